//! Collapses bursts of input into a single committed value.
//!
//! # State Machine
//!
//! ```text
//!            set_input(v)                 set_input(v')
//!  Idle ───────────────────► Pending(v) ◄──────────────┐
//!   ▲                          │  │                    │
//!   │   quiet period elapsed   │  └────────────────────┘
//!   └──── commit(trim(v)) ─────┘      (timer restarts)
//!   ▲                          │
//!   └────── cancel() ──────────┘
//! ```
//!
//! - **Idle:** Nothing typed since the last commit.
//! - **Pending:** A value is waiting for the quiet period to pass. Every
//!   new input replaces the value and restarts the timer, so intermediate
//!   values are never committed.
//!
//! The controller holds no timer task of its own. The owner awaits
//! [`DebounceController::committed`] inside its event loop; dropping that
//! future (because another branch won a `select!`) loses nothing.

use std::time::Duration;

use tokio::time::{self, Instant};

#[derive(Debug)]
enum State {
    Idle,
    Pending { value: String, deadline: Instant },
}

#[derive(Debug)]
pub struct DebounceController {
    quiet_period: Duration,
    state: State,
}

impl DebounceController {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            state: State::Idle,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Record the latest raw value and restart the quiet period.
    pub fn set_input(&mut self, value: impl Into<String>) {
        self.state = State::Pending {
            value: value.into(),
            deadline: Instant::now() + self.quiet_period,
        };
    }

    /// When the pending value will commit, if any.
    pub fn deadline(&self) -> Option<Instant> {
        match &self.state {
            State::Idle => None,
            State::Pending { deadline, .. } => Some(*deadline),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, State::Pending { .. })
    }

    /// Commit the pending value if its quiet period has passed.
    ///
    /// Returns the trimmed value exactly once per pending episode.
    pub fn poll_commit(&mut self) -> Option<String> {
        let due = matches!(
            &self.state,
            State::Pending { deadline, .. } if Instant::now() >= *deadline
        );
        if !due {
            return None;
        }

        match std::mem::replace(&mut self.state, State::Idle) {
            State::Pending { value, .. } => Some(value.trim().to_string()),
            State::Idle => None,
        }
    }

    /// Wait for the next commit. Never resolves while idle.
    ///
    /// Cancel safe: the pending value is only consumed once the future
    /// completes.
    pub async fn committed(&mut self) -> String {
        loop {
            match self.deadline() {
                None => std::future::pending::<()>().await,
                Some(deadline) => time::sleep_until(deadline).await,
            }
            if let Some(value) = self.poll_commit() {
                return value;
            }
        }
    }

    /// Drop any pending value without committing it.
    pub fn cancel(&mut self) {
        self.state = State::Idle;
    }
}
