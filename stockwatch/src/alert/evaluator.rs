use super::{AlertMemory, AlertPolicy, EpochMillis};

/// Whether to surface the low-stock popup. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertVerdict {
    pub show: bool,
}

impl AlertVerdict {
    pub const SHOW: Self = Self { show: true };
    pub const HIDE: Self = Self { show: false };
}

/// Decide whether the current low-stock count warrants a popup.
///
/// | Condition | Verdict |
/// |-----------|---------|
/// | popup disabled, or count is zero | hide |
/// | count above last observed count | show, ignoring cooldown |
/// | otherwise, cooldown elapsed since last acknowledgment | show |
/// | otherwise | hide |
///
/// A missing acknowledgment counts as an infinitely long time ago. The
/// returned memory always carries the current count; the acknowledgment
/// time is left untouched, since only an explicit dismissal moves it.
pub fn evaluate(
    policy: &AlertPolicy,
    current_count: i64,
    memory: &AlertMemory,
    now: EpochMillis,
) -> (AlertVerdict, AlertMemory) {
    let current_count = current_count.max(0) as u64;
    let updated = AlertMemory {
        last_observed_count: current_count,
        ..memory.clone()
    };

    if !policy.popup_enabled || current_count == 0 {
        return (AlertVerdict::HIDE, updated);
    }

    if current_count > memory.last_observed_count {
        return (AlertVerdict::SHOW, updated);
    }

    let cooled_down = match memory.last_acknowledged_at {
        None => true,
        Some(acknowledged_at) => now.saturating_sub(acknowledged_at) >= policy.cooldown_millis(),
    };
    let verdict = if cooled_down {
        AlertVerdict::SHOW
    } else {
        AlertVerdict::HIDE
    };
    (verdict, updated)
}
