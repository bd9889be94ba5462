//! Event-driven refresh of the low-stock alert inputs.
//!
//! Nothing here runs on a timer. Each inventory-affecting event starts one
//! cycle: fetch the alert policy and the low-stock count together, evaluate
//! them against the active identity's memory, persist the observed count,
//! and update the alert view. Cycles are generation-tagged like the query
//! channels, so a slow cycle cannot overwrite a newer one.

use std::sync::Arc;

use parking_lot::Mutex;
use strum::{Display, EnumString};
use tokio::sync::mpsc;

use super::{AlertPolicy, AlertStore, AlertVerdict, EpochMillis, Identity, evaluate};
use crate::api_client::InventoryService;
use crate::dashboard::Completion;
use crate::error::Result;
use crate::tracing::prelude::*;
use crate::types::{Generation, GenerationCounter};

/// Events after which the alert inputs may have changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum InventoryEvent {
    MovementRecorded,
    /// A product was created, edited, activated, deactivated or deleted.
    ProductChanged,
    ManualRefresh,
}

/// The alert slice of the view model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertView {
    /// Last successfully fetched policy.
    pub policy: Option<AlertPolicy>,
    pub low_stock_count: Option<u64>,
    pub popup_visible: bool,
    pub error: Option<String>,
    pub loading: bool,
}

/// Result of one cycle's fetches.
#[derive(Debug)]
pub struct CycleOutcome {
    pub generation: Generation,
    pub event: InventoryEvent,
    pub result: Result<(AlertPolicy, i64)>,
}

pub struct PollingOrchestrator<S> {
    service: Arc<dyn InventoryService>,
    store: Arc<Mutex<S>>,
    identity: Identity,
    generations: GenerationCounter,
    view: AlertView,
    completion_tx: mpsc::Sender<Completion>,
}

impl<S: AlertStore + 'static> PollingOrchestrator<S> {
    pub fn new(
        service: Arc<dyn InventoryService>,
        store: Arc<Mutex<S>>,
        identity: Identity,
        completion_tx: mpsc::Sender<Completion>,
    ) -> Self {
        Self {
            service,
            store,
            identity,
            generations: GenerationCounter::new(),
            view: AlertView::default(),
            completion_tx,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn view(&self) -> &AlertView {
        &self.view
    }

    /// Switch the identity alert memory is scoped to.
    ///
    /// Returns false if it is unchanged. A visible popup belonged to the
    /// previous identity and is hidden without acknowledgment.
    pub fn set_identity(&mut self, identity: Identity) -> bool {
        if identity == self.identity {
            return false;
        }
        info!(
            previous = %self.identity.key(),
            identity = %identity.key(),
            "Alert identity changed"
        );
        self.identity = identity;
        self.view.popup_visible = false;
        true
    }

    /// Start a cycle for `event`. Returns immediately.
    pub fn trigger(&mut self, event: InventoryEvent) -> Generation {
        let generation = self.generations.advance();
        self.view.loading = true;

        let service = Arc::clone(&self.service);
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let result = fetch_inputs(service.as_ref()).await;
            let outcome = CycleOutcome {
                generation,
                event,
                result,
            };
            if completion_tx
                .send(Completion::AlertCycle(outcome))
                .await
                .is_err()
            {
                trace!(generation = %generation, "Dashboard gone, dropping alert cycle");
            }
        });

        debug!(event = %event, generation = %generation, "Alert refresh triggered");
        generation
    }

    /// Run a cycle for `event` to completion and apply it at `now`.
    ///
    /// For one-shot callers with no event loop to receive completions.
    pub async fn refresh(
        &mut self,
        event: InventoryEvent,
        now: EpochMillis,
    ) -> Option<AlertVerdict> {
        let generation = self.generations.advance();
        self.view.loading = true;
        let outcome = CycleOutcome {
            generation,
            event,
            result: fetch_inputs(self.service.as_ref()).await,
        };
        self.apply(outcome, now)
    }

    /// Evaluate a finished cycle.
    ///
    /// Returns the verdict, or `None` if the cycle was superseded or its
    /// fetch failed. A failed fetch leaves the last policy and count in
    /// place and does not touch alert memory.
    pub fn apply(&mut self, outcome: CycleOutcome, now: EpochMillis) -> Option<AlertVerdict> {
        if !self.generations.is_current(outcome.generation) {
            trace!(generation = %outcome.generation, "Discarding stale alert cycle");
            return None;
        }
        self.view.loading = false;

        let (policy, count) = match outcome.result {
            Ok(inputs) => inputs,
            Err(e) => {
                warn!(event = %outcome.event, error = %e, "Alert refresh failed");
                self.view.error = Some(e.to_string());
                return None;
            }
        };
        self.view.error = None;
        self.view.policy = Some(policy);
        self.view.low_stock_count = Some(count.max(0) as u64);

        // Load, evaluate and save under one lock.
        let (verdict, memory) = {
            let mut store = self.store.lock();
            let memory = store.load(&self.identity);
            let (verdict, updated) = evaluate(&policy, count, &memory, now);
            if let Err(e) = store.save(&self.identity, &updated) {
                warn!(
                    identity = %self.identity.key(),
                    error = %e,
                    "Failed to persist alert memory"
                );
            }
            (verdict, memory)
        };

        if verdict.show {
            if !self.view.popup_visible {
                info!(
                    count,
                    previous = memory.last_observed_count,
                    identity = %self.identity.key(),
                    "Low-stock popup raised"
                );
            }
            self.view.popup_visible = true;
        } else if !policy.popup_enabled || count <= 0 {
            self.view.popup_visible = false;
        }

        debug!(
            event = %outcome.event,
            count,
            previous = memory.last_observed_count,
            show = verdict.show,
            "Alert cycle evaluated"
        );
        Some(verdict)
    }

    /// Explicit dismissal of the popup. Starts the cooldown.
    ///
    /// Returns false if no popup was showing.
    pub fn dismiss(&mut self, now: EpochMillis) -> bool {
        if !self.view.popup_visible {
            return false;
        }
        self.view.popup_visible = false;
        if let Err(e) = self.store.lock().acknowledge(&self.identity, now) {
            warn!(
                identity = %self.identity.key(),
                error = %e,
                "Failed to persist acknowledgment"
            );
        }
        info!(identity = %self.identity.key(), "Low-stock popup dismissed");
        true
    }
}

/// Fetch the alert policy and the low-stock count together.
async fn fetch_inputs(service: &dyn InventoryService) -> Result<(AlertPolicy, i64)> {
    let (settings, count) =
        futures::future::try_join(service.settings(), service.low_stock_count()).await?;
    Ok((AlertPolicy::from(settings), count.count))
}
