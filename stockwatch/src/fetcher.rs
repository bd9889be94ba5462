//! Generation-guarded queries against the inventory service.
//!
//! Each channel (stock overview, product search) numbers its requests.
//! Requests run as independent tasks and report back through the
//! dashboard's completion channel; a completion is applied only if no
//! newer request was issued on the same channel in the meantime. Nothing
//! is aborted at the transport level, late responses are simply dropped.

use std::future::Future;

use strum::Display;
use tokio::sync::mpsc;

use crate::api_client::types::Page;
use crate::dashboard::Completion;
use crate::error::Result;
use crate::tracing::prelude::*;
use crate::types::{Generation, GenerationCounter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Channel {
    StockOverview,
    ProductSearch,
}

/// The slice of the view model a channel owns.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelView<T> {
    pub items: Vec<T>,
    pub total: u64,
    /// Message from the latest failed request, cleared by the next issue.
    pub error: Option<String>,
    /// A current-generation request is in flight.
    pub loading: bool,
}

impl<T> Default for ChannelView<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            error: None,
            loading: false,
        }
    }
}

/// A finished request, tagged with the generation it was issued under.
#[derive(Debug)]
pub struct FetchOutcome<T> {
    pub generation: Generation,
    pub result: Result<Page<T>>,
}

/// What [`GenerationGuardedFetcher::complete`] did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Items and total replaced.
    Replaced,
    /// Error recorded, previous items kept.
    Failed,
    /// Superseded by a newer request, dropped.
    Stale,
}

pub struct GenerationGuardedFetcher<T> {
    channel: Channel,
    generations: GenerationCounter,
    view: ChannelView<T>,
    completion_tx: mpsc::Sender<Completion>,
    wrap: fn(FetchOutcome<T>) -> Completion,
}

impl<T: Send + 'static> GenerationGuardedFetcher<T> {
    pub fn new(
        channel: Channel,
        completion_tx: mpsc::Sender<Completion>,
        wrap: fn(FetchOutcome<T>) -> Completion,
    ) -> Self {
        Self {
            channel,
            generations: GenerationCounter::new(),
            view: ChannelView::default(),
            completion_tx,
            wrap,
        }
    }

    pub fn view(&self) -> &ChannelView<T> {
        &self.view
    }

    /// Start `request` under a new generation and return immediately.
    ///
    /// Everything issued earlier on this channel becomes stale.
    pub fn issue<F>(&mut self, request: F) -> Generation
    where
        F: Future<Output = Result<Page<T>>> + Send + 'static,
    {
        let generation = self.generations.advance();
        self.view.loading = true;
        self.view.error = None;

        let channel = self.channel;
        let completion_tx = self.completion_tx.clone();
        let wrap = self.wrap;
        tokio::spawn(async move {
            let result = request.await;
            let outcome = wrap(FetchOutcome { generation, result });
            if completion_tx.send(outcome).await.is_err() {
                trace!(%channel, %generation, "Dashboard gone, dropping result");
            }
        });

        debug!(channel = %self.channel, generation = %generation, "Query issued");
        generation
    }

    /// Apply a finished request if it is still the latest one.
    pub fn complete(&mut self, outcome: FetchOutcome<T>) -> Applied {
        if !self.generations.is_current(outcome.generation) {
            trace!(
                channel = %self.channel,
                generation = %outcome.generation,
                current = %self.generations.current(),
                "Discarding stale result"
            );
            return Applied::Stale;
        }

        self.view.loading = false;
        match outcome.result {
            Ok(page) => {
                debug!(
                    channel = %self.channel,
                    generation = %outcome.generation,
                    total = page.total,
                    "Query applied"
                );
                self.view.items = page.items;
                self.view.total = page.total;
                self.view.error = None;
                Applied::Replaced
            }
            Err(e) => {
                warn!(channel = %self.channel, error = %e, "Query failed");
                self.view.error = Some(e.to_string());
                Applied::Failed
            }
        }
    }
}
