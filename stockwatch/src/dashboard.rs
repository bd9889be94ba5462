//! The dashboard actor.
//!
//! One task owns the query state, both query channels and the alert
//! orchestrator. Operator commands arrive on an mpsc channel, request
//! completions on another, debounce deadlines are awaited in the same
//! `select!`, and every state change is published as a [`ViewModel`]
//! snapshot on a watch channel. Because only this task mutates state,
//! each completion and each alert evaluation runs to completion before
//! the next event is looked at.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::alert::{
    AlertPolicy, AlertStore, AlertView, CycleOutcome, Identity, InventoryEvent,
    PollingOrchestrator, now_millis,
};
use crate::api_client::InventoryService;
use crate::api_client::types::{Product, StockOverviewItem};
use crate::config::{Config, MAX_PAGE_LIMIT};
use crate::error::{Error, Result};
use crate::fetcher::{Channel, ChannelView, FetchOutcome, GenerationGuardedFetcher};
use crate::query::{Filters, OverviewParams, Paging, ProductSearchParams, QueryState};
use crate::tracing::prelude::*;
use crate::types::DebounceController;

const COMMAND_CHANNEL_CAPACITY: usize = 32;
const COMPLETION_CHANNEL_CAPACITY: usize = 64;

/// Requests from the operator (or whatever drives the dashboard).
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardCommand {
    /// Raw stock-overview search input, debounced before it commits.
    SetSearch(String),
    /// Raw product-search input, debounced before it commits.
    SetProductSearch(String),
    SetFilters(Filters),
    /// Move the overview to another page.
    SetPage { skip: u32 },
    /// Re-issue every query.
    Refresh,
    /// Something changed inventory data.
    Inventory(InventoryEvent),
    DismissAlert,
    /// Signed-in user changed; `None` for guest.
    SetIdentity(Option<String>),
}

/// Finished work reported back to the dashboard task.
#[derive(Debug)]
pub enum Completion {
    Overview(FetchOutcome<StockOverviewItem>),
    Products(FetchOutcome<Product>),
    AlertCycle(CycleOutcome),
}

/// Everything a view needs to render the dashboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewModel {
    pub query: QueryState,
    pub product_search: String,
    pub paging: Paging,
    pub overview: ChannelView<StockOverviewItem>,
    pub products: ChannelView<Product>,
    pub alert: AlertView,
}

/// Cloneable handle for driving a running [`Dashboard`].
#[derive(Clone)]
pub struct DashboardHandle {
    commands: mpsc::Sender<DashboardCommand>,
    view: watch::Receiver<ViewModel>,
}

impl DashboardHandle {
    pub async fn send(&self, command: DashboardCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| Error::Other("dashboard is not running".into()))
    }

    pub async fn set_search(&self, input: impl Into<String>) -> Result<()> {
        self.send(DashboardCommand::SetSearch(input.into())).await
    }

    pub async fn set_product_search(&self, input: impl Into<String>) -> Result<()> {
        self.send(DashboardCommand::SetProductSearch(input.into()))
            .await
    }

    pub async fn set_filters(&self, filters: Filters) -> Result<()> {
        self.send(DashboardCommand::SetFilters(filters)).await
    }

    pub async fn refresh(&self) -> Result<()> {
        self.send(DashboardCommand::Refresh).await
    }

    pub async fn notify(&self, event: InventoryEvent) -> Result<()> {
        self.send(DashboardCommand::Inventory(event)).await
    }

    pub async fn dismiss_alert(&self) -> Result<()> {
        self.send(DashboardCommand::DismissAlert).await
    }

    pub async fn set_identity(&self, user: Option<String>) -> Result<()> {
        self.send(DashboardCommand::SetIdentity(user)).await
    }

    /// Latest published view.
    pub fn view(&self) -> ViewModel {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewModel> {
        self.view.clone()
    }
}

pub struct Dashboard<S> {
    service: Arc<dyn InventoryService>,
    query: QueryState,
    paging: Paging,
    product_search: String,
    search_debounce: DebounceController,
    product_debounce: DebounceController,
    overview: GenerationGuardedFetcher<StockOverviewItem>,
    products: GenerationGuardedFetcher<Product>,
    alerts: PollingOrchestrator<S>,
    command_rx: mpsc::Receiver<DashboardCommand>,
    completion_rx: mpsc::Receiver<Completion>,
    view_tx: watch::Sender<ViewModel>,
}

impl<S: AlertStore + 'static> Dashboard<S> {
    pub fn new(
        config: &Config,
        service: Arc<dyn InventoryService>,
        store: Arc<Mutex<S>>,
    ) -> (Self, DashboardHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (completion_tx, completion_rx) = mpsc::channel(COMPLETION_CHANNEL_CAPACITY);
        let paging = Paging::new(0, config.page_limit);
        let mut query = QueryState::default();
        // Until settings arrive, pin the way the service does by default.
        query.filters.pin_low_stock_first = AlertPolicy::default().pin_enabled;
        let (view_tx, view_rx) = watch::channel(ViewModel {
            query: query.clone(),
            paging,
            ..ViewModel::default()
        });

        let dashboard = Self {
            service: Arc::clone(&service),
            query,
            paging,
            product_search: String::new(),
            search_debounce: DebounceController::new(config.debounce),
            product_debounce: DebounceController::new(config.debounce),
            overview: GenerationGuardedFetcher::new(
                Channel::StockOverview,
                completion_tx.clone(),
                Completion::Overview,
            ),
            products: GenerationGuardedFetcher::new(
                Channel::ProductSearch,
                completion_tx.clone(),
                Completion::Products,
            ),
            alerts: PollingOrchestrator::new(
                service,
                store,
                Identity::from_user(config.identity.as_deref()),
                completion_tx,
            ),
            command_rx,
            completion_rx,
            view_tx,
        };
        let handle = DashboardHandle {
            commands: command_tx,
            view: view_rx,
        };
        (dashboard, handle)
    }

    /// Run until cancelled or every handle is dropped.
    ///
    /// Loads the overview, the product list and the alert inputs once on
    /// start.
    pub async fn run(mut self, cancellation: CancellationToken) {
        info!(identity = %self.alerts.identity().key(), "Dashboard started");

        self.issue_overview();
        self.issue_products();
        self.alerts.trigger(InventoryEvent::ManualRefresh);
        self.publish();

        loop {
            tokio::select! {
                _ = cancellation.cancelled() => {
                    break;
                }

                command = self.command_rx.recv() => {
                    match command {
                        Some(command) => self.handle_command(command),
                        None => {
                            debug!("All dashboard handles dropped");
                            break;
                        }
                    }
                }

                value = self.search_debounce.committed() => {
                    self.commit_search(value);
                }

                value = self.product_debounce.committed() => {
                    self.commit_product_search(value);
                }

                Some(completion) = self.completion_rx.recv() => {
                    self.handle_completion(completion);
                }
            }

            self.publish();
        }

        info!("Dashboard stopped");
    }

    fn handle_command(&mut self, command: DashboardCommand) {
        trace!(?command, "Dashboard command");
        match command {
            DashboardCommand::SetSearch(input) => {
                self.search_debounce.set_input(input.clone());
                self.query.raw_input = input;
            }

            DashboardCommand::SetProductSearch(input) => {
                self.product_debounce.set_input(input);
            }

            DashboardCommand::SetFilters(filters) => {
                if filters != self.query.filters {
                    self.query.filters = filters;
                    self.paging = self.paging.with_skip(0);
                    self.issue_overview();
                }
            }

            DashboardCommand::SetPage { skip } => {
                if skip != self.paging.skip() {
                    self.paging = self.paging.with_skip(skip);
                    self.issue_overview();
                }
            }

            DashboardCommand::Refresh => {
                self.issue_overview();
                self.issue_products();
                self.alerts.trigger(InventoryEvent::ManualRefresh);
            }

            DashboardCommand::Inventory(event) => {
                // Balances move with every inventory change; the catalog only
                // with product edits.
                self.issue_overview();
                if event != InventoryEvent::MovementRecorded {
                    self.issue_products();
                }
                self.alerts.trigger(event);
            }

            DashboardCommand::DismissAlert => {
                self.alerts.dismiss(now_millis());
            }

            DashboardCommand::SetIdentity(user) => {
                if self.alerts.set_identity(Identity::from_user(user.as_deref())) {
                    self.alerts.trigger(InventoryEvent::ManualRefresh);
                }
            }
        }
    }

    fn commit_search(&mut self, value: String) {
        if !self.query.commit(value) {
            trace!("Committed search unchanged");
            return;
        }
        debug!(search = %self.query.committed_value(), "Search committed");
        self.paging = self.paging.with_skip(0);
        self.issue_overview();
    }

    fn commit_product_search(&mut self, value: String) {
        if value == self.product_search {
            return;
        }
        debug!(search = %value, "Product search committed");
        self.product_search = value;
        self.issue_products();
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Overview(outcome) => {
                self.overview.complete(outcome);
            }
            Completion::Products(outcome) => {
                self.products.complete(outcome);
            }
            Completion::AlertCycle(outcome) => {
                if self.alerts.apply(outcome, now_millis()).is_some() {
                    self.follow_pin_setting();
                }
            }
        }
    }

    /// Keep low-stock pinning in line with the service setting.
    fn follow_pin_setting(&mut self) {
        let Some(policy) = self.alerts.view().policy else {
            return;
        };
        if policy.pin_enabled != self.query.filters.pin_low_stock_first {
            debug!(pin = policy.pin_enabled, "Pin setting changed");
            self.query.filters.pin_low_stock_first = policy.pin_enabled;
            self.issue_overview();
        }
    }

    fn issue_overview(&mut self) {
        let params = OverviewParams::new(
            self.query.committed_value(),
            self.query.filters,
            self.paging,
        );
        let service = Arc::clone(&self.service);
        self.overview
            .issue(async move { service.stock_overview(&params).await });
    }

    fn issue_products(&mut self) {
        let paging = Paging::new(0, MAX_PAGE_LIMIT);
        let params = ProductSearchParams::new(&self.product_search, paging);
        let service = Arc::clone(&self.service);
        self.products
            .issue(async move { service.search_products(&params).await });
    }

    fn snapshot(&self) -> ViewModel {
        ViewModel {
            query: self.query.clone(),
            product_search: self.product_search.clone(),
            paging: self.paging,
            overview: self.overview.view().clone(),
            products: self.products.view().clone(),
            alert: self.alerts.view().clone(),
        }
    }

    fn publish(&self) {
        let next = self.snapshot();
        self.view_tx.send_if_modified(|view| {
            if *view == next {
                return false;
            }
            *view = next;
            true
        });
    }
}
