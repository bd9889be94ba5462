//! In-process inventory service fake for unit tests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::api_client::InventoryService;
use crate::api_client::types::{
    LowStockCount, Page, Product, SettingsResponse, StockOverviewItem,
};
use crate::error::{Error, Result};
use crate::query::{OverviewParams, ProductSearchParams};

/// Scriptable [`InventoryService`].
///
/// Responses are computed from `FakeState` at request time. Per-search
/// delays let tests control completion order under paused time.
#[derive(Default)]
pub(crate) struct FakeService {
    state: Mutex<FakeState>,
}

#[derive(Default)]
pub(crate) struct FakeState {
    pub items: Vec<StockOverviewItem>,
    pub products: Vec<Product>,
    pub settings: SettingsResponse,
    pub low_stock_count: i64,
    /// Overview/product delay keyed by search term; "" for no search.
    pub delays: HashMap<String, Duration>,
    pub overview_error: Option<String>,
    pub alert_error: Option<String>,
    pub overview_requests: Vec<OverviewParams>,
    pub product_requests: Vec<ProductSearchParams>,
    pub alert_requests: usize,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<StockOverviewItem>) -> Self {
        let service = Self::new();
        service.update(|state| state.items = items);
        service
    }

    pub fn update(&self, f: impl FnOnce(&mut FakeState)) {
        f(&mut self.state.lock());
    }

    pub fn overview_requests(&self) -> Vec<OverviewParams> {
        self.state.lock().overview_requests.clone()
    }

    pub fn product_requests(&self) -> Vec<ProductSearchParams> {
        self.state.lock().product_requests.clone()
    }

    pub fn alert_requests(&self) -> usize {
        self.state.lock().alert_requests
    }

    fn delay_for(&self, search: Option<&str>) -> Duration {
        self.state
            .lock()
            .delays
            .get(search.unwrap_or(""))
            .copied()
            .unwrap_or_default()
    }
}

fn matches_search(name: &str, search: Option<&str>) -> bool {
    search.is_none_or(|s| name.to_lowercase().contains(&s.to_lowercase()))
}

fn server_error(message: &str) -> Error {
    Error::Api {
        status: 500,
        message: message.to_string(),
    }
}

#[async_trait]
impl InventoryService for FakeService {
    async fn stock_overview(&self, params: &OverviewParams) -> Result<Page<StockOverviewItem>> {
        let search = params.search.as_deref();
        let delay = self.delay_for(search);
        let response = {
            let mut state = self.state.lock();
            state.overview_requests.push(params.clone());
            match &state.overview_error {
                Some(message) => Err(server_error(message)),
                None => {
                    let items: Vec<_> = state
                        .items
                        .iter()
                        .filter(|item| matches_search(&item.name, search))
                        .filter(|item| !params.filters.low_stock_only || item.low_stock)
                        .cloned()
                        .collect();
                    Ok(Page {
                        total: items.len() as u64,
                        items,
                    })
                }
            }
        };
        tokio::time::sleep(delay).await;
        response
    }

    async fn search_products(&self, params: &ProductSearchParams) -> Result<Page<Product>> {
        let search = params.search.as_deref();
        let delay = self.delay_for(search);
        let items: Vec<_> = {
            let mut state = self.state.lock();
            state.product_requests.push(params.clone());
            state
                .products
                .iter()
                .filter(|product| matches_search(&product.name, search))
                .cloned()
                .collect()
        };
        tokio::time::sleep(delay).await;
        Ok(Page {
            total: items.len() as u64,
            items,
        })
    }

    async fn settings(&self) -> Result<SettingsResponse> {
        let mut state = self.state.lock();
        state.alert_requests += 1;
        match &state.alert_error {
            Some(message) => Err(server_error(message)),
            None => Ok(state.settings.clone()),
        }
    }

    async fn low_stock_count(&self) -> Result<LowStockCount> {
        let state = self.state.lock();
        match &state.alert_error {
            Some(message) => Err(server_error(message)),
            None => Ok(LowStockCount {
                count: state.low_stock_count,
            }),
        }
    }
}

pub(crate) fn item(id: i64, name: &str, balance: i64, min_stock: i64) -> StockOverviewItem {
    StockOverviewItem {
        id,
        name: name.to_string(),
        unit: "kg".to_string(),
        balance,
        min_stock,
        low_stock: balance <= min_stock,
        low_stock_enabled: Some(true),
        is_active: Some(true),
        created_at: None,
    }
}

pub(crate) fn product(id: i64, name: &str) -> Product {
    Product {
        id,
        name: name.to_string(),
        unit: "kg".to_string(),
        min_stock: 0,
        low_stock_enabled: true,
        is_active: true,
        created_at: None,
    }
}

pub(crate) fn names<T>(items: &[T], name: impl Fn(&T) -> &str) -> Vec<String> {
    items.iter().map(|i| name(i).to_string()).collect()
}
