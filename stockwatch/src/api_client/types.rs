//! Inventory service data transfer objects.
//!
//! Field names follow the service's JSON. Missing collections and counts
//! decode as empty/zero rather than failing.

use serde::{Deserialize, Serialize};

/// A page of results: `{ items, total }`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}

/// One row of `GET /stock/overview`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct StockOverviewItem {
    pub id: i64,
    pub name: String,
    pub unit: String,
    /// Sum of IN movements minus sum of OUT movements.
    pub balance: i64,
    pub min_stock: i64,
    pub low_stock: bool,
    #[serde(default)]
    pub low_stock_enabled: Option<bool>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Catalog entry from `GET /products`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub unit: String,
    #[serde(default)]
    pub min_stock: i64,
    #[serde(default = "default_true")]
    pub low_stock_enabled: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// `GET /settings`. Absent fields fall back to the alert policy defaults.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct SettingsResponse {
    #[serde(default)]
    pub low_stock_popup_enabled: Option<bool>,
    #[serde(default)]
    pub low_stock_pin_enabled: Option<bool>,
    #[serde(default)]
    pub popup_cooldown_hours: Option<i64>,
}

/// `GET /stock/low/count`.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct LowStockCount {
    #[serde(default)]
    pub count: i64,
}

fn default_true() -> bool {
    true
}
