//! Query state for the stock overview and product search channels.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::config::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

/// Column the stock overview is ordered by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Name,
    Balance,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

/// Overview filters. Any change re-issues the overview query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Filters {
    pub low_stock_only: bool,
    pub sort_by: SortBy,
    pub sort_dir: SortDir,
    /// Order low-stock rows ahead of the rest, before the sort column.
    pub pin_low_stock_first: bool,
}

/// Offset pagination, clamped to what the service accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Paging {
    skip: u32,
    limit: u32,
}

impl Paging {
    pub fn new(skip: u32, limit: u32) -> Self {
        Self {
            skip,
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn skip(&self) -> u32 {
        self.skip
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Same page size, starting at `skip`.
    pub fn with_skip(self, skip: u32) -> Self {
        Self { skip, ..self }
    }
}

impl Default for Paging {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_LIMIT)
    }
}

/// What the operator typed, what has been committed, and the filters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryState {
    pub raw_input: String,
    committed_value: String,
    pub filters: Filters,
}

impl QueryState {
    pub fn committed_value(&self) -> &str {
        &self.committed_value
    }

    /// Record a debounced value. Returns whether it differs from the
    /// previous commit.
    pub fn commit(&mut self, value: String) -> bool {
        if self.committed_value == value {
            return false;
        }
        self.committed_value = value;
        true
    }
}

/// Parameters for `GET /stock/overview`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverviewParams {
    pub search: Option<String>,
    pub filters: Filters,
    pub paging: Paging,
}

impl OverviewParams {
    pub fn new(search: &str, filters: Filters, paging: Paging) -> Self {
        Self {
            search: non_empty(search),
            filters,
            paging,
        }
    }

    /// Query string pairs, with the service's parameter names.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(7);
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        pairs.push(("low_stock_only", self.filters.low_stock_only.to_string()));
        pairs.push((
            "low_stock_first",
            self.filters.pin_low_stock_first.to_string(),
        ));
        pairs.push(("sort_by", self.filters.sort_by.to_string()));
        pairs.push(("sort_dir", self.filters.sort_dir.to_string()));
        pairs.push(("skip", self.paging.skip().to_string()));
        pairs.push(("limit", self.paging.limit().to_string()));
        pairs
    }
}

/// Parameters for `GET /products`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductSearchParams {
    pub search: Option<String>,
    pub paging: Paging,
}

impl ProductSearchParams {
    pub fn new(search: &str, paging: Paging) -> Self {
        Self {
            search: non_empty(search),
            paging,
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3);
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        pairs.push(("skip", self.paging.skip().to_string()));
        pairs.push(("limit", self.paging.limit().to_string()));
        pairs
    }
}

// The service rejects `search=` with a validation error.
fn non_empty(search: &str) -> Option<String> {
    let search = search.trim();
    (!search.is_empty()).then(|| search.to_string())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn sort_enums_use_wire_names() {
        assert_eq!(SortBy::Balance.to_string(), "balance");
        assert_eq!(SortDir::Desc.to_string(), "desc");
        assert_eq!(SortBy::from_str("name").unwrap(), SortBy::Name);
        assert!(SortDir::from_str("sideways").is_err());
    }

    #[test]
    fn paging_clamps_limit() {
        assert_eq!(Paging::new(0, 0).limit(), 1);
        assert_eq!(Paging::new(0, 500).limit(), MAX_PAGE_LIMIT);
        assert_eq!(Paging::default().limit(), 50);
    }

    #[test]
    fn commit_reports_changes_only() {
        let mut state = QueryState::default();
        assert!(!state.commit(String::new()));
        assert!(state.commit("salt".into()));
        assert!(!state.commit("salt".into()));
        assert_eq!(state.committed_value(), "salt");
    }

    #[test]
    fn overview_pairs_omit_empty_search() {
        let params = OverviewParams::new("   ", Filters::default(), Paging::default());
        let pairs = params.query_pairs();
        assert!(pairs.iter().all(|(k, _)| *k != "search"));
        assert_eq!(
            pairs,
            vec![
                ("low_stock_only", "false".to_string()),
                ("low_stock_first", "false".to_string()),
                ("sort_by", "name".to_string()),
                ("sort_dir", "asc".to_string()),
                ("skip", "0".to_string()),
                ("limit", "50".to_string()),
            ]
        );
    }

    #[test]
    fn overview_pairs_carry_filters() {
        let filters = Filters {
            low_stock_only: true,
            sort_by: SortBy::Balance,
            sort_dir: SortDir::Desc,
            pin_low_stock_first: true,
        };
        let params = OverviewParams::new(" sugar ", filters, Paging::new(50, 50));
        let pairs = params.query_pairs();
        assert_eq!(pairs[0], ("search", "sugar".to_string()));
        assert!(pairs.contains(&("low_stock_first", "true".to_string())));
        assert!(pairs.contains(&("sort_by", "balance".to_string())));
        assert!(pairs.contains(&("skip", "50".to_string())));
    }

    #[test]
    fn product_pairs() {
        let params = ProductSearchParams::new("flour", Paging::new(0, 200));
        assert_eq!(
            params.query_pairs(),
            vec![
                ("search", "flour".to_string()),
                ("skip", "0".to_string()),
                ("limit", "200".to_string()),
            ]
        );
    }
}
