//! Live query and low-stock alert controller for an inventory dashboard.
//!
//! The crate sits between an operator's input and a remote inventory
//! service. Search input is debounced, queries are tagged with a
//! per-channel generation so late responses from superseded queries are
//! dropped, and a low-stock alert policy decides when to interrupt the
//! operator with a popup.

pub mod alert;
pub mod api_client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod fetcher;
pub mod query;
pub mod tracing;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;
