//! Runtime configuration read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Quiet period after the last keystroke before a search value commits.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(350);

pub const DEFAULT_PAGE_LIMIT: u32 = 50;

/// Largest page the inventory service accepts.
pub const MAX_PAGE_LIMIT: u32 = 200;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the inventory service, without a trailing slash.
    pub api_url: String,

    /// Sent as the `access_token` cookie when set.
    pub access_token: Option<String>,

    /// Alert memory scope. `None` means the guest scope.
    pub identity: Option<String>,

    pub debounce: Duration,

    /// Page size for the stock overview channel (1--200).
    pub page_limit: u32,

    pub request_timeout: Duration,

    /// Where alert memory is kept between CLI invocations of one session.
    pub session_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            access_token: None,
            identity: None,
            debounce: DEFAULT_DEBOUNCE,
            page_limit: DEFAULT_PAGE_LIMIT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            session_file: None,
        }
    }
}

impl Config {
    /// Read configuration from `STOCKWATCH_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get("STOCKWATCH_API_URL") {
            config.api_url = url.trim().trim_end_matches('/').to_string();
        }
        config.access_token = get("STOCKWATCH_ACCESS_TOKEN");
        config.identity = get("STOCKWATCH_IDENTITY").map(|id| id.trim().to_string());

        if let Some(ms) = get("STOCKWATCH_DEBOUNCE_MS") {
            config.debounce = Duration::from_millis(parse_number("STOCKWATCH_DEBOUNCE_MS", &ms)?);
        }
        if let Some(limit) = get("STOCKWATCH_PAGE_LIMIT") {
            let limit = parse_number("STOCKWATCH_PAGE_LIMIT", &limit)?;
            if limit == 0 || limit > u64::from(MAX_PAGE_LIMIT) {
                return Err(Error::Config(format!(
                    "STOCKWATCH_PAGE_LIMIT must be between 1 and {MAX_PAGE_LIMIT}, got {limit}"
                )));
            }
            config.page_limit = limit as u32;
        }
        if let Some(secs) = get("STOCKWATCH_TIMEOUT_SECS") {
            config.request_timeout =
                Duration::from_secs(parse_number("STOCKWATCH_TIMEOUT_SECS", &secs)?);
        }
        config.session_file = get("STOCKWATCH_SESSION_FILE").map(PathBuf::from);

        Ok(config)
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value.trim().parse().map_err(|_| {
        let message = format!("{key} must be a non-negative integer, got {value:?}");
        Error::Config(message)
    })
}
