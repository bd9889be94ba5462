//! Error type shared across the library.

/// Errors surfaced by the controller and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The inventory service answered with a non-success status.
    ///
    /// `message` is the service's `detail` field when present.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
