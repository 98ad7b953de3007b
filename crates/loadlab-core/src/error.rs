//! Shared error type across loadlab crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input.
    BadRequest,
    /// Invalid or inconsistent configuration.
    Config,
    /// Metric registration rejected at startup.
    Registration,
    /// External store query failed.
    Store,
    /// Bounded call exceeded its budget.
    Timeout,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::Config => "CONFIG",
            ClientCode::Registration => "REGISTRATION",
            ClientCode::Store => "STORE",
            ClientCode::Timeout => "TIMEOUT",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, LoadLabError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum LoadLabError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("config: {0}")]
    Config(String),
    #[error("metric registration: {0}")]
    Registration(String),
    #[error("store: {0}")]
    Store(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl LoadLabError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            LoadLabError::BadRequest(_) => ClientCode::BadRequest,
            LoadLabError::Config(_) => ClientCode::Config,
            LoadLabError::Registration(_) => ClientCode::Registration,
            LoadLabError::Store(_) => ClientCode::Store,
            LoadLabError::Timeout(_) => ClientCode::Timeout,
            LoadLabError::Internal(_) => ClientCode::Internal,
        }
    }
}
