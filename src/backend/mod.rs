//! HTTP-backed collaborators for the watchdog.
//!
//! The session API is expected to expose:
//!
//! - `GET  {api}/auth/session` with a bearer token: `200 {"state": "active" | "expired" | "none"}`,
//!   or `401`/`404` when the token has no session.
//! - `POST {api}/auth/logout` with a bearer token.
//! - `POST {api}/logs` accepting a JSON event (optional).

pub mod client;
pub mod logger;
pub mod remediation;
pub mod session;
pub mod token;

pub use self::client::{SessionApi, SessionState};
pub use self::logger::HttpEventLogger;
pub use self::remediation::HttpRemediation;
pub use self::session::SessionProbe;
pub use self::token::TokenStore;

use crate::watchdog::RemediationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid response body: {0}")]
    Parse(String),
    #[error("token store: {0}")]
    Store(String),
}

impl From<BackendError> for RemediationError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Transport(message) => Self::Transport(message),
            BackendError::Status { status, message } => Self::Backend { status, message },
            BackendError::Store(message) => Self::Store(message),
            other => Self::Other(other.to_string()),
        }
    }
}
