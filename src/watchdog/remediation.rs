//! Remediation contract: the routine that fixes an inconsistent auth state and
//! reports what it did.

use serde::{Deserialize, Serialize};
use std::{fmt, future::Future, str::FromStr};
use thiserror::Error;

/// Outcome tag reported by a remediation routine.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationAction {
    NoneNeeded,
    TokenRemoved,
    ExpiredSessionLogout,
    /// The backend had a live session the local store did not know about.
    StoreResynced,
    /// Backend-specific action not known to the watchdog.
    Other(String),
}

impl RemediationAction {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::NoneNeeded => "none_needed",
            Self::TokenRemoved => "token_removed",
            Self::ExpiredSessionLogout => "expired_session_logout",
            Self::StoreResynced => "store_resynced",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for RemediationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RemediationAction {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "none_needed" => Self::NoneNeeded,
            "token_removed" => Self::TokenRemoved,
            "expired_session_logout" => Self::ExpiredSessionLogout,
            "store_resynced" => Self::StoreResynced,
            other => Self::Other(other.to_string()),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationReport {
    pub success: bool,
    pub action: RemediationAction,
}

impl RemediationReport {
    #[must_use]
    pub fn succeeded(action: RemediationAction) -> Self {
        Self {
            success: true,
            action,
        }
    }

    #[must_use]
    pub fn failed(action: RemediationAction) -> Self {
        Self {
            success: false,
            action,
        }
    }
}

#[derive(Debug, Error)]
pub enum RemediationError {
    #[error("session backend unreachable: {0}")]
    Transport(String),
    #[error("session backend returned {status}: {message}")]
    Backend { status: u16, message: String },
    #[error("local token store: {0}")]
    Store(String),
    #[error("{0}")]
    Other(String),
}

/// Inspects and corrects the authentication session.
///
/// Implementations own any mutation of the underlying flag sources; the
/// watchdog only reads flags and acts on the returned report.
pub trait Remediation: Send + Sync {
    fn remediate(
        &self,
    ) -> impl Future<Output = Result<RemediationReport, RemediationError>> + Send;
}
