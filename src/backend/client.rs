use crate::{backend::BackendError, APP_USER_AGENT};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

pub const SESSION_ENDPOINT: &str = "auth/session";
pub const LOGOUT_ENDPOINT: &str = "auth/logout";
pub const LOGS_ENDPOINT: &str = "logs";

/// Session state as reported by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Active,
    Expired,
    None,
}

#[derive(Deserialize)]
struct SessionResponse {
    state: SessionState,
}

/// Thin client for the session API.
#[derive(Clone, Debug)]
pub struct SessionApi {
    client: Client,
    base_url: Url,
}

impl SessionApi {
    /// # Errors
    /// Returns an error if `base_url` is not an http(s) URL or the HTTP client
    /// cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let mut base_url =
            Url::parse(base_url).map_err(|e| BackendError::InvalidUrl(e.to_string()))?;

        match base_url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(BackendError::InvalidUrl(format!(
                    "unsupported scheme {scheme}"
                )))
            }
        }

        // Url::join drops the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// # Errors
    /// Returns an error if `endpoint` cannot be joined onto the base URL.
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|e| BackendError::InvalidUrl(e.to_string()))
    }

    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Ask the backend about the session behind `token`.
    ///
    /// `401` and `404` mean there is no session for the token.
    ///
    /// # Errors
    /// Returns an error on transport failures, other non-success statuses, or an
    /// unparsable body.
    #[instrument(skip_all)]
    pub async fn session_state(&self, token: &SecretString) -> Result<SessionState, BackendError> {
        let url = self.endpoint_url(SESSION_ENDPOINT)?;

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::NOT_FOUND {
            debug!(%status, "no session for token");
            return Ok(SessionState::None);
        }

        if !status.is_success() {
            return Err(status_error(&url, status, response).await);
        }

        let body: SessionResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;

        debug!(state = ?body.state, "session state");

        Ok(body.state)
    }

    /// End the session behind `token`.
    ///
    /// # Errors
    /// Returns an error on transport failures or a non-success status other
    /// than `401`.
    #[instrument(skip_all)]
    pub async fn logout(&self, token: &SecretString) -> Result<(), BackendError> {
        let url = self.endpoint_url(LOGOUT_ENDPOINT)?;

        let response = self
            .client
            .post(url.clone())
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            return Ok(());
        }

        Err(status_error(&url, status, response).await)
    }
}

async fn status_error(url: &Url, status: StatusCode, response: reqwest::Response) -> BackendError {
    let message = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| body["error"].as_str().map(ToString::to_string))
        .unwrap_or_default();

    BackendError::Status {
        status: status.as_u16(),
        message: format!("{url}: {message}"),
    }
}
