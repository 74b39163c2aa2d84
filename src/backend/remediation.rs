//! HTTP-backed remediation: re-validates the session and repairs the local
//! store so both flags agree again.

use crate::{
    backend::{
        client::{SessionApi, SessionState},
        token::TokenStore,
        BackendError,
    },
    watchdog::{
        Remediation, RemediationAction, RemediationError, RemediationReport, SharedFlag,
    },
};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Clone, Debug)]
pub struct HttpRemediation {
    api: SessionApi,
    store: Arc<TokenStore>,
    context: SharedFlag,
}

impl HttpRemediation {
    #[must_use]
    pub fn new(api: SessionApi, store: Arc<TokenStore>, context: SharedFlag) -> Self {
        Self {
            api,
            store,
            context,
        }
    }

    async fn fix(&self) -> Result<RemediationAction, BackendError> {
        let Some(token) = self.store.token() else {
            // Another client may have logged in and written the token file.
            return match self.store.reload().await? {
                Some(token) => self.adopt(&token).await,
                None => {
                    self.context.set(false);
                    Ok(RemediationAction::NoneNeeded)
                }
            };
        };

        match self.api.session_state(&token).await? {
            SessionState::Active => {
                self.context.set(true);
                Ok(RemediationAction::NoneNeeded)
            }
            SessionState::None => self.drop_token().await,
            SessionState::Expired => self.end_expired(&token).await,
        }
    }

    async fn adopt(&self, token: &SecretString) -> Result<RemediationAction, BackendError> {
        match self.api.session_state(token).await? {
            SessionState::Active => {
                self.context.set(true);
                info!("adopted session written by another client");
                Ok(RemediationAction::StoreResynced)
            }
            SessionState::None => self.drop_token().await,
            SessionState::Expired => self.end_expired(token).await,
        }
    }

    async fn drop_token(&self) -> Result<RemediationAction, BackendError> {
        self.store.remove().await?;
        self.context.set(false);
        Ok(RemediationAction::TokenRemoved)
    }

    async fn end_expired(&self, token: &SecretString) -> Result<RemediationAction, BackendError> {
        if let Err(e) = self.api.logout(token).await {
            warn!("logout of expired session failed: {e}");
        }
        self.store.remove().await?;
        self.context.set(false);
        Ok(RemediationAction::ExpiredSessionLogout)
    }
}

impl Remediation for HttpRemediation {
    #[instrument(skip(self))]
    async fn remediate(&self) -> Result<RemediationReport, RemediationError> {
        let action = self.fix().await.map_err(RemediationError::from)?;
        info!(%action, "remediation applied");
        Ok(RemediationReport::succeeded(action))
    }
}
