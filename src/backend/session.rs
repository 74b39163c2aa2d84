//! Session probe: the "context" flag, derived from a live session check.

use crate::{
    backend::{
        client::{SessionApi, SessionState},
        token::TokenStore,
        BackendError,
    },
    watchdog::{AuthFlagSource, SharedFlag},
};
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Clone, Debug)]
pub struct SessionProbe {
    api: SessionApi,
    store: Arc<TokenStore>,
    flag: SharedFlag,
}

impl SessionProbe {
    #[must_use]
    pub fn new(api: SessionApi, store: Arc<TokenStore>) -> Self {
        Self {
            api,
            store,
            flag: SharedFlag::default(),
        }
    }

    #[must_use]
    pub fn flag(&self) -> SharedFlag {
        self.flag.clone()
    }

    /// Recompute the context flag from the backend.
    ///
    /// Without a token there is nothing to ask and the flag is cleared. On
    /// error the flag keeps its previous value.
    ///
    /// # Errors
    /// Returns an error if the session endpoint cannot be reached or answers
    /// unexpectedly.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<bool, BackendError> {
        let authenticated = match self.store.token() {
            Some(token) => self.api.session_state(&token).await? == SessionState::Active,
            None => false,
        };
        debug!(authenticated, "context refreshed");
        self.flag.set(authenticated);
        Ok(authenticated)
    }
}

impl AuthFlagSource for SessionProbe {
    fn is_authenticated(&self) -> bool {
        self.flag.get()
    }
}
