//! Navigation collaborator used to send the user to the login route.

use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RedirectState {
    /// Location to return to after re-authentication.
    pub from: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RedirectOptions {
    pub replace: bool,
    pub state: RedirectState,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub path: String,
    pub options: RedirectOptions,
}

pub trait Navigator: Send + Sync {
    fn redirect(&self, path: &str, options: RedirectOptions);
}

/// Forwards redirects to the host over an unbounded channel.
#[derive(Clone, Debug)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<Redirect>,
}

impl ChannelNavigator {
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Redirect>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Navigator for ChannelNavigator {
    fn redirect(&self, path: &str, options: RedirectOptions) {
        let redirect = Redirect {
            path: path.to_string(),
            options,
        };
        if self.tx.send(redirect).is_err() {
            debug!(path, "redirect receiver dropped");
        }
    }
}

/// Deliver a redirect, swallowing any panic raised by the navigator.
pub(crate) fn dispatch(navigator: &dyn Navigator, path: &str, options: RedirectOptions) {
    if catch_unwind(AssertUnwindSafe(|| navigator.redirect(path, options))).is_err() {
        warn!(path, "navigator panicked; redirect dropped");
    }
}
