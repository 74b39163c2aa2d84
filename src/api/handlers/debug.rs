//! Auth debugging endpoints: inspect both flags and trigger a fix by hand.

use crate::{api::ApiState, watchdog::WatchdogStatus};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Serialize, Debug)]
pub struct AuthDebug {
    store_authenticated: bool,
    context_authenticated: bool,
    consistent: bool,
    status: WatchdogStatus,
}

pub async fn auth_state(state: Extension<ApiState>) -> impl IntoResponse {
    let store = state.store.is_authenticated();
    let context = state.context.is_authenticated();

    Json(AuthDebug {
        store_authenticated: store,
        context_authenticated: context,
        consistent: store == context,
        status: state.status.snapshot(),
    })
}

pub async fn fix(state: Extension<ApiState>) -> impl IntoResponse {
    match state.commander.check_now() {
        Ok(()) => {
            info!("manual reconciliation requested");
            StatusCode::ACCEPTED
        }
        Err(e) => {
            warn!("manual reconciliation rejected: {e}");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
