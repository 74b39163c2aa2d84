//! Fake session API shared by the integration tests.
#![allow(dead_code)]

use anyhow::Result;
use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, PoisonError,
    },
};
use tokio::net::TcpListener;
use ulid::Ulid;

/// In-memory session backend keyed by bearer token.
#[derive(Clone, Default)]
pub struct FakeBackend {
    sessions: Arc<Mutex<HashMap<String, &'static str>>>,
    logouts: Arc<AtomicUsize>,
    logs: Arc<Mutex<Vec<Value>>>,
}

impl FakeBackend {
    pub fn with_session(self, token: &str, state: &'static str) -> Self {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.to_string(), state);
        self
    }

    pub fn logouts(&self) -> usize {
        self.logouts.load(Ordering::SeqCst)
    }

    pub fn logs(&self) -> Vec<Value> {
        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(ToString::to_string)
}

async fn session(State(backend): State<FakeBackend>, headers: HeaderMap) -> Response {
    let state = bearer(&headers).and_then(|token| {
        backend
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&token)
            .copied()
    });

    match state {
        Some("broken") => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "session store unavailable"})),
        )
            .into_response(),
        Some(state) => Json(json!({ "state": state })).into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn logout(State(backend): State<FakeBackend>) -> StatusCode {
    backend.logouts.fetch_add(1, Ordering::SeqCst);
    StatusCode::NO_CONTENT
}

async fn logs(State(backend): State<FakeBackend>, Json(body): Json<Value>) -> StatusCode {
    backend
        .logs
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(body);
    StatusCode::ACCEPTED
}

/// Serve `backend` on an ephemeral port and return its API base URL.
pub async fn serve(backend: FakeBackend) -> Result<String> {
    let router = Router::new()
        .route("/v1/auth/session", get(session))
        .route("/v1/auth/logout", post(logout))
        .route("/v1/logs", post(logs))
        .with_state(backend);

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Ok(format!("http://{addr}/v1"))
}

pub fn temp_token_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("authwatch-it-{}", Ulid::new()))
        .join("token")
}
