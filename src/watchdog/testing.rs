//! Deterministic collaborators for watchdog unit tests.

use crate::watchdog::{
    events::{EventLogger, LogEvent, Severity},
    navigation::{Navigator, Redirect, RedirectOptions},
    remediation::{Remediation, RemediationError, RemediationReport},
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex, PoisonError,
};

#[derive(Clone)]
pub(crate) struct FakeRemediation {
    response: Result<RemediationReport, String>,
    calls: Arc<AtomicUsize>,
}

impl FakeRemediation {
    pub(crate) fn returning(report: RemediationReport) -> Self {
        Self {
            response: Ok(report),
            calls: Arc::default(),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            calls: Arc::default(),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Remediation for FakeRemediation {
    async fn remediate(&self) -> Result<RemediationReport, RemediationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone().map_err(RemediationError::Transport)
    }
}

#[derive(Default)]
pub(crate) struct RecordingLogger(Mutex<Vec<LogEvent>>);

impl RecordingLogger {
    pub(crate) fn events(&self) -> Vec<LogEvent> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn with_severity(&self, severity: Severity) -> Vec<LogEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.severity == severity)
            .collect()
    }
}

impl EventLogger for RecordingLogger {
    fn log(&self, event: &LogEvent) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

#[derive(Default)]
pub(crate) struct RecordingNavigator(Mutex<Vec<Redirect>>);

impl RecordingNavigator {
    pub(crate) fn redirects(&self) -> Vec<Redirect> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, path: &str, options: RedirectOptions) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Redirect {
                path: path.to_string(),
                options,
            });
    }
}

pub(crate) struct PanickingLogger;

impl EventLogger for PanickingLogger {
    fn log(&self, _event: &LogEvent) {
        panic!("log sink unavailable");
    }
}

pub(crate) struct PanickingNavigator;

impl Navigator for PanickingNavigator {
    fn redirect(&self, _path: &str, _options: RedirectOptions) {
        panic!("router unavailable");
    }
}
