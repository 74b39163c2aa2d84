//! Structured event logging collaborator.
//!
//! Loggers are fire-and-forget. [`emit`] shields the caller from a logger that
//! panics, so a broken sink can never take a reconciliation cycle down.

use serde::Serialize;
use serde_json::Value;
use std::{
    collections::BTreeMap,
    fmt,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
};
use tracing::{error, info, warn};

pub const EVENT_MISMATCH: &str = "auth_state_mismatch";
pub const EVENT_REMEDIATION_RESULT: &str = "auth_remediation_result";
pub const EVENT_REMEDIATION_FAILED: &str = "auth_remediation_failed";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LogEvent {
    pub event_name: String,
    pub message: String,
    pub severity: Severity,
    pub context: BTreeMap<String, Value>,
}

impl LogEvent {
    #[must_use]
    pub fn new(event_name: &str, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            event_name: event_name.to_string(),
            message: message.into(),
            severity,
            context: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }
}

pub trait EventLogger: Send + Sync {
    fn log(&self, event: &LogEvent);
}

/// Writes events to `tracing` at the matching level.
#[derive(Clone, Debug, Default)]
pub struct TracingLogger;

impl EventLogger for TracingLogger {
    fn log(&self, event: &LogEvent) {
        let context = Value::Object(
            event
                .context
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );
        match event.severity {
            Severity::Info => info!(event = %event.event_name, %context, "{}", event.message),
            Severity::Warning => warn!(event = %event.event_name, %context, "{}", event.message),
            Severity::Error => error!(event = %event.event_name, %context, "{}", event.message),
        }
    }
}

/// Fans an event out to several loggers.
#[derive(Clone, Default)]
pub struct FanoutLogger {
    loggers: Vec<Arc<dyn EventLogger>>,
}

impl FanoutLogger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, logger: Arc<dyn EventLogger>) -> Self {
        self.loggers.push(logger);
        self
    }
}

impl EventLogger for FanoutLogger {
    fn log(&self, event: &LogEvent) {
        for logger in &self.loggers {
            emit(logger.as_ref(), event);
        }
    }
}

/// Deliver `event`, swallowing any panic raised by the logger.
pub fn emit(logger: &dyn EventLogger, event: &LogEvent) {
    if catch_unwind(AssertUnwindSafe(|| logger.log(event))).is_err() {
        tracing::debug!(event = %event.event_name, "event logger panicked; event dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<LogEvent>>);

    impl EventLogger for Recorder {
        fn log(&self, event: &LogEvent) {
            if let Ok(mut events) = self.0.lock() {
                events.push(event.clone());
            }
        }
    }

    struct Exploding;

    impl EventLogger for Exploding {
        fn log(&self, _event: &LogEvent) {
            panic!("sink unavailable");
        }
    }

    #[test]
    fn severity_serializes_uppercase() -> Result<(), serde_json::Error> {
        let event = LogEvent::new(EVENT_MISMATCH, "mismatch", Severity::Warning)
            .with("path", "/dashboard")
            .with("store_authenticated", true);
        let json = serde_json::to_value(&event)?;
        assert_eq!(json["severity"], "WARNING");
        assert_eq!(json["event_name"], EVENT_MISMATCH);
        assert_eq!(json["context"]["path"], "/dashboard");
        assert_eq!(json["context"]["store_authenticated"], true);
        Ok(())
    }

    #[test]
    fn emit_swallows_logger_panics() {
        let event = LogEvent::new("x", "y", Severity::Info);
        emit(&Exploding, &event);
    }

    #[test]
    fn fanout_continues_after_failing_logger() {
        let recorder = Arc::new(Recorder::default());
        let fanout = FanoutLogger::new()
            .with(Arc::new(Exploding))
            .with(recorder.clone());
        fanout.log(&LogEvent::new("x", "y", Severity::Error));
        assert_eq!(recorder.0.lock().map(|e| e.len()).unwrap_or(0), 1);
    }
}
