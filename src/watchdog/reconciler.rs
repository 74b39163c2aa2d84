//! Compares the store and context flags and drives remediation and redirects.
//!
//! A cycle reads both flags once. Equal flags end the cycle silently. A
//! mismatch emits one `WARNING` event, awaits the remediation routine and may
//! redirect to the login route when the session was invalidated and the user is
//! on a protected path. Remediation errors end the cycle with one `ERROR` event.

use crate::watchdog::{
    config::WatchdogConfig,
    debounce::CheckState,
    events::{
        emit, EventLogger, LogEvent, Severity, EVENT_MISMATCH, EVENT_REMEDIATION_FAILED,
        EVENT_REMEDIATION_RESULT,
    },
    flags::AuthFlagSource,
    navigation::{dispatch, Navigator, RedirectOptions, RedirectState},
    remediation::{Remediation, RemediationAction},
    routes::{normalize_path, RouteContext},
};
use serde::Serialize;
use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
};
use tokio::time::Instant;
use tracing::{debug, instrument};
use ulid::Ulid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Navigation,
    Periodic,
    Manual,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Navigation => "navigation",
            Self::Periodic => "periodic",
            Self::Manual => "manual",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CycleOutcome {
    /// Navigation check suppressed by the debounce window.
    Debounced,
    Consistent,
    Remediated {
        action: RemediationAction,
        success: bool,
        redirected: bool,
    },
    RemediationFailed {
        error: String,
    },
}

/// Debug snapshot of the watchdog's activity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WatchdogStatus {
    pub cycles: u64,
    pub debounced: u64,
    pub mismatches: u64,
    pub redirects: u64,
    pub failures: u64,
    pub last_trigger: Option<Trigger>,
    pub last_path: Option<String>,
    pub last_outcome: Option<CycleOutcome>,
    pub last_store_authenticated: Option<bool>,
    pub last_context_authenticated: Option<bool>,
}

/// Shared, read-mostly view of [`WatchdogStatus`].
#[derive(Clone, Debug, Default)]
pub struct StatusHandle(Arc<Mutex<WatchdogStatus>>);

impl StatusHandle {
    #[must_use]
    pub fn snapshot(&self) -> WatchdogStatus {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn update(&self, f: impl FnOnce(&mut WatchdogStatus)) {
        f(&mut self.0.lock().unwrap_or_else(PoisonError::into_inner));
    }
}

pub struct Reconciler<R> {
    store: Arc<dyn AuthFlagSource>,
    context: Arc<dyn AuthFlagSource>,
    remediation: R,
    logger: Arc<dyn EventLogger>,
    navigator: Arc<dyn Navigator>,
    config: WatchdogConfig,
    check_state: CheckState,
    status: StatusHandle,
}

impl<R: Remediation> Reconciler<R> {
    #[must_use]
    pub fn new(
        store: Arc<dyn AuthFlagSource>,
        context: Arc<dyn AuthFlagSource>,
        remediation: R,
        logger: Arc<dyn EventLogger>,
        navigator: Arc<dyn Navigator>,
        config: WatchdogConfig,
    ) -> Self {
        Self {
            store,
            context,
            remediation,
            logger,
            navigator,
            config: config.normalize(),
            check_state: CheckState::default(),
            status: StatusHandle::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &WatchdogConfig {
        &self.config
    }

    #[must_use]
    pub fn status(&self) -> StatusHandle {
        self.status.clone()
    }

    /// Navigation trigger, subject to the per-path debounce window.
    pub async fn on_navigation(&mut self, route: &RouteContext) -> CycleOutcome {
        let now = Instant::now();
        if self
            .check_state
            .is_debounced(&route.path, now, self.config.debounce_window())
        {
            debug!(path = %route.path, "navigation check debounced");
            self.status.update(|status| status.debounced += 1);
            return CycleOutcome::Debounced;
        }
        self.check_state.record(&route.path, now);
        self.reconcile(Trigger::Navigation, route).await
    }

    /// Periodic trigger; never debounced.
    pub async fn on_tick(&self, route: &RouteContext) -> CycleOutcome {
        self.reconcile(Trigger::Periodic, route).await
    }

    /// Manual trigger from the debug surface; never debounced.
    pub async fn on_manual(&self, route: &RouteContext) -> CycleOutcome {
        self.reconcile(Trigger::Manual, route).await
    }

    #[instrument(skip_all, fields(trigger = %trigger, path = %route.path))]
    pub async fn reconcile(&self, trigger: Trigger, route: &RouteContext) -> CycleOutcome {
        let store = self.store.is_authenticated();
        let context = self.context.is_authenticated();

        if store == context {
            debug!(authenticated = store, "auth state consistent");
            let outcome = CycleOutcome::Consistent;
            self.record(trigger, route, store, context, &outcome);
            return outcome;
        }

        let cycle_id = Ulid::new().to_string();
        self.log(
            LogEvent::new(
                EVENT_MISMATCH,
                "store and context disagree on authentication state",
                Severity::Warning,
            )
            .with("store_authenticated", store)
            .with("context_authenticated", context)
            .with("path", route.path.as_str())
            .with("trigger", trigger.to_string())
            .with("cycle_id", cycle_id.as_str()),
        );

        let outcome = match self.remediation.remediate().await {
            Ok(report) => {
                let redirected = report.success
                    && self.config.redirects_on(&report.action)
                    && self.should_leave(&route.path);

                if redirected {
                    dispatch(
                        self.navigator.as_ref(),
                        self.config.login_route(),
                        RedirectOptions {
                            replace: true,
                            state: RedirectState {
                                from: route.path.clone(),
                            },
                        },
                    );
                }

                self.log(
                    LogEvent::new(
                        EVENT_REMEDIATION_RESULT,
                        format!("remediation finished with {}", report.action),
                        Severity::Info,
                    )
                    .with("action", report.action.as_str())
                    .with("success", report.success)
                    .with("redirected", redirected)
                    .with("path", route.path.as_str())
                    .with("cycle_id", cycle_id.as_str()),
                );

                CycleOutcome::Remediated {
                    action: report.action,
                    success: report.success,
                    redirected,
                }
            }
            Err(err) => {
                self.log(
                    LogEvent::new(
                        EVENT_REMEDIATION_FAILED,
                        format!("remediation failed: {err}"),
                        Severity::Error,
                    )
                    .with("error", err.to_string())
                    .with("path", route.path.as_str())
                    .with("cycle_id", cycle_id.as_str()),
                );
                CycleOutcome::RemediationFailed {
                    error: err.to_string(),
                }
            }
        };

        self.record(trigger, route, store, context, &outcome);
        outcome
    }

    /// Whether a redirect away from `path` is allowed.
    fn should_leave(&self, path: &str) -> bool {
        !self.config.public_routes().is_public(path)
            && normalize_path(path) != normalize_path(self.config.login_route())
    }

    fn log(&self, event: LogEvent) {
        emit(self.logger.as_ref(), &event);
    }

    fn record(
        &self,
        trigger: Trigger,
        route: &RouteContext,
        store: bool,
        context: bool,
        outcome: &CycleOutcome,
    ) {
        self.status.update(|status| {
            status.cycles += 1;
            match outcome {
                CycleOutcome::Remediated { redirected, .. } => {
                    status.mismatches += 1;
                    if *redirected {
                        status.redirects += 1;
                    }
                }
                CycleOutcome::RemediationFailed { .. } => {
                    status.mismatches += 1;
                    status.failures += 1;
                }
                CycleOutcome::Consistent | CycleOutcome::Debounced => {}
            }
            status.last_trigger = Some(trigger);
            status.last_path = Some(route.path.clone());
            status.last_outcome = Some(outcome.clone());
            status.last_store_authenticated = Some(store);
            status.last_context_authenticated = Some(context);
        });
    }
}
