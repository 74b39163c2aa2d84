//! Auth consistency watchdog.
//!
//! Two flag sources are injected read-only: the optimistic "store" flag and the
//! session-derived "context" flag. The [`Reconciler`] compares them on
//! navigation, on a periodic timer and on demand; [`spawn`] runs it as a task.

pub mod config;
pub mod debounce;
pub mod events;
pub mod flags;
pub mod navigation;
pub mod reconciler;
pub mod remediation;
pub mod routes;
pub mod runtime;

#[cfg(test)]
pub(crate) mod testing;

pub use self::config::WatchdogConfig;
pub use self::events::{EventLogger, FanoutLogger, LogEvent, Severity, TracingLogger};
pub use self::flags::{AuthFlagSource, SharedFlag};
pub use self::navigation::{ChannelNavigator, Navigator, Redirect, RedirectOptions, RedirectState};
pub use self::reconciler::{CycleOutcome, Reconciler, StatusHandle, Trigger, WatchdogStatus};
pub use self::remediation::{Remediation, RemediationAction, RemediationError, RemediationReport};
pub use self::routes::{PublicRoutes, RouteContext};
pub use self::runtime::{spawn, WatchdogCommander, WatchdogHandle, WatchdogStopped};
