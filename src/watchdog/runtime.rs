//! Watchdog task: owns the reconciler and multiplexes its triggers.
//!
//! The periodic timer and the command channel live inside the spawned task.
//! [`WatchdogHandle::stop`] ends the loop and waits for it; dropping the handle
//! aborts the task, so neither outlives the host that started them.

use crate::watchdog::{
    reconciler::{Reconciler, StatusHandle, WatchdogStatus},
    remediation::Remediation,
    routes::RouteContext,
};
use thiserror::Error;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::{interval_at, Instant, Interval, MissedTickBehavior},
};
use tracing::{debug, info, warn};

#[derive(Debug)]
enum Command {
    Navigate(String),
    CheckNow,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("watchdog is not running")]
pub struct WatchdogStopped;

/// Cloneable sender for navigation and manual triggers.
#[derive(Clone, Debug)]
pub struct WatchdogCommander {
    tx: mpsc::UnboundedSender<Command>,
}

impl WatchdogCommander {
    /// Notify the watchdog that the current route changed.
    ///
    /// # Errors
    /// Returns [`WatchdogStopped`] if the watchdog task has ended.
    pub fn navigate(&self, path: impl Into<String>) -> Result<(), WatchdogStopped> {
        self.tx
            .send(Command::Navigate(path.into()))
            .map_err(|_| WatchdogStopped)
    }

    /// Run a reconciliation now, bypassing the debounce window.
    ///
    /// # Errors
    /// Returns [`WatchdogStopped`] if the watchdog task has ended.
    pub fn check_now(&self) -> Result<(), WatchdogStopped> {
        self.tx.send(Command::CheckNow).map_err(|_| WatchdogStopped)
    }
}

pub struct WatchdogHandle {
    commander: WatchdogCommander,
    status: StatusHandle,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl WatchdogHandle {
    #[must_use]
    pub fn commander(&self) -> WatchdogCommander {
        self.commander.clone()
    }

    /// # Errors
    /// Returns [`WatchdogStopped`] if the watchdog task has ended.
    pub fn navigate(&self, path: impl Into<String>) -> Result<(), WatchdogStopped> {
        self.commander.navigate(path)
    }

    /// # Errors
    /// Returns [`WatchdogStopped`] if the watchdog task has ended.
    pub fn check_now(&self) -> Result<(), WatchdogStopped> {
        self.commander.check_now()
    }

    #[must_use]
    pub fn status(&self) -> WatchdogStatus {
        self.status.snapshot()
    }

    #[must_use]
    pub fn status_handle(&self) -> StatusHandle {
        self.status.clone()
    }

    /// Stop the watchdog and wait for the in-flight cycle, if any, to finish.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("watchdog task ended abnormally: {e}");
            }
        }
    }
}

impl Drop for WatchdogHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Start the watchdog on the current tokio runtime.
pub fn spawn<R>(reconciler: Reconciler<R>) -> WatchdogHandle
where
    R: Remediation + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let status = reconciler.status();

    let task = tokio::spawn(run(reconciler, rx, shutdown_rx));

    WatchdogHandle {
        commander: WatchdogCommander { tx },
        status,
        shutdown: Some(shutdown_tx),
        task: Some(task),
    }
}

async fn run<R: Remediation>(
    mut reconciler: Reconciler<R>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut route = RouteContext::new(reconciler.config().initial_path());

    let mut ticker = reconciler.config().periodic_interval().map(|period| {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    });

    info!(
        periodic = ?reconciler.config().periodic_interval(),
        debounce = ?reconciler.config().debounce_window(),
        "auth watchdog started"
    );

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => break,

            command = commands.recv() => match command {
                Some(Command::Navigate(path)) => {
                    route = route.navigate(path);
                    let outcome = reconciler.on_navigation(&route).await;
                    debug!(?outcome, "navigation cycle");
                }
                Some(Command::CheckNow) => {
                    let outcome = reconciler.on_manual(&route).await;
                    debug!(?outcome, "manual cycle");
                }
                None => break,
            },

            () = next_tick(&mut ticker) => {
                let outcome = reconciler.on_tick(&route).await;
                debug!(?outcome, "periodic cycle");
            }
        }
    }

    info!("auth watchdog stopped");
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watchdog::{
        config::WatchdogConfig,
        flags::SharedFlag,
        reconciler::{CycleOutcome, Trigger},
        remediation::{RemediationAction, RemediationReport},
        testing::{FakeRemediation, RecordingLogger, RecordingNavigator},
    };
    use std::{sync::Arc, time::Duration};
    use tokio::time::sleep;

    fn start(
        store: &SharedFlag,
        context: &SharedFlag,
        remediation: &FakeRemediation,
        navigator: &Arc<RecordingNavigator>,
        config: WatchdogConfig,
    ) -> WatchdogHandle {
        spawn(Reconciler::new(
            Arc::new(store.clone()),
            Arc::new(context.clone()),
            remediation.clone(),
            Arc::new(RecordingLogger::default()),
            navigator.clone(),
            config,
        ))
    }

    fn token_removed() -> FakeRemediation {
        FakeRemediation::returning(RemediationReport::succeeded(RemediationAction::TokenRemoved))
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_trigger_fires_on_interval() {
        let store = SharedFlag::new(true);
        let context = SharedFlag::new(false);
        let remediation = token_removed();
        let navigator = Arc::new(RecordingNavigator::default());
        let handle = start(
            &store,
            &context,
            &remediation,
            &navigator,
            WatchdogConfig::new().with_initial_path("/dashboard"),
        );

        sleep(Duration::from_secs(119)).await;
        assert_eq!(remediation.calls(), 0);

        sleep(Duration::from_secs(2)).await;
        assert_eq!(remediation.calls(), 1);
        let status = handle.status();
        assert_eq!(status.last_trigger, Some(Trigger::Periodic));
        assert_eq!(navigator.redirects().len(), 1);

        sleep(Duration::from_secs(120)).await;
        assert_eq!(remediation.calls(), 2);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_periodic_trigger_never_fires() {
        let store = SharedFlag::new(true);
        let context = SharedFlag::new(false);
        let remediation = token_removed();
        let navigator = Arc::new(RecordingNavigator::default());
        let handle = start(
            &store,
            &context,
            &remediation,
            &navigator,
            WatchdogConfig::new().with_periodic_interval(None),
        );

        sleep(Duration::from_secs(3600)).await;
        assert_eq!(remediation.calls(), 0);
        assert_eq!(handle.status().cycles, 0);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn navigation_commands_are_debounced_per_path() {
        let store = SharedFlag::new(true);
        let context = SharedFlag::new(false);
        let remediation = token_removed();
        let navigator = Arc::new(RecordingNavigator::default());
        let handle = start(
            &store,
            &context,
            &remediation,
            &navigator,
            WatchdogConfig::new(),
        );

        handle.navigate("/dashboard").ok();
        sleep(Duration::from_secs(3)).await;
        handle.navigate("/dashboard").ok();
        sleep(Duration::from_millis(10)).await;

        assert_eq!(remediation.calls(), 1);
        let status = handle.status();
        assert_eq!(status.debounced, 1);
        assert_eq!(status.last_path.as_deref(), Some("/dashboard"));

        let redirects = navigator.redirects();
        assert_eq!(redirects.len(), 1);
        assert_eq!(redirects[0].options.state.from, "/dashboard");

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn manual_check_bypasses_debounce() {
        let store = SharedFlag::new(false);
        let context = SharedFlag::new(true);
        let remediation =
            FakeRemediation::returning(RemediationReport::succeeded(RemediationAction::NoneNeeded));
        let navigator = Arc::new(RecordingNavigator::default());
        let handle = start(
            &store,
            &context,
            &remediation,
            &navigator,
            WatchdogConfig::new(),
        );

        handle.navigate("/plans").ok();
        handle.check_now().ok();
        sleep(Duration::from_millis(10)).await;

        assert_eq!(remediation.calls(), 2);
        let status = handle.status();
        assert_eq!(status.last_trigger, Some(Trigger::Manual));
        assert!(matches!(
            status.last_outcome,
            Some(CycleOutcome::Remediated { redirected: false, .. })
        ));
        assert!(navigator.redirects().is_empty());

        handle.stop().await;
    }

    #[tokio::test]
    async fn stop_releases_the_task() {
        let store = SharedFlag::new(true);
        let context = SharedFlag::new(true);
        let remediation = token_removed();
        let navigator = Arc::new(RecordingNavigator::default());
        let handle = start(
            &store,
            &context,
            &remediation,
            &navigator,
            WatchdogConfig::new(),
        );
        let commander = handle.commander();

        handle.stop().await;

        assert_eq!(commander.navigate("/dashboard"), Err(WatchdogStopped));
        assert_eq!(commander.check_now(), Err(WatchdogStopped));
    }

    #[tokio::test]
    async fn dropping_the_handle_aborts_the_task() {
        let store = SharedFlag::new(true);
        let context = SharedFlag::new(true);
        let remediation = token_removed();
        let navigator = Arc::new(RecordingNavigator::default());
        let handle = start(
            &store,
            &context,
            &remediation,
            &navigator,
            WatchdogConfig::new(),
        );
        let commander = handle.commander();

        drop(handle);
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }

        assert_eq!(commander.navigate("/dashboard"), Err(WatchdogStopped));
    }
}
