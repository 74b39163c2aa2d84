use crate::watchdog::{remediation::RemediationAction, routes::PublicRoutes};
use std::{collections::BTreeSet, time::Duration};

pub const DEFAULT_PERIODIC_INTERVAL: Duration = Duration::from_secs(120);
pub const MIN_PERIODIC_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_secs(5);
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";

#[derive(Clone, Debug)]
pub struct WatchdogConfig {
    periodic_interval: Option<Duration>,
    debounce_window: Duration,
    login_route: String,
    initial_path: String,
    redirect_actions: BTreeSet<RemediationAction>,
    public_routes: PublicRoutes,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchdogConfig {
    /// Default config: 2 minute periodic check, 5s navigation debounce,
    /// redirect to `/login` after `token_removed` or `expired_session_logout`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            periodic_interval: Some(DEFAULT_PERIODIC_INTERVAL),
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            initial_path: "/".to_string(),
            redirect_actions: BTreeSet::from([
                RemediationAction::TokenRemoved,
                RemediationAction::ExpiredSessionLogout,
            ]),
            public_routes: PublicRoutes::default(),
        }
    }

    /// `None` disables the periodic trigger.
    #[must_use]
    pub fn with_periodic_interval(mut self, interval: Option<Duration>) -> Self {
        self.periodic_interval = interval;
        self
    }

    #[must_use]
    pub fn with_debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window = window;
        self
    }

    #[must_use]
    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    #[must_use]
    pub fn with_initial_path(mut self, path: impl Into<String>) -> Self {
        self.initial_path = path.into();
        self
    }

    #[must_use]
    pub fn with_redirect_actions<I>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = RemediationAction>,
    {
        self.redirect_actions = actions.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_public_routes(mut self, routes: PublicRoutes) -> Self {
        self.public_routes = routes;
        self
    }

    #[must_use]
    pub fn normalize(self) -> Self {
        let periodic_interval = match self.periodic_interval {
            Some(interval) if interval.is_zero() => None,
            Some(interval) => Some(interval.max(MIN_PERIODIC_INTERVAL)),
            None => None,
        };
        let login_route = normalize_route(&self.login_route, DEFAULT_LOGIN_ROUTE);
        let initial_path = normalize_route(&self.initial_path, "/");
        Self {
            periodic_interval,
            login_route,
            initial_path,
            ..self
        }
    }

    #[must_use]
    pub fn periodic_interval(&self) -> Option<Duration> {
        self.periodic_interval
    }

    #[must_use]
    pub fn debounce_window(&self) -> Duration {
        self.debounce_window
    }

    #[must_use]
    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    #[must_use]
    pub fn initial_path(&self) -> &str {
        &self.initial_path
    }

    #[must_use]
    pub fn redirect_actions(&self) -> &BTreeSet<RemediationAction> {
        &self.redirect_actions
    }

    #[must_use]
    pub fn public_routes(&self) -> &PublicRoutes {
        &self.public_routes
    }

    #[must_use]
    pub fn redirects_on(&self, action: &RemediationAction) -> bool {
        self.redirect_actions.contains(action)
    }
}

fn normalize_route(route: &str, fallback: &str) -> String {
    let route = route.trim();
    if route.is_empty() {
        fallback.to_string()
    } else if route.starts_with('/') {
        route.to_string()
    } else {
        format!("/{route}")
    }
}
