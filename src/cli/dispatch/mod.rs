//! Maps validated CLI arguments to the watch action.

use crate::cli::actions::{watch::Args, Action};
use crate::cli::commands::{backend, watchdog};
use crate::watchdog::{PublicRoutes, WatchdogConfig};
use anyhow::{Context, Result};
use std::time::Duration;

/// Map validated CLI matches to a watch action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let backend_opts = backend::Options::parse(matches)?;
    let watchdog_opts = watchdog::Options::parse(matches)?;

    // The built-in public routes always stay public; configured ones are added.
    let mut public_routes = watchdog_opts
        .public_routes
        .iter()
        .fold(PublicRoutes::default(), |routes, route| routes.with_route(route));
    for pattern in &watchdog_opts.public_route_patterns {
        public_routes = public_routes
            .with_pattern(pattern)
            .with_context(|| format!("invalid --public-route-pattern: {pattern}"))?;
    }

    let periodic_interval = match watchdog_opts.check_interval_seconds {
        0 => None,
        seconds => Some(Duration::from_secs(seconds)),
    };

    let config = WatchdogConfig::new()
        .with_periodic_interval(periodic_interval)
        .with_debounce_window(Duration::from_secs(watchdog_opts.debounce_seconds))
        .with_login_route(watchdog_opts.login_route)
        .with_initial_path(watchdog_opts.initial_path)
        .with_redirect_actions(watchdog_opts.redirect_on)
        .with_public_routes(public_routes)
        .normalize();

    Ok(Action::Watch(Args {
        api_url: backend_opts.api_url,
        token_file: backend_opts.token_file,
        request_timeout: Duration::from_secs(backend_opts.request_timeout_seconds),
        remote_log: backend_opts.remote_log,
        status_port: watchdog_opts.status_port,
        config,
    }))
}
