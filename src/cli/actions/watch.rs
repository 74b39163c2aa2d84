//! `authwatch` host loop.
//!
//! Wires the file-backed token store, the session probe and the HTTP
//! remediation into a watchdog, then drives it from stdin. Every line is one
//! event from the host application:
//!
//! ```text
//! /dashboard          navigate (refreshes the session probe first)
//! login <token>       optimistic login, the token is written to disk
//! logout              optimistic logout, the token file is removed
//! check               reconcile now, ignoring the debounce window
//! ```
//!
//! Redirects requested by the watchdog are printed on stdout as
//! `redirect <path> from=<location>` and become the current route.

use crate::{
    api::{self, ApiState},
    backend::{HttpEventLogger, HttpRemediation, SessionApi, SessionProbe, TokenStore},
    cli::telemetry,
    watchdog::{
        self, ChannelNavigator, FanoutLogger, Reconciler, Redirect, TracingLogger, WatchdogConfig,
        WatchdogHandle, WatchdogStatus,
    },
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{future::Future, path::PathBuf, sync::Arc, time::Duration};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader},
    signal,
    sync::{mpsc, watch as shutdown},
};
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct Args {
    pub api_url: String,
    pub token_file: PathBuf,
    pub request_timeout: Duration,
    pub remote_log: bool,
    pub status_port: Option<u16>,
    pub config: WatchdogConfig,
}

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Navigate(String),
    Login(String),
    Logout,
    Check,
    Blank,
    Unknown(String),
}

fn parse_line(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Blank;
    }
    if line.starts_with('/') {
        return Input::Navigate(line.to_string());
    }

    let (command, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(command, rest)| (command, rest.trim()));

    match (command, rest) {
        ("login", token) if !token.is_empty() => Input::Login(token.to_string()),
        ("logout", "") => Input::Logout,
        ("check", "") => Input::Check,
        _ => Input::Unknown(line.to_string()),
    }
}

fn format_redirect(redirect: &Redirect) -> String {
    format!(
        "redirect {} from={}",
        redirect.path, redirect.options.state.from
    )
}

struct Session {
    store: Arc<TokenStore>,
    probe: SessionProbe,
    watchdog: WatchdogHandle,
}

impl Session {
    async fn navigate(&self, path: String) -> Result<()> {
        if let Err(e) = self.probe.refresh().await {
            warn!("session refresh failed, keeping previous context: {e}");
        }
        self.watchdog.navigate(path)?;
        Ok(())
    }

    async fn handle(&self, input: Input) -> Result<()> {
        match input {
            Input::Navigate(path) => self.navigate(path).await?,
            Input::Login(token) => {
                self.store
                    .login(SecretString::from(token))
                    .await
                    .context("failed to store token")?;
            }
            Input::Logout => {
                self.store
                    .remove()
                    .await
                    .context("failed to remove token")?;
            }
            Input::Check => self.watchdog.check_now()?,
            Input::Blank => {}
            Input::Unknown(line) => warn!("ignoring unrecognized input: {line}"),
        }
        Ok(())
    }
}

/// A running watchdog wired to the session backend, driven by line input.
pub struct Host {
    session: Session,
    redirects: mpsc::UnboundedReceiver<Redirect>,
}

impl Host {
    /// Load the token, probe the session and spawn the watchdog.
    ///
    /// # Errors
    /// Returns an error if the backend URL is invalid or the token file cannot
    /// be read.
    pub async fn start(args: Args) -> Result<Self> {
        let api = SessionApi::new(&args.api_url, args.request_timeout)
            .with_context(|| format!("invalid --api-url: {}", args.api_url))?;

        let store = Arc::new(
            TokenStore::load(&args.token_file)
                .await
                .with_context(|| format!("could not read {}", args.token_file.display()))?,
        );

        let probe = SessionProbe::new(api.clone(), store.clone());
        if let Err(e) = probe.refresh().await {
            warn!("initial session check failed: {e}");
        }

        let mut logger = FanoutLogger::new().with(Arc::new(TracingLogger));
        if args.remote_log {
            logger = logger.with(Arc::new(HttpEventLogger::new(&api)?));
        }

        let (navigator, redirects) = ChannelNavigator::new();
        let remediation = HttpRemediation::new(api, store.clone(), probe.flag());

        let reconciler = Reconciler::new(
            store.clone(),
            Arc::new(probe.clone()),
            remediation,
            Arc::new(logger),
            Arc::new(navigator),
            args.config,
        );

        Ok(Self {
            session: Session {
                store,
                probe,
                watchdog: watchdog::spawn(reconciler),
            },
            redirects,
        })
    }

    /// State for the status server.
    #[must_use]
    pub fn api_state(&self) -> ApiState {
        ApiState {
            store: self.session.store.clone(),
            context: Arc::new(self.session.probe.clone()),
            status: self.session.watchdog.status_handle(),
            commander: self.session.watchdog.commander(),
        }
    }

    #[must_use]
    pub fn status(&self) -> WatchdogStatus {
        self.session.watchdog.status()
    }

    /// Feed `input` lines to the watchdog and write redirects to `output`
    /// until `input` ends or `interrupt` resolves.
    ///
    /// # Errors
    /// Returns an error if reading or writing fails, the token file cannot be
    /// updated, or the watchdog stopped.
    pub async fn run<I, W, S>(&mut self, input: I, output: &mut W, interrupt: S) -> Result<()>
    where
        I: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        S: Future,
    {
        let Self { session, redirects } = self;
        let mut lines = input.lines();

        tokio::pin!(interrupt);

        loop {
            tokio::select! {
                _ = &mut interrupt => {
                    debug!("interrupted");
                    return Ok(());
                }

                Some(redirect) = redirects.recv() => {
                    let line = format!("{}\n", format_redirect(&redirect));
                    output.write_all(line.as_bytes()).await?;
                    output.flush().await?;
                    session.navigate(redirect.path).await?;
                }

                line = lines.next_line() => match line.context("failed to read input")? {
                    Some(line) => session.handle(parse_line(&line)).await?,
                    None => {
                        debug!("input closed");
                        return Ok(());
                    }
                },
            }
        }
    }

    /// Stop the watchdog and wait for it.
    pub async fn stop(self) {
        self.session.watchdog.stop().await;
    }
}

/// Execute the watch action.
/// # Errors
/// Returns an error if the backend URL is invalid, the token file cannot be
/// read, or the status server cannot start.
pub async fn execute(args: Args) -> Result<()> {
    info!(
        api_url = %args.api_url,
        token_file = %args.token_file.display(),
        periodic = ?args.config.periodic_interval(),
        debounce = ?args.config.debounce_window(),
        login_route = args.config.login_route(),
        redirect_on = ?args.config.redirect_actions(),
        status_port = ?args.status_port,
        "starting authwatch {} - {}",
        env!("CARGO_PKG_VERSION"),
        crate::GIT_COMMIT_HASH
    );

    let status_port = args.status_port;
    let mut host = Host::start(args).await?;

    let (shutdown_tx, shutdown_rx) = shutdown::channel(false);
    let server = status_port
        .map(|port| tokio::spawn(api::serve(port, host.api_state(), shutdown_rx)));

    let result = host
        .run(
            BufReader::new(tokio::io::stdin()),
            &mut tokio::io::stdout(),
            signal::ctrl_c(),
        )
        .await;

    host.stop().await;

    let _ = shutdown_tx.send(true);
    if let Some(server) = server {
        match server.await {
            Ok(Err(e)) => warn!("status server failed: {e:#}"),
            Err(e) => warn!("status server task failed: {e}"),
            Ok(Ok(())) => {}
        }
    }

    info!("authwatch stopped");
    telemetry::shutdown_tracer();

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watchdog::{RedirectOptions, RedirectState};

    #[test]
    fn parses_navigation() {
        assert_eq!(
            parse_line("  /dashboard?tab=1 \n"),
            Input::Navigate("/dashboard?tab=1".to_string())
        );
        assert_eq!(parse_line("/"), Input::Navigate("/".to_string()));
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse_line("login abc.def"), Input::Login("abc.def".to_string()));
        assert_eq!(parse_line("login   spaced  "), Input::Login("spaced".to_string()));
        assert_eq!(parse_line("logout"), Input::Logout);
        assert_eq!(parse_line("check"), Input::Check);
        assert_eq!(parse_line("   "), Input::Blank);
    }

    #[test]
    fn rejects_malformed_commands() {
        assert_eq!(parse_line("login"), Input::Unknown("login".to_string()));
        assert_eq!(
            parse_line("logout now"),
            Input::Unknown("logout now".to_string())
        );
        assert_eq!(parse_line("dashboard"), Input::Unknown("dashboard".to_string()));
    }

    #[test]
    fn redirect_line_carries_origin() {
        let redirect = Redirect {
            path: "/login".to_string(),
            options: RedirectOptions {
                replace: true,
                state: RedirectState {
                    from: "/dashboard".to_string(),
                },
            },
        };
        assert_eq!(format_redirect(&redirect), "redirect /login from=/dashboard");
    }
}
