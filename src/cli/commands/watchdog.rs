use crate::watchdog::RemediationAction;
use clap::{Arg, ArgAction, ArgMatches, Command};

pub const ARG_CHECK_INTERVAL: &str = "check-interval";
pub const ARG_DEBOUNCE: &str = "debounce";
pub const ARG_LOGIN_ROUTE: &str = "login-route";
pub const ARG_INITIAL_PATH: &str = "initial-path";
pub const ARG_PUBLIC_ROUTE: &str = "public-route";
pub const ARG_PUBLIC_ROUTE_PATTERN: &str = "public-route-pattern";
pub const ARG_REDIRECT_ON: &str = "redirect-on";
pub const ARG_STATUS_PORT: &str = "status-port";

/// Remediation actions `--redirect-on` accepts.
const REDIRECT_ACTIONS: [&str; 4] = [
    "none_needed",
    "token_removed",
    "expired_session_logout",
    "store_resynced",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Zero disables the periodic check.
    pub check_interval_seconds: u64,
    pub debounce_seconds: u64,
    pub login_route: String,
    pub initial_path: String,
    /// Extra public routes, on top of the built-in ones.
    pub public_routes: Vec<String>,
    pub public_route_patterns: Vec<String>,
    pub redirect_on: Vec<RemediationAction>,
    pub status_port: Option<u16>,
}

impl Options {
    /// Parse watchdog arguments from matches.
    ///
    /// # Errors
    /// Returns an error if a value is empty or malformed.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let read_required = |id: &str| -> anyhow::Result<String> {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("missing required argument: --{id}"))
        };

        let read_many = |id: &str| -> Vec<String> {
            matches
                .get_many::<String>(id)
                .map(|values| {
                    values
                        .filter(|v| !v.trim().is_empty())
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        };

        let redirect_on: Vec<RemediationAction> = read_many(ARG_REDIRECT_ON)
            .iter()
            .map(|v| v.parse::<RemediationAction>())
            .collect::<Result<_, _>>()?;

        if redirect_on.is_empty() {
            anyhow::bail!("--{ARG_REDIRECT_ON} needs at least one remediation action");
        }

        Ok(Self {
            check_interval_seconds: matches
                .get_one::<u64>(ARG_CHECK_INTERVAL)
                .copied()
                .unwrap_or(120),
            debounce_seconds: matches.get_one::<u64>(ARG_DEBOUNCE).copied().unwrap_or(5),
            login_route: read_required(ARG_LOGIN_ROUTE)?,
            initial_path: read_required(ARG_INITIAL_PATH)?,
            public_routes: read_many(ARG_PUBLIC_ROUTE),
            public_route_patterns: read_many(ARG_PUBLIC_ROUTE_PATTERN),
            redirect_on,
            status_port: matches.get_one::<u16>(ARG_STATUS_PORT).copied(),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_CHECK_INTERVAL)
                .short('i')
                .long(ARG_CHECK_INTERVAL)
                .help("Seconds between periodic auth checks, 0 disables them")
                .env("AUTHWATCH_CHECK_INTERVAL")
                .default_value("120")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_DEBOUNCE)
                .long(ARG_DEBOUNCE)
                .help("Seconds during which repeated navigations to the same path are not re-checked")
                .env("AUTHWATCH_DEBOUNCE")
                .default_value("5")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_LOGIN_ROUTE)
                .long(ARG_LOGIN_ROUTE)
                .help("Route to redirect to when the session is gone")
                .env("AUTHWATCH_LOGIN_ROUTE")
                .default_value("/login"),
        )
        .arg(
            Arg::new(ARG_INITIAL_PATH)
                .long(ARG_INITIAL_PATH)
                .help("Route assumed before the first navigation")
                .env("AUTHWATCH_INITIAL_PATH")
                .default_value("/"),
        )
        .arg(
            Arg::new(ARG_PUBLIC_ROUTE)
                .long(ARG_PUBLIC_ROUTE)
                .help("Extra route reachable without authentication, repeat or comma separate")
                .long_help(
                    "Extra route reachable without authentication, repeat or comma separate.\n\
                     /, /login, /register, /reset-password and /create-password are always public.",
                )
                .env("AUTHWATCH_PUBLIC_ROUTES")
                .value_delimiter(',')
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new(ARG_PUBLIC_ROUTE_PATTERN)
                .long(ARG_PUBLIC_ROUTE_PATTERN)
                .help("Regular expression matching additional public routes")
                .env("AUTHWATCH_PUBLIC_ROUTE_PATTERNS")
                .value_delimiter(',')
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new(ARG_REDIRECT_ON)
                .long(ARG_REDIRECT_ON)
                .help("Remediation actions that send the user to the login route")
                .env("AUTHWATCH_REDIRECT_ON")
                .value_delimiter(',')
                .action(ArgAction::Append)
                .value_parser(REDIRECT_ACTIONS)
                .default_values(["token_removed", "expired_session_logout"]),
        )
        .arg(
            Arg::new(ARG_STATUS_PORT)
                .long(ARG_STATUS_PORT)
                .help("Serve /health and /debug/auth on this port")
                .env("AUTHWATCH_STATUS_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
}
