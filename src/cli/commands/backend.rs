use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

pub const ARG_API_URL: &str = "api-url";
pub const ARG_TOKEN_FILE: &str = "token-file";
pub const ARG_REQUEST_TIMEOUT: &str = "request-timeout";
pub const ARG_REMOTE_LOG: &str = "remote-log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub api_url: String,
    pub token_file: PathBuf,
    pub request_timeout_seconds: u64,
    pub remote_log: bool,
}

impl Options {
    /// Parse session backend arguments from matches.
    ///
    /// # Errors
    /// Returns an error if required arguments are missing.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let api_url = matches
            .get_one::<String>(ARG_API_URL)
            .cloned()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_API_URL}"))?;

        let token_file = matches
            .get_one::<String>(ARG_TOKEN_FILE)
            .map(PathBuf::from)
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_TOKEN_FILE}"))?;

        Ok(Self {
            api_url,
            token_file,
            request_timeout_seconds: matches
                .get_one::<u64>(ARG_REQUEST_TIMEOUT)
                .copied()
                .unwrap_or(10),
            remote_log: matches.get_flag(ARG_REMOTE_LOG),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_URL)
                .short('a')
                .long(ARG_API_URL)
                .help("Session API base URL, example: https://api.example.com/v1")
                .env("AUTHWATCH_API_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_TOKEN_FILE)
                .short('t')
                .long(ARG_TOKEN_FILE)
                .help("File holding the persisted session token")
                .env("AUTHWATCH_TOKEN_FILE")
                .default_value(".authwatch/token"),
        )
        .arg(
            Arg::new(ARG_REQUEST_TIMEOUT)
                .long(ARG_REQUEST_TIMEOUT)
                .help("Session API request timeout in seconds")
                .env("AUTHWATCH_REQUEST_TIMEOUT")
                .default_value("10")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_REMOTE_LOG)
                .long(ARG_REMOTE_LOG)
                .help("Also post watchdog events to {api-url}/logs")
                .env("AUTHWATCH_REMOTE_LOG")
                .action(ArgAction::SetTrue),
        )
}
