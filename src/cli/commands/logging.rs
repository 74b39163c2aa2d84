use clap::{builder::ValueParser, Arg, ArgAction, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

/// Level names in `-v` count order; `error` is the default (no `-v`).
const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Accepts `AUTHWATCH_LOG_LEVEL` as a level name or a `-v` count (0..=5).
#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(|level: &str| -> Result<u8, String> {
        let level = level.trim().to_ascii_lowercase();
        if let Ok(count) = level.parse::<u8>() {
            return if count <= 5 {
                Ok(count)
            } else {
                Err(format!("verbosity count {count} is above 5"))
            };
        }

        LEVELS
            .iter()
            .position(|name| *name == level)
            .and_then(|index| u8::try_from(index).ok())
            .ok_or_else(|| format!("unknown log level '{level}', expected one of {LEVELS:?}"))
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Raise authwatch log verbosity; repeat up to -vvvv (default: errors only)")
            .long_help(
                "Raise authwatch log verbosity: -v warn, -vv info, -vvv debug, -vvvv trace.\n\
                 AUTHWATCH_LOG_LEVEL takes a level name or a count; RUST_LOG directives still apply.",
            )
            .env("AUTHWATCH_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(level: &str) -> Result<u8, clap::Error> {
        Command::new("authwatch")
            .arg(Arg::new("level").value_parser(validator_log_level()))
            .try_get_matches_from(["authwatch", level])
            .map(|matches| matches.get_one::<u8>("level").copied().unwrap_or_default())
    }

    #[test]
    fn level_names_map_to_counts() {
        assert_eq!(parse("error").ok(), Some(0));
        assert_eq!(parse("INFO").ok(), Some(2));
        assert_eq!(parse("trace").ok(), Some(4));
    }

    #[test]
    fn numeric_counts_are_bounded() {
        assert_eq!(parse("5").ok(), Some(5));
        assert!(parse("6").is_err());
        assert!(parse("verbose").is_err());
    }
}
