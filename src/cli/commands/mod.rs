pub mod backend;
pub mod logging;
pub mod watchdog;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    ColorChoice, Command,
};

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("authwatch")
        .about("Auth consistency watchdog")
        .long_about(
            "Keeps the locally stored login state and the backend session in agreement.\n\
             Navigation paths are read from stdin, one per line; `login <token>`, `logout`\n\
             and `check` are also accepted.",
        )
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles);

    let command = backend::with_args(command);
    let command = watchdog::with_args(command);
    logging::with_args(command)
}
