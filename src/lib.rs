//! # Authwatch (Auth Consistency Watchdog)
//!
//! `authwatch` keeps two independently maintained authentication signals in
//! agreement: the locally cached "store" flag (updated optimistically on
//! login/logout and loaded from a persisted token) and the "context" flag
//! derived from a live session check against the backend.
//!
//! ## Reconciliation
//!
//! The [`watchdog`] module compares both flags on every navigation and on a
//! fixed interval. A mismatch is logged, handed to a remediation routine, and,
//! when the session turned out to be invalid and the user sits on a protected
//! route, followed by a redirect to the login route carrying the original
//! location.
//!
//! - **Debounce:** repeated navigations to the same path inside the cooldown
//!   window run a single check. Periodic and manual checks are never debounced.
//! - **Containment:** remediation errors, logger and navigator failures never
//!   escape a cycle; the next trigger retries.
//!
//! ## Backend
//!
//! The [`backend`] module provides HTTP-backed collaborators (token store,
//! session probe, remediation, remote event log) and [`api`] exposes an
//! optional status server for debugging auth state.

pub mod api;
pub mod backend;
pub mod cli;
pub mod watchdog;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
