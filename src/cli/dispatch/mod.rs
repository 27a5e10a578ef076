//! Map validated CLI arguments to the action to run.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_FRONTEND_ORIGIN, ARG_PORT, database, session};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let frontend_origin = matches
        .get_one::<String>(ARG_FRONTEND_ORIGIN)
        .filter(|origin| !origin.trim().is_empty())
        .cloned();

    let store = database::Options::parse(matches)?;
    let session_opts = session::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        store,
        session_ttl_seconds: session_opts.ttl_seconds,
        frontend_origin,
    }))
}
