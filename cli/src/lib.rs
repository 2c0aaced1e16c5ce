//! Command-line surface for the Billingo v3 API.
//!
//! Parses arguments, resolves credentials from flags, environment and the
//! config file, calls `billingo_core`, and renders results. Errors are
//! returned to `main`, which is the only place that prints them and picks
//! the exit code.

use std::io::Write;

use billingo_core::{Billingo, RequestClient};
use tracing::debug;

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;

pub use cli::Opts;
pub use config::{ConfigKey, ConfigStore};
pub use error::CliError;

pub fn run(opts: Opts, out: &mut dyn Write) -> Result<(), CliError> {
    let path = opts.config.clone().unwrap_or_else(ConfigStore::default_path);
    let mut store = ConfigStore::load(path)?;
    debug!(path = %store.path().display(), configured = store.is_configured(), "config loaded");

    match opts.command {
        cli::Command::Config { action } => commands::run_config(action, &mut store, out),
        command => {
            let credentials = store.credentials(opts.api_key.as_deref(), opts.base_url.as_deref());
            let api = Billingo::new(RequestClient::with_credentials(credentials));
            commands::run(command, &api, out)
        }
    }
}
