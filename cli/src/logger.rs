//! Diagnostic logging via `tracing`, written to stderr.
//!
//! Operator-facing progress goes through `output`; this is for `-v` and
//! `RUST_LOG` troubleshooting only.

use std::sync::OnceLock;

use anyhow::{Context, Result};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: OnceLock<()> = OnceLock::new();

/// Install the global subscriber. `verbosity` is the `-v` count; when it is
/// zero, `RUST_LOG` applies and defaults to `warn`.
///
/// # Errors
///
/// Returns an error if another global subscriber is already installed.
pub fn init(verbosity: u8) -> Result<()> {
    if INIT.get().is_some() {
        return Ok(());
    }

    let env_filter = match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("rebox_cli=debug,warn"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()
        .context("failed to initialize tracing subscriber")?;

    let _ = INIT.set(());
    Ok(())
}
