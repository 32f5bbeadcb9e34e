//! Logging prelude module for convenient access to tracing macros.
//!
//! stdout carries protocol responses, so every diagnostic goes to stderr.
//! git-lfs shows the agent's stderr when run with `GIT_TRACE=1`.
//!
//! # Usage
//!
//! ```ignore
//! use crate::logging::*;
//!
//! info!("Received download request for: {}", oid);
//! warn!("Unable to parse request: {}", line);
//! ```

pub use tracing::{debug, error, info, warn};

/// Initialize the tracing subscriber with environment filter support.
///
/// `RUST_LOG` wins when set; otherwise `default_level` (from configuration)
/// is used:
///
/// ```bash
/// RUST_LOG=debug git lfs pull
/// RUST_LOG=lfs_rsync_agent::agent=debug git lfs push origin main
/// ```
pub fn init_tracing(default_level: &str) {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
		)
		.with_writer(std::io::stderr)
		.with_ansi(false)
		.init();
}

// vim: ts=4
