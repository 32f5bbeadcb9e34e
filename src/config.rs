//! Agent configuration
//!
//! The configuration follows a priority chain:
//! 1. Built-in defaults (AgentConfig::default())
//! 2. Config file (--config, else ~/.config/lfs-rsync-agent/config.toml)
//! 3. Environment variables (LFS_RSYNC_AGENT_* prefix)
//! 4. CLI flags (highest priority)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::error::AgentError;

/// Prefix of environment variables read by [`AgentConfig::apply_env`]
pub const ENV_PREFIX: &str = "LFS_RSYNC_AGENT_";

/// Configuration for the transfer agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AgentConfig {
	// ========================================================================
	// STORAGE
	// ========================================================================
	/// Remote storage root (local path or rsync address such as host:/srv/lfs)
	pub remote: Option<String>,

	// ========================================================================
	// TRANSFER COMMAND
	// ========================================================================
	/// Program used to move files
	pub rsync_command: String,

	/// Extra arguments passed before source and destination
	pub rsync_args: Vec<String>,

	// ========================================================================
	// DOWNLOADS
	// ========================================================================
	/// Directory for downloaded files (system temp dir if unset)
	pub temp_dir: Option<PathBuf>,

	/// Filename prefix of downloaded files
	pub temp_prefix: String,

	// ========================================================================
	// OUTPUT & LOGGING
	// ========================================================================
	/// Log level used when RUST_LOG is not set
	pub log_level: String,
}

impl Default for AgentConfig {
	fn default() -> Self {
		AgentConfig {
			remote: None,
			rsync_command: "rsync".to_string(),
			rsync_args: vec![],
			temp_dir: None,
			temp_prefix: "rsync-agent".to_string(),
			log_level: "info".to_string(),
		}
	}
}

impl AgentConfig {
	/// Default config file location, if a home or XDG config dir is known
	pub fn default_path() -> Option<PathBuf> {
		let base = match env::var_os("XDG_CONFIG_HOME") {
			Some(dir) if !dir.is_empty() => PathBuf::from(dir),
			_ => PathBuf::from(env::var_os("HOME")?).join(".config"),
		};
		Some(base.join("lfs-rsync-agent").join("config.toml"))
	}

	/// Parse a TOML config file; missing keys keep their defaults
	pub fn from_file(path: &Path) -> Result<Self, AgentError> {
		let content = fs::read_to_string(path).map_err(|e| AgentError::Config {
			message: format!("cannot read {}: {}", path.display(), e),
		})?;
		Self::from_toml(&content)
			.map_err(|e| AgentError::Config { message: format!("{}: {}", path.display(), e) })
	}

	pub fn from_toml(content: &str) -> Result<Self, AgentError> {
		toml::from_str(content).map_err(|e| AgentError::Config { message: e.to_string() })
	}

	/// Load defaults plus the config file
	///
	/// An explicit `path` must exist; the default location is optional.
	pub fn load(path: Option<&Path>) -> Result<Self, AgentError> {
		match path {
			Some(path) => Self::from_file(path),
			None => match Self::default_path() {
				Some(path) if path.is_file() => Self::from_file(&path),
				_ => Ok(Self::default()),
			},
		}
	}

	/// Apply LFS_RSYNC_AGENT_* variables from the process environment
	pub fn apply_env(&mut self) {
		self.apply_vars(env::vars())
	}

	/// Apply LFS_RSYNC_AGENT_* overrides from an arbitrary variable list
	pub fn apply_vars<I>(&mut self, vars: I)
	where
		I: IntoIterator<Item = (String, String)>,
	{
		for (key, value) in vars {
			let name = match key.strip_prefix(ENV_PREFIX) {
				Some(name) => name,
				None => continue,
			};
			match name {
				"REMOTE" => self.remote = Some(value),
				"RSYNC_COMMAND" => self.rsync_command = value,
				"RSYNC_ARGS" => {
					self.rsync_args = value.split_whitespace().map(|s| s.to_string()).collect()
				}
				"TEMP_DIR" => self.temp_dir = Some(PathBuf::from(value)),
				"TEMP_PREFIX" => self.temp_prefix = value,
				"LOG_LEVEL" => self.log_level = value,
				_ => {}
			}
		}
	}

	/// Remote location, treating an empty string as absent
	pub fn remote(&self) -> Option<&str> {
		self.remote.as_deref().filter(|r| !r.is_empty())
	}

	/// Check values that would otherwise only fail at transfer time
	pub fn validate(&self) -> Result<(), AgentError> {
		if self.rsync_command.trim().is_empty() {
			return Err(AgentError::Config { message: "rsyncCommand must not be empty".to_string() });
		}
		if self.temp_prefix.contains('/') {
			return Err(AgentError::Config {
				message: format!("tempPrefix must not contain '/': {}", self.temp_prefix),
			});
		}
		Ok(())
	}
}


// vim: ts=4
