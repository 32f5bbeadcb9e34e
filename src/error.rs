//! Error types for the transfer agent

use std::error::Error;
use std::fmt;
use std::io;
use std::process::ExitStatus;

use crate::protocol::{Operation, ERR_DOWNLOAD, ERR_SETUP, ERR_UPLOAD};

/// Main error type for agent operations
#[derive(Debug)]
pub enum AgentError {
	/// No remote location was supplied at launch
	MissingRemote,

	/// A transfer was requested before a successful init
	NotInitialized,

	/// Could not allocate the local download destination
	TempFile { source: io::Error },

	/// Oid cannot be used to address a remote file
	InvalidOid { oid: String, reason: String },

	/// External transfer primitive failed (nested)
	Transfer(TransferError),

	/// I/O error
	Io(io::Error),

	/// Invalid configuration
	Config { message: String },
}

impl AgentError {
	/// Protocol error code reported to the peer for a failure during `operation`
	///
	/// Setup failures are always 3; anything else belongs to the transfer
	/// itself and is reported as 4 (download) or 5 (upload).
	pub fn code(&self, operation: Operation) -> i32 {
		match self {
			AgentError::MissingRemote
			| AgentError::NotInitialized
			| AgentError::TempFile { .. }
			| AgentError::Config { .. } => ERR_SETUP,
			_ => match operation {
				Operation::Download => ERR_DOWNLOAD,
				Operation::Upload => ERR_UPLOAD,
			},
		}
	}
}

impl fmt::Display for AgentError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AgentError::MissingRemote => {
				write!(f, "No remote specified when launching the process")
			}
			AgentError::NotInitialized => {
				write!(f, "Agent not initialized: init must succeed before transfers")
			}
			AgentError::TempFile { source } => {
				write!(f, "Cannot create temporary file: {}", source)
			}
			AgentError::InvalidOid { oid, reason } => write!(f, "Invalid oid {:?}: {}", oid, reason),
			AgentError::Transfer(e) => write!(f, "{}", e),
			AgentError::Io(e) => write!(f, "I/O error: {}", e),
			AgentError::Config { message } => write!(f, "Invalid configuration: {}", message),
		}
	}
}

impl Error for AgentError {}

impl From<io::Error> for AgentError {
	fn from(e: io::Error) -> Self {
		AgentError::Io(e)
	}
}

impl From<TransferError> for AgentError {
	fn from(e: TransferError) -> Self {
		AgentError::Transfer(e)
	}
}

/// Errors from running the external transfer command
#[derive(Debug)]
pub enum TransferError {
	/// The command could not be started at all
	SpawnFailed { command: String, source: io::Error },

	/// The command ran and exited unsuccessfully
	Failed { command: String, status: ExitStatus, output: String },
}

impl fmt::Display for TransferError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TransferError::SpawnFailed { command, source } => {
				write!(f, "Error while running `{}`: {}", command, source)
			}
			TransferError::Failed { command, status, output } => {
				write!(f, "Error while running `{}`: {}\n{}", command, status, output)
			}
		}
	}
}

impl Error for TransferError {}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_setup_errors_map_to_code_3() {
		assert_eq!(AgentError::MissingRemote.code(Operation::Download), 3);
		assert_eq!(AgentError::NotInitialized.code(Operation::Upload), 3);
		let e = AgentError::TempFile { source: io::Error::new(io::ErrorKind::Other, "disk full") };
		assert_eq!(e.code(Operation::Download), 3);
	}

	#[test]
	fn test_transfer_errors_follow_operation() {
		let e = AgentError::Transfer(TransferError::SpawnFailed {
			command: "rsync a b".to_string(),
			source: io::Error::new(io::ErrorKind::NotFound, "not found"),
		});
		assert_eq!(e.code(Operation::Download), 4);
		assert_eq!(e.code(Operation::Upload), 5);

		let e = AgentError::InvalidOid { oid: "../x".to_string(), reason: "bad".to_string() };
		assert_eq!(e.code(Operation::Upload), 5);
	}

	#[test]
	fn test_missing_remote_message() {
		assert!(AgentError::MissingRemote.to_string().contains("No remote"));
	}
}

// vim: ts=4
