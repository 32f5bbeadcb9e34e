//! External transfer primitive
//!
//! Moving bytes is delegated to an external command (rsync by default) run as
//! `<command> [args...] <source> <destination>`. The agent only sees whether
//! it exited successfully and, if not, what it printed.
//!
//! stdout and stderr are captured on separate pipes, so the failure output is
//! everything from stdout followed by everything from stderr, not the two
//! streams interleaved in the order they were written.

use async_trait::async_trait;
use std::process::Stdio;

use crate::error::TransferError;
use crate::logging::*;

/// Copies `source` to `destination`, blocking the caller until done
#[async_trait]
pub trait Transfer: Send + Sync {
	async fn transfer(&self, source: &str, destination: &str) -> Result<(), TransferError>;
}

/// Transfer backed by an rsync-compatible command
#[derive(Debug, Clone)]
pub struct RsyncTransfer {
	/// Program to run
	pub command: String,

	/// Extra arguments placed before source and destination
	pub args: Vec<String>,
}

impl Default for RsyncTransfer {
	fn default() -> Self {
		RsyncTransfer { command: "rsync".to_string(), args: vec![] }
	}
}

impl RsyncTransfer {
	pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
		RsyncTransfer { command: command.into(), args }
	}

	/// Human readable command line, used in diagnostics and error messages
	fn command_line(&self, source: &str, destination: &str) -> String {
		let mut parts = Vec::with_capacity(self.args.len() + 3);
		parts.push(self.command.as_str());
		parts.extend(self.args.iter().map(|a| a.as_str()));
		parts.push(source);
		parts.push(destination);
		parts.join(" ")
	}
}

#[async_trait]
impl Transfer for RsyncTransfer {
	async fn transfer(&self, source: &str, destination: &str) -> Result<(), TransferError> {
		let command_line = self.command_line(source, destination);
		debug!("Running `{}`", command_line);

		// stdout must be captured: ours is the protocol channel
		let output = tokio::process::Command::new(&self.command)
			.args(&self.args)
			.arg(source)
			.arg(destination)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.output()
			.await
			.map_err(|e| TransferError::SpawnFailed { command: command_line.clone(), source: e })?;

		if output.status.success() {
			debug!("`{}` finished", command_line);
			return Ok(());
		}

		// stdout block first, then stderr block
		let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
		combined.push_str(&String::from_utf8_lossy(&output.stderr));
		Err(TransferError::Failed { command: command_line, status: output.status, output: combined })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::TempDir;

	#[test]
	fn test_command_line() {
		let t = RsyncTransfer::new("rsync", vec!["-a".to_string(), "--partial".to_string()]);
		assert_eq!(t.command_line("/src/a", "host:/dst/a"), "rsync -a --partial /src/a host:/dst/a");
		assert_eq!(RsyncTransfer::default().command_line("x", "y"), "rsync x y");
	}

	#[tokio::test]
	#[cfg(unix)]
	async fn test_successful_copy() {
		let dir = TempDir::new().unwrap();
		let src = dir.path().join("src");
		let dst = dir.path().join("dst");
		fs::write(&src, b"payload").unwrap();

		let t = RsyncTransfer::new("cp", vec![]);
		t.transfer(src.to_str().unwrap(), dst.to_str().unwrap()).await.unwrap();
		assert_eq!(fs::read(&dst).unwrap(), b"payload");
	}

	#[tokio::test]
	#[cfg(unix)]
	async fn test_failure_captures_output() {
		let dir = TempDir::new().unwrap();
		let src = dir.path().join("missing");
		let dst = dir.path().join("dst");

		let t = RsyncTransfer::new("cp", vec![]);
		let err = t.transfer(src.to_str().unwrap(), dst.to_str().unwrap()).await.unwrap_err();
		match &err {
			TransferError::Failed { command, status, output } => {
				assert!(command.starts_with("cp "));
				assert!(!status.success());
				assert!(output.contains("missing"), "output was {:?}", output);
			}
			other => panic!("expected Failed, got {:?}", other),
		}
		assert!(err.to_string().starts_with("Error while running `cp "));
	}

	#[tokio::test]
	#[cfg(unix)]
	async fn test_failure_output_is_stdout_then_stderr() {
		let script = "echo err1 >&2; echo out1; echo err2 >&2; echo out2; exit 3";
		let t = RsyncTransfer::new("sh", vec!["-c".to_string(), script.to_string(), "sh".to_string()]);
		match t.transfer("src", "dst").await.unwrap_err() {
			TransferError::Failed { output, .. } => assert_eq!(output, "out1\nout2\nerr1\nerr2\n"),
			other => panic!("expected Failed, got {:?}", other),
		}
	}

	#[tokio::test]
	async fn test_missing_program() {
		let t = RsyncTransfer::new("lfs-rsync-agent-no-such-program", vec![]);
		let err = t.transfer("a", "b").await.unwrap_err();
		assert!(matches!(err, TransferError::SpawnFailed { .. }));
	}
}

// vim: ts=4
