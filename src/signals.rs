//! Termination signals
//!
//! git-lfs ends a session with a terminate event. A signal means the user
//! interrupted git instead, possibly in the middle of an rsync run. There is
//! nothing to clean up (downloaded temp files belong to git-lfs), so the
//! agent just reports the signal and exits with the shell's 128+n status.

use crate::logging::*;

/// Signals that end the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
	Terminate,
	Interrupt,
}

impl Signal {
	pub fn number(self) -> i32 {
		match self {
			Signal::Terminate => 15,
			Signal::Interrupt => 2,
		}
	}

	pub fn name(self) -> &'static str {
		match self {
			Signal::Terminate => "SIGTERM",
			Signal::Interrupt => "SIGINT",
		}
	}

	/// Process exit status after this signal
	pub fn exit_code(self) -> i32 {
		128 + self.number()
	}
}

/// Wait until SIGTERM or SIGINT arrives
#[cfg(unix)]
pub async fn wait_for_signal() -> std::io::Result<Signal> {
	use tokio::signal::unix::{signal, SignalKind};

	let mut terminate = signal(SignalKind::terminate())?;
	let mut interrupt = signal(SignalKind::interrupt())?;
	tokio::select! {
		_ = terminate.recv() => Ok(Signal::Terminate),
		_ = interrupt.recv() => Ok(Signal::Interrupt),
	}
}

#[cfg(not(unix))]
pub async fn wait_for_signal() -> std::io::Result<Signal> {
	tokio::signal::ctrl_c().await?;
	Ok(Signal::Interrupt)
}

/// Spawn a task that exits the process on the first termination signal
pub fn exit_on_signal() {
	tokio::spawn(async {
		match wait_for_signal().await {
			Ok(sig) => {
				warn!("{} received while serving git-lfs, exiting with {}", sig.name(), sig.exit_code());
				std::process::exit(sig.exit_code());
			}
			Err(e) => warn!("Cannot install signal handlers, signals use default handling: {}", e),
		}
	});
}


// vim: ts=4
