//! Protocol engine for the git-lfs custom transfer agent
//!
//! Reads one JSON request per line, dispatches it, and answers on the writer.
//! Requests are handled strictly one at a time; a transfer blocks the loop
//! until the external command exits.
//!
//! Failures are handled in three tiers:
//! - unparseable lines are logged and skipped, the peer sees nothing
//! - setup and transfer failures become `{code, message}` errors in the
//!   response for that request
//! - failures to write a response are logged and dropped (see [`Emitted`])

use serde::Serialize;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::logging::*;
use crate::protocol::{
	DownloadRequest, InitRequest, InitResponse, Operation, OperationError, Request,
	TransferResponse, UploadRequest, ERR_SETUP,
};
use crate::transfer::Transfer;
use crate::validation::validate_oid;

/// Remote storage root fixed at init
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote(String);

impl Remote {
	pub fn new(location: &str) -> Result<Self, AgentError> {
		if location.is_empty() {
			return Err(AgentError::MissingRemote);
		}
		Ok(Remote(location.to_string()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Remote address of the object `oid`: `<remote>/<oid>`
	pub fn file(&self, oid: &str) -> String {
		format!("{}/{}", self.0, oid)
	}
}

/// State established by a successful init
#[derive(Debug, Clone)]
pub struct Session {
	pub remote: Remote,
	/// Direction announced at init, when it was a known one
	pub operation: Option<Operation>,
	/// Concurrency hints from git-lfs; accepted but transfers stay sequential
	pub concurrent: bool,
	pub concurrent_transfers: Option<i64>,
}

/// Why the read loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
	Terminated,
	EndOfInput,
}

/// Counters kept over the lifetime of the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
	pub requests: u64,
	pub skipped_lines: u64,
	pub responses_sent: u64,
	pub responses_dropped: u64,
}

/// Outcome of sending a response
///
/// A response that cannot be serialized or written is logged and dropped;
/// the engine never retries and never stops because of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emitted {
	Sent,
	Dropped,
}

enum Flow {
	Continue,
	Stop,
}

/// Serialize `message` as one JSON line and flush it
pub async fn write_message<W, M>(writer: &mut W, message: &M) -> std::io::Result<String>
where
	W: AsyncWrite + Unpin,
	M: Serialize,
{
	let mut json = serde_json::to_string(message)?;
	json.push('\n');
	writer.write_all(json.as_bytes()).await?;
	writer.flush().await?;
	Ok(json)
}

/// The protocol engine
pub struct Agent<T: Transfer> {
	/// Remote location given at launch; only becomes active on init
	launch_remote: Option<String>,
	transfer: T,
	temp_dir: Option<PathBuf>,
	temp_prefix: String,
	session: Option<Session>,
	stats: SessionStats,
}

impl<T: Transfer> Agent<T> {
	pub fn new(launch_remote: Option<String>, transfer: T) -> Self {
		Agent {
			launch_remote,
			transfer,
			temp_dir: None,
			temp_prefix: "rsync-agent".to_string(),
			session: None,
			stats: SessionStats::default(),
		}
	}

	pub fn from_config(config: &AgentConfig, transfer: T) -> Self {
		Agent {
			launch_remote: config.remote().map(|r| r.to_string()),
			transfer,
			temp_dir: config.temp_dir.clone(),
			temp_prefix: config.temp_prefix.clone(),
			session: None,
			stats: SessionStats::default(),
		}
	}

	/// Put downloaded files in `dir` instead of the system temp dir
	pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.temp_dir = Some(dir.into());
		self
	}

	pub fn session(&self) -> Option<&Session> {
		self.session.as_ref()
	}

	pub fn stats(&self) -> SessionStats {
		self.stats
	}

	/// Serve requests from `reader` until terminate or end of input
	///
	/// Only a failure to read the input ends the loop with an error.
	pub async fn run<R, W>(
		&mut self,
		mut reader: R,
		writer: &mut W,
	) -> Result<SessionEnd, AgentError>
	where
		R: AsyncBufRead + Unpin,
		W: AsyncWrite + Unpin,
	{
		let mut buf = Vec::new();

		let end = loop {
			buf.clear();
			let n = reader.read_until(b'\n', &mut buf).await?;
			if n == 0 {
				debug!("End of input");
				break SessionEnd::EndOfInput;
			}

			let line = match std::str::from_utf8(&buf) {
				Ok(line) => line.trim(),
				Err(_) => {
					warn!("Unable to parse request: {}", String::from_utf8_lossy(&buf).trim());
					self.stats.skipped_lines += 1;
					continue;
				}
			};
			if line.is_empty() {
				continue;
			}

			if let Flow::Stop = self.handle_line(line, writer).await {
				break SessionEnd::Terminated;
			}
		};

		info!(
			"Session ended ({:?}): {} requests, {} skipped lines, {} responses sent, {} dropped",
			end,
			self.stats.requests,
			self.stats.skipped_lines,
			self.stats.responses_sent,
			self.stats.responses_dropped
		);
		Ok(end)
	}

	async fn handle_line<W>(&mut self, line: &str, writer: &mut W) -> Flow
	where
		W: AsyncWrite + Unpin,
	{
		match Request::parse(line) {
			Ok(request) => {
				self.stats.requests += 1;
				debug!("Dispatching {} request", request.event());
				self.handle(request, writer).await
			}
			Err(e) => {
				warn!("Unable to parse request: {} ({})", line, e);
				self.stats.skipped_lines += 1;
				Flow::Continue
			}
		}
	}

	async fn handle<W>(&mut self, request: Request, writer: &mut W) -> Flow
	where
		W: AsyncWrite + Unpin,
	{
		match request {
			Request::Init(init) => {
				info!(
					"Initialising rsync agent for: {}",
					init.operation.as_deref().unwrap_or("unspecified operation")
				);
				let response = self.initialize(&init);
				self.send(writer, &response).await;
			}
			Request::Download(req) => {
				info!("Received download request for: {}", req.oid);
				let response = match self.download(&req).await {
					Ok(path) => TransferResponse::downloaded(&req.oid, path),
					Err(e) => {
						warn!("Download of {} failed: {}", req.oid, e);
						transfer_failure(&req.oid, Operation::Download, &e)
					}
				};
				self.send(writer, &response).await;
			}
			Request::Upload(req) => {
				info!("Received upload request for: {}", req.oid);
				let response = match self.upload(&req).await {
					Ok(()) => TransferResponse::uploaded(&req.oid),
					Err(e) => {
						warn!("Upload of {} failed: {}", req.oid, e);
						transfer_failure(&req.oid, Operation::Upload, &e)
					}
				};
				self.send(writer, &response).await;
			}
			Request::Terminate => {
				info!("Terminating rsync agent gracefully.");
				return Flow::Stop;
			}
		}
		Flow::Continue
	}

	fn initialize(&mut self, init: &InitRequest) -> InitResponse {
		if let Some(session) = &self.session {
			warn!("Repeated init ignored, remote stays {}", session.remote.as_str());
			return InitResponse::success();
		}

		let remote = match Remote::new(self.launch_remote.as_deref().unwrap_or("")) {
			Ok(remote) => remote,
			Err(e) => {
				error!("{}", e);
				return InitResponse::failure(OperationError::new(ERR_SETUP, e.to_string()));
			}
		};

		debug!(
			"Remote {} (git remote {:?}, concurrent={}, concurrenttransfers={:?})",
			remote.as_str(),
			init.remote,
			init.concurrent,
			init.concurrenttransfers
		);
		self.session = Some(Session {
			remote,
			operation: init.direction(),
			concurrent: init.concurrent,
			concurrent_transfers: init.concurrenttransfers,
		});
		InitResponse::success()
	}

	fn active_session(&self) -> Result<&Session, AgentError> {
		self.session.as_ref().ok_or(AgentError::NotInitialized)
	}

	/// Fetch `<remote>/<oid>` into a fresh temp file and hand its path over
	///
	/// The file is left on disk for git-lfs to move into place, also when the
	/// transfer fails part way.
	async fn download(&self, req: &DownloadRequest) -> Result<PathBuf, AgentError> {
		let session = self.active_session()?;
		validate_oid(&req.oid)?;

		let mut builder = tempfile::Builder::new();
		builder.prefix(&self.temp_prefix);
		let temp = match &self.temp_dir {
			Some(dir) => builder.tempfile_in(dir),
			None => builder.tempfile(),
		}
		.map_err(|e| AgentError::TempFile { source: e })?;
		// Handle closes when it goes out of scope, the path stays
		let (_file, path) = temp.keep().map_err(|e| AgentError::TempFile { source: e.error })?;

		self.transfer.transfer(&session.remote.file(&req.oid), &path.to_string_lossy()).await?;
		Ok(path)
	}

	/// Store the local file at `<remote>/<oid>`
	async fn upload(&self, req: &UploadRequest) -> Result<(), AgentError> {
		let session = self.active_session()?;
		validate_oid(&req.oid)?;

		self.transfer.transfer(&req.path.to_string_lossy(), &session.remote.file(&req.oid)).await?;
		Ok(())
	}

	/// Write one response line, logging and dropping it on failure
	async fn send<W, M>(&mut self, writer: &mut W, message: &M) -> Emitted
	where
		W: AsyncWrite + Unpin,
		M: Serialize,
	{
		match write_message(writer, message).await {
			Ok(json) => {
				info!("Sent message {}", json.trim_end());
				self.stats.responses_sent += 1;
				Emitted::Sent
			}
			Err(e) => {
				error!("Unable to send response: {}", e);
				self.stats.responses_dropped += 1;
				Emitted::Dropped
			}
		}
	}
}

fn transfer_failure(oid: &str, operation: Operation, e: &AgentError) -> TransferResponse {
	TransferResponse::failed(oid, OperationError::new(e.code(operation), e.to_string()))
}


// vim: ts=4
