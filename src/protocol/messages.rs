//! Request and response messages of the custom transfer protocol
//!
//! Requests are decoded in two stages: the `event` tag is read from a generic
//! JSON value first, then the value is decoded into the struct for that event,
//! so every variant carries exactly the fields it requires.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::error::ProtocolError;

/// Transfer direction: announced by init, and the kind of each transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
	Upload,
	Download,
}

impl std::fmt::Display for Operation {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Operation::Upload => write!(f, "upload"),
			Operation::Download => write!(f, "download"),
		}
	}
}

/// Endpoint descriptor sent by git-lfs with each transfer
///
/// Carried through untouched; the rsync agent addresses files by oid only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
	pub href: String,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub header: BTreeMap<String, String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_at: Option<String>,
}

/// `{"event":"init", ...}`
///
/// Every field is optional: init succeeds or fails on the launch remote alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InitRequest {
	/// "upload" or "download"; kept as text so unexpected values still get a reply
	#[serde(default)]
	pub operation: Option<String>,
	/// Name of the git remote (e.g. "origin"), not the storage location
	#[serde(default)]
	pub remote: Option<String>,
	#[serde(default)]
	pub concurrent: bool,
	#[serde(default)]
	pub concurrenttransfers: Option<i64>,
}

impl InitRequest {
	/// Announced transfer direction, if it is one this agent knows
	pub fn direction(&self) -> Option<Operation> {
		match self.operation.as_deref() {
			Some("upload") => Some(Operation::Upload),
			Some("download") => Some(Operation::Download),
			_ => None,
		}
	}
}

/// `{"event":"download", ...}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DownloadRequest {
	pub oid: String,
	/// Informational only; signed like git-lfs sends it
	#[serde(default)]
	pub size: i64,
	#[serde(default)]
	pub action: Option<Action>,
}

/// `{"event":"upload", ...}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadRequest {
	pub oid: String,
	#[serde(default)]
	pub size: i64,
	/// Local file git-lfs wants stored
	pub path: PathBuf,
	#[serde(default)]
	pub action: Option<Action>,
}

/// A decoded request line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
	Init(InitRequest),
	Download(DownloadRequest),
	Upload(UploadRequest),
	Terminate,
}

impl Request {
	/// Parse one input line into a request
	pub fn parse(line: &str) -> Result<Self, ProtocolError> {
		let value: serde_json::Value = serde_json::from_str(line)?;
		let event = match value.get("event").and_then(|e| e.as_str()) {
			Some(event) => event.to_string(),
			None => return Err(ProtocolError::MissingEvent),
		};

		match event.as_str() {
			"init" => Ok(Request::Init(serde_json::from_value(value)?)),
			"download" => Ok(Request::Download(serde_json::from_value(value)?)),
			"upload" => Ok(Request::Upload(serde_json::from_value(value)?)),
			"terminate" => Ok(Request::Terminate),
			_ => Err(ProtocolError::UnknownEvent(event)),
		}
	}

	/// Event tag as it appears on the wire
	pub fn event(&self) -> &'static str {
		match self {
			Request::Init(_) => "init",
			Request::Download(_) => "download",
			Request::Upload(_) => "upload",
			Request::Terminate => "terminate",
		}
	}
}

/// `{code, message}` error object embedded in responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
	pub code: i32,
	pub message: String,
}

impl OperationError {
	pub fn new(code: i32, message: impl Into<String>) -> Self {
		OperationError { code, message: message.into() }
	}
}

/// Reply to the init event; `{}` on success
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitResponse {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<OperationError>,
}

impl InitResponse {
	pub fn success() -> Self {
		InitResponse { error: None }
	}

	pub fn failure(error: OperationError) -> Self {
		InitResponse { error: Some(error) }
	}
}

/// Messages about a single transfer, correlated by oid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TransferResponse {
	Complete {
		oid: String,
		/// Downloaded file location; absent for uploads and failures
		#[serde(default, skip_serializing_if = "Option::is_none")]
		path: Option<PathBuf>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		error: Option<OperationError>,
	},
	Progress(ProgressResponse),
}

impl TransferResponse {
	pub fn downloaded(oid: &str, path: PathBuf) -> Self {
		TransferResponse::Complete { oid: oid.to_string(), path: Some(path), error: None }
	}

	pub fn uploaded(oid: &str) -> Self {
		TransferResponse::Complete { oid: oid.to_string(), path: None, error: None }
	}

	pub fn failed(oid: &str, error: OperationError) -> Self {
		TransferResponse::Complete { oid: oid.to_string(), path: None, error: Some(error) }
	}

	pub fn oid(&self) -> &str {
		match self {
			TransferResponse::Complete { oid, .. } => oid,
			TransferResponse::Progress(p) => &p.oid,
		}
	}
}

/// Incremental progress of a transfer
///
/// Part of the protocol but never sent: rsync runs as one blocking call and
/// reports nothing until it exits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
	pub oid: String,
	pub bytes_so_far: u64,
	pub bytes_since_last: u64,
}


// vim: ts=4
