//! Protocol error types
//!
//! Errors raised while turning an input line into a typed request. None of
//! these are ever reported to the peer; the engine logs them and moves on.

use std::fmt;

/// Protocol error type
#[derive(Debug)]
pub enum ProtocolError {
	/// Line is not valid JSON, or a field does not match its event's shape
	Json(String),
	/// JSON object without a string `event` field
	MissingEvent,
	/// `event` names something this agent does not handle
	UnknownEvent(String),
}

impl fmt::Display for ProtocolError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ProtocolError::Json(msg) => write!(f, "JSON parse error: {}", msg),
			ProtocolError::MissingEvent => write!(f, "Request has no event field"),
			ProtocolError::UnknownEvent(event) => write!(f, "Unknown event: {}", event),
		}
	}
}

impl std::error::Error for ProtocolError {}

impl From<serde_json::Error> for ProtocolError {
	fn from(e: serde_json::Error) -> Self {
		ProtocolError::Json(e.to_string())
	}
}

// vim: ts=4
