//! Git LFS custom transfer protocol
//!
//! Line-delimited JSON exchanged with git-lfs over the agent's stdin/stdout.
//! Each request line carries an `event` tag (`init`, `download`, `upload`,
//! `terminate`); responses are single JSON objects terminated by a newline.
//!
//! # Example Usage
//!
//! ```ignore
//! use lfs_rsync_agent::protocol::Request;
//!
//! match Request::parse(r#"{"event":"terminate"}"#)? {
//!     Request::Terminate => { /* stop reading */ }
//!     _ => {}
//! }
//! ```

pub mod error;
pub mod messages;

// Re-export public API
pub use error::ProtocolError;
pub use messages::{
	Action, DownloadRequest, InitRequest, InitResponse, OperationError, Operation,
	ProgressResponse, Request, TransferResponse, UploadRequest,
};

/// Configuration/setup failure: missing remote, temp file allocation
pub const ERR_SETUP: i32 = 3;

/// Download transfer failure
pub const ERR_DOWNLOAD: i32 = 4;

/// Upload transfer failure
pub const ERR_UPLOAD: i32 = 5;

// vim: ts=4
