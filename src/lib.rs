//! # lfs-rsync-agent - Git LFS custom transfer agent backed by rsync
//!
//! git-lfs launches the agent and talks to it over stdin/stdout using
//! line-delimited JSON. Objects are stored as `<remote>/<oid>`, where the
//! remote is the single argument the agent was launched with, and are moved
//! with rsync.
//!
//! ## Git configuration
//!
//! ```text
//! git config lfs.standalonetransferagent rsync
//! git config lfs.customtransfer.rsync.path lfs-rsync-agent
//! git config lfs.customtransfer.rsync.args "backup:/srv/lfs"
//! ```
//!
//! ## Library use
//!
//! ```rust,ignore
//! use lfs_rsync_agent::{Agent, RsyncTransfer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut agent = Agent::new(Some("/backup/lfs".to_string()), RsyncTransfer::default());
//!     let reader = tokio::io::BufReader::new(tokio::io::stdin());
//!     agent.run(reader, &mut tokio::io::stdout()).await?;
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod signals;
pub mod transfer;
pub mod validation;

// Re-export commonly used types and functions
pub use agent::{Agent, Emitted, Remote, Session, SessionEnd, SessionStats};
pub use config::AgentConfig;
pub use error::{AgentError, TransferError};
pub use protocol::{InitResponse, OperationError, Request, TransferResponse};
pub use transfer::{RsyncTransfer, Transfer};

// vim: ts=4
