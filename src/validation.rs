//! Oid validation
//!
//! An oid is joined onto the remote location as `<remote>/<oid>`, so it must
//! name exactly one entry directly under the remote root.

use crate::error::AgentError;

/// Check if an oid is safe to append to the remote location
pub fn is_oid_safe(oid: &str) -> bool {
	!oid.is_empty() && oid != "." && oid != ".." && !oid.contains(|c| c == '/' || c == '\\')
}

/// Validate an oid
///
/// # Returns
/// `Ok(())` if valid, `Err(AgentError::InvalidOid)` otherwise
pub fn validate_oid(oid: &str) -> Result<(), AgentError> {
	if oid.is_empty() {
		return Err(AgentError::InvalidOid { oid: oid.to_string(), reason: "oid is empty".to_string() });
	}
	if !is_oid_safe(oid) {
		return Err(AgentError::InvalidOid {
			oid: oid.to_string(),
			reason: "oid must not contain path separators or refer to a directory".to_string(),
		});
	}
	Ok(())
}


// vim: ts=4
