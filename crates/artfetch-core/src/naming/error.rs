//! Naming error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while legalizing a candidate file name.
#[derive(Debug, Error)]
pub enum NameError {
    /// The sanitized path exceeds the platform ceiling and no stem remains
    /// to truncate. Fatal for the task that produced the name.
    #[error("path name too long: {path}")]
    PathTooLong {
        /// The offending full path.
        path: PathBuf,
    },

    /// The candidate could not be resolved to an absolute path.
    #[error("cannot resolve '{name}': {reason}")]
    Resolve {
        /// The sanitized relative name.
        name: String,
        /// Why resolution failed.
        reason: String,
    },
}
