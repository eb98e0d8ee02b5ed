//! Download error types.

use std::io;
use std::path::PathBuf;

use artfetch_core::NameError;
use thiserror::Error;

/// Error type for download operations.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The source locator could not be parsed.
    #[error("invalid URL '{0}'")]
    InvalidUrl(String),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// Network/HTTP error while talking to the source.
    #[error("network error for {url}: {message}")]
    Network {
        /// The locator being fetched.
        url: String,
        /// Detailed error message.
        message: String,
        /// HTTP status code if one was received.
        status_code: Option<u16>,
    },

    /// The staging file could not be created, even after falling back to a
    /// URL-derived name in the working directory.
    #[error("cannot create staging file for {destination}: {source}")]
    StagingCreate {
        /// The destination whose staging sibling failed.
        destination: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// I/O error while writing, renaming, or inspecting files.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path being operated on.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The fallback destination name could not be legalized.
    #[error(transparent)]
    Name(#[from] NameError),
}

impl DownloadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            message: message.into(),
            status_code: None,
        }
    }
}
