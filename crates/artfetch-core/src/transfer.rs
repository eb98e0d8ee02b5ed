//! Transfer task and outcome types.
//!
//! Pure data: a [`DownloadTask`] describes one fetch, a [`TransferOutcome`]
//! says how the byte copy ended, and a [`CommittedFile`] describes the
//! artifact after a successful promote. None of these are persisted; a task
//! is created per asset and consumed once.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

/// Everything the downloader needs to fetch one asset.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadTask {
    /// Source locator.
    pub url: String,
    /// Fully resolved, sanitized destination path.
    pub destination: PathBuf,
    /// Declared payload size; `0` means unknown.
    pub expected_size: u64,
    /// Whether an existing destination should be replaced.
    pub overwrite: bool,
}

impl DownloadTask {
    /// Create a task with an unknown size and no overwrite.
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
            expected_size: 0,
            overwrite: false,
        }
    }

    /// Set the declared payload size (`0` keeps it unknown).
    #[must_use]
    pub fn with_expected_size(mut self, size: u64) -> Self {
        self.expected_size = size;
        self
    }

    /// Request replacement of an existing destination file.
    #[must_use]
    pub const fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// The declared size, if one was declared.
    #[must_use]
    pub const fn known_size(&self) -> Option<u64> {
        if self.expected_size > 0 {
            Some(self.expected_size)
        } else {
            None
        }
    }
}

/// How a byte transfer terminated.
///
/// Only `Completed` promotes the staged file; the other variants leave the
/// destination untouched and the staging file deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransferOutcome {
    /// All expected bytes arrived (or the stream ended with an unknown
    /// declared size and at least one byte written).
    Completed {
        /// Bytes written to the destination.
        bytes_written: u64,
        /// Wall-clock duration of the copy, for reporting only.
        elapsed: Duration,
    },
    /// The declared size was known and the stream ended short of it.
    IncompleteKnownSize {
        /// Bytes that did arrive.
        bytes_written: u64,
        /// The declared size.
        expected: u64,
    },
    /// The stream ended before a single byte arrived.
    NoDataReceived,
}

impl TransferOutcome {
    /// Whether the staged file was promoted to its final name.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// The committed artifact at its final path.
///
/// Only the downloader's finalize step and the animation encoder's export
/// step produce these; a file under its final name is never partially
/// written.
#[derive(Clone, Debug)]
pub struct CommittedFile {
    /// Final path of the artifact.
    pub path: PathBuf,
    /// Size in bytes on disk.
    pub len: u64,
    /// Modification timestamp, when the filesystem reports one.
    pub modified: Option<SystemTime>,
}

impl CommittedFile {
    /// Describe an already-committed file by reading its metadata.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let meta = std::fs::metadata(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}
