//! Animation pipeline error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error type for archive reading and animation encoding.
#[derive(Debug, Error)]
pub enum AnimError {
    /// The archive is not a readable zip, or its manifest is missing or
    /// malformed. Fatal for the conversion; staging is still cleaned up.
    #[error("corrupt frame archive {path}: {reason}")]
    CorruptArchive {
        /// The archive being read.
        path: PathBuf,
        /// What went wrong while parsing it.
        reason: String,
    },

    /// I/O error on staging, temp output, or the committed file.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path being operated on.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// A frame image could not be decoded. Aborts the whole encode; no
    /// partial output is committed.
    #[error("failed to decode frame {file}: {source}")]
    FrameDecode {
        /// The frame image that failed.
        file: PathBuf,
        /// The decoder failure.
        #[source]
        source: image::ImageError,
    },

    /// A frame's dimensions differ from the first frame's (the animated-PNG
    /// container requires uniform frames).
    #[error("frame {file} is {got_w}x{got_h}, expected {want_w}x{want_h}")]
    FrameSizeMismatch {
        file: PathBuf,
        got_w: u32,
        got_h: u32,
        want_w: u32,
        want_h: u32,
    },

    /// GIF serialization failed.
    #[error("GIF encoding failed: {source}")]
    Gif {
        #[source]
        source: image::ImageError,
    },

    /// Animated-PNG serialization failed.
    #[error("animated PNG encoding failed: {source}")]
    Png {
        #[source]
        source: png::EncodingError,
    },

    /// The configured external encoder binary is not on the PATH.
    #[error("external encoder '{program}' not found on PATH")]
    EncoderMissing {
        /// The configured executable name.
        program: String,
    },

    /// The external encoder process could not be started.
    #[error("external encoder '{program}' could not be started: {source}")]
    EncoderSpawn {
        /// The configured executable name.
        program: String,
        /// The spawn failure.
        #[source]
        source: io::Error,
    },

    /// The external encoder ran but exited with a non-zero status. No
    /// output is committed.
    #[error("external encoder exited with status {code}")]
    EncodeProcessFailed {
        /// The child's exit code (`-1` when terminated by a signal).
        code: i32,
    },
}

impl AnimError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptArchive {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
