//! Download pipeline for artfetch: integrity gating, streamed transfer into
//! a staging file, and atomic promotion to the final path.
//!
//! The pipeline is deliberately sequential — one task runs to completion
//! before the caller proceeds. Batching and parallel fan-out are the
//! caller's business, as is making sure two tasks never target the same
//! destination path (no locking is provided at this layer).

pub mod client;
pub mod error;
pub mod gate;
pub mod stream;

pub use client::{build_client, open_stream, probe_content_length};
pub use error::DownloadError;
pub use gate::{GateDecision, check_existing};
pub use stream::{DownloadReport, FetchResult, STAGING_SUFFIX, download, fetch};
