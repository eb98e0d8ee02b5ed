//! Animation reconstruction for artfetch.
//!
//! A frame archive is a zip bundling `animation.json` (an ordered frame
//! list with per-frame display delays) and the referenced frame images.
//! This crate extracts such an archive into a scoped staging directory and
//! re-encodes it as a GIF, an animated PNG, or a WEBM (the latter through an
//! external encoder process), committing the result atomically.

pub mod archive;
pub mod encoder;
pub mod error;

pub use archive::{FrameArchive, FrameDescriptor, MANIFEST_NAME, probe_declared_size};
pub use encoder::{AnimationFormat, EncodeOptions, WebmConfig, encode};
pub use error::AnimError;
