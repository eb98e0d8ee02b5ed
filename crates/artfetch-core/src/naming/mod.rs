//! Filesystem-safe naming for downloaded artifacts.
//!
//! Callers hand this module candidate names assembled from remote metadata
//! (titles, tags, template output). Those names routinely contain HTML
//! entities, reserved characters, and segments that are illegal on at least
//! one supported platform. `sanitize` turns such a candidate into a path the
//! host filesystem will accept, without ever touching the disk.
//!
//! # Design
//!
//! - Pure string/`PathBuf` transformations; the only environment read is the
//!   platform identity (and the working directory when resolving a relative
//!   root).
//! - Platform-specific rules are keyed on [`Platform`] so both branches stay
//!   testable from any host.
//! - The optional root directory is trusted and never sanitized.

mod error;
mod platform;
mod sanitize;
mod urls;

pub use error::NameError;
pub use platform::Platform;
pub use sanitize::{sanitize, sanitize_for};
pub use urls::{extension_from_url, filename_from_url};
