//! Names derived from a source locator.
//!
//! The downloader falls back to these when the caller-provided destination
//! cannot be created, and the CLI uses them to pick default output names.

/// The extension implied by a URL's final path segment: everything after the
/// last `.`, with any `?query` suffix stripped.
///
/// Returns `None` when the tail is not a plausible extension (no dot, or the
/// dot belongs to an earlier path segment / the host name).
#[must_use]
pub fn extension_from_url(url: &str) -> Option<String> {
    let (_, tail) = url.rsplit_once('.')?;
    let ext = tail.split('?').next().unwrap_or("");
    if ext.is_empty() || ext.contains('/') {
        return None;
    }
    Some(ext.to_string())
}

/// The file name implied by a URL: its last path segment with any `?query`
/// suffix stripped.
#[must_use]
pub fn filename_from_url(url: &str) -> Option<String> {
    let tail = url.rsplit('/').next()?;
    let name = tail.split('?').next().unwrap_or("");
    if name.is_empty() {
        return None;
    }
    Some(name.to_string())
}
