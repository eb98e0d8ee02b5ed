//! Frame archive reading.
//!
//! The manifest's frame list is the only source of truth for playback
//! order. Directory-listing order of the extracted files is never
//! consulted, and frames are neither reordered nor deduplicated.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tempfile::TempDir;
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::error::AnimError;

/// Name of the manifest entry at the archive root.
pub const MANIFEST_NAME: &str = "animation.json";

/// One frame of an animation, in playback order.
#[derive(Debug, Clone)]
pub struct FrameDescriptor {
    /// The image's manifest-relative file name (used by the concat script).
    pub file: String,
    /// The extracted image on disk.
    pub path: PathBuf,
    /// Display duration in milliseconds; always positive.
    pub delay_ms: u32,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    frames: Vec<ManifestFrame>,
    #[serde(rename = "zipSize")]
    zip_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ManifestFrame {
    file: String,
    delay: u32,
}

/// A frame archive extracted into a scoped staging directory.
///
/// The staging directory lives exactly as long as this value; dropping it
/// removes the extracted tree recursively, on success and failure paths
/// alike.
#[derive(Debug)]
pub struct FrameArchive {
    staging: TempDir,
    frames: Vec<FrameDescriptor>,
}

impl FrameArchive {
    /// Extract `path` and parse its manifest.
    ///
    /// Anything that prevents treating the file as a frame archive — an
    /// unreadable zip, a missing or malformed manifest, a listed frame that
    /// is not present, a non-positive delay — is `CorruptArchive`.
    pub fn open(path: &Path) -> Result<Self, AnimError> {
        let file = fs::File::open(path).map_err(|e| AnimError::io(path, e))?;
        let mut zip =
            ZipArchive::new(file).map_err(|e| AnimError::corrupt(path, e.to_string()))?;

        let staging = tempfile::Builder::new()
            .prefix("artfetch-anim-")
            .tempdir()
            .map_err(|e| AnimError::io(path, e))?;
        zip.extract(staging.path())
            .map_err(|e| AnimError::corrupt(path, e.to_string()))?;
        debug!(archive = %path.display(), staging = %staging.path().display(), "extracted frame archive");

        let manifest_path = staging.path().join(MANIFEST_NAME);
        let manifest_bytes = fs::read(&manifest_path)
            .map_err(|_| AnimError::corrupt(path, format!("missing {MANIFEST_NAME}")))?;
        let manifest: Manifest = serde_json::from_slice(&manifest_bytes)
            .map_err(|e| AnimError::corrupt(path, format!("malformed manifest: {e}")))?;
        if manifest.frames.is_empty() {
            return Err(AnimError::corrupt(path, "manifest lists no frames"));
        }

        let mut frames = Vec::with_capacity(manifest.frames.len());
        for entry in manifest.frames {
            if entry.delay == 0 {
                return Err(AnimError::corrupt(
                    path,
                    format!("non-positive delay for frame '{}'", entry.file),
                ));
            }
            let frame_path = staging.path().join(&entry.file);
            if !frame_path.is_file() {
                return Err(AnimError::corrupt(
                    path,
                    format!("frame '{}' listed but not present", entry.file),
                ));
            }
            frames.push(FrameDescriptor {
                file: entry.file,
                path: frame_path,
                delay_ms: entry.delay,
            });
        }

        Ok(Self { staging, frames })
    }

    /// The frames in manifest (= playback) order.
    #[must_use]
    pub fn frames(&self) -> &[FrameDescriptor] {
        &self.frames
    }

    /// The staging directory the archive was extracted into.
    #[must_use]
    pub fn staging_path(&self) -> &Path {
        self.staging.path()
    }
}

/// Best-effort declared total size of an archive, for display purposes.
///
/// Reads the manifest's `zipSize` field; when the archive or manifest is
/// unreadable for this purpose, falls back to the file's on-disk size
/// instead of failing the caller.
#[must_use]
pub fn probe_declared_size(path: &Path) -> u64 {
    match read_zip_size(path) {
        Some(size) => size,
        None => {
            warn!(
                archive = %path.display(),
                "could not read declared size from manifest, using file size"
            );
            fs::metadata(path).map(|m| m.len()).unwrap_or(0)
        }
    }
}

fn read_zip_size(path: &Path) -> Option<u64> {
    let file = fs::File::open(path).ok()?;
    let mut zip = ZipArchive::new(file).ok()?;
    let mut entry = zip.by_name(MANIFEST_NAME).ok()?;
    let mut bytes = Vec::new();
    std::io::Read::read_to_end(&mut entry, &mut bytes).ok()?;
    let manifest: Manifest = serde_json::from_slice(&bytes).ok()?;
    manifest.zip_size
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_archive(path: &Path, manifest: &str, files: &[(&str, &[u8])]) {
        let file = fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        writer.start_file(MANIFEST_NAME, options).unwrap();
        writer.write_all(manifest.as_bytes()).unwrap();
        for (name, bytes) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(bytes).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn frames_come_out_in_manifest_order_not_name_order() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("anim.zip");
        write_archive(
            &archive,
            r#"{"frames":[{"file":"z.png","delay":100},{"file":"a.png","delay":200},{"file":"m.png","delay":150}]}"#,
            &[("a.png", b"a"), ("m.png", b"m"), ("z.png", b"z")],
        );

        let opened = FrameArchive::open(&archive).unwrap();
        let order: Vec<(&str, u32)> = opened
            .frames()
            .iter()
            .map(|f| (f.file.as_str(), f.delay_ms))
            .collect();
        assert_eq!(order, vec![("z.png", 100), ("a.png", 200), ("m.png", 150)]);
    }

    #[test]
    fn staging_is_removed_when_the_archive_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("anim.zip");
        write_archive(
            &archive,
            r#"{"frames":[{"file":"f.png","delay":100}]}"#,
            &[("f.png", b"f")],
        );

        let opened = FrameArchive::open(&archive).unwrap();
        let staging = opened.staging_path().to_path_buf();
        assert!(staging.exists());
        drop(opened);
        assert!(!staging.exists());
    }

    #[test]
    fn a_non_zip_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("anim.zip");
        fs::write(&archive, b"definitely not a zip").unwrap();

        let err = FrameArchive::open(&archive).unwrap_err();
        assert!(matches!(err, AnimError::CorruptArchive { .. }));
    }

    #[test]
    fn a_missing_manifest_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("anim.zip");
        let file = fs::File::create(&archive).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("frame.png", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"f").unwrap();
        writer.finish().unwrap();

        let err = FrameArchive::open(&archive).unwrap_err();
        assert!(matches!(err, AnimError::CorruptArchive { .. }));
    }

    #[test]
    fn a_zero_delay_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("anim.zip");
        write_archive(
            &archive,
            r#"{"frames":[{"file":"f.png","delay":0}]}"#,
            &[("f.png", b"f")],
        );

        let err = FrameArchive::open(&archive).unwrap_err();
        assert!(matches!(err, AnimError::CorruptArchive { .. }));
    }

    #[test]
    fn a_listed_but_absent_frame_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("anim.zip");
        write_archive(
            &archive,
            r#"{"frames":[{"file":"ghost.png","delay":100}]}"#,
            &[("real.png", b"r")],
        );

        let err = FrameArchive::open(&archive).unwrap_err();
        assert!(matches!(err, AnimError::CorruptArchive { .. }));
    }

    #[test]
    fn declared_size_prefers_the_manifest_field() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("anim.zip");
        write_archive(
            &archive,
            r#"{"frames":[{"file":"f.png","delay":100}],"zipSize":123456}"#,
            &[("f.png", b"f")],
        );
        assert_eq!(probe_declared_size(&archive), 123_456);
    }

    #[test]
    fn declared_size_falls_back_to_the_file_size() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("anim.zip");
        fs::write(&archive, b"not a zip at all").unwrap();
        assert_eq!(probe_declared_size(&archive), 16);
    }
}
