//! The animation encoder: one entry point, three backends.
//!
//! All backends share the same life cycle: extract the archive into
//! staging, encode into a temp file inside staging, atomically move the
//! result into place, and only then delete the source archive when asked
//! to. A failure at any point leaves no partial output under the final
//! name, and the staging directory is removed exactly once either way.

mod apng;
mod gif;
mod webm;

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::SystemTime;

use tracing::{error, info};

use artfetch_core::{CommittedFile, ProgressReporter};

use crate::archive::FrameArchive;
use crate::error::AnimError;

pub use webm::WebmConfig;

/// The closed set of output backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationFormat {
    /// Multi-frame GIF via an in-memory raster pass.
    #[default]
    Gif,
    /// Animated PNG, frames appended one at a time.
    Apng,
    /// WEBM via an external encoder process.
    Webm,
}

impl AnimationFormat {
    /// The file extension this backend produces. The webm extension is
    /// configurable because the external encoder accepts other containers.
    #[must_use]
    pub fn extension<'a>(&self, webm: &'a WebmConfig) -> &'a str {
        match self {
            Self::Gif => "gif",
            Self::Apng => "png",
            Self::Webm => &webm.extension,
        }
    }
}

impl fmt::Display for AnimationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gif => "gif",
            Self::Apng => "apng",
            Self::Webm => "webm",
        };
        write!(f, "{name}")
    }
}

impl FromStr for AnimationFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gif" => Ok(Self::Gif),
            "apng" => Ok(Self::Apng),
            "webm" => Ok(Self::Webm),
            other => Err(format!("unknown animation format '{other}'")),
        }
    }
}

/// Per-conversion options shared by all backends.
#[derive(Debug, Clone, Default)]
pub struct EncodeOptions {
    /// Which backend to run.
    pub format: AnimationFormat,
    /// Delete the source archive after (and only after) the output is
    /// committed.
    pub delete_source: bool,
    /// Stamp the committed file's modification time with a source-declared
    /// creation time.
    pub set_modified: Option<SystemTime>,
    /// External-encoder configuration, used by the webm backend only.
    pub webm: WebmConfig,
}

/// Reconstruct one animation from `archive_path` into `output_path`.
///
/// Returns the committed output file. On any failure nothing exists at
/// `output_path` (unless a previous file was already there) and the source
/// archive is untouched.
pub async fn encode(
    archive_path: &Path,
    output_path: &Path,
    options: &EncodeOptions,
    reporter: &dyn ProgressReporter,
) -> Result<CommittedFile, AnimError> {
    reporter.start(
        &format!(
            "converting {} to {}",
            archive_path.display(),
            options.format
        ),
        None,
    );

    match run(archive_path, output_path, options, reporter).await {
        Ok(committed) => {
            info!(
                archive = %archive_path.display(),
                output = %committed.path.display(),
                "animation exported"
            );
            reporter.finish(&format!("exported to {}", committed.path.display()));
            Ok(committed)
        }
        Err(e) => {
            error!(
                archive = %archive_path.display(),
                output = %output_path.display(),
                error = %e,
                "animation conversion failed"
            );
            reporter.finish_with_error(&format!("conversion failed: {e}"));
            Err(e)
        }
    }
}

async fn run(
    archive_path: &Path,
    output_path: &Path,
    options: &EncodeOptions,
    reporter: &dyn ProgressReporter,
) -> Result<CommittedFile, AnimError> {
    // Extraction; the archive value owns the staging directory for the
    // whole conversion.
    let archive = FrameArchive::open(archive_path)?;
    let temp_output = archive
        .staging_path()
        .join(format!("temp.{}", options.format.extension(&options.webm)));

    match options.format {
        AnimationFormat::Gif => gif::encode_to(archive.frames(), &temp_output)?,
        AnimationFormat::Apng => apng::encode_to(archive.frames(), &temp_output)?,
        AnimationFormat::Webm => {
            webm::encode_to(&archive, &temp_output, &options.webm, reporter).await?;
        }
    }

    promote(&temp_output, output_path)?;

    if options.delete_source {
        info!(archive = %archive_path.display(), "deleting source archive");
        std::fs::remove_file(archive_path).map_err(|e| AnimError::io(archive_path, e))?;
    }

    if let Some(timestamp) = options.set_modified {
        let file = std::fs::File::options()
            .write(true)
            .open(output_path)
            .map_err(|e| AnimError::io(output_path, e))?;
        let times = std::fs::FileTimes::new()
            .set_accessed(timestamp)
            .set_modified(timestamp);
        file.set_times(times)
            .map_err(|e| AnimError::io(output_path, e))?;
    }

    CommittedFile::from_path(output_path).map_err(|e| AnimError::io(output_path, e))
}

/// Move the finished temp file into place. Staging usually lives on the
/// system temp filesystem, so a plain rename can fail across devices; fall
/// back to copy-then-remove in that case.
fn promote(temp: &Path, output: &Path) -> Result<(), AnimError> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| AnimError::io(parent, e))?;
        }
    }
    if std::fs::rename(temp, output).is_ok() {
        return Ok(());
    }
    std::fs::copy(temp, output).map_err(|e| AnimError::io(output, e))?;
    std::fs::remove_file(temp).map_err(|e| AnimError::io(temp, e))?;
    Ok(())
}
