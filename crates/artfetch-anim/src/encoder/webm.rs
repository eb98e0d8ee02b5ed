//! WEBM backend: drive an external encoder over a generated concat script.
//!
//! The encoder's stderr is read by a dedicated task; line-buffered progress
//! lines (the ones carrying `frame=`) are forwarded through a bounded
//! channel to the caller's reporter, everything else goes to debug logging.
//! There is no timeout — the conversion is bounded by the child's own
//! runtime, and cancellation means killing the process externally.

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, Command};
use tokio::sync::mpsc;
use tracing::{debug, info};

use artfetch_core::ProgressReporter;

use crate::archive::{FrameArchive, FrameDescriptor};
use crate::error::AnimError;

/// Name of the concat script written into the staging directory.
const CONCAT_SCRIPT: &str = "i.ffconcat";

/// Substring identifying the encoder's progress lines.
const PROGRESS_MARKER: &str = "frame=";

/// Capacity of the progress-forwarding channel.
const PROGRESS_CHANNEL_CAPACITY: usize = 64;

/// External-encoder invocation settings.
#[derive(Debug, Clone)]
pub struct WebmConfig {
    /// Executable name or path.
    pub ffmpeg: String,
    /// Video codec identifier passed as `-c:v`.
    pub codec: String,
    /// Extra parameters, whitespace-split into individual arguments.
    pub params: String,
    /// Output container extension.
    pub extension: String,
}

impl Default for WebmConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            codec: "libvpx-vp9".to_string(),
            params: "-lossless 1 -vsync 2 -r 999 -pix_fmt yuv420p".to_string(),
            extension: "webm".to_string(),
        }
    }
}

pub(super) async fn encode_to(
    archive: &FrameArchive,
    temp_output: &Path,
    cfg: &WebmConfig,
    reporter: &dyn ProgressReporter,
) -> Result<(), AnimError> {
    which::which(&cfg.ffmpeg).map_err(|_| AnimError::EncoderMissing {
        program: cfg.ffmpeg.clone(),
    })?;

    let script_path = archive.staging_path().join(CONCAT_SCRIPT);
    std::fs::write(&script_path, concat_script(archive.frames()))
        .map_err(|e| AnimError::io(&script_path, e))?;

    let mut command = Command::new(&cfg.ffmpeg);
    command
        .arg("-y")
        .arg("-i")
        .arg(CONCAT_SCRIPT)
        .arg("-c:v")
        .arg(&cfg.codec)
        .args(cfg.params.split_whitespace())
        .arg(temp_output)
        // Relative frame paths in the script resolve against staging.
        .current_dir(archive.staging_path())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    info!(program = %cfg.ffmpeg, codec = %cfg.codec, "starting external encoder");
    let mut child = command.spawn().map_err(|e| AnimError::EncoderSpawn {
        program: cfg.ffmpeg.clone(),
        source: e,
    })?;

    let (tx, mut rx) = mpsc::channel::<String>(PROGRESS_CHANNEL_CAPACITY);
    let reader = match child.stderr.take() {
        Some(stderr) => Some(tokio::spawn(forward_progress(stderr, tx))),
        None => {
            drop(tx);
            None
        }
    };

    // Drain progress until the child closes its stderr, then collect the
    // exit status.
    while let Some(line) = rx.recv().await {
        reporter.message(&line);
    }
    let status = child
        .wait()
        .await
        .map_err(|e| AnimError::io(archive.staging_path(), e))?;
    if let Some(task) = reader {
        let _ = task.await;
    }

    if !status.success() {
        return Err(AnimError::EncodeProcessFailed {
            code: status.code().unwrap_or(-1),
        });
    }
    debug!(output = %temp_output.display(), "external encoder finished");
    Ok(())
}

/// Build the concat-demuxer script for the frame sequence.
///
/// The final frame is listed a second time without a duration: the demuxer
/// otherwise truncates the last segment's display time. This raises the
/// frame count by one but keeps the timing correct.
fn concat_script(frames: &[FrameDescriptor]) -> String {
    let mut script = String::from("ffconcat version 1.0\n");
    for frame in frames {
        script.push_str(&format!("file {}\n", frame.file));
        script.push_str(&format!(
            "duration {}\n",
            f64::from(frame.delay_ms) / 1000.0
        ));
    }
    if let Some(last) = frames.last() {
        script.push_str(&format!("file {}\n", last.file));
    }
    script
}

async fn forward_progress(stderr: ChildStderr, tx: mpsc::Sender<String>) {
    let mut reader = BufReader::new(stderr);
    let mut buf: Vec<u8> = Vec::with_capacity(1024);
    loop {
        buf.clear();
        // Progress lines are terminated with CR, regular log lines with LF;
        // read to CR and split on both. Lossy decoding keeps the reader
        // alive across non-UTF8 output.
        match reader.read_until(b'\r', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf);
                for segment in text.split(['\r', '\n']) {
                    let line = segment.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if line.contains(PROGRESS_MARKER) {
                        if tx.send(line.to_string()).await.is_err() {
                            return;
                        }
                    } else {
                        debug!("encoder: {line}");
                    }
                }
            }
            Err(e) => {
                debug!(error = %e, "encoder log reader exiting");
                break;
            }
        }
    }
}
