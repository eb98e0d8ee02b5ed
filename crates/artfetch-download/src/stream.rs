//! Streamed transfer into a staging file with atomic promotion.
//!
//! Bytes never land under the final name until the transfer is verified
//! complete: the copy goes to `destination + ".part"`, and only a
//! `Completed` outcome renames it into place. Every other outcome (short
//! stream, empty stream, transport error) deletes the staging file and
//! leaves the destination exactly as it was.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

use artfetch_core::units::speed_in_str;
use artfetch_core::{CommittedFile, DownloadTask, ProgressReporter, TransferOutcome, naming};

use crate::client;
use crate::error::DownloadError;
use crate::gate::{self, GateDecision};

/// Suffix of the staging sibling a transfer writes into.
pub const STAGING_SUFFIX: &str = ".part";

/// What one finished (or skipped) fetch left on disk.
#[derive(Debug)]
pub struct DownloadReport {
    /// How the byte copy terminated.
    pub outcome: TransferOutcome,
    /// The destination actually used — differs from the task's when staging
    /// creation fell back to a URL-derived name in the working directory.
    pub destination: PathBuf,
    /// The committed artifact, present only for complete transfers.
    pub committed: Option<CommittedFile>,
}

/// Result of the full gate-then-download sequence.
#[derive(Debug)]
pub enum FetchResult {
    /// An identical-size file was already present; nothing was transferred.
    SkippedDuplicate {
        /// The untouched existing file.
        path: PathBuf,
    },
    /// A transfer ran; see the report for its outcome.
    Transferred(DownloadReport),
}

/// Copy `stream` into the task's destination via a staging file.
///
/// Progress is reported after every chunk. Termination:
/// - declared size reached → `Completed`,
/// - stream exhausted with bytes written → `Completed` (unknown size) or
///   `IncompleteKnownSize` (known size, short),
/// - stream exhausted with nothing written → `NoDataReceived`.
///
/// On completion, an existing destination is removed first when the task
/// requested overwrite, then the staging file is renamed into place and the
/// modification time optionally stamped with `set_modified`.
pub async fn download<S, E>(
    task: &DownloadTask,
    mut stream: S,
    set_modified: Option<SystemTime>,
    reporter: &dyn ProgressReporter,
) -> Result<DownloadReport, DownloadError>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    let (mut file, destination, staging) = create_staging(task).await?;
    let total = task.known_size();
    reporter.start(&format!("downloading {}", destination.display()), total);

    let started = Instant::now();
    let mut written: u64 = 0;
    let copy_result = loop {
        match stream.next().await {
            Some(Ok(chunk)) => {
                if let Err(e) = file.write_all(&chunk).await {
                    break Err(DownloadError::io(&staging, e));
                }
                written += chunk.len() as u64;
                reporter.update(written, total);
                if let Some(expected) = total {
                    if written >= expected {
                        break Ok(TransferOutcome::Completed {
                            bytes_written: written,
                            elapsed: started.elapsed(),
                        });
                    }
                }
            }
            Some(Err(e)) => {
                break Err(DownloadError::network(task.url.as_str(), e.to_string()));
            }
            None => {
                break Ok(match (written, total) {
                    (0, _) => TransferOutcome::NoDataReceived,
                    (written, Some(expected)) if written < expected => {
                        TransferOutcome::IncompleteKnownSize {
                            bytes_written: written,
                            expected,
                        }
                    }
                    (written, _) => TransferOutcome::Completed {
                        bytes_written: written,
                        elapsed: started.elapsed(),
                    },
                });
            }
        }
    };

    // The staging handle must be closed on every exit path before the file
    // is renamed or deleted.
    if let Ok(TransferOutcome::Completed { .. }) = &copy_result {
        file.flush()
            .await
            .map_err(|e| DownloadError::io(&staging, e))?;
    }
    drop(file);

    let outcome = match copy_result {
        Ok(outcome) => outcome,
        Err(e) => {
            discard_staging(&staging);
            reporter.finish_with_error(&format!("download failed: {e}"));
            return Err(e);
        }
    };

    if let TransferOutcome::Completed {
        bytes_written,
        elapsed,
    } = &outcome
    {
        promote(task, &staging, &destination, set_modified)?;
        let secs = elapsed.as_secs_f64();
        reporter.finish(&format!(
            "completed in {secs:.2}s ({})",
            speed_in_str(*bytes_written, secs)
        ));
        let committed =
            CommittedFile::from_path(&destination).map_err(|e| DownloadError::io(&destination, e))?;
        return Ok(DownloadReport {
            outcome,
            destination,
            committed: Some(committed),
        });
    }

    discard_staging(&staging);
    match &outcome {
        TransferOutcome::IncompleteKnownSize {
            bytes_written,
            expected,
        } => {
            error!(
                url = %task.url,
                path = %destination.display(),
                bytes_written,
                expected,
                "downloaded file incomplete"
            );
            reporter.finish_with_error(&format!(
                "incomplete: {bytes_written} of {expected} bytes"
            ));
        }
        TransferOutcome::NoDataReceived => {
            error!(url = %task.url, path = %destination.display(), "no data received");
            reporter.finish_with_error("no data received");
        }
        TransferOutcome::Completed { .. } => unreachable!("handled above"),
    }
    Ok(DownloadReport {
        outcome,
        destination,
        committed: None,
    })
}

/// Run the whole fetch sequence: probe the declared size when the caller
/// does not know it, gate any existing destination file, then stream the
/// payload.
pub async fn fetch(
    http: &reqwest::Client,
    mut task: DownloadTask,
    referer: Option<&str>,
    backup_stale: bool,
    set_modified: Option<SystemTime>,
    reporter: &dyn ProgressReporter,
) -> Result<FetchResult, DownloadError> {
    if task.expected_size == 0 {
        // Best-effort: a host that rejects HEAD just leaves the size unknown.
        match client::probe_content_length(http, &task.url, referer).await {
            Ok(Some(length)) => task.expected_size = length,
            Ok(None) => {}
            Err(e) => warn!(url = %task.url, error = %e, "size probe failed"),
        }
    }

    if task.destination.exists() {
        match gate::check_existing(
            &task.destination,
            task.overwrite,
            task.expected_size,
            backup_stale,
        )? {
            GateDecision::SkipDuplicate => {
                return Ok(FetchResult::SkippedDuplicate {
                    path: task.destination,
                });
            }
            GateDecision::ProceedAfterBackup { .. } | GateDecision::ProceedAfterDelete => {}
        }
    }

    let response = client::open_stream(http, &task.url, referer).await?;
    let report = download(&task, response.bytes_stream(), set_modified, reporter).await?;
    Ok(FetchResult::Transferred(report))
}

/// Open the staging file, creating parent directories first.
///
/// When that fails, recover once: derive a name from the URL's last path
/// segment, sanitize it, and stage in the current working directory.
async fn create_staging(task: &DownloadTask) -> Result<(File, PathBuf, PathBuf), DownloadError> {
    match open_staging(&task.destination).await {
        Ok(file) => {
            let staging = staging_path(&task.destination);
            Ok((file, task.destination.clone(), staging))
        }
        Err(first_failure) => {
            warn!(
                url = %task.url,
                destination = %task.destination.display(),
                error = %first_failure,
                "cannot create staging file, falling back to a URL-derived name"
            );
            let fallback_name = naming::filename_from_url(&task.url)
                .unwrap_or_else(|| "download".to_string());
            let fallback = naming::sanitize(&fallback_name, None)?;
            let file = open_staging(&fallback).await.map_err(|_| {
                DownloadError::StagingCreate {
                    destination: task.destination.clone(),
                    source: first_failure,
                }
            })?;
            info!(path = %fallback.display(), "file will be saved to the working directory");
            let staging = staging_path(&fallback);
            Ok((file, fallback, staging))
        }
    }
}

async fn open_staging(destination: &Path) -> io::Result<File> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            info!(directory = %parent.display(), "creating directory");
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    File::create(staging_path(destination)).await
}

fn staging_path(destination: &Path) -> PathBuf {
    let mut staged = destination.as_os_str().to_owned();
    staged.push(STAGING_SUFFIX);
    PathBuf::from(staged)
}

fn promote(
    task: &DownloadTask,
    staging: &Path,
    destination: &Path,
    set_modified: Option<SystemTime>,
) -> Result<(), DownloadError> {
    if task.overwrite && destination.exists() {
        std::fs::remove_file(destination).map_err(|e| DownloadError::io(destination, e))?;
    }
    std::fs::rename(staging, destination).map_err(|e| DownloadError::io(destination, e))?;

    if let Some(timestamp) = set_modified {
        let file = std::fs::File::options()
            .write(true)
            .open(destination)
            .map_err(|e| DownloadError::io(destination, e))?;
        let times = std::fs::FileTimes::new()
            .set_accessed(timestamp)
            .set_modified(timestamp);
        file.set_times(times)
            .map_err(|e| DownloadError::io(destination, e))?;
    }
    Ok(())
}

fn discard_staging(staging: &Path) {
    if let Err(e) = std::fs::remove_file(staging) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(path = %staging.display(), error = %e, "could not remove staging file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artfetch_core::NoopProgress;
    use artfetch_core::progress::test_utils::{ProgressEvent, RecordingReporter};
    use futures_util::stream;
    use std::convert::Infallible;

    fn chunks(parts: &[&[u8]]) -> impl Stream<Item = Result<Bytes, Infallible>> + Unpin {
        stream::iter(
            parts
                .iter()
                .map(|p| Ok(Bytes::copy_from_slice(p)))
                .collect::<Vec<_>>(),
        )
    }

    #[tokio::test]
    async fn known_size_download_commits_exact_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("art.png");
        let task = DownloadTask::new("https://img.example.net/art.png", &dest)
            .with_expected_size(10);

        let report = download(&task, chunks(&[b"12345", b"67890"]), None, &NoopProgress)
            .await
            .unwrap();

        assert!(matches!(
            report.outcome,
            TransferOutcome::Completed { bytes_written: 10, .. }
        ));
        assert_eq!(std::fs::read(&dest).unwrap().len(), 10);
        assert!(!staging_path(&dest).exists());
        assert_eq!(report.committed.unwrap().len, 10);
    }

    #[tokio::test]
    async fn short_stream_discards_staging_and_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("art.png");
        let task = DownloadTask::new("https://img.example.net/art.png", &dest)
            .with_expected_size(1000);

        let report = download(&task, chunks(&[&[0u8; 800]]), None, &NoopProgress)
            .await
            .unwrap();

        assert_eq!(
            report.outcome,
            TransferOutcome::IncompleteKnownSize {
                bytes_written: 800,
                expected: 1000
            }
        );
        assert!(!dest.exists());
        assert!(!staging_path(&dest).exists());
        assert!(report.committed.is_none());
    }

    #[tokio::test]
    async fn empty_stream_reports_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("art.png");
        let task = DownloadTask::new("https://img.example.net/art.png", &dest);

        let report = download(&task, chunks(&[]), None, &NoopProgress)
            .await
            .unwrap();

        assert_eq!(report.outcome, TransferOutcome::NoDataReceived);
        assert!(!dest.exists());
        assert!(!staging_path(&dest).exists());
    }

    #[tokio::test]
    async fn unknown_size_completes_on_stream_end() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("art.bin");
        let task = DownloadTask::new("https://img.example.net/art.bin", &dest);

        let report = download(&task, chunks(&[b"abc", b"defg"]), None, &NoopProgress)
            .await
            .unwrap();

        assert!(matches!(
            report.outcome,
            TransferOutcome::Completed { bytes_written: 7, .. }
        ));
        assert_eq!(std::fs::read(&dest).unwrap(), b"abcdefg");
    }

    #[tokio::test]
    async fn overwrite_replaces_the_previous_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("art.png");
        std::fs::write(&dest, b"stale contents").unwrap();

        let task = DownloadTask::new("https://img.example.net/art.png", &dest)
            .with_expected_size(5)
            .with_overwrite(true);
        let report = download(&task, chunks(&[b"fresh"]), None, &NoopProgress)
            .await
            .unwrap();

        assert!(report.outcome.is_complete());
        assert_eq!(std::fs::read(&dest).unwrap(), b"fresh");
    }

    #[tokio::test]
    async fn parent_directories_are_created_for_the_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("artist").join("title").join("art.png");
        let task = DownloadTask::new("https://img.example.net/art.png", &dest)
            .with_expected_size(3);

        let report = download(&task, chunks(&[b"abc"]), None, &NoopProgress)
            .await
            .unwrap();
        assert!(report.outcome.is_complete());
        assert!(dest.exists());
    }

    #[tokio::test]
    async fn progress_updates_carry_the_known_total() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("art.png");
        let task = DownloadTask::new("https://img.example.net/art.png", &dest)
            .with_expected_size(6);
        let reporter = RecordingReporter::new();

        download(&task, chunks(&[b"abc", b"def"]), None, &reporter)
            .await
            .unwrap();

        let events = reporter.events();
        assert!(matches!(
            events.first(),
            Some(ProgressEvent::Started { total: Some(6), .. })
        ));
        assert!(events.contains(&ProgressEvent::Updated {
            current: 3,
            total: Some(6)
        }));
        assert!(events.contains(&ProgressEvent::Updated {
            current: 6,
            total: Some(6)
        }));
        assert!(matches!(events.last(), Some(ProgressEvent::Finished(_))));
    }

    #[tokio::test]
    async fn progress_updates_without_total_stay_indeterminate() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("art.png");
        let task = DownloadTask::new("https://img.example.net/art.png", &dest);
        let reporter = RecordingReporter::new();

        download(&task, chunks(&[b"abc"]), None, &reporter)
            .await
            .unwrap();

        let events = reporter.events();
        assert!(matches!(
            events.first(),
            Some(ProgressEvent::Started { total: None, .. })
        ));
        assert!(events.contains(&ProgressEvent::Updated {
            current: 3,
            total: None
        }));
    }

    #[tokio::test]
    async fn modified_time_is_stamped_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("art.png");
        let task = DownloadTask::new("https://img.example.net/art.png", &dest)
            .with_expected_size(3);
        let stamp = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_500_000_000);

        download(&task, chunks(&[b"abc"]), Some(stamp), &NoopProgress)
            .await
            .unwrap();

        let modified = std::fs::metadata(&dest).unwrap().modified().unwrap();
        assert_eq!(modified, stamp);
    }

    #[tokio::test]
    async fn staging_create_failure_falls_back_to_url_name_in_cwd() {
        let dir = tempfile::tempdir().unwrap();
        // Make the destination's parent an existing *file* so directory
        // creation fails.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        let dest = blocker.join("art.png");

        let cwd = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();
        let task = DownloadTask::new("https://img.example.net/fallback_name.png?v=2", &dest)
            .with_expected_size(3);
        let report = download(&task, chunks(&[b"abc"]), None, &NoopProgress).await;
        std::env::set_current_dir(cwd).unwrap();

        let report = report.unwrap();
        assert!(report.outcome.is_complete());
        assert_eq!(
            report.destination.file_name().unwrap().to_string_lossy(),
            "fallback_name.png"
        );
        assert!(dir.path().join("fallback_name.png").exists());
    }
}
