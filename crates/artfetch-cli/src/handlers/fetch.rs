//! The `fetch` command: sanitize the target, gate any existing file, stream
//! the payload.

use anyhow::{Context, bail};

use artfetch_core::units::{size_in_str, speed_in_str};
use artfetch_core::{DownloadTask, TransferOutcome, naming};
use artfetch_download::{FetchResult, build_client, fetch};

use crate::commands::FetchArgs;
use crate::handlers::parse_timestamp;
use crate::progress::CliProgress;

pub async fn run(args: FetchArgs) -> anyhow::Result<()> {
    let mut candidate = args
        .out
        .clone()
        .or_else(|| naming::filename_from_url(&args.url))
        .context("cannot derive a file name from the URL; pass --out")?;
    // A caller-provided name without an extension inherits the URL's.
    if !candidate.contains('.') {
        if let Some(ext) = naming::extension_from_url(&args.url) {
            candidate = format!("{candidate}.{ext}");
        }
    }
    let destination = naming::sanitize(&candidate, args.dir.as_deref())?;

    let task = DownloadTask::new(&args.url, destination)
        .with_expected_size(args.size.unwrap_or(0))
        .with_overwrite(args.overwrite);
    let set_modified = parse_timestamp(args.timestamp.as_deref())?;

    let client = build_client()?;
    let reporter = CliProgress::new();
    let result = fetch(
        &client,
        task,
        args.referer.as_deref(),
        args.backup,
        set_modified,
        &reporter,
    )
    .await?;

    match result {
        FetchResult::SkippedDuplicate { path } => {
            println!("already downloaded: {}", path.display());
        }
        FetchResult::Transferred(report) => match report.outcome {
            TransferOutcome::Completed {
                bytes_written,
                elapsed,
            } => {
                let secs = elapsed.as_secs_f64();
                println!(
                    "saved {} ({}, {})",
                    report.destination.display(),
                    size_in_str(bytes_written),
                    speed_in_str(bytes_written, secs)
                );
            }
            TransferOutcome::IncompleteKnownSize {
                bytes_written,
                expected,
            } => {
                bail!(
                    "download incomplete: {} of {} bytes from {}",
                    bytes_written,
                    expected,
                    args.url
                );
            }
            TransferOutcome::NoDataReceived => {
                bail!("no data received from {}", args.url);
            }
        },
    }
    Ok(())
}
