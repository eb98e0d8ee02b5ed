//! The `convert` command: frame archive in, animation file out.

use artfetch_anim::{EncodeOptions, WebmConfig, encode};
use artfetch_core::units::size_in_str;

use crate::commands::ConvertArgs;
use crate::handlers::parse_timestamp;
use crate::progress::CliProgress;

pub async fn run(args: ConvertArgs) -> anyhow::Result<()> {
    let webm = WebmConfig {
        ffmpeg: args.ffmpeg.clone(),
        codec: args.codec.clone(),
        params: args.params.clone(),
        extension: args.extension.clone(),
    };
    let output = args
        .out
        .clone()
        .unwrap_or_else(|| args.archive.with_extension(args.format.extension(&webm)));

    let options = EncodeOptions {
        format: args.format,
        delete_source: args.delete_source,
        set_modified: parse_timestamp(args.timestamp.as_deref())?,
        webm,
    };

    let reporter = CliProgress::new();
    let committed = encode(&args.archive, &output, &options, &reporter).await?;
    println!(
        "exported {} ({})",
        committed.path.display(),
        size_in_str(committed.len)
    );
    Ok(())
}
