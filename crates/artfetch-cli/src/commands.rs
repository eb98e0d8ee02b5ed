//! Command-line definition for the artfetch tool.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use artfetch_anim::AnimationFormat;

/// Fetch media artifacts and rebuild frame-archive animations.
#[derive(Parser)]
#[command(name = "artfetch", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Download one asset to a sanitized destination path
    Fetch(FetchArgs),

    /// Rebuild a frame archive into a playable animation file
    Convert(ConvertArgs),

    /// Print the declared size of a frame archive
    Probe(ProbeArgs),
}

#[derive(Args)]
pub struct FetchArgs {
    /// Source URL of the asset
    pub url: String,

    /// Candidate file name (sanitized before use); defaults to the URL's
    /// last path segment
    #[arg(short, long)]
    pub out: Option<String>,

    /// Directory the destination is resolved against (taken as-is)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Declared payload size in bytes; probed from the server when omitted
    #[arg(long)]
    pub size: Option<u64>,

    /// Replace an existing file at the destination
    #[arg(long)]
    pub overwrite: bool,

    /// Rename a stale existing file aside instead of deleting it
    #[arg(long)]
    pub backup: bool,

    /// Referer header to send with the request
    #[arg(long)]
    pub referer: Option<String>,

    /// Stamp the downloaded file's modification time (RFC 3339)
    #[arg(long)]
    pub timestamp: Option<String>,
}

#[derive(Args)]
pub struct ConvertArgs {
    /// The frame archive (zip) to rebuild
    pub archive: PathBuf,

    /// Output file; defaults to the archive name with the backend extension
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Output backend: gif, apng or webm
    #[arg(short, long, default_value = "gif")]
    pub format: AnimationFormat,

    /// Delete the source archive after a successful export
    #[arg(long)]
    pub delete_source: bool,

    /// External encoder executable (webm backend)
    #[arg(long, default_value = "ffmpeg")]
    pub ffmpeg: String,

    /// Video codec handed to the external encoder (webm backend)
    #[arg(long, default_value = "libvpx-vp9")]
    pub codec: String,

    /// Extra encoder parameters, whitespace-separated (webm backend)
    #[arg(
        long,
        default_value = "-lossless 1 -vsync 2 -r 999 -pix_fmt yuv420p",
        allow_hyphen_values = true
    )]
    pub params: String,

    /// Output container extension used by the external encoder
    #[arg(long, default_value = "webm")]
    pub extension: String,

    /// Stamp the output file's modification time (RFC 3339)
    #[arg(long)]
    pub timestamp: Option<String>,
}

#[derive(Args)]
pub struct ProbeArgs {
    /// The frame archive (zip) to inspect
    pub archive: PathBuf,
}
