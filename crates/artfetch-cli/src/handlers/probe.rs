//! The `probe` command: print a frame archive's declared size.

use artfetch_anim::probe_declared_size;
use artfetch_core::units::size_in_str;

use crate::commands::ProbeArgs;

pub fn run(args: &ProbeArgs) -> anyhow::Result<()> {
    let size = probe_declared_size(&args.archive);
    println!(
        "{}: declared size {} ({size} bytes)",
        args.archive.display(),
        size_in_str(size)
    );
    Ok(())
}
