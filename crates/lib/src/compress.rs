//! xz compression of disk images.

use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use fn_error_context::context;

use crate::context::RepoContext;
use crate::exec::ToolCommand;

/// virt-builder can only seek within xz files that have multiple blocks.
const XZ_BLOCK_SIZE: u64 = 16 * 1024 * 1024;

/// The path xz writes when compressing `input`.
pub fn xz_path(input: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{input}.xz"))
}

/// Compress `input` to `<input>.xz`, returning the compressed path.
///
/// When the output exists already and `force` is unset, it is returned as is
/// and the compressor does not run.
#[context("Compressing {}", input)]
pub fn compress(
    ctx: &RepoContext<'_>,
    input: &Utf8Path,
    keep: bool,
    force: bool,
) -> Result<Utf8PathBuf> {
    let output = xz_path(input);
    if !force && output.try_exists()? {
        tracing::info!("Reusing existing {output}");
        return Ok(output);
    }

    let mut cmd = ToolCommand::new(&ctx.config.xz)
        .arg("--best")
        .arg(format!("--block-size={XZ_BLOCK_SIZE}"));
    if keep {
        cmd = cmd.arg("--keep");
    }
    if force {
        cmd = cmd.arg("--force");
    }
    let cmd = cmd.arg(input.as_str());

    tracing::info!("Compressing {input}");
    ctx.runner.run_checked(&cmd)?;
    anyhow::ensure!(
        output.try_exists()?,
        "{} succeeded but did not create {output}",
        ctx.config.xz
    );
    Ok(output)
}
