//! Registering an image that was built elsewhere.

use anyhow::{Context, Result};
use fn_error_context::context;

use crate::checksum::digest_file;
use crate::cli::AddOpts;
use crate::compress::compress;
use crate::context::RepoContext;
use crate::descriptor::{ImageDescriptor, PreparedImage};
use crate::lookup::{read_section, ConfigSource};

/// Compress and describe the image at `opts.source`.
///
/// The source is kept; its compressed copy is written next to it. Returns
/// `None` if the repository already records an identical entry and holds
/// its file.
#[context("Adding {}", opts.source)]
pub fn add(ctx: &RepoContext<'_>, opts: &AddOpts) -> Result<Option<PreparedImage>> {
    let name = opts.image.image_name();
    let _span = tracing::info_span!("add", image = %name).entered();

    let size = std::fs::metadata(&opts.source)
        .with_context(|| format!("Querying {}", opts.source))?
        .len();
    let artifact = compress(ctx, &opts.source, true, false)?;
    let digest = digest_file(&artifact)?;
    let file = artifact
        .file_name()
        .with_context(|| format!("No file name in {artifact}"))?
        .to_string();

    let descriptor = ImageDescriptor {
        name,
        arch: opts.image.arch.clone(),
        format: opts.image.format,
        size,
        expand: opts.expand.clone(),
        file,
        checksum: digest.sha256,
        compressed_size: digest.size,
    };
    let existing = read_section(
        &ConfigSource::Path(ctx.repo.index_path()),
        &descriptor.name,
    )
    .found();
    PreparedImage::unless_unchanged(descriptor, &artifact, existing.as_ref(), &ctx.repo.dir)
}
