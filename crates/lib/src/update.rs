//! Building images with virt-builder.

use anyhow::{Context, Result};
use fn_error_context::context;

use crate::checksum::digest_file;
use crate::cli::UpdateOpts;
use crate::compress::compress;
use crate::context::RepoContext;
use crate::descriptor::{ImageDescriptor, PreparedImage, DEFAULT_EXPAND};
use crate::exec::ToolCommand;
use crate::lookup::{read_section, ConfigSource};

/// Root password setting; the built image has no usable root password.
const ROOT_PASSWORD: &str = "locked:disabled";

/// Fail unless virt-builder lists `template`.
#[context("Checking for template {}", template)]
fn ensure_template_known(ctx: &RepoContext<'_>, template: &str) -> Result<()> {
    let cmd = ToolCommand::new(&ctx.config.virt_builder).arg("--list");
    let out = ctx.runner.run_checked(&cmd)?;
    let known = out
        .stdout
        .lines()
        .filter_map(|l| l.split_whitespace().next())
        .any(|name| name == template);
    anyhow::ensure!(
        known,
        "Unknown base template {template}; see `{} --list`",
        ctx.config.virt_builder
    );
    Ok(())
}

/// Build the image described by `opts`, then sparsify and compress it.
///
/// An image already registered under the same name is the base for an
/// incremental build unless `opts.clean` is set, in which case the stock
/// template is used without the build cache. Returns `None` if the result
/// matches the registered entry exactly.
#[context("Updating {}", opts.image.image_name())]
pub fn update(ctx: &RepoContext<'_>, opts: &UpdateOpts) -> Result<Option<PreparedImage>> {
    let name = opts.image.image_name();
    let template = opts.image.template_name();
    let _span = tracing::info_span!("update", image = %name).entered();

    ensure_template_known(ctx, &template)?;

    let existing = read_section(&ConfigSource::Path(ctx.repo.index_path()), &name).found();
    let incremental = existing.is_some() && !opts.clean;
    let (base, mut expand) = match existing.as_ref() {
        Some(prev) if incremental => {
            tracing::info!("Updating existing image {name} incrementally");
            (name.clone(), prev.get("expand").cloned())
        }
        _ => {
            tracing::info!("Building {name} from template {template}");
            (template.clone(), None)
        }
    };
    if expand.is_none() {
        if let Some(upstream) = ctx.config.upstream_index.as_deref() {
            expand = read_section(&ConfigSource::parse(upstream), &template)
                .or_default()
                .shift_remove("expand");
        }
    }
    let expand = expand.unwrap_or_else(|| DEFAULT_EXPAND.to_string());

    let output = opts.workdir.join(&name);
    let mut build = ToolCommand::new(&ctx.config.virt_builder)
        .arg(base.as_str())
        .arg("--update")
        .args(["--output", output.as_str()])
        .args(["--root-password", ROOT_PASSWORD])
        .arg("--selinux-relabel")
        .args(["--format", opts.image.format.as_str()])
        .args(["--arch", opts.image.arch.as_str()]);
    if !incremental {
        build = build.arg("--no-cache");
    }
    ctx.runner.run_checked(&build)?;

    let sparsify = ToolCommand::new(&ctx.config.virt_sparsify)
        .arg("--in-place")
        .arg(output.as_str());
    ctx.runner.run_checked(&sparsify)?;

    let size = std::fs::metadata(&output)
        .with_context(|| format!("Querying {output}"))?
        .len();
    let artifact = compress(ctx, &output, false, true)?;
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
        expand,
        file,
        checksum: digest.sha256,
        compressed_size: digest.size,
    };
    PreparedImage::unless_unchanged(descriptor, &artifact, existing.as_ref(), &ctx.repo.dir)
}
