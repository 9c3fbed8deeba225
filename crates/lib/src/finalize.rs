//! Publishing a prepared image into its repository.
//!
//! The compressed image is moved into place before the index is rewritten,
//! so the index never names a file the repository does not have. If the
//! index write fails the repository is left with an unreferenced file.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use fn_error_context::context;

use crate::context::RepoContext;
use crate::descriptor::PreparedImage;
use crate::index::update_index;

/// Move `src` into `dir`, keeping its file name.
#[context("Moving {} into {}", src, dir)]
fn move_into(src: &Utf8Path, dir: &Utf8Path) -> Result<Utf8PathBuf> {
    let name = src
        .file_name()
        .with_context(|| format!("No file name in {src}"))?;
    let dest = dir.join(name);
    match std::fs::rename(src, &dest) {
        Ok(()) => return Ok(dest),
        Err(e) if e.raw_os_error() == Some(libc::EXDEV) => {
            tracing::debug!("{src} and {dir} are on different filesystems; copying");
        }
        Err(e) => return Err(e.into()),
    }
    // Copy to a temporary file beside the destination so a partial copy is
    // never visible under the final name.
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    let mut f = std::fs::File::open(src).with_context(|| format!("Opening {src}"))?;
    tmp.as_file().set_permissions(f.metadata()?.permissions())?;
    std::io::copy(&mut f, tmp.as_file_mut()).context("Copying")?;
    tmp.as_file().sync_all()?;
    tmp.persist(&dest)?;
    std::fs::remove_file(src).with_context(|| format!("Removing {src}"))?;
    Ok(dest)
}

/// Move the image into the repository and record it in the index. Without a
/// prepared image nothing changes.
pub fn finalize(ctx: &RepoContext<'_>, prepared: Option<PreparedImage>) -> Result<()> {
    let Some(PreparedImage {
        descriptor,
        artifact,
    }) = prepared
    else {
        tracing::warn!(
            "No new image to publish; repository {} left unchanged",
            ctx.repo.name
        );
        return Ok(());
    };

    let dest = move_into(&artifact, &ctx.repo.dir)?;
    tracing::debug!("Moved {artifact} to {dest}");
    update_index(&ctx.repo, &descriptor.name, descriptor.to_section())?;
    tracing::info!("Published {} as {dest}", descriptor.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ImageFormat;
    use crate::descriptor::ImageDescriptor;
    use crate::testutil::{FakeRunner, Fixture};

    fn prepared(fx: &Fixture) -> Result<PreparedImage> {
        let artifact = fx.write_file("work/centos-9.xz", b"compressed")?;
        Ok(PreparedImage {
            descriptor: ImageDescriptor {
                name: "centos-9".into(),
                arch: "x86_64".into(),
                format: ImageFormat::Raw,
                size: 100,
                expand: "/dev/sda3".into(),
                file: "centos-9.xz".into(),
                checksum: "00".into(),
                compressed_size: 10,
            },
            artifact,
        })
    }

    #[test]
    fn test_finalize() -> Result<()> {
        let fx = Fixture::new(FakeRunner::default())?;
        let p = prepared(&fx)?;
        let artifact = p.artifact.clone();
        finalize(&fx.ctx(), Some(p))?;
        assert!(!artifact.exists());
        assert_eq!(std::fs::read(fx.repo_file("centos-9.xz"))?, b"compressed");
        assert!(fx.index()?.starts_with("[centos-9]\narch=x86_64\n"));
        Ok(())
    }

    #[test]
    fn test_finalize_nothing() -> Result<()> {
        let fx = Fixture::new(FakeRunner::default())?;
        finalize(&fx.ctx(), None)?;
        assert!(!fx.repo.index_path().exists());
        Ok(())
    }

    #[test]
    fn test_failed_move_leaves_index() -> Result<()> {
        let fx = Fixture::new(FakeRunner::default())?;
        std::fs::write(fx.repo.index_path(), "[fedora-40]\narch=x86_64\n")?;
        let mut p = prepared(&fx)?;
        p.artifact = fx.work().join("vanished.xz");
        let err = finalize(&fx.ctx(), Some(p)).unwrap_err();
        assert!(format!("{err:#}").contains("vanished.xz"), "{err:#}");
        assert_eq!(fx.index()?, "[fedora-40]\narch=x86_64\n");
        Ok(())
    }

    #[test]
    fn test_move_into_same_dir() -> Result<()> {
        let fx = Fixture::new(FakeRunner::default())?;
        let src = fx.write_file("repo/already-here.xz", b"data")?;
        let dest = move_into(&src, &fx.repo.dir)?;
        assert_eq!(dest, src);
        assert_eq!(std::fs::read(&dest)?, b"data");
        Ok(())
    }
}
