//! Index entries describing one image.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};

use crate::cli::{ImageFormat, ImageOpts};
use crate::ini::Section;

/// The device virt-builder grows when no other is configured.
pub const DEFAULT_EXPAND: &str = "/dev/sda3";

/// The name an image is registered under: `<os>-<version>[-<suffix>]`.
pub fn image_name(os: &str, version: &str, suffix: Option<&str>) -> String {
    match suffix.filter(|s| !s.is_empty()) {
        Some(suffix) => format!("{os}-{version}-{suffix}"),
        None => format!("{os}-{version}"),
    }
}

impl ImageOpts {
    /// The name of the image these options describe.
    pub fn image_name(&self) -> String {
        image_name(&self.os, &self.os_version, self.suffix.as_deref())
    }

    /// The stock virt-builder template for this OS release.
    pub fn template_name(&self) -> String {
        image_name(&self.os, &self.os_version, None)
    }
}

/// A complete index entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    /// Section name in the index.
    pub name: String,
    /// Architecture.
    pub arch: String,
    /// Format of the uncompressed image.
    pub format: ImageFormat,
    /// Size of the uncompressed image in bytes.
    pub size: u64,
    /// Device to grow when the image is installed.
    pub expand: String,
    /// Basename of the compressed image.
    pub file: String,
    /// SHA-256 of the compressed image.
    pub checksum: String,
    /// Size of the compressed image in bytes.
    pub compressed_size: u64,
}

impl ImageDescriptor {
    /// The index section for this image.
    pub fn to_section(&self) -> Section {
        [
            ("arch", self.arch.clone()),
            ("format", self.format.to_string()),
            ("size", self.size.to_string()),
            ("expand", self.expand.clone()),
            ("file", self.file.clone()),
            ("checksum", self.checksum.clone()),
            ("compressed_size", self.compressed_size.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

/// A descriptor together with the compressed image it describes, still in
/// its working location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedImage {
    /// The index entry.
    pub descriptor: ImageDescriptor,
    /// Path of the compressed image.
    pub artifact: Utf8PathBuf,
}

impl PreparedImage {
    /// Pair `descriptor` with `artifact`, or `None` if `existing` already
    /// records exactly this descriptor and `repo_dir` holds its file.
    ///
    /// When nothing needs publishing the working copy at `artifact` is
    /// removed.
    pub(crate) fn unless_unchanged(
        descriptor: ImageDescriptor,
        artifact: &Utf8Path,
        existing: Option<&Section>,
        repo_dir: &Utf8Path,
    ) -> Result<Option<Self>> {
        let published = repo_dir.join(&descriptor.file);
        if existing == Some(&descriptor.to_section()) {
            if published.try_exists()? {
                tracing::info!("Image {} is unchanged", descriptor.name);
                if artifact != published.as_path() {
                    std::fs::remove_file(artifact)
                        .with_context(|| format!("Removing {artifact}"))?;
                }
                return Ok(None);
            }
            tracing::warn!("{published} is missing; publishing {} again", descriptor.name);
        }
        Ok(Some(Self {
            descriptor,
            artifact: artifact.to_owned(),
        }))
    }
}
