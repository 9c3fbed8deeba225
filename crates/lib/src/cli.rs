//! # vbrepo command line interface
//!
//! Maintains a local repository of disk images for `virt-builder`.

use camino::Utf8PathBuf;
use clap::Parser;

use crate::descriptor::DEFAULT_EXPAND;

/// Maintain a local virt-builder image repository
#[derive(Debug, Parser, PartialEq, Eq)]
#[clap(name = "vbrepo", version)]
pub struct Opt {
    /// Name of the repository to write to
    #[clap(long, global = true, default_value = "local")]
    pub repo: String,

    /// Repository descriptor file (default: `<repos_dir>/<repo>.conf`)
    #[clap(long, global = true)]
    pub repo_config: Option<Utf8PathBuf>,

    /// Tool configuration file (TOML)
    #[clap(long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Enable debug logging
    #[clap(long, global = true)]
    pub debug: bool,

    /// The operation to run
    #[clap(subcommand)]
    pub cmd: Cmd,
}

/// Repository operations
#[derive(Debug, clap::Subcommand, PartialEq, Eq)]
pub enum Cmd {
    /// Register an already-built disk image
    ///
    /// The image is compressed next to the source (which is kept), then
    /// moved into the repository and recorded in its index.
    Add(AddOpts),

    /// Build or refresh an image from its base template
    ///
    /// If the repository already carries an image with the same name it is
    /// used as the base for an incremental update, unless `--clean` is given.
    Update(UpdateOpts),

    /// List the images recorded in the repository index
    List,
}

/// Options describing the image being registered or built
#[derive(Debug, clap::Args, PartialEq, Eq)]
pub struct ImageOpts {
    /// Operating system identifier, e.g. `fedora`
    #[clap(long)]
    pub os: String,

    /// Operating system version, e.g. `40`
    #[clap(long)]
    pub os_version: String,

    /// Image architecture
    #[clap(long, default_value = "x86_64")]
    pub arch: String,

    /// Disk image format
    #[clap(long, value_enum, default_value_t = ImageFormat::Raw)]
    pub format: ImageFormat,

    /// Suffix appended to the image name
    #[clap(long)]
    pub suffix: Option<String>,
}

/// Options for registering an existing image
#[derive(Debug, Parser, PartialEq, Eq)]
pub struct AddOpts {
    /// The image being described
    #[clap(flatten)]
    pub image: ImageOpts,

    /// Device which virt-builder grows to fill the target disk
    #[clap(long, default_value = DEFAULT_EXPAND)]
    pub expand: String,

    /// Path to the disk image to add
    pub source: Utf8PathBuf,
}

/// Options for building an image
#[derive(Debug, Parser, PartialEq, Eq)]
pub struct UpdateOpts {
    /// The image being described
    #[clap(flatten)]
    pub image: ImageOpts,

    /// Build from the stock template, ignoring any registered image and the build cache
    #[clap(long)]
    pub clean: bool,

    /// Directory in which the image is built before being moved into the repository
    #[clap(long, default_value = ".")]
    pub workdir: Utf8PathBuf,
}

/// Disk image formats understood by virt-builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ImageFormat {
    /// Raw disk image
    Raw,
    /// QEMU copy-on-write image
    Qcow2,
}

impl ImageFormat {
    /// The name used on the virt-builder command line and in the index.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Raw => "raw",
            ImageFormat::Qcow2 => "qcow2",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
