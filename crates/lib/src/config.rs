//! Configuration for the external tools vbrepo drives.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use fn_error_context::context;
use serde::{Deserialize, Serialize};
use vbrepo_utils::PathQuotedDisplay;

/// The environment variable that can be used to specify a configuration file.
pub const CONFIG_VAR: &str = "VBREPO_CONFIG";

/// Where virt-builder keeps its repository descriptors.
const DEFAULT_REPOS_DIR: &str = "/etc/virt-builder/repos.d";

/// Programs and locations used by vbrepo. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// The disk image builder.
    pub virt_builder: String,
    /// The in-place disk compaction tool.
    pub virt_sparsify: String,
    /// The stream compressor.
    pub xz: String,
    /// Index of the upstream repository, consulted for template defaults.
    pub upstream_index: Option<String>,
    /// Directory holding `<repo>.conf` repository descriptors.
    pub repos_dir: Utf8PathBuf,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            virt_builder: "virt-builder".into(),
            virt_sparsify: "virt-sparsify".into(),
            xz: "xz".into(),
            upstream_index: None,
            repos_dir: DEFAULT_REPOS_DIR.into(),
        }
    }
}

impl ToolConfig {
    /// Load the configuration from `path`, or from the file named by
    /// [`CONFIG_VAR`]. With neither set the defaults apply.
    #[context("Loading configuration")]
    pub fn load(path: Option<&Utf8Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_owned(),
            None => match std::env::var(CONFIG_VAR) {
                Ok(p) if !p.is_empty() => Utf8PathBuf::from(p),
                _ => return Ok(Self::default()),
            },
        };
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Opening {}", PathQuotedDisplay::new(&path)))?;
        let r = Self::parse(&contents)
            .with_context(|| format!("Parsing config from {}", PathQuotedDisplay::new(&path)))?;
        tracing::debug!("Loaded configuration from {path}");
        Ok(r)
    }

    fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// The descriptor file for the repository `name`.
    pub fn descriptor_path(&self, name: &str) -> Utf8PathBuf {
        self.repos_dir.join(format!("{name}.conf"))
    }
}
