//! Locating repositories on disk.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use fn_error_context::context;

use crate::ini::IniDocument;

/// The index file inside a repository directory.
pub const INDEX_FILE: &str = "index";

/// A filesystem-backed virt-builder repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    /// Name, as in the repository descriptor.
    pub name: String,
    /// Directory holding the index and the compressed images.
    pub dir: Utf8PathBuf,
}

impl Repository {
    /// Look up repository `name` in the descriptor file at `descriptor`.
    ///
    /// The descriptor's `uri` must be a `file://` URI; it may name either the
    /// directory or the index file within it.
    #[context("Resolving repository {}", name)]
    pub fn resolve(name: &str, descriptor: &Utf8Path) -> Result<Self> {
        let contents = std::fs::read_to_string(descriptor)
            .with_context(|| format!("Reading {descriptor}"))?;
        let doc = IniDocument::parse(&contents).with_context(|| format!("Parsing {descriptor}"))?;
        let section = doc
            .section(name)
            .with_context(|| format!("No section [{name}] in {descriptor}"))?;
        let uri = section
            .get("uri")
            .with_context(|| format!("No uri for [{name}] in {descriptor}"))?;
        let dir = dir_from_uri(uri)?;
        tracing::debug!("Repository {name} is at {dir}");
        Ok(Self {
            name: name.to_string(),
            dir,
        })
    }

    /// Path of the repository index.
    pub fn index_path(&self) -> Utf8PathBuf {
        self.dir.join(INDEX_FILE)
    }
}

fn dir_from_uri(uri: &str) -> Result<Utf8PathBuf> {
    let Some(path) = uri.strip_prefix("file://") else {
        anyhow::bail!("Repository URI {uri} is not local; only file:// URIs are supported");
    };
    let path = match path.strip_suffix("/index") {
        Some("") => "/",
        Some(p) => p,
        None => path,
    };
    let path = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };
    anyhow::ensure!(!path.is_empty(), "Repository URI {uri} has no path");
    Ok(path.into())
}
