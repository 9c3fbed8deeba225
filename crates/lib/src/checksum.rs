//! Content digests of image files.

use std::fs::File;
use std::io::Read;

use anyhow::{Context, Result};
use camino::Utf8Path;
use fn_error_context::context;
use openssl::hash::{Hasher, MessageDigest};

/// Files are hashed in chunks of this size; disk images are far too large to
/// read into memory.
const CHUNK_SIZE: usize = 64 * 1024;

/// The SHA-256 digest and length of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigest {
    /// Lowercase hex SHA-256.
    pub sha256: String,
    /// Length in bytes.
    pub size: u64,
}

/// Compute the digest and size of the file at `path`.
#[context("Computing checksum of {}", path)]
pub fn digest_file(path: &Utf8Path) -> Result<FileDigest> {
    let mut f = File::open(path).with_context(|| format!("Opening {path}"))?;
    let mut hasher = Hasher::new(MessageDigest::sha256())?;
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut size = 0u64;
    loop {
        let n = match f.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).with_context(|| format!("Reading {path}")),
        };
        hasher.update(&buf[..n])?;
        size += n as u64;
    }
    let sha256 = hex::encode(hasher.finish()?);
    tracing::debug!("{path}: sha256 {sha256}, {size} bytes");
    Ok(FileDigest { sha256, size })
}
