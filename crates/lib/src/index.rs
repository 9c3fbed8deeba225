//! Rewriting repository indexes.
//!
//! The index is always rewritten in full. Writes are atomic, and concurrent
//! vbrepo processes serialize on an advisory lock in the repository
//! directory; nothing protects against other programs editing the index.

use anyhow::{Context, Result};
use cap_std_ext::cap_std;
use cap_std_ext::cap_std::fs::{Dir, File, OpenOptions, PermissionsExt};
use cap_std_ext::dirext::CapStdExtDirExt;
use fn_error_context::context;
use rustix::fs::FlockOperation;

use crate::ini::{IniDocument, Section};
use crate::repo::{Repository, INDEX_FILE};

/// Lock file guarding index updates.
const LOCK_FILE: &str = ".vbrepo.lock";

/// virt-builder may run as any user, so the index must be world readable.
const INDEX_MODE: u32 = 0o644;

fn open_repo_dir(repo: &Repository) -> Result<Dir> {
    Dir::open_ambient_dir(&repo.dir, cap_std::ambient_authority())
        .with_context(|| format!("Opening repository directory {}", repo.dir))
}

/// Exclusive lock on a repository, released on drop.
#[derive(Debug)]
struct RepoLock {
    _file: File,
}

impl RepoLock {
    fn acquire(dir: &Dir) -> Result<Self> {
        let f = dir
            .open_with(LOCK_FILE, OpenOptions::new().create(true).write(true))
            .with_context(|| format!("Opening {LOCK_FILE}"))?;
        tracing::trace!("Waiting for {LOCK_FILE}");
        rustix::fs::flock(&f, FlockOperation::LockExclusive)
            .with_context(|| format!("Locking {LOCK_FILE}"))?;
        Ok(Self { _file: f })
    }
}

fn read_index(dir: &Dir) -> Result<IniDocument> {
    let contents = match dir.read_to_string(INDEX_FILE) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No index yet");
            return Ok(IniDocument::default());
        }
        Err(e) => return Err(e).context("Reading index"),
    };
    IniDocument::parse(&contents).context("Parsing index")
}

/// Load the index of `repo`. A repository without an index is empty.
#[context("Loading index of repository {}", repo.name)]
pub fn load_index(repo: &Repository) -> Result<IniDocument> {
    read_index(&open_repo_dir(repo)?)
}

/// Replace the section `name` in the index of `repo` with `section`, creating
/// the index if needed. Returns the section's previous contents.
#[context("Updating index of repository {}", repo.name)]
pub fn update_index(repo: &Repository, name: &str, section: Section) -> Result<Option<Section>> {
    let dir = open_repo_dir(repo)?;
    let _lock = RepoLock::acquire(&dir)?;
    let mut doc = read_index(&dir)?;
    let previous = doc.replace_section(name, section);
    dir.atomic_write_with_perms(
        INDEX_FILE,
        doc.to_string(),
        cap_std::fs::Permissions::from_mode(INDEX_MODE),
    )
    .context("Writing index")?;
    match &previous {
        Some(_) => tracing::info!("Replaced {name} in {}", repo.index_path()),
        None => tracing::info!("Added {name} to {}", repo.index_path()),
    }
    Ok(previous)
}
