//! State shared by every step of a run.

use crate::config::ToolConfig;
use crate::exec::CommandRunner;
use crate::repo::Repository;

/// The tools, configuration and target repository for one invocation.
#[derive(Debug)]
pub struct RepoContext<'a> {
    /// Executes external programs.
    pub runner: &'a dyn CommandRunner,
    /// Tool names and locations.
    pub config: &'a ToolConfig,
    /// The repository being modified.
    pub repo: Repository,
    /// Span covering all work on this repository.
    pub span: tracing::Span,
}

impl<'a> RepoContext<'a> {
    /// A context for operating on `repo`.
    pub fn new(runner: &'a dyn CommandRunner, config: &'a ToolConfig, repo: Repository) -> Self {
        let span = tracing::info_span!("repo", name = %repo.name);
        Self {
            runner,
            config,
            repo,
            span,
        }
    }
}
