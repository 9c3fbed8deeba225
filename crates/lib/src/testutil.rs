//! Fake tools and scratch repositories for unit tests.

use std::cell::RefCell;

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};

use crate::config::ToolConfig;
use crate::context::RepoContext;
use crate::exec::{CommandOutput, CommandRunner, ToolCommand};
use crate::repo::Repository;

/// Stands in for virt-builder, virt-sparsify and xz, recording each call.
#[derive(Debug, Default)]
pub(crate) struct FakeRunner {
    /// Templates virt-builder claims to know.
    pub(crate) templates: Vec<String>,
    /// A program which exits 1 instead of doing its job.
    pub(crate) failing: Option<String>,
    /// A program which exits 0 without doing anything.
    pub(crate) silent: Option<String>,
    calls: RefCell<Vec<ToolCommand>>,
}

impl FakeRunner {
    pub(crate) fn with_templates(templates: &[&str]) -> Self {
        Self {
            templates: templates.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    pub(crate) fn failing(program: &str) -> Self {
        Self {
            failing: Some(program.to_string()),
            ..Default::default()
        }
    }

    pub(crate) fn silent(program: &str) -> Self {
        Self {
            silent: Some(program.to_string()),
            ..Default::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<ToolCommand> {
        self.calls.borrow().clone()
    }

    pub(crate) fn calls_to(&self, program: &str) -> Vec<ToolCommand> {
        self.calls()
            .into_iter()
            .filter(|c| c.program == program)
            .collect()
    }

    fn virt_builder(&self, cmd: &ToolCommand) -> Result<String> {
        if cmd.has_arg("--list") {
            return Ok(self
                .templates
                .iter()
                .map(|t| format!("{t:<24} x86_64     Fake OS\n"))
                .collect());
        }
        let template = cmd.args.first().context("no template")?;
        let output = cmd.flag_value("--output").context("no --output")?;
        let format = cmd.flag_value("--format").unwrap_or("raw");
        std::fs::write(output, format!("{format} image built from {template}\n"))?;
        Ok(String::new())
    }

    fn virt_sparsify(&self, cmd: &ToolCommand) -> Result<String> {
        anyhow::ensure!(cmd.has_arg("--in-place"), "only in-place is supported");
        let path = cmd.args.last().context("no image")?;
        let mut data = std::fs::read(path)?;
        data.extend_from_slice(b"sparsified\n");
        std::fs::write(path, data)?;
        Ok(String::new())
    }

    fn xz(&self, cmd: &ToolCommand) -> Result<String> {
        let input = cmd.args.last().context("no input")?;
        let output = format!("{input}.xz");
        let mut data = b"XZ:".to_vec();
        data.extend(std::fs::read(input)?.iter().rev());
        std::fs::write(output, data)?;
        if !cmd.has_arg("--keep") {
            std::fs::remove_file(input)?;
        }
        Ok(String::new())
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, cmd: &ToolCommand) -> Result<CommandOutput> {
        self.calls.borrow_mut().push(cmd.clone());
        if self.failing.as_deref() == Some(cmd.program.as_str()) {
            return Ok(CommandOutput {
                code: Some(1),
                stdout: String::new(),
                stderr: format!("{}: simulated failure", cmd.program),
            });
        }
        if self.silent.as_deref() == Some(cmd.program.as_str()) {
            return Ok(CommandOutput {
                code: Some(0),
                stdout: String::new(),
                stderr: String::new(),
            });
        }
        let stdout = match cmd.program.as_str() {
            "virt-builder" => self.virt_builder(cmd)?,
            "virt-sparsify" => self.virt_sparsify(cmd)?,
            "xz" => self.xz(cmd)?,
            o => anyhow::bail!("Unexpected program {o}"),
        };
        Ok(CommandOutput {
            code: Some(0),
            stdout,
            stderr: String::new(),
        })
    }
}

/// A scratch directory holding a `repo/` repository and a `work/` directory.
#[derive(Debug)]
pub(crate) struct Fixture {
    _td: tempfile::TempDir,
    pub(crate) root: Utf8PathBuf,
    pub(crate) runner: FakeRunner,
    pub(crate) config: ToolConfig,
    pub(crate) repo: Repository,
}

impl Fixture {
    pub(crate) fn new(runner: FakeRunner) -> Result<Self> {
        let td = tempfile::tempdir()?;
        let root = Utf8PathBuf::try_from(td.path().to_owned())?;
        std::fs::create_dir(root.join("repo"))?;
        std::fs::create_dir(root.join("work"))?;
        std::fs::write(
            root.join("local.conf"),
            format!("[local]\nuri=file://{root}/repo/index\n"),
        )?;
        let config = ToolConfig {
            repos_dir: root.clone(),
            ..Default::default()
        };
        let repo = Repository::resolve("local", &config.descriptor_path("local"))?;
        Ok(Self {
            _td: td,
            root,
            runner,
            config,
            repo,
        })
    }

    pub(crate) fn ctx(&self) -> RepoContext<'_> {
        RepoContext::new(&self.runner, &self.config, self.repo.clone())
    }

    pub(crate) fn write_file(&self, rel: &str, contents: &[u8]) -> Result<Utf8PathBuf> {
        let path = self.root.join(rel);
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    pub(crate) fn work(&self) -> Utf8PathBuf {
        self.root.join("work")
    }

    pub(crate) fn repo_file(&self, name: &str) -> Utf8PathBuf {
        self.repo.dir.join(name)
    }

    pub(crate) fn index(&self) -> Result<String> {
        std::fs::read_to_string(self.repo.index_path()).context("reading index")
    }
}

/// Length of the file at `path`.
pub(crate) fn file_len(path: &Utf8Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}
