//! ImportEngine — repository → spec.
//!
//! Walks the commits between a base and head revision (oldest first),
//! materializes each as a patch file, and rewrites the spec's patch
//! section. Patches are written in chronological commit order; when the
//! numbers are monotonic with commit order this is also ascending-number
//! order, and it is the exact inverse of export's spec-file-order replay.
//!
//! ## All-or-nothing visibility
//!
//! Every generated file — patches and the rewritten spec — is staged in a
//! scoped temporary directory created *inside* the working directory (same
//! filesystem, so the final renames cannot cross a mount). Only after every
//! commit in the range has resolved are the old patch files deleted and the
//! staged set moved in. Any earlier failure leaves the working directory
//! untouched.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use patchsync_core::{section, specfile, PatchInformation};
use patchsync_git::{CommandRunner, Git};

use crate::artifact::ArtifactBuilder;
use crate::error::{io_err, EngineError};

/// More commits than this in base..head means a wrong range was selected.
pub const MAX_SERIES_LEN: usize = 99;

/// Result of a completed import run.
#[derive(Debug)]
pub struct ImportOutcome {
    /// One entry per commit, oldest first.
    pub patches: Vec<PatchInformation>,
    /// The rewritten spec file's final location.
    pub spec_path: PathBuf,
    /// Everything moved into the working directory, sorted.
    pub written: Vec<PathBuf>,
}

/// Repository → spec synchronization.
pub struct ImportEngine<'a> {
    runner: &'a dyn CommandRunner,
    repo: PathBuf,
    spec_path: PathBuf,
    workdir: PathBuf,
}

impl<'a> ImportEngine<'a> {
    /// `repo` is the upstream clone commits are read from; `workdir` is
    /// where patch files live and where all output lands (the spec's own
    /// directory in normal operation).
    pub fn new(
        runner: &'a dyn CommandRunner,
        repo: impl Into<PathBuf>,
        spec_path: impl Into<PathBuf>,
        workdir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            repo: repo.into(),
            spec_path: spec_path.into(),
            workdir: workdir.into(),
        }
    }

    /// Synchronize the spec to the commits in `base..head`.
    pub fn run(&self, base: &str, head: &str) -> Result<ImportOutcome, EngineError> {
        let git = Git::new(self.runner, &self.repo);

        let commits = git
            .rev_list(base, head)?
            .ok_or_else(|| EngineError::RevList {
                base: base.to_owned(),
                head: head.to_owned(),
            })?;
        if commits.len() > MAX_SERIES_LEN {
            return Err(EngineError::RangeTooLarge {
                count: commits.len(),
            });
        }
        if commits.is_empty() {
            tracing::warn!("no commits between {base} and {head}; the patch series will be empty");
        }

        let staging = tempfile::Builder::new()
            .prefix(".patchsync-")
            .tempdir_in(&self.workdir)
            .map_err(|e| io_err(&self.workdir, e))?;
        let builder = ArtifactBuilder::new(&git, &self.workdir, staging.path());

        let mut patches: Vec<PatchInformation> = Vec::new();
        let mut seen: HashSet<u32> = HashSet::new();
        for commit in commits.iter().rev() {
            let info = builder.build(commit)?;
            if !seen.insert(info.number.0) {
                return Err(EngineError::DuplicateNumber {
                    number: info.number,
                });
            }
            patches.push(info);
        }

        let mut body: String = patches.iter().map(PatchInformation::section_block).collect();
        body.push('\n');

        let spec_text = specfile::load(&self.spec_path)?;
        let new_spec = section::rewrite(&spec_text, &body)?;

        let spec_name = self
            .spec_path
            .file_name()
            .ok_or_else(|| {
                io_err(
                    &self.spec_path,
                    std::io::Error::other("spec path has no file name"),
                )
            })?
            .to_owned();
        let staged_spec = staging.path().join(&spec_name);
        std::fs::write(&staged_spec, &new_spec).map_err(|e| io_err(&staged_spec, e))?;

        // Everything resolved; swap the staged set in.
        remove_patch_files(&self.workdir)?;
        let mut written = Vec::new();
        for entry in std::fs::read_dir(staging.path()).map_err(|e| io_err(staging.path(), e))? {
            let entry = entry.map_err(|e| io_err(staging.path(), e))?;
            let target = self.workdir.join(entry.file_name());
            std::fs::rename(entry.path(), &target).map_err(|e| io_err(&target, e))?;
            written.push(target);
        }
        written.sort();

        tracing::debug!("imported {} patches into {}", patches.len(), self.workdir.display());
        Ok(ImportOutcome {
            patches,
            spec_path: self.workdir.join(&spec_name),
            written,
        })
    }
}

/// Delete every `*.patch` file directly inside `dir`.
fn remove_patch_files(dir: &Path) -> Result<(), EngineError> {
    for entry in std::fs::read_dir(dir).map_err(|e| io_err(dir, e))? {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let is_patch = path
            .extension()
            .map(|ext| ext == "patch")
            .unwrap_or(false);
        if is_patch && path.is_file() {
            std::fs::remove_file(&path).map_err(|e| io_err(&path, e))?;
        }
    }
    Ok(())
}
