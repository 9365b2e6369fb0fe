//! Typed façade over the git operations the engines use.
//!
//! One method per operation, each a thin argv builder over the
//! [`CommandRunner`] seam. Methods whose failure is a normal engine outcome
//! (`switch` to a missing branch, `am` onto a conflicting tree, `rev-list`
//! over a bad range) return the success state instead of erroring, so the
//! engines can map them into their own taxonomy.

use std::path::{Path, PathBuf};

use crate::error::{io_err, GitError};
use crate::runner::{CmdRequest, CommandRunner};

/// A git repository addressed through an injected [`CommandRunner`].
pub struct Git<'a> {
    runner: &'a dyn CommandRunner,
    repo: PathBuf,
}

impl<'a> Git<'a> {
    pub fn new(runner: &'a dyn CommandRunner, repo: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            repo: repo.into(),
        }
    }

    pub fn repo(&self) -> &Path {
        &self.repo
    }

    fn request(&self) -> CmdRequest {
        CmdRequest::new("git").cwd(&self.repo)
    }

    // -- read-only queries --------------------------------------------------

    /// Full commit message (`%B`), trimmed.
    pub fn commit_message(&self, commit: &str) -> Result<String, GitError> {
        let out = self
            .runner
            .run(&self.request().args(["show", "-s", "--format=%B", commit]))?;
        Ok(out.stdout.trim().to_owned())
    }

    /// Commit ids reachable from `head` but not `base`, newest first.
    ///
    /// Returns `None` when the range does not resolve (unknown tags, missing
    /// commits) — the caller owns the operator-facing hints for that case.
    pub fn rev_list(&self, base: &str, head: &str) -> Result<Option<Vec<String>>, GitError> {
        let out = self.runner.run(
            &self
                .request()
                .args(["rev-list", head])
                .arg(format!("^{base}"))
                .allow_failure()
                .quiet(),
        )?;
        if !out.success() {
            return Ok(None);
        }
        Ok(Some(out.stdout.lines().map(str::to_owned).collect()))
    }

    /// Single-commit unified diff with the fixed patch-formatting flags,
    /// written to `out_path`.
    pub fn format_patch(&self, commit: &str, out_path: &Path) -> Result<(), GitError> {
        let out = self.runner.run(
            &self
                .request()
                .args([
                    "format-patch",
                    "--stdout",
                    "-1",
                    "--minimal",
                    "--patience",
                    "--abbrev=78",
                    "--find-renames",
                    "--zero-commit",
                    "--no-signature",
                    commit,
                ])
                .quiet(),
        )?;
        std::fs::write(out_path, &out.stdout).map_err(|e| io_err(out_path, e))
    }

    /// Stable content fingerprint of a diff (`git patch-id --stable`).
    pub fn patch_id(&self, diff: &str) -> Result<String, GitError> {
        let request = self
            .request()
            .args(["patch-id", "--stable"])
            .stdin_text(diff)
            .quiet();
        let command = request.command_line();
        let out = self.runner.run(&request)?;
        out.stdout
            .split_whitespace()
            .next()
            .map(str::to_owned)
            .ok_or(GitError::UnexpectedOutput {
                command,
                output: out.stdout,
            })
    }

    /// Whether the working tree has no pending changes.
    pub fn is_worktree_clean(&self) -> Result<bool, GitError> {
        let out = self.runner.run(
            &self
                .request()
                .args(["diff-index", "--quiet", "HEAD", "--"])
                .allow_failure(),
        )?;
        Ok(out.success())
    }

    pub fn rev_parse(&self, rev: &str) -> Result<String, GitError> {
        let out = self.runner.run(&self.request().args(["rev-parse", rev]))?;
        Ok(out.stdout.trim().to_owned())
    }

    /// `HEAD`'s full commit message, trimmed.
    pub fn head_message(&self) -> Result<String, GitError> {
        let out = self
            .runner
            .run(&self.request().args(["log", "--format=%B", "-n", "1"]))?;
        Ok(out.stdout.trim_end().to_owned())
    }

    /// Whether any existing tag starts with `tag`.
    pub fn tag_exists(&self, tag: &str) -> Result<bool, GitError> {
        let out = self
            .runner
            .run(&self.request().args(["tag", "--list", tag]).quiet())?;
        Ok(out
            .stdout
            .lines()
            .any(|line| line.starts_with(tag)))
    }

    /// `git config --get <key>`; exit status 1 means the key is absent.
    pub fn config_get(&self, key: &str) -> Result<Option<String>, GitError> {
        let request = self
            .request()
            .args(["config", "--get", key])
            .allow_failure();
        let command = request.command_line();
        let out = self.runner.run(&request)?;
        match out.code {
            0 => Ok(Some(out.stdout.trim().to_owned())),
            1 => Ok(None),
            code => Err(GitError::CommandFailed { command, code }),
        }
    }

    // -- mutations ----------------------------------------------------------

    /// Switch to an existing branch; `false` when the branch does not exist.
    pub fn switch(&self, branch: &str) -> Result<bool, GitError> {
        let out = self
            .runner
            .run(&self.request().args(["switch", branch]).allow_failure())?;
        Ok(out.success())
    }

    pub fn switch_create(&self, branch: &str) -> Result<(), GitError> {
        self.runner
            .run(&self.request().args(["switch", "-c", branch]))?;
        Ok(())
    }

    pub fn reset_hard(&self, rev: &str) -> Result<(), GitError> {
        self.runner
            .run(&self.request().args(["reset", "--hard", rev]))?;
        Ok(())
    }

    /// Apply a patch file as a commit, keeping the author date as the
    /// committer date. `false` means the apply failed and the repository is
    /// left mid-`am` for manual resolution.
    pub fn apply_mailbox(&self, patch: &Path) -> Result<bool, GitError> {
        let out = self.runner.run(
            &self
                .request()
                .args(["am", "--committer-date-is-author-date"])
                .arg(patch.display().to_string())
                .allow_failure(),
        )?;
        Ok(out.success())
    }

    /// Rewrite `HEAD`'s message — the only commit rewrite this tool performs.
    pub fn amend_message(&self, message: &str) -> Result<(), GitError> {
        self.runner
            .run(&self.request().args(["commit", "--amend", "-m"]).arg(message))?;
        Ok(())
    }

    pub fn tag(&self, name: &str) -> Result<(), GitError> {
        self.runner.run(&self.request().args(["tag", name]))?;
        Ok(())
    }

    pub fn push(&self, remote: &str, refspec: &str) -> Result<(), GitError> {
        self.runner
            .run(&self.request().args(["push", remote, refspec]))?;
        Ok(())
    }

    pub fn push_branch_force(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        self.runner
            .run(&self.request().args(["push", "--force", "-u", remote, branch]))?;
        Ok(())
    }
}
