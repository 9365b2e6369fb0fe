//! ExportEngine — spec → repository.
//!
//! Resets the working branch to the upstream base and replays the spec's
//! patch entries as commits, in spec file order. The state machine is
//! strictly linear: clean-tree precondition, branch switch (or confirmed
//! create), hard reset, one apply-verify step per patch, tag, confirmed
//! push. Any failure aborts in place — a half-applied series is left for
//! the operator, never rolled back.

use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;

use patchsync_core::PatchDirective;
use patchsync_git::{CommandRunner, Git};

use crate::error::EngineError;
use crate::prompt::Prompter;

static COMMIT_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{5}:").unwrap());

/// Everything export needs to know beyond the patch list.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Working branch to (re)build, e.g. `fedora-3.12`.
    pub branch: String,
    /// Upstream base revision the series applies on top of, e.g. `v3.12.1`.
    pub base: String,
    /// Release tag to create, e.g. `fedora-3.12.1-3`.
    pub tag: String,
    /// Remote for the final tag push + branch force-push.
    pub remote: String,
}

/// Result of a completed export run.
#[derive(Debug)]
pub struct ExportOutcome {
    pub applied: usize,
    /// The tag actually created (the operator may have renamed it).
    pub tag: String,
}

/// Spec → repository synchronization.
pub struct ExportEngine<'a> {
    runner: &'a dyn CommandRunner,
    prompter: &'a dyn Prompter,
    repo: PathBuf,
    patch_dir: PathBuf,
}

impl<'a> ExportEngine<'a> {
    /// `patch_dir` is where the spec's patch files live (the spec's own
    /// directory in normal operation).
    pub fn new(
        runner: &'a dyn CommandRunner,
        prompter: &'a dyn Prompter,
        repo: impl Into<PathBuf>,
        patch_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            prompter,
            repo: repo.into(),
            patch_dir: patch_dir.into(),
        }
    }

    /// Replay `directives` (spec file order) onto the branch and tag the
    /// result.
    pub fn run(
        &self,
        directives: &[PatchDirective],
        options: &ExportOptions,
    ) -> Result<ExportOutcome, EngineError> {
        let git = Git::new(self.runner, &self.repo);

        if !git.is_worktree_clean()? {
            return Err(EngineError::DirtyWorkTree {
                repo: self.repo.clone(),
            });
        }

        if !git.switch(&options.branch)? {
            let question = format!("Branch {} does not exist. Create it?", options.branch);
            if !self.prompter.confirm(&question)? {
                return Err(EngineError::Declined {
                    action: format!("creating branch {}", options.branch),
                });
            }
            git.switch_create(&options.branch)?;
        }
        git.reset_hard(&options.base)?;

        for directive in directives {
            self.apply_one(&git, directive)?;
        }

        let tag = self.pick_tag(&git, &options.tag)?;
        git.tag(&tag)?;

        let question = format!(
            "About to run `git push {remote} {tag}` and `git push --force -u {remote} {branch}`. Continue?",
            remote = options.remote,
            branch = options.branch,
        );
        if !self.prompter.confirm(&question)? {
            return Err(EngineError::Declined {
                action: format!("pushing to {}", options.remote),
            });
        }
        git.push(&options.remote, &tag)?;
        git.push_branch_force(&options.remote, &options.branch)?;

        Ok(ExportOutcome {
            applied: directives.len(),
            tag,
        })
    }

    /// Apply one patch as exactly one commit, amending the message to the
    /// five-digit `NNNNN: ` prefix when it is missing.
    fn apply_one(&self, git: &Git<'_>, directive: &PatchDirective) -> Result<(), EngineError> {
        let filename = directive.filename();
        let tip = git.rev_parse("HEAD")?;

        if !git.apply_mailbox(&self.patch_dir.join(filename))? {
            return Err(EngineError::Apply {
                patch: filename.to_owned(),
            });
        }

        let message = git.head_message()?;
        if !COMMIT_PREFIX_RE.is_match(&message) {
            let prefixed = format!("{}: {}", directive.number.padded(), message);
            git.amend_message(&prefixed)?;
        }

        // One patch, one commit: the new tip's first parent must be the
        // old tip. A cherry-picked multi-commit patch fails here and the
        // repository stays as-is for the operator.
        let parent = git.rev_parse("HEAD^1")?;
        if tip != parent {
            return Err(EngineError::MultiCommit {
                patch: filename.to_owned(),
            });
        }
        tracing::debug!("applied patch {} as one commit", directive.number);
        Ok(())
    }

    /// Resolve tag-name collisions interactively.
    fn pick_tag(&self, git: &Git<'_>, initial: &str) -> Result<String, EngineError> {
        let mut tag = initial.to_owned();
        while git.tag_exists(&tag)? {
            let question = format!("Tag {tag} already exists in the repository. Create a new tag?");
            if !self.prompter.confirm(&question)? {
                return Err(EngineError::Declined {
                    action: format!("tagging {tag}"),
                });
            }
            tag = self.prompter.input("Tag name")?;
        }
        Ok(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedPrompter, ScriptedRunner};
    use patchsync_core::PatchNumber;
    use tempfile::TempDir;

    fn directive(number: u32, source: &str) -> PatchDirective {
        PatchDirective {
            number: PatchNumber(number),
            source: source.to_owned(),
        }
    }

    fn options() -> ExportOptions {
        ExportOptions {
            branch: "fedora-3.12".to_owned(),
            base: "v3.12.1".to_owned(),
            tag: "fedora-3.12.1-3".to_owned(),
            remote: "origin".to_owned(),
        }
    }

    fn engine_with<'a>(
        runner: &'a ScriptedRunner,
        prompter: &'a ScriptedPrompter,
        patch_dir: &TempDir,
    ) -> ExportEngine<'a> {
        ExportEngine::new(runner, prompter, "/repo", patch_dir.path())
    }

    fn am_line(patch_dir: &TempDir, filename: &str) -> String {
        format!(
            "git am --committer-date-is-author-date {}",
            patch_dir.path().join(filename).display()
        )
    }

    #[test]
    fn applies_in_spec_file_order_and_prefixes_messages() {
        // Spec order 5, 12, 7 — replayed exactly in that order; patch 12's
        // message already carries its prefix and is not amended.
        let patch_dir = TempDir::new().unwrap();
        let am5 = am_line(&patch_dir, "00005-a.patch");
        let am12 = am_line(&patch_dir, "00012-b.patch");
        let am7 = am_line(&patch_dir, "00007-c.patch");
        let runner = ScriptedRunner::new(vec![
            ("git diff-index --quiet HEAD --", 0, ""),
            ("git switch fedora-3.12", 0, ""),
            ("git reset --hard v3.12.1", 0, ""),
            ("git rev-parse HEAD", 0, "base0\n"),
            (&am5, 0, "Applying: Fix a\n"),
            ("git log --format=%B -n 1", 0, "Fix a\n"),
            ("git commit --amend -m \"00005: Fix a\"", 0, ""),
            ("git rev-parse HEAD^1", 0, "base0\n"),
            ("git rev-parse HEAD", 0, "tip5\n"),
            (&am12, 0, "Applying: Fix b\n"),
            ("git log --format=%B -n 1", 0, "00012: Fix b\n"),
            ("git rev-parse HEAD^1", 0, "tip5\n"),
            ("git rev-parse HEAD", 0, "tip12\n"),
            (&am7, 0, "Applying: Fix c\n"),
            ("git log --format=%B -n 1", 0, "Fix c\n"),
            ("git commit --amend -m \"00007: Fix c\"", 0, ""),
            ("git rev-parse HEAD^1", 0, "tip12\n"),
            ("git tag --list fedora-3.12.1-3", 0, ""),
            ("git tag fedora-3.12.1-3", 0, ""),
            ("git push origin fedora-3.12.1-3", 0, ""),
            ("git push --force -u origin fedora-3.12", 0, ""),
        ]);
        let prompter = ScriptedPrompter::new(vec![true], vec![]);

        let directives = [
            directive(5, "00005-a.patch"),
            directive(12, "00012-b.patch"),
            directive(7, "00007-c.patch"),
        ];
        let outcome = engine_with(&runner, &prompter, &patch_dir)
            .run(&directives, &options())
            .expect("export");
        runner.assert_exhausted();

        assert_eq!(outcome.applied, 3);
        assert_eq!(outcome.tag, "fedora-3.12.1-3");
    }

    #[test]
    fn dirty_worktree_aborts_before_any_mutation() {
        let patch_dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new(vec![("git diff-index --quiet HEAD --", 1, "")]);
        let prompter = ScriptedPrompter::new(vec![], vec![]);

        let err = engine_with(&runner, &prompter, &patch_dir)
            .run(&[directive(5, "a.patch")], &options())
            .unwrap_err();
        assert!(matches!(err, EngineError::DirtyWorkTree { .. }));
        runner.assert_exhausted();
    }

    #[test]
    fn missing_branch_is_created_after_confirmation() {
        let patch_dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new(vec![
            ("git diff-index --quiet HEAD --", 0, ""),
            ("git switch fedora-3.12", 1, ""),
            ("git switch -c fedora-3.12", 0, ""),
            ("git reset --hard v3.12.1", 0, ""),
            ("git tag --list fedora-3.12.1-3", 0, ""),
            ("git tag fedora-3.12.1-3", 0, ""),
            ("git push origin fedora-3.12.1-3", 0, ""),
            ("git push --force -u origin fedora-3.12", 0, ""),
        ]);
        let prompter = ScriptedPrompter::new(vec![true, true], vec![]);

        let outcome = engine_with(&runner, &prompter, &patch_dir)
            .run(&[], &options())
            .expect("export");
        assert_eq!(outcome.applied, 0);
        runner.assert_exhausted();
    }

    #[test]
    fn declining_branch_creation_aborts() {
        let patch_dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new(vec![
            ("git diff-index --quiet HEAD --", 0, ""),
            ("git switch fedora-3.12", 1, ""),
        ]);
        let prompter = ScriptedPrompter::new(vec![false], vec![]);

        let err = engine_with(&runner, &prompter, &patch_dir)
            .run(&[], &options())
            .unwrap_err();
        assert!(matches!(err, EngineError::Declined { .. }));
        runner.assert_exhausted();
    }

    #[test]
    fn apply_failure_names_the_patch_and_stops() {
        let patch_dir = TempDir::new().unwrap();
        let am5 = am_line(&patch_dir, "00005-a.patch");
        let runner = ScriptedRunner::new(vec![
            ("git diff-index --quiet HEAD --", 0, ""),
            ("git switch fedora-3.12", 0, ""),
            ("git reset --hard v3.12.1", 0, ""),
            ("git rev-parse HEAD", 0, "base0\n"),
            (&am5, 128, ""),
        ]);
        let prompter = ScriptedPrompter::new(vec![], vec![]);

        let err = engine_with(&runner, &prompter, &patch_dir)
            .run(&[directive(5, "00005-a.patch")], &options())
            .unwrap_err();
        match err {
            EngineError::Apply { patch } => assert_eq!(patch, "00005-a.patch"),
            other => panic!("expected Apply, got {other:?}"),
        }
        runner.assert_exhausted();
    }

    #[test]
    fn a_patch_that_lands_extra_commits_is_fatal() {
        let patch_dir = TempDir::new().unwrap();
        let am5 = am_line(&patch_dir, "00005-a.patch");
        let runner = ScriptedRunner::new(vec![
            ("git diff-index --quiet HEAD --", 0, ""),
            ("git switch fedora-3.12", 0, ""),
            ("git reset --hard v3.12.1", 0, ""),
            ("git rev-parse HEAD", 0, "base0\n"),
            (&am5, 0, ""),
            ("git log --format=%B -n 1", 0, "00005: Fix a\n"),
            // First parent is an intermediate commit, not the old tip.
            ("git rev-parse HEAD^1", 0, "intermediate\n"),
        ]);
        let prompter = ScriptedPrompter::new(vec![], vec![]);

        let err = engine_with(&runner, &prompter, &patch_dir)
            .run(&[directive(5, "00005-a.patch")], &options())
            .unwrap_err();
        assert!(matches!(err, EngineError::MultiCommit { .. }));
        runner.assert_exhausted();
    }

    #[test]
    fn existing_tag_is_renamed_through_the_prompt() {
        let patch_dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new(vec![
            ("git diff-index --quiet HEAD --", 0, ""),
            ("git switch fedora-3.12", 0, ""),
            ("git reset --hard v3.12.1", 0, ""),
            ("git tag --list fedora-3.12.1-3", 0, "fedora-3.12.1-3\n"),
            ("git tag --list fedora-3.12.1-4", 0, ""),
            ("git tag fedora-3.12.1-4", 0, ""),
            ("git push origin fedora-3.12.1-4", 0, ""),
            ("git push --force -u origin fedora-3.12", 0, ""),
        ]);
        let prompter = ScriptedPrompter::new(vec![true, true], vec!["fedora-3.12.1-4"]);

        let outcome = engine_with(&runner, &prompter, &patch_dir)
            .run(&[], &options())
            .expect("export");
        assert_eq!(outcome.tag, "fedora-3.12.1-4");
        runner.assert_exhausted();
    }

    #[test]
    fn declining_the_push_leaves_the_tag_but_pushes_nothing() {
        let patch_dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new(vec![
            ("git diff-index --quiet HEAD --", 0, ""),
            ("git switch fedora-3.12", 0, ""),
            ("git reset --hard v3.12.1", 0, ""),
            ("git tag --list fedora-3.12.1-3", 0, ""),
            ("git tag fedora-3.12.1-3", 0, ""),
        ]);
        let prompter = ScriptedPrompter::new(vec![false], vec![]);

        let err = engine_with(&runner, &prompter, &patch_dir)
            .run(&[], &options())
            .unwrap_err();
        assert!(matches!(err, EngineError::Declined { .. }));
        runner.assert_exhausted();
    }

    #[test]
    fn url_sources_apply_their_local_filename() {
        let patch_dir = TempDir::new().unwrap();
        let am = am_line(&patch_dir, "00005-a.patch");
        let runner = ScriptedRunner::new(vec![
            ("git diff-index --quiet HEAD --", 0, ""),
            ("git switch fedora-3.12", 0, ""),
            ("git reset --hard v3.12.1", 0, ""),
            ("git rev-parse HEAD", 0, "base0\n"),
            (&am, 0, ""),
            ("git log --format=%B -n 1", 0, "00005: Fix a\n"),
            ("git rev-parse HEAD^1", 0, "base0\n"),
            ("git tag --list fedora-3.12.1-3", 0, ""),
            ("git tag fedora-3.12.1-3", 0, ""),
            ("git push origin fedora-3.12.1-3", 0, ""),
            ("git push --force -u origin fedora-3.12", 0, ""),
        ]);
        let prompter = ScriptedPrompter::new(vec![true], vec![]);

        let directives = [directive(5, "https://example.org/x/00005-a.patch")];
        engine_with(&runner, &prompter, &patch_dir)
            .run(&directives, &options())
            .expect("export");
        runner.assert_exhausted();
    }
}
