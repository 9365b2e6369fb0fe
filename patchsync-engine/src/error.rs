//! Error types for patchsync-engine.
//!
//! Structural errors (identity, range, duplicate numbers) are always fatal
//! and never retried — retrying without operator correction would repeat the
//! same failure. [`EngineError::Apply`] and [`EngineError::MultiCommit`]
//! mean mutation already partially happened; the engine deliberately leaves
//! the repository in that state for manual resolution.

use std::path::PathBuf;

use thiserror::Error;

use patchsync_core::{PatchNumber, SpecError};
use patchsync_git::GitError;

/// All errors that can arise from the import/export engines.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The commit summary matches neither accepted style.
    #[error("cannot derive patch identity from {commit}: {summary}")]
    Identity { commit: String, summary: String },

    /// Legacy-style summary with no patch number anywhere in the message.
    #[error("cannot find patch number in {commit}: {summary}")]
    MissingNumber { commit: String, summary: String },

    /// Several on-disk patch files carry the same number prefix.
    #[error("more than one patch file matches {number}: {candidates:?}")]
    AmbiguousPatchFile {
        number: PatchNumber,
        candidates: Vec<String>,
    },

    /// Two commits in one import range resolved to the same number.
    #[error("patch number {number} produced by more than one commit")]
    DuplicateNumber { number: PatchNumber },

    /// Far more commits than any plausible series — wrong base or head.
    #[error("{count} commits in range; almost certainly a wrong base or head was selected")]
    RangeTooLarge { count: usize },

    /// The base..head range did not resolve at all.
    #[error("expected commits between {base} and {head} were not found")]
    RevList { base: String, head: String },

    /// A bundled-dependency name appears twice in the designated patch.
    #[error("bundled version for {name} appears twice")]
    DuplicateBundledVersion { name: String },

    /// Export precondition: the repository has pending changes.
    #[error("working tree at {repo} is not clean; commit or stash your work first")]
    DirtyWorkTree { repo: PathBuf },

    /// `git am` failed; the repository is left mid-apply for manual fixup.
    #[error("git am failed on {patch}; resolve manually in the repository")]
    Apply { patch: String },

    /// One patch produced several commits; the series is partially applied.
    #[error("{patch} produced more than one commit; continue manually in the repository")]
    MultiCommit { patch: String },

    /// The operator answered no at a confirmation point.
    #[error("{action} declined by operator")]
    Declined { action: String },

    /// The interactive prompt itself failed (e.g. closed stdin).
    #[error("prompt failed: {0}")]
    Prompt(String),

    /// An error from the external git collaborator.
    #[error("git error: {0}")]
    Git(#[from] GitError),

    /// An error from spec-file parsing or the section editor.
    #[error("spec error: {0}")]
    Spec(#[from] SpecError),

    /// Filesystem failure, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`EngineError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> EngineError {
    EngineError::Io {
        path: path.into(),
        source,
    }
}
