//! Error types for patchsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from spec-file operations.
#[derive(Debug, Error)]
pub enum SpecError {
    /// Underlying I/O failure, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No recognized patch-section start marker in the spec.
    #[error("patch section start marker not found in spec")]
    SectionNotFound,

    /// More than one start marker — the splice target is ambiguous.
    #[error("spec has more than one patch section start marker")]
    DuplicateSection,

    /// A start marker was found but no end marker follows it.
    #[error("patch section end marker not found after the start marker")]
    SectionUnterminated,

    /// A `Patch...` line that does not parse as `Patch<number>: <source>`.
    #[error("malformed patch directive: {line}")]
    BadDirective { line: String },

    /// The same patch number appears on two directive lines.
    #[error("patch number {number} appears more than once in the spec")]
    DuplicateNumber { number: u32 },
}

/// Convenience constructor for [`SpecError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SpecError {
    SpecError::Io {
        path: path.into(),
        source,
    }
}
