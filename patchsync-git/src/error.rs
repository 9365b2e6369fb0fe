//! Error types for patchsync-git.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from external-command execution.
#[derive(Debug, Error)]
pub enum GitError {
    /// The command binary could not be started at all.
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran and exited nonzero (for requests that demand success).
    #[error("`{command}` exited with status {code}")]
    CommandFailed { command: String, code: i32 },

    /// Captured stdout was not valid UTF-8.
    #[error("`{command}` produced non-UTF-8 output")]
    NonUtf8Output { command: String },

    /// The command succeeded but its output was not in the expected shape.
    #[error("`{command}` produced unexpected output: {output:?}")]
    UnexpectedOutput { command: String, output: String },

    /// Filesystem failure while writing captured output, with annotated path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`GitError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> GitError {
    GitError::Io {
        path: path.into(),
        source,
    }
}
