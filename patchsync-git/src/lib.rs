//! Patchsync git library — the narrow external-command collaborator.
//!
//! Version control is an external service with one contract: run a command,
//! return its exit status and captured stdout. [`runner`] holds that seam
//! ([`CommandRunner`]) plus the real [`ShellRunner`]; [`git`] is a typed
//! façade with one method per git operation the engines use. Engines are
//! tested against a scripted [`CommandRunner`], never a live repository.
//!
//! All invocations are synchronous and blocking, with no timeout — this is
//! an interactively supervised tool, and a hang in git is the operator's to
//! interrupt.

pub mod error;
pub mod git;
pub mod runner;

pub use error::GitError;
pub use git::Git;
pub use runner::{CmdOutput, CmdRequest, CommandRunner, ShellRunner};
