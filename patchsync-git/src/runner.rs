//! Command execution behind a narrow, injectable seam.
//!
//! [`CommandRunner`] is the only way the engines touch the outside world, so
//! tests drive them with a scripted implementation instead of a live git.
//! The real [`ShellRunner`] mirrors an interactive shell session on stderr:
//! a cyan `cwd$` prompt with the command line before each run, and the
//! captured stdout (or a `[N lines]` summary) after it.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use colored::Colorize;

use crate::error::GitError;

// ---------------------------------------------------------------------------
// Request / output
// ---------------------------------------------------------------------------

/// One external command invocation.
///
/// `check` (the default) turns a nonzero exit into [`GitError::CommandFailed`];
/// `allow_failure` requests let the caller inspect the exit code instead.
#[derive(Debug, Clone)]
pub struct CmdRequest {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub stdin: Option<String>,
    pub check: bool,
    pub quiet: bool,
}

impl CmdRequest {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            stdin: None,
            check: true,
            quiet: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn stdin_text(mut self, text: impl Into<String>) -> Self {
        self.stdin = Some(text.into());
        self
    }

    /// Let the caller handle a nonzero exit instead of erroring.
    pub fn allow_failure(mut self) -> Self {
        self.check = false;
        self
    }

    /// Summarize stdout on stderr as `[N lines]` instead of echoing it.
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// The command as a single display string, e.g. `git am 00005-x.patch`.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                line.push_str(&format!("{arg:?}"));
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}

/// Exit status and captured stdout of a finished command.
#[derive(Debug, Clone)]
pub struct CmdOutput {
    pub code: i32,
    pub stdout: String,
}

impl CmdOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

// ---------------------------------------------------------------------------
// The seam
// ---------------------------------------------------------------------------

/// Run a command and return its exit status + captured stdout.
///
/// stderr is never captured; it flows through to the terminal, where the
/// operator resolves whatever git is complaining about.
pub trait CommandRunner {
    fn run(&self, request: &CmdRequest) -> Result<CmdOutput, GitError>;
}

// ---------------------------------------------------------------------------
// Real implementation
// ---------------------------------------------------------------------------

/// Executes commands with [`std::process::Command`], narrating on stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, request: &CmdRequest) -> Result<CmdOutput, GitError> {
        let command_line = request.command_line();
        let cwd_display = request
            .cwd
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_default();
        eprintln!("{} {}", format!("{cwd_display}$").cyan(), command_line);

        let mut command = Command::new(&request.program);
        command.args(&request.args);
        if let Some(dir) = &request.cwd {
            command.current_dir(dir);
        }
        command.stdout(Stdio::piped());
        if request.stdin.is_some() {
            command.stdin(Stdio::piped());
        }

        let mut child = command.spawn().map_err(|source| GitError::Spawn {
            program: request.program.clone(),
            source,
        })?;

        if let Some(text) = &request.stdin {
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(text.as_bytes())
                    .map_err(|source| GitError::Spawn {
                        program: request.program.clone(),
                        source,
                    })?;
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|source| GitError::Spawn {
                program: request.program.clone(),
                source,
            })?;

        let stdout =
            String::from_utf8(output.stdout).map_err(|_| GitError::NonUtf8Output {
                command: command_line.clone(),
            })?;
        let code = output.status.code().unwrap_or(-1);
        tracing::debug!("`{command_line}` exited with status {code}");

        if !stdout.trim().is_empty() {
            if request.quiet {
                eprintln!("[{} lines]\n", stdout.matches('\n').count());
            } else {
                eprintln!("{stdout}");
            }
        }

        if request.check && code != 0 {
            return Err(GitError::CommandFailed {
                command: command_line,
                code,
            });
        }
        Ok(CmdOutput { code, stdout })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
