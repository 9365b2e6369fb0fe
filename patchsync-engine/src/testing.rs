//! Deterministic fakes for engine tests: a scripted command runner and a
//! scripted prompter. Each expects an exact, ordered sequence of calls —
//! any deviation panics with the full context, which is what makes the
//! export state machine's command ordering assertable.

use std::cell::RefCell;
use std::collections::VecDeque;

use patchsync_git::{CmdOutput, CmdRequest, CommandRunner, GitError};

use crate::error::EngineError;
use crate::prompt::Prompter;

/// Replays a fixed `(command line, exit code, stdout)` script.
pub(crate) struct ScriptedRunner {
    script: RefCell<VecDeque<(String, i32, String)>>,
}

impl ScriptedRunner {
    pub(crate) fn new(steps: Vec<(&str, i32, &str)>) -> Self {
        Self {
            script: RefCell::new(
                steps
                    .into_iter()
                    .map(|(cmd, code, stdout)| (cmd.to_owned(), code, stdout.to_owned()))
                    .collect(),
            ),
        }
    }

    /// Every scripted step must have been consumed.
    pub(crate) fn assert_exhausted(&self) {
        let remaining = self.script.borrow();
        assert!(
            remaining.is_empty(),
            "unconsumed scripted commands: {:?}",
            remaining.iter().map(|(cmd, ..)| cmd).collect::<Vec<_>>()
        );
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, request: &CmdRequest) -> Result<CmdOutput, GitError> {
        let (expected, code, stdout) = self
            .script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected command: {}", request.command_line()));
        assert_eq!(
            request.command_line(),
            expected,
            "command order mismatch"
        );
        if request.check && code != 0 {
            return Err(GitError::CommandFailed {
                command: expected,
                code,
            });
        }
        Ok(CmdOutput { code, stdout })
    }
}

/// Replays fixed confirmation answers and text inputs.
pub(crate) struct ScriptedPrompter {
    confirms: RefCell<VecDeque<bool>>,
    inputs: RefCell<VecDeque<String>>,
}

impl ScriptedPrompter {
    pub(crate) fn new(confirms: Vec<bool>, inputs: Vec<&str>) -> Self {
        Self {
            confirms: RefCell::new(confirms.into_iter().collect()),
            inputs: RefCell::new(inputs.into_iter().map(str::to_owned).collect()),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, question: &str) -> Result<bool, EngineError> {
        self.confirms
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| EngineError::Prompt(format!("unexpected confirm: {question}")))
    }

    fn input(&self, prompt: &str) -> Result<String, EngineError> {
        self.inputs
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| EngineError::Prompt(format!("unexpected input: {prompt}")))
    }
}
