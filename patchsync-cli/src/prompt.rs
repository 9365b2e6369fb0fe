//! Terminal implementation of the engine's prompt capability.

use inquire::{Confirm, Text};

use patchsync_engine::{EngineError, Prompter};

/// Asks on the controlling terminal via `inquire`.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&self, question: &str) -> Result<bool, EngineError> {
        Confirm::new(question)
            .with_default(false)
            .prompt()
            .map_err(|e| EngineError::Prompt(e.to_string()))
    }

    fn input(&self, prompt: &str) -> Result<String, EngineError> {
        Text::new(prompt)
            .prompt()
            .map_err(|e| EngineError::Prompt(e.to_string()))
    }
}
