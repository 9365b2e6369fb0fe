//! Operator confirmation as a pluggable capability.
//!
//! The engines never talk to a terminal directly; batch and test runs
//! supply deterministic answers through this trait.

use crate::error::EngineError;

/// Ask the operator before taking an irreversible step.
pub trait Prompter {
    /// Yes/no question; `false` aborts the step that asked.
    fn confirm(&self, question: &str) -> Result<bool, EngineError>;

    /// Free-form text, e.g. a replacement tag name.
    fn input(&self, prompt: &str) -> Result<String, EngineError>;
}
