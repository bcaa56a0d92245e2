//! CLI output: command results and error mapping to the CLI surface.

use crate::error::PipelineError;

/// Rendered command result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    /// Process exit status to use after printing `text`
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(text: String) -> Self {
        Self { text, exit_code: 0 }
    }

    pub fn failure(text: String) -> Self {
        Self { text, exit_code: 1 }
    }
}

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &PipelineError) -> String {
    if e.is_configuration_fault() {
        format!("Configuration fault: {}", e)
    } else {
        format!("Error: {}", e)
    }
}

/// Exit status for an error: 2 for configuration faults, 1 otherwise.
pub fn exit_code(e: &PipelineError) -> i32 {
    if e.is_configuration_fault() {
        2
    } else {
        1
    }
}
