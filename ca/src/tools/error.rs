//! Tool error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during tool execution
///
/// None of these abort a conversation: the registry turns them into error
/// results the model can read and react to.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Cannot access \"{path}\" as it is outside the permitted working directory {root}")]
    SandboxViolation { path: PathBuf, root: PathBuf },

    #[error("File or directory not found: \"{path}\"")]
    NotFound { path: PathBuf },

    #[error("\"{path}\" is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("\"{path}\" is not a regular file")]
    NotAFile { path: PathBuf },

    #[error("\"{path}\" is not a runnable script")]
    NotAScriptFile { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Process timed out after {timeout_secs} seconds")]
    ProcessTimeout { timeout_secs: u64 },

    #[error("Failed to start {interpreter}: {source}")]
    ProcessSpawn {
        interpreter: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unrecognized function: {name}")]
    UnrecognizedFunction { name: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
