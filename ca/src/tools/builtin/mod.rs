//! Built-in functions offered to the model
//!
//! Each function exposes its declaration and an `execute` that returns the
//! text fed back to the model, or a [`ToolError`] the registry stringifies.

mod list_directory;
mod read_file;
mod run_script;
mod write_file;

pub use list_directory::GetFilesInfo;
pub use read_file::GetFileContent;
pub use run_script::RunPythonFile;
pub use write_file::WriteFile;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::ToolError;

/// Deserialize function arguments; a missing argument object counts as `{}`
pub(crate) fn parse_args<T: DeserializeOwned>(args: &Value) -> Result<T, ToolError> {
    let args = if args.is_null() { serde_json::json!({}) } else { args.clone() };
    serde_json::from_value(args).map_err(|e| ToolError::InvalidArgument(e.to_string()))
}
