//! write_file - create or overwrite a file

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::llm::ToolDefinition;
use crate::tools::{ToolContext, ToolError};

use super::parse_args;

/// Write a file inside the sandbox, creating parent directories as needed
pub struct WriteFile;

#[derive(Debug, Deserialize)]
struct Args {
    file_path: String,
    content: String,
}

impl WriteFile {
    pub const NAME: &'static str = "write_file";

    pub fn definition() -> ToolDefinition {
        ToolDefinition::new(
            Self::NAME,
            "Writes content to a file within the working directory. Creates the file and any missing parent directories, and overwrites existing files.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "Path to the file to write, relative to the working directory."
                    },
                    "content": {
                        "type": "string",
                        "description": "Content to write to the file."
                    }
                },
                "required": ["file_path", "content"]
            }),
        )
    }

    pub async fn execute(args: &Value, ctx: &ToolContext) -> Result<String, ToolError> {
        debug!(?args, "WriteFile::execute: called");
        let Args { file_path, content } = parse_args(args)?;

        let full_path = ctx.sandbox.resolve(&file_path)?;
        if full_path.is_dir() {
            debug!(?full_path, "WriteFile::execute: target is a directory");
            return Err(ToolError::NotAFile { path: file_path.into() });
        }

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        debug!("WriteFile::execute: parent directories ensured");

        tokio::fs::write(&full_path, content.as_bytes()).await?;
        debug!(bytes = content.len(), ?full_path, "WriteFile::execute: written");

        Ok(format!("Successfully wrote {} bytes to \"{}\"", content.len(), file_path))
    }
}
