//! get_files_info - list a directory with sizes

use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

use crate::llm::ToolDefinition;
use crate::tools::{ToolContext, ToolError};

use super::parse_args;

/// List the immediate entries of a directory inside the sandbox
pub struct GetFilesInfo;

#[derive(Debug, Deserialize)]
struct Args {
    #[serde(default = "default_directory")]
    directory: String,
}

fn default_directory() -> String {
    ".".to_string()
}

impl GetFilesInfo {
    pub const NAME: &'static str = "get_files_info";

    pub fn definition() -> ToolDefinition {
        ToolDefinition::new(
            Self::NAME,
            "Lists files in the specified directory along with their sizes, constrained to the working directory.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "directory": {
                        "type": "string",
                        "description": "The directory to list files from, relative to the working directory. If not provided, lists files in the working directory itself."
                    }
                }
            }),
        )
    }

    pub async fn execute(args: &Value, ctx: &ToolContext) -> Result<String, ToolError> {
        debug!(?args, "GetFilesInfo::execute: called");
        let Args { directory } = parse_args(args)?;

        let full_path = ctx.sandbox.resolve_existing(&directory)?;
        if !full_path.is_dir() {
            debug!(?full_path, "GetFilesInfo::execute: not a directory");
            return Err(ToolError::NotADirectory { path: directory.into() });
        }

        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&full_path).await?;
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            // Symlinks are reported as themselves, never followed
            let metadata = match entry.metadata().await {
                Ok(m) => m,
                Err(e) => {
                    debug!(%name, %e, "GetFilesInfo::execute: failed to get metadata, skipping entry");
                    continue;
                }
            };

            let is_dir = metadata.is_dir();
            let size = if is_dir { dir_size(&entry.path()) } else { metadata.len() };
            entries.push((name, size, is_dir));
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        debug!(entries_count = %entries.len(), "GetFilesInfo::execute: entries collected");

        if entries.is_empty() {
            return Ok("(empty directory)".to_string());
        }

        Ok(entries
            .iter()
            .map(|(name, size, is_dir)| format!(" - {}: file_size={} bytes, is_dir={}", name, size, is_dir))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

/// Total size of the regular files below `path`; unreadable entries count as zero
fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}
