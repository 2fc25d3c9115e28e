//! get_file_content - read a file, capped at a character budget

use serde::Deserialize;
use serde_json::Value;
use std::io;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::llm::ToolDefinition;
use crate::tools::{ToolContext, ToolError};

use super::parse_args;

/// Read a regular file inside the sandbox
pub struct GetFileContent;

#[derive(Debug, Deserialize)]
struct Args {
    file_path: String,
}

impl GetFileContent {
    pub const NAME: &'static str = "get_file_content";

    pub fn definition(max_chars: usize) -> ToolDefinition {
        ToolDefinition::new(
            Self::NAME,
            format!(
                "Reads and returns the first {} characters of the content from a specified file within the working directory.",
                max_chars
            ),
            serde_json::json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "The path to the file whose content should be read, relative to the working directory."
                    }
                },
                "required": ["file_path"]
            }),
        )
    }

    pub async fn execute(args: &Value, ctx: &ToolContext) -> Result<String, ToolError> {
        debug!(?args, "GetFileContent::execute: called");
        let Args { file_path } = parse_args(args)?;

        let full_path = ctx.sandbox.resolve_existing(&file_path)?;
        if !full_path.is_file() {
            debug!(?full_path, "GetFileContent::execute: not a regular file");
            return Err(ToolError::NotAFile { path: file_path.into() });
        }

        let max = ctx.limits.max_file_read_chars;
        let (text, truncated) = read_prefix(&full_path, max).await?;

        if truncated {
            debug!(%max, "GetFileContent::execute: truncating");
            return Ok(format!("{}[...File \"{}\" truncated at {} characters]", text, file_path, max));
        }
        Ok(text)
    }
}

/// Read at most `max` characters, plus whether more text follows
///
/// Only enough bytes for `max + 1` UTF-8 characters are read, so bytes past
/// the cap are never decoded.
async fn read_prefix(path: &Path, max: usize) -> Result<(String, bool), ToolError> {
    let limit = max.saturating_add(1).saturating_mul(4) as u64;
    let mut buf = Vec::new();
    tokio::fs::File::open(path)
        .await?
        .take(limit)
        .read_to_end(&mut buf)
        .await?;

    let (valid, bad_byte) = match std::str::from_utf8(&buf) {
        Ok(s) => (s, false),
        Err(e) => {
            let valid = std::str::from_utf8(&buf[..e.valid_up_to()]).unwrap_or_default();
            // A char cut by the read limit is fine; one cut by end of file is not
            (valid, e.error_len().is_some() || (buf.len() as u64) < limit)
        }
    };

    if let Some((cut, _)) = valid.char_indices().nth(max) {
        return Ok((valid[..cut].to_string(), true));
    }
    if bad_byte {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "stream did not contain valid UTF-8").into());
    }
    Ok((valid.to_string(), false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutionLimits;
    use crate::tools::{PathSandbox, ScriptSettings};
    use std::fs;
    use tempfile::tempdir;

    fn ctx(root: &Path, max_file_read_chars: usize) -> ToolContext {
        let limits = ExecutionLimits {
            max_file_read_chars,
            ..ExecutionLimits::default()
        };
        ToolContext::new(PathSandbox::new(root), limits, ScriptSettings::default())
    }

    #[tokio::test]
    async fn test_read_small_file_verbatim() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("main.py"), "print('hello')\n").unwrap();

        let result = GetFileContent::execute(&serde_json::json!({"file_path": "main.py"}), &ctx(temp.path(), 100))
            .await
            .unwrap();

        assert_eq!(result, "print('hello')\n");
    }

    #[tokio::test]
    async fn test_read_exactly_at_cap_is_not_truncated() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), "abcde").unwrap();

        let result = GetFileContent::execute(&serde_json::json!({"file_path": "a.txt"}), &ctx(temp.path(), 5))
            .await
            .unwrap();

        assert_eq!(result, "abcde");
    }

    #[tokio::test]
    async fn test_read_truncates_with_marker() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("lorem.txt"), "x".repeat(25)).unwrap();

        let result = GetFileContent::execute(&serde_json::json!({"file_path": "lorem.txt"}), &ctx(temp.path(), 10))
            .await
            .unwrap();

        assert_eq!(
            result,
            format!("{}[...File \"lorem.txt\" truncated at 10 characters]", "x".repeat(10))
        );
    }

    #[tokio::test]
    async fn test_read_truncation_counts_characters() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("u.txt"), "héllo wörld").unwrap();

        let result = GetFileContent::execute(&serde_json::json!({"file_path": "u.txt"}), &ctx(temp.path(), 4))
            .await
            .unwrap();

        assert!(result.starts_with("héll[...File"));
    }

    #[tokio::test]
    async fn test_read_outside_root() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("calculator");
        fs::create_dir(&root).unwrap();
        fs::write(temp.path().join("secrets.txt"), "hunter2").unwrap();

        let err = GetFileContent::execute(&serde_json::json!({"file_path": "../secrets.txt"}), &ctx(&root, 100))
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::SandboxViolation { .. }));
        assert!(!err.to_string().contains("hunter2"));
    }

    #[tokio::test]
    async fn test_read_directory_is_not_a_file() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("pkg")).unwrap();

        let err = GetFileContent::execute(&serde_json::json!({"file_path": "pkg"}), &ctx(temp.path(), 100))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotAFile { .. }));
    }

    #[tokio::test]
    async fn test_read_missing_argument() {
        let temp = tempdir().unwrap();
        let err = GetFileContent::execute(&serde_json::json!({}), &ctx(temp.path(), 100))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_read_ignores_bytes_past_cap() {
        let temp = tempdir().unwrap();
        let mut bytes = vec![b'a'; 30_000];
        bytes.extend_from_slice(&[0xff, 0xfe]);
        fs::write(temp.path().join("blob.bin"), bytes).unwrap();

        let result = GetFileContent::execute(&serde_json::json!({"file_path": "blob.bin"}), &ctx(temp.path(), 20))
            .await
            .unwrap();

        assert_eq!(
            result,
            format!("{}[...File \"blob.bin\" truncated at 20 characters]", "a".repeat(20))
        );
    }

    #[tokio::test]
    async fn test_read_multibyte_char_split_by_read_limit() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("wide.txt"), "€".repeat(50)).unwrap();

        let result = GetFileContent::execute(&serde_json::json!({"file_path": "wide.txt"}), &ctx(temp.path(), 3))
            .await
            .unwrap();

        assert_eq!(result, "€€€[...File \"wide.txt\" truncated at 3 characters]");
    }

    #[tokio::test]
    async fn test_read_invalid_utf8_within_cap() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("bad.bin"), [b'o', b'k', 0xff, b'!']).unwrap();

        let err = GetFileContent::execute(&serde_json::json!({"file_path": "bad.bin"}), &ctx(temp.path(), 100))
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::Io(_)));
    }
}
