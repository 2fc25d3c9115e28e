//! Integration tests for codeagent
//!
//! Drive the public API end to end with a scripted model client.

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use codeagent::{
    CompletionRequest, CompletionResponse, Config, ConversationLoop, FunctionCall, LlmError, LoopOutcome,
    ModelClient, Part, Role, ToolRegistry,
};
use serde_json::json;
use tempfile::TempDir;

/// Replays a fixed script of responses
struct ScriptedClient {
    responses: Vec<CompletionResponse>,
    next: AtomicUsize,
}

impl ScriptedClient {
    fn new(responses: Vec<CompletionResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses,
            next: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.next.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let idx = self.next.fetch_add(1, Ordering::SeqCst);
        let idx = idx.min(self.responses.len() - 1);
        Ok(self.responses[idx].clone())
    }
}

fn config_for(root: &std::path::Path, max_rounds: &str) -> Config {
    Config::default()
        .with_overrides(|key| match key {
            "WORKING_DIR" => Some(root.display().to_string()),
            "MAX_CONV_ROUNDS" => Some(max_rounds.to_string()),
            "MAX_CHARS" => Some("16".to_string()),
            _ => None,
        })
        .expect("overrides should parse")
}

// =============================================================================
// Conversation Tests
// =============================================================================

#[tokio::test]
async fn test_fix_and_verify_session() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let root = temp.path().join("calculator");
    fs::create_dir_all(root.join("pkg")).unwrap();
    fs::write(root.join("pkg/calculator.py"), "def add(a, b):\n    return a - b\n").unwrap();

    let config = config_for(&root, "10");
    let client = ScriptedClient::new(vec![
        CompletionResponse::calls(vec![FunctionCall::new("get_files_info", json!({"directory": "."}))]),
        CompletionResponse::calls(vec![FunctionCall::new(
            "get_file_content",
            json!({"file_path": "pkg/calculator.py"}),
        )]),
        CompletionResponse::calls(vec![FunctionCall::new(
            "write_file",
            json!({"file_path": "pkg/calculator.py", "content": "def add(a, b):\n    return a + b\n"}),
        )]),
        CompletionResponse::text("Fixed the subtraction bug in add()."),
    ]);

    let mut engine = ConversationLoop::new(client.clone(), ToolRegistry::from_config(&config), "sys", &config.limits);
    let outcome = engine.run("fix the add function").await.unwrap();

    assert_eq!(
        outcome,
        LoopOutcome::Done {
            text: "Fixed the subtraction bug in add().".to_string(),
            rounds: 4
        }
    );
    assert_eq!(client.calls(), 4);
    assert_eq!(
        fs::read_to_string(root.join("pkg/calculator.py")).unwrap(),
        "def add(a, b):\n    return a + b\n"
    );

    // The read went through the 16 character cap
    let truncated = engine
        .conversation()
        .messages()
        .iter()
        .filter(|m| m.role == Role::Tool)
        .flat_map(|m| m.parts.iter())
        .any(|p| matches!(p, Part::FunctionResult(r) if r.output.ends_with("truncated at 16 characters]")));
    assert!(truncated);
}

#[tokio::test]
async fn test_round_cap_from_config() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let config = config_for(temp.path(), "2");
    let client = ScriptedClient::new(vec![CompletionResponse::calls(vec![FunctionCall::new(
        "get_files_info",
        json!({}),
    )])]);

    let mut engine = ConversationLoop::new(client.clone(), ToolRegistry::from_config(&config), "sys", &config.limits);
    let outcome = engine.run("keep going").await.unwrap();

    assert_eq!(outcome, LoopOutcome::Aborted { round: 3, max_rounds: 2 });
    assert_eq!(client.calls(), 2);
}

#[tokio::test]
async fn test_escape_attempts_leave_outside_untouched() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let root = temp.path().join("calculator");
    fs::create_dir(&root).unwrap();

    let config = config_for(&root, "5");
    let client = ScriptedClient::new(vec![
        CompletionResponse::calls(vec![
            FunctionCall::new("write_file", json!({"file_path": "../pwned.txt", "content": "x"})),
            FunctionCall::new("get_files_info", json!({"directory": "/"})),
        ]),
        CompletionResponse::text("I can't do that."),
    ]);

    let mut engine = ConversationLoop::new(client, ToolRegistry::from_config(&config), "sys", &config.limits);
    engine.run("escape").await.unwrap();

    assert!(!temp.path().join("pwned.txt").exists());

    let errors: Vec<bool> = engine
        .conversation()
        .messages()
        .iter()
        .filter(|m| m.role == Role::Tool)
        .flat_map(|m| m.parts.iter())
        .filter_map(|p| match p {
            Part::FunctionResult(r) => Some(r.is_error),
            _ => None,
        })
        .collect();
    assert_eq!(errors, vec![true, true]);
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_config_file_round_trip() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let path = temp.path().join("codeagent.yml");
    fs::write(
        &path,
        "llm:\n  model: gemini-2.5-flash\nlimits:\n  max-conversation-rounds: 7\nsandbox:\n  working-dir: ./proj\n  interpreter: python3.12\n",
    )
    .unwrap();

    let config = Config::load(Some(&path)).unwrap();

    assert_eq!(config.llm.model, "gemini-2.5-flash");
    assert_eq!(config.limits.max_conversation_rounds, 7);
    assert_eq!(config.limits.max_file_read_chars, 10_000);
    assert_eq!(config.sandbox.working_dir, std::path::PathBuf::from("./proj"));
    assert_eq!(config.sandbox.interpreter, "python3.12");
    assert_eq!(config.sandbox.extensions, vec!["py".to_string()]);
}
