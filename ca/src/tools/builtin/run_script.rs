//! run_python_file - execute a script with the configured interpreter

use serde::Deserialize;
use serde_json::Value;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::llm::ToolDefinition;
use crate::tools::{ToolContext, ToolError};

use super::parse_args;

/// Cap on the combined output handed back to the model
const MAX_OUTPUT_CHARS: usize = 30_000;

/// Run a script inside the sandbox with a wall-clock budget
pub struct RunPythonFile;

#[derive(Debug, Deserialize)]
struct Args {
    file_path: String,
    #[serde(default)]
    args: Vec<String>,
}

impl RunPythonFile {
    pub const NAME: &'static str = "run_python_file";

    pub fn definition() -> ToolDefinition {
        ToolDefinition::new(
            Self::NAME,
            "Executes a Python file within the working directory and returns the output from the interpreter.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "Path to the Python file to execute, relative to the working directory."
                    },
                    "args": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Optional arguments passed to the script on its command line."
                    }
                },
                "required": ["file_path"]
            }),
        )
    }

    pub async fn execute(args: &Value, ctx: &ToolContext) -> Result<String, ToolError> {
        debug!(?args, "RunPythonFile::execute: called");
        let Args { file_path, args } = parse_args(args)?;

        let full_path = ctx.sandbox.resolve_existing(&file_path)?;
        if !full_path.is_file() || !ctx.script.accepts(&full_path) {
            debug!(?full_path, "RunPythonFile::execute: not a script");
            return Err(ToolError::NotAScriptFile { path: file_path.into() });
        }
        let root = ctx.sandbox.canonical_root()?;

        let interpreter = ctx.script.interpreter.clone();
        let mut command = Command::new(&interpreter);
        command
            .arg(&full_path)
            .args(&args)
            .current_dir(&root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group so a timeout takes down anything the script spawned
        #[cfg(unix)]
        command.process_group(0);

        debug!(%interpreter, ?full_path, ?args, "RunPythonFile::execute: spawning");
        let mut child = command
            .spawn()
            .map_err(|source| ToolError::ProcessSpawn { interpreter, source })?;
        let pid = child.id();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let timeout_secs = ctx.limits.subprocess_timeout_secs;
        let outcome = tokio::time::timeout(Duration::from_secs(timeout_secs), async {
            let (status, out, err) = tokio::join!(child.wait(), read_all(stdout), read_all(stderr));
            Ok::<_, std::io::Error>((status?, out?, err?))
        })
        .await;

        match outcome {
            Ok(Ok((status, out, err))) => {
                debug!(?status, stdout_len = out.len(), stderr_len = err.len(), "RunPythonFile::execute: finished");
                Ok(truncate(format_output(
                    &String::from_utf8_lossy(&out),
                    &String::from_utf8_lossy(&err),
                    status,
                )))
            }
            Ok(Err(e)) => {
                debug!(%e, "RunPythonFile::execute: failed waiting for process");
                Err(ToolError::Io(e))
            }
            Err(_) => {
                warn!(?pid, %timeout_secs, "RunPythonFile::execute: timed out, killing process group");
                kill_process_group(pid);
                let _ = child.start_kill();
                // Reap so no zombie outlives the call
                let _ = child.wait().await;
                Err(ToolError::ProcessTimeout { timeout_secs })
            }
        }
    }
}

async fn read_all<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

fn format_output(stdout: &str, stderr: &str, status: ExitStatus) -> String {
    let mut sections = Vec::new();
    if !stdout.is_empty() {
        sections.push(format!("STDOUT:\n{}", stdout));
    }
    if !stderr.is_empty() {
        sections.push(format!("STDERR:\n{}", stderr));
    }
    match status.code() {
        Some(0) => {}
        Some(code) => sections.push(format!("Process exited with code {}", code)),
        None => sections.push(terminated_by_signal(status)),
    }

    if sections.is_empty() {
        "No output produced.".to_string()
    } else {
        sections.join("\n")
    }
}

#[cfg(unix)]
fn terminated_by_signal(status: ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;
    match status.signal() {
        Some(signal) => format!("Process terminated by signal {}", signal),
        None => "Process terminated".to_string(),
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_status: ExitStatus) -> String {
    "Process terminated".to_string()
}

fn truncate(output: String) -> String {
    match output.char_indices().nth(MAX_OUTPUT_CHARS) {
        Some((cut, _)) => {
            debug!(len = output.len(), "truncate: output over limit");
            format!(
                "{}...\n[truncated, {} chars total]",
                &output[..cut],
                output.chars().count()
            )
        }
        None => output,
    }
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    if let Some(pid) = pid
        && let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL)
    {
        debug!(%pid, %e, "kill_process_group: killpg failed");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}
