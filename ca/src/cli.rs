//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

/// codeagent - sandboxed coding assistant
#[derive(Parser)]
#[command(
    name = "ca",
    about = "Ask a coding question; the model may list, read, write and run files in the working directory",
    version,
    after_help = "Environment: GEMINI_API_KEY (required), WORKING_DIR, MAX_CHARS, MAX_CONV_ROUNDS, SUBPROCESS_TIMEOUT_SECS\n\
                  Logs are written to: ~/.local/share/codeagent/logs/codeagent.log"
)]
pub struct Cli {
    /// Prompt for the model (multiple words are joined with spaces)
    #[arg(required = true, num_args = 1.., value_name = "PROMPT")]
    pub prompt: Vec<String>,

    /// Enable verbose output
    #[arg(short, long, help = "Show function arguments, results and token usage")]
    pub verbose: bool,

    /// Path to config file
    #[arg(short, long, help = "Path to config file")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// The prompt words joined into a single prompt
    pub fn prompt_text(&self) -> String {
        self.prompt.join(" ")
    }
}
