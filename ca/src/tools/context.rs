//! ToolContext - execution context for tools

use std::path::Path;
use tracing::debug;

use super::PathSandbox;
use crate::config::{Config, ExecutionLimits, SandboxConfig};

/// How scripts are run by `run_python_file`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSettings {
    /// Interpreter program, looked up on PATH
    pub interpreter: String,

    /// Accepted file extensions, without the dot
    pub extensions: Vec<String>,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            extensions: vec!["py".to_string()],
        }
    }
}

impl ScriptSettings {
    pub fn new(interpreter: impl Into<String>, extensions: Vec<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
            extensions,
        }
    }

    /// Whether the file extension marks a runnable script
    pub fn accepts(&self, path: &Path) -> bool {
        let accepted = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)));
        debug!(?path, %accepted, "ScriptSettings::accepts: called");
        accepted
    }
}

impl From<&SandboxConfig> for ScriptSettings {
    fn from(config: &SandboxConfig) -> Self {
        Self::new(config.interpreter.clone(), config.extensions.clone())
    }
}

/// Context provided to every tool invocation
///
/// Immutable for the process lifetime: built once from the loaded config.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Path containment for every file argument
    pub sandbox: PathSandbox,

    /// Read and subprocess limits
    pub limits: ExecutionLimits,

    /// Script runner settings
    pub script: ScriptSettings,
}

impl ToolContext {
    pub fn new(sandbox: PathSandbox, limits: ExecutionLimits, script: ScriptSettings) -> Self {
        debug!(root = ?sandbox.root(), "ToolContext::new: called");
        Self {
            sandbox,
            limits,
            script,
        }
    }

    /// Build the context from the loaded config
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            PathSandbox::new(config.sandbox.working_dir.clone()),
            config.limits,
            ScriptSettings::from(&config.sandbox),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_script_settings_accepts_extension() {
        let settings = ScriptSettings::default();
        assert!(settings.accepts(Path::new("main.py")));
        assert!(settings.accepts(Path::new("pkg/tests.PY")));
        assert!(!settings.accepts(Path::new("main.sh")));
        assert!(!settings.accepts(Path::new("Makefile")));
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.sandbox.working_dir = PathBuf::from("/tmp/work");
        config.sandbox.interpreter = "sh".to_string();
        config.sandbox.extensions = vec!["sh".to_string()];
        config.limits.max_file_read_chars = 42;

        let ctx = ToolContext::from_config(&config);

        assert_eq!(ctx.sandbox.root(), Path::new("/tmp/work"));
        assert_eq!(ctx.script.interpreter, "sh");
        assert!(ctx.script.accepts(Path::new("run.sh")));
        assert_eq!(ctx.limits.max_file_read_chars, 42);
    }
}
