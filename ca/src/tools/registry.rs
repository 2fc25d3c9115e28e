//! ToolRegistry - the closed set of functions the model may call

use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

use crate::config::Config;
use crate::llm::{FunctionCall, FunctionResult, ToolDefinition};

use super::builtin::{GetFileContent, GetFilesInfo, RunPythonFile, WriteFile};
use super::{ToolContext, ToolError};

/// Every operation the model can request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GetFilesInfo,
    GetFileContent,
    WriteFile,
    RunPythonFile,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::GetFilesInfo,
        Operation::GetFileContent,
        Operation::WriteFile,
        Operation::RunPythonFile,
    ];

    /// Wire name used in function declarations and calls
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetFilesInfo => GetFilesInfo::NAME,
            Self::GetFileContent => GetFileContent::NAME,
            Self::WriteFile => WriteFile::NAME,
            Self::RunPythonFile => RunPythonFile::NAME,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| ToolError::UnrecognizedFunction { name: s.to_string() })
    }
}

/// Dispatches function calls to the builtin operations
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    ctx: ToolContext,
}

impl ToolRegistry {
    pub fn new(ctx: ToolContext) -> Self {
        debug!("ToolRegistry::new: called");
        Self { ctx }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(ToolContext::from_config(config))
    }

    /// Function declarations for the model, one per operation
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        debug!("ToolRegistry::definitions: called");
        Operation::ALL
            .into_iter()
            .map(|op| match op {
                Operation::GetFilesInfo => GetFilesInfo::definition(),
                Operation::GetFileContent => GetFileContent::definition(self.ctx.limits.max_file_read_chars),
                Operation::WriteFile => WriteFile::definition(),
                Operation::RunPythonFile => RunPythonFile::definition(),
            })
            .collect()
    }

    /// Execute one function call
    ///
    /// Never fails: any error, including an unknown function name, becomes an
    /// error result carrying the error text.
    pub async fn execute(&self, call: &FunctionCall) -> FunctionResult {
        info!(name = %call.name, "ToolRegistry::execute: called");
        match self.dispatch(call).await {
            Ok(output) => {
                debug!(name = %call.name, output_len = output.len(), "ToolRegistry::execute: success");
                FunctionResult::success(&call.name, output)
            }
            Err(e) => {
                debug!(name = %call.name, %e, "ToolRegistry::execute: error");
                FunctionResult::error(&call.name, e.to_string())
            }
        }
    }

    async fn dispatch(&self, call: &FunctionCall) -> Result<String, ToolError> {
        let ctx = &self.ctx;
        match call.name.parse::<Operation>()? {
            Operation::GetFilesInfo => GetFilesInfo::execute(&call.args, ctx).await,
            Operation::GetFileContent => GetFileContent::execute(&call.args, ctx).await,
            Operation::WriteFile => WriteFile::execute(&call.args, ctx).await,
            Operation::RunPythonFile => RunPythonFile::execute(&call.args, ctx).await,
        }
    }
}
