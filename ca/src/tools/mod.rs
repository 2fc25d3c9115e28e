//! Tool system
//!
//! The model reaches the filesystem only through these functions. Every path
//! argument goes through [`PathSandbox`], so no function can read, write or
//! run anything outside the configured working directory.

mod context;
mod error;
mod registry;
mod sandbox;

pub mod builtin;

pub use context::{ScriptSettings, ToolContext};
pub use error::ToolError;
pub use registry::{Operation, ToolRegistry};
pub use sandbox::PathSandbox;
