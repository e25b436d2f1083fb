//! Error types for tool execution

use thiserror::Error;

/// Result type for tool operations
pub type Result<T> = std::result::Result<T, ToolError>;

/// Errors raised by tools and the registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// Arguments did not match the tool's input schema
    #[error("Invalid parameters for {tool}: {reason}")]
    InvalidParameters { tool: String, reason: String },

    /// The tool ran but could not produce a result
    #[error("Tool {tool} failed: {reason}")]
    ExecutionFailed { tool: String, reason: String },

    /// Two tools were registered under the same name
    #[error("Duplicate tool name: {0}")]
    DuplicateName(String),
}
