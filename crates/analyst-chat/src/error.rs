//! Error types for chat and analysis operations

use analyst_llm::LLMError;
use analyst_tools::ToolError;
use thiserror::Error;

/// Result type for chat operations
pub type Result<T> = std::result::Result<T, ChatError>;

/// Errors raised while talking to the language model
#[derive(Debug, Error)]
pub enum ChatError {
    /// The completion call failed
    #[error("{0}")]
    Completion(#[from] LLMError),

    /// A prompt template failed to render
    #[error("Prompt rendering failed: {0}")]
    Prompt(#[from] minijinja::Error),

    /// The tool registry could not be built
    #[error("Tool registry error: {0}")]
    Tools(#[from] ToolError),

    /// Invalid chat configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_error_keeps_provider_message() {
        let err = ChatError::from(LLMError::AuthenticationFailed);
        assert_eq!(err.to_string(), "Invalid API key or authentication failed");
    }

    #[test]
    fn test_tool_error_conversion() {
        let err = ChatError::from(ToolError::DuplicateName("get_stock_info".to_string()));
        assert!(matches!(err, ChatError::Tools(_)));
    }
}
