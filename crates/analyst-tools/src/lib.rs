//! Tool management and execution framework for stock-analyst
//!
//! This crate provides the [`Tool`] trait implemented by every function the
//! language model may call, and the immutable [`ToolRegistry`] that resolves
//! tool calls by name.

pub mod error;
pub mod registry;
pub mod tool;

pub use error::{Result, ToolError};
pub use registry::{ToolRegistry, ToolRegistryBuilder};
pub use tool::{Tool, parse_params};
