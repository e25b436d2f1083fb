//! Shared utilities for stock-analyst
//!
//! This crate provides common functionality used across the workspace,
//! including logging setup, environment-driven configuration and rounding
//! helpers shared by the market and chat crates.

pub mod config;
pub mod logging;
pub mod numeric;

pub use config::{Config, ConfigError, env_or, env_parse};
pub use logging::{LogFormat, init_tracing, init_tracing_with};
pub use numeric::round2;
