//! HTTP API for stock-analyst
//!
//! Exposes market data, the tool-augmented chat, AI summaries and the alert
//! scheduler over JSON. [`create_app`] builds the router from an
//! [`AppState`]; the `stock-analyst` binary wires live providers into it.

pub mod app;
pub mod error;
pub mod routes;
pub mod state;

pub use app::create_app;
pub use error::ApiError;
pub use state::AppState;
