//! Route handlers, one module per API area

pub mod chat;
pub mod health;
pub mod market;
pub mod scheduler;
pub mod stocks;
pub mod users;
