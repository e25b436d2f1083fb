//! Scheduled stock alerts for stock-analyst
//!
//! Users register an email address and attach alert definitions to it. Each
//! definition fires on the morning or evening trigger and mails either a
//! per-symbol recommendation digest or a general market summary.
//!
//! - [`model`]: users, alert definitions and their create/update requests
//! - [`store`]: the [`AlertStore`] / [`UserDirectory`] seams and [`JsonFileStore`]
//! - [`email`]: message composition and the [`EmailDispatcher`] seam
//! - [`scheduler`]: the [`AlertScheduler`] timers and manual runs

pub mod email;
pub mod error;
pub mod model;
pub mod scheduler;
pub mod store;

pub use email::{EmailDispatcher, LogDispatcher, OutgoingEmail, compose_market_alert, compose_welcome};
pub use error::{AlertError, Result};
pub use model::{
    AlertDefinition, AlertUpdate, Credentials, NewAlert, NewUser, Trigger, User, hash_password,
};
pub use scheduler::{
    AlertAnalyst, AlertScheduler, BatchReport, ManualRun, NextRuns, ScheduleConfig,
    compose_summary_alert, compose_symbol_alert, next_occurrence,
};
pub use store::{AlertStore, JsonFileStore, UserDirectory};
