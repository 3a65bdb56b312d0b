//! # OpsFlow Core
//!
//! Shared foundation for the OpsFlow workflow automation engine:
//! the error type, configuration system, domain types (events, deals,
//! training programs, drafts), and the adapter contracts every external
//! collaborator (email, SMS, calendar, chat, CRM, storage, templates)
//! is invoked through.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::OpsFlowConfig;
pub use error::{OpsFlowError, Result};
