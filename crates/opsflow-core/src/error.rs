//! OpsFlow error type.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, OpsFlowError>;

/// All errors surfaced by the OpsFlow core.
#[derive(Debug, Error)]
pub enum OpsFlowError {
    /// Configuration could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),

    /// A collaborator adapter call failed (mail, SMS, calendar, chat, CRM, storage).
    #[error("adapter error: {0}")]
    Adapter(String),

    /// A flow processor failed while handling an event.
    #[error("processing error: {0}")]
    Processing(String),

    /// An event payload was missing or malformed for the matched flow.
    #[error("payload error: {0}")]
    Payload(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
