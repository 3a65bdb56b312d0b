//! Domain types — the core data model shared by every OpsFlow crate.
//!
//! Events arrive on the wire with a namespaced `"<Domain>.<Name>"` type
//! string; that string is decoded once, at the serde boundary, into the
//! [`EventKind`] enums so flow routing is an exhaustive match instead of
//! string-prefix checks.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// An immutable fact driving workflow execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event id — the deduplication key.
    pub id: String,
    /// Decoded event type (wire field `type`).
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Opaque event payload, interpreted by the matched flow.
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Event {
    pub fn new(id: &str, kind: EventKind, payload: serde_json::Value) -> Self {
        Self {
            id: id.to_string(),
            kind,
            payload,
            timestamp: Some(Utc::now()),
            source: None,
        }
    }
}

/// Event type, decoded from the wire string by domain prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Sales(SalesEvent),
    Training(TrainingEvent),
    /// Prefix did not match any registered domain.
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SalesEvent {
    InitialCallLogged,
    NoAnswer,
    QuoteReady,
    ContractSent,
    ContractSigned,
    /// Sales-domain event with an unrecognized name (warn + no-op).
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainingEvent {
    ContractSigned,
    SessionScheduled,
    Tminus3,
    Tminus1,
    SessionCompleted,
    /// Training-domain event with an unrecognized name (warn + no-op).
    Other(String),
}

impl EventKind {
    /// Domain prefix, if the event matched a registered domain.
    pub fn domain(&self) -> Option<&'static str> {
        match self {
            EventKind::Sales(_) => Some("Sales"),
            EventKind::Training(_) => Some("Training"),
            EventKind::Unknown(_) => None,
        }
    }

    /// Reconstruct the wire `"<Domain>.<Name>"` string.
    pub fn as_wire(&self) -> String {
        match self {
            EventKind::Sales(e) => format!("Sales.{}", e.name()),
            EventKind::Training(e) => format!("Training.{}", e.name()),
            EventKind::Unknown(s) => s.clone(),
        }
    }
}

impl SalesEvent {
    fn name(&self) -> &str {
        match self {
            SalesEvent::InitialCallLogged => "InitialCallLogged",
            SalesEvent::NoAnswer => "NoAnswer",
            SalesEvent::QuoteReady => "QuoteReady",
            SalesEvent::ContractSent => "ContractSent",
            SalesEvent::ContractSigned => "ContractSigned",
            SalesEvent::Other(s) => s,
        }
    }
}

impl TrainingEvent {
    fn name(&self) -> &str {
        match self {
            TrainingEvent::ContractSigned => "ContractSigned",
            TrainingEvent::SessionScheduled => "SessionScheduled",
            TrainingEvent::Tminus3 => "Tminus3",
            TrainingEvent::Tminus1 => "Tminus1",
            TrainingEvent::SessionCompleted => "SessionCompleted",
            TrainingEvent::Other(s) => s,
        }
    }
}

impl From<String> for EventKind {
    fn from(wire: String) -> Self {
        let Some((domain, name)) = wire.split_once('.') else {
            return EventKind::Unknown(wire);
        };
        match domain {
            "Sales" => EventKind::Sales(match name {
                "InitialCallLogged" => SalesEvent::InitialCallLogged,
                "NoAnswer" => SalesEvent::NoAnswer,
                "QuoteReady" => SalesEvent::QuoteReady,
                "ContractSent" => SalesEvent::ContractSent,
                "ContractSigned" => SalesEvent::ContractSigned,
                other => SalesEvent::Other(other.to_string()),
            }),
            "Training" => EventKind::Training(match name {
                "ContractSigned" => TrainingEvent::ContractSigned,
                "SessionScheduled" => TrainingEvent::SessionScheduled,
                "Tminus3" => TrainingEvent::Tminus3,
                "Tminus1" => TrainingEvent::Tminus1,
                "SessionCompleted" => TrainingEvent::SessionCompleted,
                other => TrainingEvent::Other(other.to_string()),
            }),
            _ => EventKind::Unknown(wire),
        }
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_wire()
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_wire())
    }
}

/// Outbound communication channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
    Chat,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
            Channel::Chat => "chat",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A CRM deal record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: String,
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub amount: u64,
    pub stage: String,
}

/// A training program bought by a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingProgram {
    pub id: String,
    pub company_name: String,
    pub program_name: String,
    pub start_date: NaiveDate,
    pub session_count: u32,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub name: String,
    pub email: String,
}

/// One delivery session of a training program.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub program_id: String,
    pub session_number: u32,
    pub title: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording_url: Option<String>,
}

/// An outbound email, drafted before sending.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailDraft {
    pub to: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<String>,
    pub subject: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub filename: String,
    pub content: Vec<u8>,
    pub content_type: String,
}

/// A file handed to the storage adapter.
#[derive(Debug, Clone)]
pub struct ArtifactFile {
    pub filename: String,
    pub content: Vec<u8>,
    pub content_type: String,
    pub folder: Option<String>,
}

/// A calendar event handed to the calendar adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub attendees: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_url: Option<String>,
}

/// A time-of-day window during which a channel must not originate sends.
/// `start_hour > end_hour` means the window wraps midnight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuietHoursWindow {
    pub channel: Channel,
    pub start_hour: u32,
    pub end_hour: u32,
    pub timezone: String,
    /// Fixed UTC offset of `timezone`, in hours.
    pub utc_offset_hours: i32,
}

/// A draft held until quiet hours end.
#[derive(Debug, Clone)]
pub struct DeferredSend {
    pub draft: EmailDraft,
    pub channel: Channel,
    pub send_at: DateTime<Utc>,
}

/// Operator-initiated action kinds accepted by the action gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ApproveSend,
    DeferNextBd,
    Reject,
    Toggle,
}

impl ActionKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "approve_send" => Some(ActionKind::ApproveSend),
            "defer_next_bd" => Some(ActionKind::DeferNextBd),
            "reject" => Some(ActionKind::Reject),
            "toggle" => Some(ActionKind::Toggle),
            _ => None,
        }
    }
}

/// Request body of an operator action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// Result of an operator action. Failures are reported here as `ok: false`
/// rather than as errors, so the contract stays uniform for clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub ok: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automation_enabled: Option<bool>,
}

impl ActionResult {
    pub fn ok(message: &str) -> Self {
        Self {
            ok: true,
            message: message.to_string(),
            queue_id: None,
            deal_id: None,
            scheduled_for: None,
            reason: None,
            automation_enabled: None,
        }
    }

    pub fn fail(message: &str) -> Self {
        Self {
            ok: false,
            ..Self::ok(message)
        }
    }
}
