//! Adapter contracts for every external collaborator.
//!
//! The core never talks to a mail server, SMS gateway, calendar, chat room,
//! CRM, or file store directly — only through these traits. Each has a mock
//! and a real implementation in `opsflow-adapters`, selected by
//! configuration at construction time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::Result;
use crate::types::{ArtifactFile, CalendarEvent, Deal, EmailDraft};

/// Outbound email: draft, send, or hand off with a delivery time.
#[async_trait]
pub trait EmailAdapter: Send + Sync {
    /// Create a draft; returns a draft id.
    async fn draft(&self, draft: &EmailDraft) -> Result<String>;
    /// Send a previously created draft.
    async fn send(&self, draft_id: &str) -> Result<()>;
    /// Hand a draft to the provider with a delivery time; returns a scheduled id.
    async fn schedule(&self, draft: &EmailDraft, send_at: DateTime<Utc>) -> Result<String>;
}

#[async_trait]
pub trait SmsAdapter: Send + Sync {
    /// Send an SMS; returns a message id.
    async fn send(&self, to: &str, body: &str) -> Result<String>;
}

#[async_trait]
pub trait CalendarAdapter: Send + Sync {
    /// Create an event; returns an event id.
    async fn create_event(&self, event: &CalendarEvent) -> Result<String>;
    async fn update_event(&self, event_id: &str, event: &CalendarEvent) -> Result<()>;
    async fn delete_event(&self, event_id: &str) -> Result<()>;
}

#[async_trait]
pub trait ChatRoomAdapter: Send + Sync {
    /// Post a message to a room; returns a message id.
    async fn post_message(&self, room_id: &str, message: &str) -> Result<String>;
    /// Look a room up by name, creating it if missing; returns the room id.
    async fn get_or_create_room(&self, name: &str) -> Result<String>;
}

#[async_trait]
pub trait CrmAdapter: Send + Sync {
    async fn get_deal(&self, deal_id: &str) -> Result<Deal>;
    async fn update_stage(&self, deal_id: &str, stage: &str) -> Result<()>;
    async fn attach_file(&self, deal_id: &str, url: &str, filename: &str) -> Result<()>;
}

#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Upload a file; returns its URL.
    async fn upload(&self, file: &ArtifactFile) -> Result<String>;
}

/// Template rendering. Falls back to a built-in default body when the
/// named template is missing, so rendering itself never fails a flow.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template_key: &str, variables: &serde_json::Value) -> String;
}

/// The full set of collaborator adapters a flow processor works against.
#[derive(Clone)]
pub struct Adapters {
    pub email: Arc<dyn EmailAdapter>,
    pub sms: Arc<dyn SmsAdapter>,
    pub calendar: Arc<dyn CalendarAdapter>,
    pub chat: Arc<dyn ChatRoomAdapter>,
    pub crm: Arc<dyn CrmAdapter>,
    pub storage: Arc<dyn StorageAdapter>,
    pub templates: Arc<dyn TemplateRenderer>,
}
