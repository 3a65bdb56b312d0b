//! In-memory mock adapters.
//!
//! Every mock records its calls in a shared, ordered log so tests can
//! assert cross-adapter sequencing (upload before attach before draft).
//! The CRM mock synthesizes a deal for any id it has not been given, so
//! flows can run against arbitrary payloads without fixture setup.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use opsflow_core::traits::{
    Adapters, CalendarAdapter, ChatRoomAdapter, CrmAdapter, EmailAdapter, SmsAdapter,
    StorageAdapter,
};
use opsflow_core::types::{ArtifactFile, CalendarEvent, Deal, EmailDraft};
use opsflow_core::Result;

use crate::template::TemplateEngine;

/// Ordered record of every adapter call, shared across the mock set.
type CallLog = Arc<Mutex<Vec<String>>>;

fn log(calls: &CallLog, entry: &str) {
    if let Ok(mut calls) = calls.lock() {
        calls.push(entry.to_string());
    }
}

/// The complete mock adapter bundle with inspection handles.
pub struct MockSet {
    pub email: Arc<MockEmail>,
    pub sms: Arc<MockSms>,
    pub calendar: Arc<MockCalendar>,
    pub chat: Arc<MockChat>,
    pub crm: Arc<MockCrm>,
    pub storage: Arc<MockStorage>,
    pub templates: Arc<TemplateEngine>,
    calls: CallLog,
}

impl MockSet {
    pub fn new() -> Self {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let crm = Arc::new(MockCrm::new(calls.clone()));
        crm.insert_deal(Deal {
            id: "deal_001".into(),
            company_name: "Acme Corporation".into(),
            contact_name: "Taro Yamada".into(),
            email: "taro.yamada@acme.example".into(),
            phone: Some("+81-90-1234-5678".into()),
            amount: 1_200_000,
            stage: "Qualification".into(),
        });
        Self {
            email: Arc::new(MockEmail::new(calls.clone())),
            sms: Arc::new(MockSms::new(calls.clone())),
            calendar: Arc::new(MockCalendar::new(calls.clone())),
            chat: Arc::new(MockChat::new(calls.clone())),
            crm,
            storage: Arc::new(MockStorage::new(calls.clone())),
            templates: Arc::new(TemplateEngine::new(PathBuf::from("templates"))),
            calls,
        }
    }

    /// The trait-object bundle flows are constructed with.
    pub fn adapters(&self) -> Adapters {
        Adapters {
            email: self.email.clone(),
            sms: self.sms.clone(),
            calendar: self.calendar.clone(),
            chat: self.chat.clone(),
            crm: self.crm.clone(),
            storage: self.storage.clone(),
            templates: self.templates.clone(),
        }
    }

    /// Snapshot of the ordered cross-adapter call log.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Default for MockSet {
    fn default() -> Self {
        Self::new()
    }
}

pub struct MockEmail {
    calls: CallLog,
    drafts: Mutex<Vec<EmailDraft>>,
    sent: Mutex<Vec<String>>,
    scheduled: Mutex<Vec<(EmailDraft, DateTime<Utc>)>>,
}

impl MockEmail {
    fn new(calls: CallLog) -> Self {
        Self {
            calls,
            drafts: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            scheduled: Mutex::new(Vec::new()),
        }
    }

    pub fn drafts(&self) -> Vec<EmailDraft> {
        self.drafts.lock().map(|d| d.clone()).unwrap_or_default()
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn scheduled(&self) -> Vec<(EmailDraft, DateTime<Utc>)> {
        self.scheduled.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EmailAdapter for MockEmail {
    async fn draft(&self, draft: &EmailDraft) -> Result<String> {
        log(&self.calls, "email.draft");
        let id = {
            let mut drafts = self.drafts.lock().map_err(poisoned)?;
            drafts.push(draft.clone());
            format!("draft_{}", drafts.len())
        };
        tracing::debug!(%id, subject = %draft.subject, "mock email drafted");
        Ok(id)
    }

    async fn send(&self, draft_id: &str) -> Result<()> {
        log(&self.calls, "email.send");
        self.sent.lock().map_err(poisoned)?.push(draft_id.to_string());
        Ok(())
    }

    async fn schedule(&self, draft: &EmailDraft, send_at: DateTime<Utc>) -> Result<String> {
        log(&self.calls, "email.schedule");
        let mut scheduled = self.scheduled.lock().map_err(poisoned)?;
        scheduled.push((draft.clone(), send_at));
        Ok(format!("scheduled_{}", scheduled.len()))
    }
}

pub struct MockSms {
    calls: CallLog,
    sent: Mutex<Vec<(String, String)>>,
}

impl MockSms {
    fn new(calls: CallLog) -> Self {
        Self { calls, sent: Mutex::new(Vec::new()) }
    }

    /// (to, body) pairs in send order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SmsAdapter for MockSms {
    async fn send(&self, to: &str, body: &str) -> Result<String> {
        log(&self.calls, "sms.send");
        let mut sent = self.sent.lock().map_err(poisoned)?;
        sent.push((to.to_string(), body.to_string()));
        Ok(format!("sms_{}", sent.len()))
    }
}

pub struct MockCalendar {
    calls: CallLog,
    created: Mutex<Vec<CalendarEvent>>,
}

impl MockCalendar {
    fn new(calls: CallLog) -> Self {
        Self { calls, created: Mutex::new(Vec::new()) }
    }

    pub fn created(&self) -> Vec<CalendarEvent> {
        self.created.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CalendarAdapter for MockCalendar {
    async fn create_event(&self, event: &CalendarEvent) -> Result<String> {
        log(&self.calls, "calendar.create_event");
        let mut created = self.created.lock().map_err(poisoned)?;
        created.push(event.clone());
        Ok(format!("cal_{}", created.len()))
    }

    async fn update_event(&self, _event_id: &str, _event: &CalendarEvent) -> Result<()> {
        log(&self.calls, "calendar.update_event");
        Ok(())
    }

    async fn delete_event(&self, _event_id: &str) -> Result<()> {
        log(&self.calls, "calendar.delete_event");
        Ok(())
    }
}

pub struct MockChat {
    calls: CallLog,
    rooms: Mutex<HashMap<String, String>>,
    posts: Mutex<Vec<(String, String)>>,
}

impl MockChat {
    fn new(calls: CallLog) -> Self {
        Self {
            calls,
            rooms: Mutex::new(HashMap::new()),
            posts: Mutex::new(Vec::new()),
        }
    }

    /// (room_id, message) pairs in post order.
    pub fn posts(&self) -> Vec<(String, String)> {
        self.posts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ChatRoomAdapter for MockChat {
    async fn post_message(&self, room_id: &str, message: &str) -> Result<String> {
        log(&self.calls, "chat.post_message");
        let mut posts = self.posts.lock().map_err(poisoned)?;
        posts.push((room_id.to_string(), message.to_string()));
        Ok(format!("msg_{}", posts.len()))
    }

    async fn get_or_create_room(&self, name: &str) -> Result<String> {
        log(&self.calls, "chat.get_or_create_room");
        let mut rooms = self.rooms.lock().map_err(poisoned)?;
        let next_id = format!("room_{}", rooms.len() + 1);
        Ok(rooms.entry(name.to_string()).or_insert(next_id).clone())
    }
}

pub struct MockCrm {
    calls: CallLog,
    deals: Mutex<HashMap<String, Deal>>,
    attachments: Mutex<Vec<(String, String, String)>>,
}

impl MockCrm {
    fn new(calls: CallLog) -> Self {
        Self {
            calls,
            deals: Mutex::new(HashMap::new()),
            attachments: Mutex::new(Vec::new()),
        }
    }

    pub fn insert_deal(&self, deal: Deal) {
        if let Ok(mut deals) = self.deals.lock() {
            deals.insert(deal.id.clone(), deal);
        }
    }

    pub fn stage_of(&self, deal_id: &str) -> Option<String> {
        self.deals
            .lock()
            .ok()
            .and_then(|d| d.get(deal_id).map(|deal| deal.stage.clone()))
    }

    /// (deal_id, url, filename) triples in attach order.
    pub fn attachments(&self) -> Vec<(String, String, String)> {
        self.attachments.lock().map(|a| a.clone()).unwrap_or_default()
    }

    fn synthesize(deal_id: &str) -> Deal {
        Deal {
            id: deal_id.to_string(),
            company_name: format!("Company {deal_id}"),
            contact_name: "Mock Contact".into(),
            email: format!("{deal_id}@mock.example"),
            phone: Some("+81-90-0000-0000".into()),
            amount: 500_000,
            stage: "Qualification".into(),
        }
    }
}

#[async_trait]
impl CrmAdapter for MockCrm {
    async fn get_deal(&self, deal_id: &str) -> Result<Deal> {
        log(&self.calls, "crm.get_deal");
        let mut deals = self.deals.lock().map_err(poisoned)?;
        Ok(deals
            .entry(deal_id.to_string())
            .or_insert_with(|| Self::synthesize(deal_id))
            .clone())
    }

    async fn update_stage(&self, deal_id: &str, stage: &str) -> Result<()> {
        log(&self.calls, "crm.update_stage");
        let mut deals = self.deals.lock().map_err(poisoned)?;
        deals
            .entry(deal_id.to_string())
            .or_insert_with(|| Self::synthesize(deal_id))
            .stage = stage.to_string();
        Ok(())
    }

    async fn attach_file(&self, deal_id: &str, url: &str, filename: &str) -> Result<()> {
        log(&self.calls, "crm.attach_file");
        self.attachments.lock().map_err(poisoned)?.push((
            deal_id.to_string(),
            url.to_string(),
            filename.to_string(),
        ));
        Ok(())
    }
}

pub struct MockStorage {
    calls: CallLog,
    uploads: Mutex<Vec<String>>,
}

impl MockStorage {
    fn new(calls: CallLog) -> Self {
        Self { calls, uploads: Mutex::new(Vec::new()) }
    }

    /// URLs returned by `upload`, in order.
    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl StorageAdapter for MockStorage {
    async fn upload(&self, file: &ArtifactFile) -> Result<String> {
        log(&self.calls, "storage.upload");
        let folder = file.folder.as_deref().unwrap_or("uploads");
        let url = format!("file:///mock/{}/{}", folder, file.filename);
        self.uploads.lock().map_err(poisoned)?.push(url.clone());
        Ok(url)
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> opsflow_core::OpsFlowError {
    opsflow_core::OpsFlowError::Adapter("mock state lock poisoned".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_call_log_preserves_cross_adapter_order() {
        let mocks = MockSet::new();
        mocks
            .storage
            .upload(&ArtifactFile {
                filename: "a.pdf".into(),
                content: vec![1, 2, 3],
                content_type: "application/pdf".into(),
                folder: None,
            })
            .await
            .unwrap();
        mocks.crm.attach_file("deal_001", "file:///mock/uploads/a.pdf", "a.pdf").await.unwrap();
        mocks.sms.send("+81-90-1234-5678", "hello").await.unwrap();

        assert_eq!(mocks.calls(), vec!["storage.upload", "crm.attach_file", "sms.send"]);
    }

    #[tokio::test]
    async fn test_crm_synthesizes_unknown_deals() {
        let mocks = MockSet::new();
        let deal = mocks.crm.get_deal("deal_xyz").await.unwrap();
        assert_eq!(deal.id, "deal_xyz");
        assert!(deal.phone.is_some());

        // Stage updates on synthesized deals stick.
        mocks.crm.update_stage("deal_xyz", "Closed Won").await.unwrap();
        assert_eq!(mocks.crm.stage_of("deal_xyz").as_deref(), Some("Closed Won"));
    }

    #[tokio::test]
    async fn test_chat_rooms_are_stable_by_name() {
        let mocks = MockSet::new();
        let a = mocks.chat.get_or_create_room("Training - Acme").await.unwrap();
        let b = mocks.chat.get_or_create_room("Training - Acme").await.unwrap();
        let c = mocks.chat.get_or_create_room("Training - Beta").await.unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(mocks.chat.room_count(), 2);
    }
}
