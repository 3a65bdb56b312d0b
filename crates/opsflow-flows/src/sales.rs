//! Sales flow — outreach automation driven by CRM call outcomes.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use opsflow_core::config::SalesConfig;
use opsflow_core::error::OpsFlowError;
use opsflow_core::traits::Adapters;
use opsflow_core::types::{
    ArtifactFile, Attachment, Channel, Deal, EmailDraft, Event, EventKind, SalesEvent,
};
use opsflow_core::Result;
use opsflow_scheduler::QuietHoursScheduler;

use crate::FlowProcessor;

pub struct SalesFlow {
    adapters: Adapters,
    config: SalesConfig,
    scheduler: Arc<QuietHoursScheduler>,
}

impl SalesFlow {
    pub fn new(adapters: Adapters, config: SalesConfig, scheduler: Arc<QuietHoursScheduler>) -> Self {
        Self { adapters, config, scheduler }
    }

    async fn handle_initial_call(&self, event: &Event) -> Result<()> {
        let deal = self.fetch_deal(event).await?;
        tracing::info!(deal_id = %deal.id, "handling initial call");

        let body = self.adapters.templates.render(
            "email/initial_contact",
            &serde_json::json!({
                "companyName": deal.company_name,
                "contactName": deal.contact_name,
                "dealAmount": deal.amount,
            }),
        );

        let draft = EmailDraft {
            to: vec![deal.email.clone()],
            cc: vec![],
            bcc: vec![self.config.default_bcc.clone()],
            subject: format!("{} - introduction and proposal", deal.company_name),
            body,
            attachments: vec![],
        };

        if self.scheduler.can_send_now(Channel::Email) {
            self.adapters.email.draft(&draft).await?;
            tracing::info!(deal_id = %deal.id, "initial contact email drafted");
        } else {
            let send_at = self.scheduler.schedule(draft, Channel::Email).await;
            tracing::info!(deal_id = %deal.id, %send_at, "initial contact email deferred");
        }
        Ok(())
    }

    async fn handle_no_answer(&self, event: &Event) -> Result<()> {
        let deal = self.fetch_deal(event).await?;
        tracing::info!(deal_id = %deal.id, "handling no answer");

        let email_body = self.adapters.templates.render(
            "email/follow_up_no_answer",
            &serde_json::json!({
                "companyName": deal.company_name,
                "contactName": deal.contact_name,
            }),
        );

        let draft = EmailDraft {
            to: vec![deal.email.clone()],
            cc: vec![],
            bcc: vec![self.config.default_bcc.clone()],
            subject: format!("{} - follow-up", deal.company_name),
            body: email_body,
            attachments: vec![],
        };

        // Follow-up email goes out unconditionally; the SMS only when a
        // phone number exists and the channel is currently sendable.
        self.adapters.email.draft(&draft).await?;

        if let Some(phone) = &deal.phone {
            if self.scheduler.can_send_now(Channel::Sms) {
                let sms_body = self.adapters.templates.render(
                    "sms/follow_up",
                    &serde_json::json!({ "companyName": deal.company_name }),
                );
                self.adapters.sms.send(phone, &sms_body).await?;
            }
        }
        Ok(())
    }

    async fn handle_quote_ready(&self, event: &Event) -> Result<()> {
        let deal = self.fetch_deal(event).await?;
        tracing::info!(deal_id = %deal.id, "handling quote ready");

        let quote = self.generate_quote(&deal);
        let filename = format!(
            "{}_{}_{}.pdf",
            self.config.attachment_prefix,
            deal.company_name,
            Utc::now().format("%Y%m%d"),
        );

        // Upload and CRM-attach must complete before the email draft is
        // issued: the email body references the upload's URL.
        let file_url = self
            .adapters
            .storage
            .upload(&ArtifactFile {
                filename: filename.clone(),
                content: quote.clone(),
                content_type: "application/pdf".into(),
                folder: Some(format!("sales/quotes/{}", deal.id)),
            })
            .await?;

        self.adapters.crm.attach_file(&deal.id, &file_url, &filename).await?;

        let body = self.adapters.templates.render(
            "email/quote_ready",
            &serde_json::json!({
                "companyName": deal.company_name,
                "contactName": deal.contact_name,
                "quoteAmount": deal.amount,
                "downloadUrl": file_url,
            }),
        );

        let draft = EmailDraft {
            to: vec![deal.email.clone()],
            cc: vec![],
            bcc: vec![self.config.default_bcc.clone()],
            subject: format!("{} - your quote", deal.company_name),
            body,
            attachments: vec![Attachment {
                filename,
                content: quote,
                content_type: "application/pdf".into(),
            }],
        };

        self.adapters.email.draft(&draft).await?;
        tracing::info!(deal_id = %deal.id, "quote email drafted with attachment");
        Ok(())
    }

    async fn handle_contract_signed(&self, event: &Event) -> Result<()> {
        let deal = self.fetch_deal(event).await?;
        self.adapters.crm.update_stage(&deal.id, "Closed Won").await?;
        tracing::info!(deal_id = %deal.id, "deal marked as closed won");
        Ok(())
    }

    async fn fetch_deal(&self, event: &Event) -> Result<Deal> {
        let deal_id = event.payload["dealId"]
            .as_str()
            .ok_or_else(|| OpsFlowError::Payload(format!("event {} missing dealId", event.id)))?;
        self.adapters.crm.get_deal(deal_id).await
    }

    fn generate_quote(&self, deal: &Deal) -> Vec<u8> {
        // Placeholder document body; real generation lives behind the
        // storage collaborator boundary.
        format!("Quote for {} - Amount: {}", deal.company_name, deal.amount).into_bytes()
    }
}

#[async_trait]
impl FlowProcessor for SalesFlow {
    fn domain(&self) -> &'static str {
        "Sales"
    }

    async fn process(&self, event: &Event) -> Result<()> {
        let EventKind::Sales(kind) = &event.kind else {
            tracing::warn!(kind = %event.kind, "non-sales event routed to sales flow");
            return Ok(());
        };
        tracing::info!(kind = %event.kind, "processing sales event");

        match kind {
            SalesEvent::InitialCallLogged => self.handle_initial_call(event).await,
            SalesEvent::NoAnswer => self.handle_no_answer(event).await,
            SalesEvent::QuoteReady => self.handle_quote_ready(event).await,
            SalesEvent::ContractSent => {
                tracing::info!(event_id = %event.id, "contract sent acknowledged");
                Ok(())
            }
            SalesEvent::ContractSigned => self.handle_contract_signed(event).await,
            SalesEvent::Other(name) => {
                tracing::warn!(name, "unknown sales event type");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsflow_adapters::mock::MockSet;
    use opsflow_core::types::QuietHoursWindow;

    fn event(kind: &str, deal_id: &str) -> Event {
        Event::new(
            "evt-1",
            EventKind::from(kind.to_string()),
            serde_json::json!({ "dealId": deal_id }),
        )
    }

    fn always_quiet(channel: Channel) -> QuietHoursWindow {
        // end_hour past any hour-of-day keeps the window permanently closed.
        QuietHoursWindow {
            channel,
            start_hour: 0,
            end_hour: 24,
            timezone: "UTC".into(),
            utc_offset_hours: 0,
        }
    }

    fn flow(mocks: &MockSet, windows: Vec<QuietHoursWindow>) -> (SalesFlow, Arc<QuietHoursScheduler>) {
        let scheduler = Arc::new(QuietHoursScheduler::new(windows, mocks.email.clone()));
        let flow = SalesFlow::new(mocks.adapters(), SalesConfig::default(), scheduler.clone());
        (flow, scheduler)
    }

    #[tokio::test]
    async fn test_initial_call_drafts_when_sendable() {
        let mocks = MockSet::new();
        let (flow, scheduler) = flow(&mocks, vec![]);
        flow.process(&event("Sales.InitialCallLogged", "deal_001")).await.unwrap();

        assert_eq!(mocks.email.drafts().len(), 1);
        assert_eq!(scheduler.pending_count().await, 0);
        let draft = &mocks.email.drafts()[0];
        assert_eq!(draft.bcc, vec!["sales@opsflow.example".to_string()]);
    }

    #[tokio::test]
    async fn test_initial_call_defers_during_quiet_hours() {
        let mocks = MockSet::new();
        let (flow, scheduler) = flow(&mocks, vec![always_quiet(Channel::Email)]);
        flow.process(&event("Sales.InitialCallLogged", "deal_001")).await.unwrap();

        assert!(mocks.email.drafts().is_empty());
        assert_eq!(scheduler.pending_count().await, 1);
    }

    #[tokio::test]
    async fn test_no_answer_sends_sms_when_phone_and_channel_open() {
        let mocks = MockSet::new();
        let (flow, _) = flow(&mocks, vec![]);
        flow.process(&event("Sales.NoAnswer", "deal_001")).await.unwrap();

        assert_eq!(mocks.email.drafts().len(), 1);
        assert_eq!(mocks.sms.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_no_answer_skips_sms_during_quiet_hours() {
        let mocks = MockSet::new();
        let (flow, _) = flow(&mocks, vec![always_quiet(Channel::Sms)]);
        flow.process(&event("Sales.NoAnswer", "deal_001")).await.unwrap();

        // Email still goes out; SMS is suppressed.
        assert_eq!(mocks.email.drafts().len(), 1);
        assert!(mocks.sms.sent().is_empty());
    }

    #[tokio::test]
    async fn test_no_answer_skips_sms_without_phone() {
        let mocks = MockSet::new();
        mocks.crm.insert_deal(Deal {
            id: "deal_np".into(),
            company_name: "NoPhone Co".into(),
            contact_name: "Kim".into(),
            email: "kim@nophone.example".into(),
            phone: None,
            amount: 42_000,
            stage: "Qualification".into(),
        });
        let (flow, _) = flow(&mocks, vec![]);
        flow.process(&event("Sales.NoAnswer", "deal_np")).await.unwrap();

        assert_eq!(mocks.email.drafts().len(), 1);
        assert!(mocks.sms.sent().is_empty());
    }

    #[tokio::test]
    async fn test_quote_ready_orders_upload_attach_email() {
        let mocks = MockSet::new();
        let (flow, _) = flow(&mocks, vec![]);
        flow.process(&event("Sales.QuoteReady", "deal_001")).await.unwrap();

        let calls = mocks.calls();
        let pos = |name: &str| calls.iter().position(|c| c == name).unwrap();
        assert!(pos("storage.upload") < pos("crm.attach_file"));
        assert!(pos("crm.attach_file") < pos("email.draft"));

        // The draft bundles the uploaded artifact and references its URL.
        let draft = &mocks.email.drafts()[0];
        assert_eq!(draft.attachments.len(), 1);
        assert!(draft.body.contains(&mocks.storage.uploads()[0]));
    }

    #[tokio::test]
    async fn test_contract_signed_updates_stage_only() {
        let mocks = MockSet::new();
        let (flow, _) = flow(&mocks, vec![]);
        flow.process(&event("Sales.ContractSigned", "deal_001")).await.unwrap();

        assert_eq!(mocks.crm.stage_of("deal_001").as_deref(), Some("Closed Won"));
        assert!(mocks.email.drafts().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_sales_kind_is_noop() {
        let mocks = MockSet::new();
        let (flow, _) = flow(&mocks, vec![]);
        flow.process(&event("Sales.SomethingNew", "deal_001")).await.unwrap();

        assert!(mocks.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_deal_id_is_payload_error() {
        let mocks = MockSet::new();
        let (flow, _) = flow(&mocks, vec![]);
        let bad = Event::new(
            "evt-2",
            EventKind::from("Sales.NoAnswer".to_string()),
            serde_json::json!({}),
        );
        let err = flow.process(&bad).await.unwrap_err();
        assert!(matches!(err, OpsFlowError::Payload(_)));
    }
}
