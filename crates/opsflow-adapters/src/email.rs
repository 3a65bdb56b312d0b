//! SMTP email adapter (async lettre).
//!
//! SMTP has no provider-side draft or scheduling facility, so drafts are
//! held in memory until `send`, and `schedule` spawns a delayed send task.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use opsflow_core::config::SmtpConfig;
use opsflow_core::error::OpsFlowError;
use opsflow_core::traits::EmailAdapter;
use opsflow_core::types::EmailDraft;
use opsflow_core::Result;

pub struct SmtpEmailAdapter {
    config: SmtpConfig,
    drafts: Arc<Mutex<HashMap<String, EmailDraft>>>,
}

impl SmtpEmailAdapter {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config, drafts: Arc::new(Mutex::new(HashMap::new())) }
    }

    async fn transmit(config: &SmtpConfig, draft: &EmailDraft) -> Result<()> {
        use lettre::{
            AsyncSmtpTransport, AsyncTransport, Message,
            message::{Attachment as LettreAttachment, Mailbox, MultiPart, SinglePart},
            message::header::ContentType,
            transport::smtp::authentication::Credentials,
        };

        let from = if config.from.is_empty() { &config.username } else { &config.from };
        let from_mailbox: Mailbox = from
            .parse()
            .map_err(|e| OpsFlowError::Adapter(format!("Invalid from address: {e}")))?;

        let mut builder = Message::builder().from(from_mailbox).subject(&draft.subject);
        for to in &draft.to {
            let mailbox: Mailbox = to
                .parse()
                .map_err(|e| OpsFlowError::Adapter(format!("Invalid to address: {e}")))?;
            builder = builder.to(mailbox);
        }
        for cc in &draft.cc {
            let mailbox: Mailbox = cc
                .parse()
                .map_err(|e| OpsFlowError::Adapter(format!("Invalid cc address: {e}")))?;
            builder = builder.cc(mailbox);
        }
        for bcc in &draft.bcc {
            let mailbox: Mailbox = bcc
                .parse()
                .map_err(|e| OpsFlowError::Adapter(format!("Invalid bcc address: {e}")))?;
            builder = builder.bcc(mailbox);
        }

        let message = if draft.attachments.is_empty() {
            builder
                .header(ContentType::TEXT_PLAIN)
                .body(draft.body.clone())
                .map_err(|e| OpsFlowError::Adapter(format!("Build email: {e}")))?
        } else {
            let mut multipart = MultiPart::mixed().singlepart(SinglePart::plain(draft.body.clone()));
            for attachment in &draft.attachments {
                let content_type = ContentType::parse(&attachment.content_type)
                    .map_err(|e| OpsFlowError::Adapter(format!("Attachment content type: {e}")))?;
                multipart = multipart.singlepart(
                    LettreAttachment::new(attachment.filename.clone())
                        .body(attachment.content.clone(), content_type),
                );
            }
            builder
                .multipart(multipart)
                .map_err(|e| OpsFlowError::Adapter(format!("Build email: {e}")))?
        };

        let creds = Credentials::new(config.username.clone(), config.password.clone());
        let mailer = AsyncSmtpTransport::<lettre::Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| OpsFlowError::Adapter(format!("SMTP relay: {e}")))?
            .port(config.port)
            .credentials(creds)
            .build();

        mailer
            .send(message)
            .await
            .map_err(|e| OpsFlowError::Adapter(format!("SMTP send: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl EmailAdapter for SmtpEmailAdapter {
    async fn draft(&self, draft: &EmailDraft) -> Result<String> {
        let draft_id = format!("draft_{}", uuid::Uuid::new_v4());
        self.drafts
            .lock()
            .map_err(|_| OpsFlowError::Adapter("draft store lock poisoned".into()))?
            .insert(draft_id.clone(), draft.clone());
        tracing::info!(%draft_id, subject = %draft.subject, "email drafted");
        Ok(draft_id)
    }

    async fn send(&self, draft_id: &str) -> Result<()> {
        let draft = self
            .drafts
            .lock()
            .map_err(|_| OpsFlowError::Adapter("draft store lock poisoned".into()))?
            .remove(draft_id)
            .ok_or_else(|| OpsFlowError::Adapter(format!("Unknown draft: {draft_id}")))?;
        Self::transmit(&self.config, &draft).await?;
        tracing::info!(%draft_id, "email sent");
        Ok(())
    }

    async fn schedule(&self, draft: &EmailDraft, send_at: DateTime<Utc>) -> Result<String> {
        let scheduled_id = format!("scheduled_{}", uuid::Uuid::new_v4());
        let config = self.config.clone();
        let draft = draft.clone();
        let id = scheduled_id.clone();
        tokio::spawn(async move {
            let wait = (send_at - Utc::now()).num_seconds().max(0) as u64;
            tokio::time::sleep(std::time::Duration::from_secs(wait)).await;
            if let Err(e) = Self::transmit(&config, &draft).await {
                tracing::error!(scheduled_id = %id, error = %e, "scheduled email failed");
            }
        });
        tracing::info!(%scheduled_id, %send_at, "email scheduled");
        Ok(scheduled_id)
    }
}
