//! Training flow — program logistics: session rollout, reminders, wrap-up.

use async_trait::async_trait;
use chrono::{Duration, NaiveTime};

use opsflow_core::config::TrainingConfig;
use opsflow_core::error::OpsFlowError;
use opsflow_core::traits::Adapters;
use opsflow_core::types::{
    CalendarEvent, EmailDraft, Event, EventKind, Session, TrainingEvent, TrainingProgram,
};
use opsflow_core::Result;

use crate::FlowProcessor;

pub struct TrainingFlow {
    adapters: Adapters,
    config: TrainingConfig,
}

impl TrainingFlow {
    pub fn new(adapters: Adapters, config: TrainingConfig) -> Self {
        Self { adapters, config }
    }

    /// Contract signed: roll out every session (draft + calendar event),
    /// then announce the program in its chat room.
    async fn handle_contract_signed(&self, event: &Event) -> Result<()> {
        let program = self.program_from(event)?;
        tracing::info!(program_id = %program.id, "handling training contract signed");

        let sessions = generate_sessions(&program, &self.config);

        for session in &sessions {
            let body = self.adapters.templates.render(
                "email/session_draft",
                &serde_json::json!({
                    "companyName": program.company_name,
                    "programName": program.program_name,
                    "sessionNumber": session.session_number,
                    "sessionTitle": session.title,
                    "sessionDate": session.date,
                    "startTime": session.start_time,
                    "endTime": session.end_time,
                }),
            );

            let draft = EmailDraft {
                to: program.participants.iter().map(|p| p.email.clone()).collect(),
                cc: vec![],
                bcc: vec![self.config.default_bcc.clone()],
                subject: format!(
                    "{} - session {} of {}: {}",
                    program.company_name, session.session_number, sessions.len(), session.title
                ),
                body: body.clone(),
                attachments: vec![],
            };
            self.adapters.email.draft(&draft).await?;

            let start = session.date.and_time(session.start_time).and_utc();
            let end = session.date.and_time(session.end_time).and_utc();
            self.adapters
                .calendar
                .create_event(&CalendarEvent {
                    title: format!(
                        "Training: {} - session {}",
                        program.company_name, session.session_number
                    ),
                    description: Some(body),
                    start_time: start,
                    end_time: end,
                    attendees: program.participants.iter().map(|p| p.email.clone()).collect(),
                    meeting_url: session.meeting_url.clone(),
                })
                .await?;
        }

        let room_message = self.adapters.templates.render(
            "chat/program_start",
            &serde_json::json!({
                "companyName": program.company_name,
                "programName": program.program_name,
                "sessionCount": sessions.len(),
                "startDate": program.start_date,
            }),
        );
        let room_id = self.program_room(&program).await?;
        self.adapters.chat.post_message(&room_id, &room_message).await?;

        tracing::info!(
            program_id = %program.id,
            sessions_created = sessions.len(),
            "training program initialized"
        );
        Ok(())
    }

    /// T-3 / T-1 reminder: email the participants and post to the room.
    async fn handle_reminder(&self, event: &Event, days_before: u32) -> Result<()> {
        let program = self.program_from(event)?;
        let session = self.session_from(event)?;
        tracing::info!(session_id = %session.id, days_before, "handling session reminder");

        let template = format!("email/reminder_t{days_before}");
        let body = self.adapters.templates.render(
            &template,
            &serde_json::json!({
                "companyName": program.company_name,
                "sessionNumber": session.session_number,
                "sessionTitle": session.title,
                "sessionDate": session.date,
                "startTime": session.start_time,
                "meetingUrl": session.meeting_url,
                "materials": session.materials,
            }),
        );

        let draft = EmailDraft {
            to: program.participants.iter().map(|p| p.email.clone()).collect(),
            cc: vec![],
            bcc: vec![self.config.default_bcc.clone()],
            subject: format!(
                "Reminder: {} - session {} in {} day(s)",
                program.company_name, session.session_number, days_before
            ),
            body,
            attachments: vec![],
        };
        self.adapters.email.draft(&draft).await?;

        let room_message = self.adapters.templates.render(
            &format!("chat/reminder_t{days_before}"),
            &serde_json::json!({
                "sessionNumber": session.session_number,
                "sessionTitle": session.title,
                "sessionDate": session.date,
                "startTime": session.start_time,
            }),
        );
        let room_id = self.program_room(&program).await?;
        self.adapters.chat.post_message(&room_id, &room_message).await?;
        Ok(())
    }

    /// Session completed: room post only, no outbound message.
    async fn handle_session_completed(&self, event: &Event) -> Result<()> {
        let program = self.program_from(event)?;
        let session = self.session_from(event)?;
        tracing::info!(session_id = %session.id, "handling session completed");

        let room_message = self.adapters.templates.render(
            "chat/session_completed",
            &serde_json::json!({
                "sessionNumber": session.session_number,
                "sessionTitle": session.title,
                "recordingUrl": session.recording_url,
            }),
        );
        let room_id = self.program_room(&program).await?;
        self.adapters.chat.post_message(&room_id, &room_message).await?;
        Ok(())
    }

    async fn program_room(&self, program: &TrainingProgram) -> Result<String> {
        let room_name = format!("Training - {} {}", program.company_name, program.program_name);
        self.adapters.chat.get_or_create_room(&room_name).await
    }

    fn program_from(&self, event: &Event) -> Result<TrainingProgram> {
        serde_json::from_value(event.payload["program"].clone())
            .map_err(|e| OpsFlowError::Payload(format!("event {} program: {e}", event.id)))
    }

    fn session_from(&self, event: &Event) -> Result<Session> {
        serde_json::from_value(event.payload["session"].clone())
            .map_err(|e| OpsFlowError::Payload(format!("event {} session: {e}", event.id)))
    }
}

/// Deterministic session plan: session *i* (1-based) starts at
/// `start_date + 7 * (i - 1)` days, at the configured time-of-day.
pub fn generate_sessions(program: &TrainingProgram, config: &TrainingConfig) -> Vec<Session> {
    let start_time =
        NaiveTime::from_hms_opt(config.session_start_hour, 0, 0).unwrap_or(NaiveTime::MIN);
    let end_time =
        NaiveTime::from_hms_opt(config.session_end_hour, 0, 0).unwrap_or(NaiveTime::MIN);

    (0..program.session_count)
        .map(|i| {
            let number = i + 1;
            Session {
                id: format!("{}_session_{}", program.id, number),
                program_id: program.id.clone(),
                session_number: number,
                title: format!("Training session {number}"),
                date: program.start_date + Duration::days(7 * i as i64),
                start_time,
                end_time,
                meeting_url: Some(format!(
                    "{}/{}/{}",
                    config.meeting_url_base, program.id, number
                )),
                materials: vec![],
                recording_url: None,
            }
        })
        .collect()
}

#[async_trait]
impl FlowProcessor for TrainingFlow {
    fn domain(&self) -> &'static str {
        "Training"
    }

    async fn process(&self, event: &Event) -> Result<()> {
        let EventKind::Training(kind) = &event.kind else {
            tracing::warn!(kind = %event.kind, "non-training event routed to training flow");
            return Ok(());
        };
        tracing::info!(kind = %event.kind, "processing training event");

        match kind {
            TrainingEvent::ContractSigned => self.handle_contract_signed(event).await,
            TrainingEvent::SessionScheduled => {
                tracing::info!(event_id = %event.id, "session scheduled acknowledged");
                Ok(())
            }
            TrainingEvent::Tminus3 => self.handle_reminder(event, self.config.reminders.t3_days).await,
            TrainingEvent::Tminus1 => self.handle_reminder(event, self.config.reminders.t1_days).await,
            TrainingEvent::SessionCompleted => self.handle_session_completed(event).await,
            TrainingEvent::Other(name) => {
                tracing::warn!(name, "unknown training event type");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use opsflow_adapters::mock::MockSet;
    use opsflow_core::types::Participant;

    fn program() -> TrainingProgram {
        TrainingProgram {
            id: "prog-1".into(),
            company_name: "Acme".into(),
            program_name: "Onboarding".into(),
            start_date: NaiveDate::from_ymd_opt(2026, 4, 6).unwrap(),
            session_count: 3,
            participants: vec![
                Participant { name: "Ana".into(), email: "ana@acme.example".into() },
                Participant { name: "Bo".into(), email: "bo@acme.example".into() },
            ],
        }
    }

    fn session() -> Session {
        Session {
            id: "prog-1_session_2".into(),
            program_id: "prog-1".into(),
            session_number: 2,
            title: "Training session 2".into(),
            date: NaiveDate::from_ymd_opt(2026, 4, 13).unwrap(),
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            meeting_url: Some("https://meet.opsflow.example/prog-1/2".into()),
            materials: vec![],
            recording_url: Some("https://rec.example/2".into()),
        }
    }

    fn flow(mocks: &MockSet) -> TrainingFlow {
        TrainingFlow::new(mocks.adapters(), TrainingConfig::default())
    }

    #[test]
    fn test_generate_sessions_weekly_cadence() {
        let sessions = generate_sessions(&program(), &TrainingConfig::default());
        assert_eq!(sessions.len(), 3);
        assert_eq!(sessions[0].date, NaiveDate::from_ymd_opt(2026, 4, 6).unwrap());
        assert_eq!(sessions[1].date, NaiveDate::from_ymd_opt(2026, 4, 13).unwrap());
        assert_eq!(sessions[2].date, NaiveDate::from_ymd_opt(2026, 4, 20).unwrap());
        assert_eq!(sessions[1].session_number, 2);
        assert_eq!(sessions[0].start_time, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(
            sessions[2].meeting_url.as_deref(),
            Some("https://meet.opsflow.example/prog-1/3")
        );
    }

    #[tokio::test]
    async fn test_contract_signed_rolls_out_program() {
        let mocks = MockSet::new();
        let event = Event::new(
            "evt-t1",
            EventKind::from("Training.ContractSigned".to_string()),
            serde_json::json!({ "programId": "prog-1", "program": program() }),
        );
        flow(&mocks).process(&event).await.unwrap();

        // One draft + one calendar event per session, one room post after.
        assert_eq!(mocks.email.drafts().len(), 3);
        assert_eq!(mocks.calendar.created().len(), 3);
        assert_eq!(mocks.chat.posts().len(), 1);

        // The room post comes after every session rollout.
        let calls = mocks.calls();
        let last_calendar = calls.iter().rposition(|c| c == "calendar.create_event").unwrap();
        let post = calls.iter().position(|c| c == "chat.post_message").unwrap();
        assert!(last_calendar < post);

        let draft = &mocks.email.drafts()[0];
        assert_eq!(draft.to.len(), 2);
        assert_eq!(draft.bcc, vec!["training@opsflow.example".to_string()]);
    }

    #[tokio::test]
    async fn test_tminus3_reminder_emails_and_posts() {
        let mocks = MockSet::new();
        let event = Event::new(
            "evt-t3",
            EventKind::from("Training.Tminus3".to_string()),
            serde_json::json!({ "program": program(), "session": session() }),
        );
        flow(&mocks).process(&event).await.unwrap();

        assert_eq!(mocks.email.drafts().len(), 1);
        assert_eq!(mocks.chat.posts().len(), 1);
        assert!(mocks.email.drafts()[0].subject.contains("3 day(s)"));
    }

    #[tokio::test]
    async fn test_tminus1_reminder_always_posts_to_room() {
        let mocks = MockSet::new();
        let event = Event::new(
            "evt-q",
            EventKind::from("Training.Tminus1".to_string()),
            serde_json::json!({ "program": program(), "session": session() }),
        );
        flow(&mocks).process(&event).await.unwrap();

        // The room notification is part of the reminder contract: it is
        // never gated or dropped, whatever the send-window configuration.
        assert_eq!(mocks.email.drafts().len(), 1);
        assert_eq!(mocks.chat.posts().len(), 1);
        assert!(mocks.email.drafts()[0].subject.contains("1 day(s)"));
    }

    #[tokio::test]
    async fn test_session_completed_posts_only() {
        let mocks = MockSet::new();
        let event = Event::new(
            "evt-sc",
            EventKind::from("Training.SessionCompleted".to_string()),
            serde_json::json!({ "program": program(), "session": session() }),
        );
        flow(&mocks).process(&event).await.unwrap();

        assert!(mocks.email.drafts().is_empty());
        assert_eq!(mocks.chat.posts().len(), 1);
    }

    #[tokio::test]
    async fn test_room_is_reused_across_events() {
        let mocks = MockSet::new();
        let f = flow(&mocks);
        let reminder = Event::new(
            "evt-a",
            EventKind::from("Training.Tminus1".to_string()),
            serde_json::json!({ "program": program(), "session": session() }),
        );
        let completed = Event::new(
            "evt-b",
            EventKind::from("Training.SessionCompleted".to_string()),
            serde_json::json!({ "program": program(), "session": session() }),
        );
        f.process(&reminder).await.unwrap();
        f.process(&completed).await.unwrap();

        assert_eq!(mocks.chat.room_count(), 1);
        assert_eq!(mocks.chat.posts().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_program_payload_errors() {
        let mocks = MockSet::new();
        let event = Event::new(
            "evt-bad",
            EventKind::from("Training.ContractSigned".to_string()),
            serde_json::json!({ "program": {"id": "x"} }),
        );
        let err = flow(&mocks).process(&event).await.unwrap_err();
        assert!(matches!(err, OpsFlowError::Payload(_)));
    }
}
