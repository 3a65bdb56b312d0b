//! The quiet-hours scheduler — decision function + deferred-send queue.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Timelike, Utc};
use tokio::sync::Mutex;

use opsflow_core::traits::EmailAdapter;
use opsflow_core::types::{Channel, DeferredSend, EmailDraft, QuietHoursWindow};

use crate::quiet_hours;

/// Decides whether an outbound communication may fire now, and holds
/// deferred drafts until their channel exits quiet hours.
pub struct QuietHoursScheduler {
    windows: HashMap<Channel, QuietHoursWindow>,
    pending: Mutex<Vec<DeferredSend>>,
    email: Arc<dyn EmailAdapter>,
}

impl QuietHoursScheduler {
    pub fn new(windows: Vec<QuietHoursWindow>, email: Arc<dyn EmailAdapter>) -> Self {
        Self {
            windows: windows.into_iter().map(|w| (w.channel, w)).collect(),
            pending: Mutex::new(Vec::new()),
            email,
        }
    }

    /// Whether the channel may originate a send right now.
    /// Channels without a configured window are always sendable.
    pub fn can_send_now(&self, channel: Channel) -> bool {
        self.can_send_at(channel, Utc::now())
    }

    /// Time-parameterized variant of [`can_send_now`](Self::can_send_now).
    pub fn can_send_at(&self, channel: Channel, now: DateTime<Utc>) -> bool {
        let Some(window) = self.windows.get(&channel) else {
            return true;
        };
        let hour = quiet_hours::to_local(window, now).hour();
        if quiet_hours::in_quiet_hours(window, hour) {
            tracing::info!(
                channel = %channel,
                hour,
                start = window.start_hour,
                end = window.end_hour,
                "currently in quiet hours"
            );
            return false;
        }
        true
    }

    /// Enqueue a draft for delivery at the channel's next quiet-hours exit.
    /// Returns the computed send time.
    pub async fn schedule(&self, draft: EmailDraft, channel: Channel) -> DateTime<Utc> {
        self.schedule_at(draft, channel, Utc::now()).await
    }

    /// Time-parameterized variant of [`schedule`](Self::schedule).
    pub async fn schedule_at(
        &self,
        draft: EmailDraft,
        channel: Channel,
        now: DateTime<Utc>,
    ) -> DateTime<Utc> {
        let send_at = match self.windows.get(&channel) {
            Some(window) => quiet_hours::next_exit(window, now),
            None => now,
        };

        tracing::info!(
            channel = %channel,
            send_at = %send_at,
            to = ?draft.to,
            "message deferred"
        );

        let mut pending = self.pending.lock().await;
        pending.push(DeferredSend { draft, channel, send_at });
        send_at
    }

    /// Deliver every deferred entry whose send time has arrived.
    /// Best effort: an adapter failure drops the entry after logging.
    /// Returns the number of entries removed from the queue.
    pub async fn flush_due(&self) -> usize {
        self.flush_due_at(Utc::now()).await
    }

    /// Time-parameterized variant of [`flush_due`](Self::flush_due).
    pub async fn flush_due_at(&self, now: DateTime<Utc>) -> usize {
        // Take due entries out under the lock, deliver outside it so
        // schedule() is never blocked on adapter calls.
        let due: Vec<DeferredSend> = {
            let mut pending = self.pending.lock().await;
            let mut due = Vec::new();
            pending.retain(|item| {
                if item.send_at <= now {
                    due.push(item.clone());
                    false
                } else {
                    true
                }
            });
            due
        };

        let mut flushed = 0;
        for item in due {
            flushed += 1;
            tracing::info!(
                channel = %item.channel,
                to = ?item.draft.to,
                subject = %item.draft.subject,
                "delivering deferred message"
            );
            match self.email.draft(&item.draft).await {
                Ok(draft_id) => {
                    if let Err(e) = self.email.send(&draft_id).await {
                        tracing::warn!(draft_id, "deferred send failed, dropping entry: {e}");
                    }
                }
                Err(e) => {
                    tracing::warn!("deferred draft failed, dropping entry: {e}");
                }
            }
        }
        flushed
    }

    /// Number of entries waiting in the deferred queue.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}

/// Spawn the flush loop as a background tokio task. The loop awaits each
/// flush before ticking again, so at most one flush is in flight.
pub fn spawn_flush_loop(scheduler: Arc<QuietHoursScheduler>, interval_secs: u64) {
    tokio::spawn(async move {
        tracing::info!("deferred-send flush loop started (every {interval_secs}s)");
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            let flushed = scheduler.flush_due().await;
            if flushed > 0 {
                tracing::info!(flushed, "deferred queue flushed");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use opsflow_core::Result;
    use opsflow_core::error::OpsFlowError;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingEmail {
        sent: StdMutex<Vec<String>>,
        fail_draft: bool,
    }

    #[async_trait]
    impl EmailAdapter for RecordingEmail {
        async fn draft(&self, draft: &EmailDraft) -> Result<String> {
            if self.fail_draft {
                return Err(OpsFlowError::Adapter("smtp unavailable".into()));
            }
            Ok(format!("draft-{}", draft.subject))
        }

        async fn send(&self, draft_id: &str) -> Result<()> {
            self.sent.lock().unwrap().push(draft_id.to_string());
            Ok(())
        }

        async fn schedule(&self, _draft: &EmailDraft, _send_at: DateTime<Utc>) -> Result<String> {
            Ok("scheduled".into())
        }
    }

    fn wrapping_window(channel: Channel) -> QuietHoursWindow {
        QuietHoursWindow {
            channel,
            start_hour: 20,
            end_hour: 8,
            timezone: "UTC".into(),
            utc_offset_hours: 0,
        }
    }

    fn draft(subject: &str) -> EmailDraft {
        EmailDraft {
            to: vec!["a@example.com".into()],
            cc: vec![],
            bcc: vec![],
            subject: subject.into(),
            body: "hello".into(),
            attachments: vec![],
        }
    }

    fn scheduler_with(email: Arc<RecordingEmail>) -> QuietHoursScheduler {
        QuietHoursScheduler::new(
            vec![wrapping_window(Channel::Email), wrapping_window(Channel::Sms)],
            email,
        )
    }

    #[test]
    fn test_can_send_wrapping_window() {
        let sched = scheduler_with(Arc::new(RecordingEmail::default()));
        let at = |h| Utc.with_ymd_and_hms(2026, 3, 10, h, 0, 0).unwrap();
        assert!(!sched.can_send_at(Channel::Email, at(22)));
        assert!(!sched.can_send_at(Channel::Email, at(3)));
        assert!(sched.can_send_at(Channel::Email, at(12)));
    }

    #[test]
    fn test_unconfigured_channel_always_sendable() {
        let sched = QuietHoursScheduler::new(vec![], Arc::new(RecordingEmail::default()));
        let midnight = Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap();
        assert!(sched.can_send_at(Channel::Chat, midnight));
    }

    #[tokio::test]
    async fn test_schedule_defers_to_window_exit() {
        let sched = scheduler_with(Arc::new(RecordingEmail::default()));
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 21, 0, 0).unwrap();
        let send_at = sched.schedule_at(draft("hi"), Channel::Email, now).await;
        assert_eq!(send_at, Utc.with_ymd_and_hms(2026, 3, 11, 8, 0, 0).unwrap());
        assert_eq!(sched.pending_count().await, 1);
    }

    #[tokio::test]
    async fn test_flush_delivers_due_and_keeps_future() {
        let email = Arc::new(RecordingEmail::default());
        let sched = scheduler_with(email.clone());
        let evening = Utc.with_ymd_and_hms(2026, 3, 10, 21, 0, 0).unwrap();
        sched.schedule_at(draft("due"), Channel::Email, evening).await;
        sched
            .schedule_at(draft("later"), Channel::Email, evening + chrono::Duration::days(1))
            .await;

        // At 08:00 next day only the first entry is due.
        let flush_time = Utc.with_ymd_and_hms(2026, 3, 11, 8, 0, 0).unwrap();
        let flushed = sched.flush_due_at(flush_time).await;
        assert_eq!(flushed, 1);
        assert_eq!(sched.pending_count().await, 1);
        assert_eq!(email.sent.lock().unwrap().as_slice(), ["draft-due"]);
    }

    #[tokio::test]
    async fn test_flush_drops_entry_on_adapter_error() {
        let email = Arc::new(RecordingEmail { fail_draft: true, ..Default::default() });
        let sched = scheduler_with(email.clone());
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 21, 0, 0).unwrap();
        sched.schedule_at(draft("doomed"), Channel::Email, now).await;

        let flushed = sched.flush_due_at(now + chrono::Duration::days(1)).await;
        assert_eq!(flushed, 1);
        // Dropped, not retried.
        assert_eq!(sched.pending_count().await, 0);
        assert!(email.sent.lock().unwrap().is_empty());
    }
}
