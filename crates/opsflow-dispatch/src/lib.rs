//! # OpsFlow Dispatch
//!
//! The event dispatcher: deduplicates incoming events by id, then routes
//! each first-seen event to the flow processor registered for its domain
//! prefix. An event is marked as seen before its processor runs, so a
//! concurrent duplicate cannot slip through; if the processor fails, the
//! mark is removed and the error propagates, leaving the event eligible
//! for redelivery.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use opsflow_core::error::OpsFlowError;
use opsflow_core::types::Event;
use opsflow_core::Result;
use opsflow_flows::FlowProcessor;

/// Events seen within this window are duplicates.
const DEDUP_WINDOW_HOURS: i64 = 24;

pub struct Dispatcher {
    processors: Vec<Arc<dyn FlowProcessor>>,
    processed: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl Dispatcher {
    pub fn new(processors: Vec<Arc<dyn FlowProcessor>>) -> Self {
        Self { processors, processed: Mutex::new(HashMap::new()) }
    }

    /// Handle one event: dedup, route, propagate the processor's result.
    pub async fn handle(&self, event: &Event) -> Result<()> {
        self.handle_at(event, Utc::now()).await
    }

    /// Clock-parameterized variant of [`handle`](Self::handle).
    pub async fn handle_at(&self, event: &Event, now: DateTime<Utc>) -> Result<()> {
        // Check-and-mark under one lock: the first caller wins, any
        // concurrent duplicate sees the mark.
        {
            let mut processed = self.processed.lock().map_err(poisoned)?;
            if let Some(seen_at) = processed.get(&event.id) {
                if now - *seen_at < Duration::hours(DEDUP_WINDOW_HOURS) {
                    tracing::info!(event_id = %event.id, "duplicate event skipped");
                    return Ok(());
                }
            }
            processed.insert(event.id.clone(), now);
        }

        let Some(domain) = event.kind.domain() else {
            // Unknown prefix is accepted and stays marked: redelivering it
            // would produce the same warning, not different behavior.
            tracing::warn!(event_id = %event.id, kind = %event.kind, "no processor for event domain");
            return Ok(());
        };

        let Some(processor) = self.processors.iter().find(|p| p.domain() == domain) else {
            tracing::warn!(event_id = %event.id, domain, "domain has no registered processor");
            return Ok(());
        };

        if let Err(e) = processor.process(event).await {
            // Unmark so a redelivery can retry the event.
            self.processed.lock().map_err(poisoned)?.remove(&event.id);
            tracing::error!(event_id = %event.id, error = %e, "event processing failed");
            return Err(OpsFlowError::Processing(format!(
                "event {}: {e}",
                event.id
            )));
        }
        Ok(())
    }

    /// Evict dedup marks older than the window; returns how many were removed.
    pub fn cleanup_old_events(&self) -> usize {
        self.cleanup_old_events_at(Utc::now())
    }

    pub fn cleanup_old_events_at(&self, now: DateTime<Utc>) -> usize {
        let Ok(mut processed) = self.processed.lock() else {
            return 0;
        };
        let before = processed.len();
        processed.retain(|_, seen_at| now - *seen_at < Duration::hours(DEDUP_WINDOW_HOURS));
        before - processed.len()
    }

    pub fn seen_count(&self) -> usize {
        self.processed.lock().map(|p| p.len()).unwrap_or(0)
    }
}

/// Periodically evict expired dedup marks.
pub fn spawn_cleanup_loop(dispatcher: Arc<Dispatcher>, interval_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            let removed = dispatcher.cleanup_old_events();
            if removed > 0 {
                tracing::debug!(removed, "expired dedup marks evicted");
            }
        }
    });
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> OpsFlowError {
    OpsFlowError::Processing("dedup state lock poisoned".into())
}
