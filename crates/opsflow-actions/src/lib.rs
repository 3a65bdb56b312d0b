//! # OpsFlow Actions
//!
//! Operator action gateway. Every action is idempotent: a request carrying
//! an idempotency key returns the stored result of the first execution for
//! as long as the key lives. Action failures are part of the result
//! contract (`ok: false`), not errors, so clients see one uniform shape.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveTime, Offset, TimeZone, Utc, Weekday};
use std::collections::HashMap;
use std::sync::Mutex;

use opsflow_core::config::ActionsConfig;
use opsflow_core::types::{ActionKind, ActionRequest, ActionResult};

pub struct ActionGateway {
    cache: Mutex<HashMap<String, (ActionResult, DateTime<Utc>)>>,
    kill_switch: Mutex<HashMap<String, bool>>,
    key_ttl: Duration,
    utc_offset_hours: i32,
}

impl ActionGateway {
    pub fn new(config: &ActionsConfig) -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
            kill_switch: Mutex::new(HashMap::new()),
            key_ttl: Duration::hours(config.key_ttl_hours as i64),
            utc_offset_hours: config.utc_offset_hours,
        }
    }

    /// Execute an action. With an idempotency key, a repeated key within
    /// its TTL returns the first execution's result unchanged.
    pub fn execute(
        &self,
        kind: ActionKind,
        request: &ActionRequest,
        idempotency_key: Option<&str>,
    ) -> ActionResult {
        self.execute_at(kind, request, idempotency_key, Utc::now())
    }

    /// Clock-parameterized variant of [`execute`](Self::execute).
    pub fn execute_at(
        &self,
        kind: ActionKind,
        request: &ActionRequest,
        idempotency_key: Option<&str>,
        now: DateTime<Utc>,
    ) -> ActionResult {
        let Some(key) = idempotency_key else {
            return self.perform(kind, request, now);
        };

        // Check, execute, and store under one lock so a concurrent request
        // with the same key cannot execute twice.
        let Ok(mut cache) = self.cache.lock() else {
            return ActionResult::fail("action state unavailable");
        };
        if let Some((result, stored_at)) = cache.get(key) {
            if now - *stored_at < self.key_ttl {
                tracing::info!(key, "idempotent replay, returning stored result");
                return result.clone();
            }
        }
        let result = self.perform(kind, request, now);
        cache.insert(key.to_string(), (result.clone(), now));
        result
    }

    fn perform(&self, kind: ActionKind, request: &ActionRequest, now: DateTime<Utc>) -> ActionResult {
        tracing::info!(
            ?kind,
            queue_id = ?request.queue_id,
            deal_id = ?request.deal_id,
            actor_id = ?request.actor_id,
            "executing action"
        );
        match kind {
            ActionKind::ApproveSend => {
                let Some(queue_id) = &request.queue_id else {
                    return ActionResult::fail("queueId is required");
                };
                ActionResult {
                    queue_id: Some(queue_id.clone()),
                    ..ActionResult::ok("send approved")
                }
            }
            ActionKind::DeferNextBd => {
                let Some(queue_id) = &request.queue_id else {
                    return ActionResult::fail("queueId is required");
                };
                let scheduled_for = next_business_day(now, self.utc_offset_hours);
                ActionResult {
                    queue_id: Some(queue_id.clone()),
                    scheduled_for: Some(scheduled_for),
                    ..ActionResult::ok("send deferred to next business day")
                }
            }
            ActionKind::Reject => {
                let Some(queue_id) = &request.queue_id else {
                    return ActionResult::fail("queueId is required");
                };
                ActionResult {
                    queue_id: Some(queue_id.clone()),
                    reason: request.reason.clone(),
                    ..ActionResult::ok("send rejected")
                }
            }
            ActionKind::Toggle => {
                let Some(deal_id) = &request.deal_id else {
                    return ActionResult::fail("dealId is required");
                };
                let Some(enabled) = request.enabled else {
                    return ActionResult::fail("enabled is required");
                };
                if let Ok(mut switches) = self.kill_switch.lock() {
                    switches.insert(deal_id.clone(), enabled);
                }
                ActionResult {
                    deal_id: Some(deal_id.clone()),
                    automation_enabled: Some(enabled),
                    ..ActionResult::ok(if enabled {
                        "automation enabled"
                    } else {
                        "automation disabled"
                    })
                }
            }
        }
    }

    /// Whether automation may act on this deal. Untouched deals default on.
    pub fn automation_enabled(&self, deal_id: &str) -> bool {
        self.kill_switch
            .lock()
            .map(|s| s.get(deal_id).copied().unwrap_or(true))
            .unwrap_or(true)
    }

    /// Evict expired idempotency keys; returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Utc::now())
    }

    pub fn sweep_expired_at(&self, now: DateTime<Utc>) -> usize {
        let Ok(mut cache) = self.cache.lock() else {
            return 0;
        };
        let before = cache.len();
        cache.retain(|_, (_, stored_at)| now - *stored_at < self.key_ttl);
        before - cache.len()
    }

    pub fn key_count(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }
}

/// 09:00 local on the next business day: Friday skips to Monday, Saturday
/// to Monday, everything else to tomorrow.
pub fn next_business_day(now: DateTime<Utc>, utc_offset_hours: i32) -> DateTime<Utc> {
    // A fixed offset in whole hours is always representable.
    let offset = FixedOffset::east_opt(utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix());
    let local = now.with_timezone(&offset);
    let days_ahead = match local.weekday() {
        Weekday::Fri => 3,
        Weekday::Sat => 2,
        _ => 1,
    };
    let date = local.date_naive() + Duration::days(days_ahead);
    let nine_am = NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN);
    match offset.from_local_datetime(&date.and_time(nine_am)).single() {
        Some(dt) => dt.with_timezone(&Utc),
        None => now + Duration::days(days_ahead),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn gateway() -> ActionGateway {
        ActionGateway::new(&ActionsConfig::default())
    }

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
            .and_utc()
    }

    fn queue_request(queue_id: &str) -> ActionRequest {
        ActionRequest { queue_id: Some(queue_id.into()), ..ActionRequest::default() }
    }

    #[test]
    fn test_same_key_executes_once() {
        let gateway = gateway();
        let toggle_off = ActionRequest {
            deal_id: Some("deal_1".into()),
            enabled: Some(false),
            ..ActionRequest::default()
        };
        let toggle_on = ActionRequest {
            deal_id: Some("deal_1".into()),
            enabled: Some(true),
            ..ActionRequest::default()
        };

        let first = gateway.execute(ActionKind::Toggle, &toggle_off, Some("key-1"));
        // Same key: the later request is a replay, not a new toggle.
        let second = gateway.execute(ActionKind::Toggle, &toggle_on, Some("key-1"));

        assert_eq!(first, second);
        assert!(!gateway.automation_enabled("deal_1"));
    }

    #[test]
    fn test_different_keys_execute_independently() {
        let gateway = gateway();
        gateway.execute(
            ActionKind::Toggle,
            &ActionRequest {
                deal_id: Some("deal_1".into()),
                enabled: Some(false),
                ..ActionRequest::default()
            },
            Some("key-1"),
        );
        gateway.execute(
            ActionKind::Toggle,
            &ActionRequest {
                deal_id: Some("deal_1".into()),
                enabled: Some(true),
                ..ActionRequest::default()
            },
            Some("key-2"),
        );
        assert!(gateway.automation_enabled("deal_1"));
        assert_eq!(gateway.key_count(), 2);
    }

    #[test]
    fn test_failures_are_results_not_errors() {
        let gateway = gateway();
        let result = gateway.execute(ActionKind::ApproveSend, &ActionRequest::default(), None);
        assert!(!result.ok);
        assert!(result.message.contains("queueId"));
    }

    #[test]
    fn test_failed_result_is_replayed_under_same_key() {
        let gateway = gateway();
        let bad = ActionRequest::default();
        let first = gateway.execute(ActionKind::Reject, &bad, Some("key-x"));
        let second = gateway.execute(ActionKind::Reject, &queue_request("q1"), Some("key-x"));
        assert!(!first.ok);
        assert_eq!(first, second);
    }

    #[test]
    fn test_defer_from_wednesday_is_thursday() {
        // 2026-08-19 is a Wednesday.
        let result = gateway().execute_at(
            ActionKind::DeferNextBd,
            &queue_request("q1"),
            None,
            utc(2026, 8, 19, 3),
        );
        assert_eq!(result.scheduled_for, Some(utc(2026, 8, 20, 0))); // 09:00 at UTC+9
    }

    #[test]
    fn test_defer_from_friday_is_monday() {
        // 2026-08-21 is a Friday.
        let result = gateway().execute_at(
            ActionKind::DeferNextBd,
            &queue_request("q1"),
            None,
            utc(2026, 8, 21, 3),
        );
        assert_eq!(result.scheduled_for, Some(utc(2026, 8, 24, 0))); // Monday 09:00 at UTC+9
    }

    #[test]
    fn test_defer_from_saturday_is_monday() {
        // 2026-08-22 is a Saturday.
        let result = gateway().execute_at(
            ActionKind::DeferNextBd,
            &queue_request("q1"),
            None,
            utc(2026, 8, 22, 3),
        );
        assert_eq!(result.scheduled_for, Some(utc(2026, 8, 24, 0)));
    }

    #[test]
    fn test_expired_key_executes_again() {
        let gateway = gateway();
        let t0 = utc(2026, 8, 19, 3);
        let first = gateway.execute_at(ActionKind::DeferNextBd, &queue_request("q1"), Some("k"), t0);
        // Past the TTL (168h default) the key no longer replays.
        let later = t0 + Duration::hours(169);
        let second =
            gateway.execute_at(ActionKind::DeferNextBd, &queue_request("q1"), Some("k"), later);
        assert_ne!(first.scheduled_for, second.scheduled_for);
    }

    #[test]
    fn test_sweep_removes_only_expired_keys() {
        let gateway = gateway();
        let t0 = utc(2026, 8, 19, 3);
        gateway.execute_at(ActionKind::ApproveSend, &queue_request("q1"), Some("old"), t0);
        let later = t0 + Duration::hours(169);
        gateway.execute_at(ActionKind::ApproveSend, &queue_request("q2"), Some("new"), later);

        assert_eq!(gateway.sweep_expired_at(later), 1);
        assert_eq!(gateway.key_count(), 1);
    }

    #[test]
    fn test_automation_defaults_to_enabled() {
        assert!(gateway().automation_enabled("deal_untouched"));
    }

    #[test]
    fn test_reject_echoes_reason() {
        let request = ActionRequest {
            queue_id: Some("q1".into()),
            reason: Some("wrong recipient".into()),
            ..ActionRequest::default()
        };
        let result = gateway().execute(ActionKind::Reject, &request, None);
        assert!(result.ok);
        assert_eq!(result.reason.as_deref(), Some("wrong recipient"));
    }
}
