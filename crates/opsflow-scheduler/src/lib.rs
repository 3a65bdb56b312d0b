//! # OpsFlow Scheduler
//!
//! Quiet-hours aware send scheduling. A stateless decision function
//! (`can_send_now`) plus a small deferred-send queue drained by a periodic
//! flush loop.
//!
//! ## Architecture
//! ```text
//! Flow processor
//!   ├── can_send_now(channel)? ── yes → draft immediately
//!   └── no → schedule(draft, channel)
//!              └── DeferredSend { send_at = next window exit }
//!
//! Flush loop (tokio interval, default 60s)
//!   └── every entry with send_at <= now → draft + send, then remove
//!       (adapter failure → drop and log; no retry)
//! ```

pub mod quiet_hours;
pub mod scheduler;

pub use scheduler::{QuietHoursScheduler, spawn_flush_loop};
