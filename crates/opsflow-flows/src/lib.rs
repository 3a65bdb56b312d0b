//! # OpsFlow Flows
//!
//! Per-domain flow processors. Each processor translates one event into a
//! deterministic, ordered sequence of side-effecting adapter calls,
//! consulting the quiet-hours scheduler before any time-sensitive send.
//! Unknown event names within a domain log a warning and are a no-op.

pub mod sales;
pub mod training;

use async_trait::async_trait;

use opsflow_core::Result;
use opsflow_core::types::Event;

pub use sales::SalesFlow;
pub use training::TrainingFlow;

/// A per-domain event processor.
#[async_trait]
pub trait FlowProcessor: Send + Sync {
    /// Domain prefix this processor handles ("Sales", "Training").
    fn domain(&self) -> &'static str;

    /// Process one event. Errors propagate to the dispatcher unmodified;
    /// partially issued side effects are not rolled back.
    async fn process(&self, event: &Event) -> Result<()>;
}
