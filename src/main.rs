//! # OpsFlow — Event-Driven Workflow Automation
//!
//! Routes business events (sales outreach, training logistics) through
//! deduplication, per-domain flow processors, and a quiet-hours scheduler.
//!
//! Usage:
//!   opsflow run                          # Read JSON events from stdin, one per line
//!   opsflow trigger --event event.json   # Dispatch a single event from a file
//!   opsflow trigger --inline '{"id":...}'
//!   opsflow action approve_send --queue-id q1 --key op-123

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::EnvFilter;

use opsflow_actions::ActionGateway;
use opsflow_adapters::build_adapters;
use opsflow_core::types::{ActionKind, ActionRequest, Event};
use opsflow_core::OpsFlowConfig;
use opsflow_dispatch::{spawn_cleanup_loop, Dispatcher};
use opsflow_flows::{FlowProcessor, SalesFlow, TrainingFlow};
use opsflow_scheduler::{spawn_flush_loop, QuietHoursScheduler};

#[derive(Parser)]
#[command(name = "opsflow", version, about = "Event-driven workflow automation")]
struct Cli {
    /// Config file path (default: ~/.opsflow/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read JSON events from stdin, one per line, and dispatch each
    Run,
    /// Dispatch a single event and exit
    Trigger {
        /// Path to a JSON event file
        #[arg(long, conflicts_with = "inline")]
        event: Option<PathBuf>,
        /// Inline JSON event
        #[arg(long)]
        inline: Option<String>,
    },
    /// Execute an operator action (approve_send, defer_next_bd, reject, toggle)
    Action {
        /// Action name
        kind: String,
        /// Deferred-send queue entry id
        #[arg(long)]
        queue_id: Option<String>,
        /// CRM deal id (toggle)
        #[arg(long)]
        deal_id: Option<String>,
        /// Operator performing the action (recorded in the action log)
        #[arg(long)]
        actor_id: Option<String>,
        /// Rejection reason
        #[arg(long)]
        reason: Option<String>,
        /// Automation on/off (toggle)
        #[arg(long)]
        enabled: Option<bool>,
        /// Idempotency key
        #[arg(long)]
        key: Option<String>,
    },
}

struct Runtime {
    dispatcher: Arc<Dispatcher>,
    scheduler: Arc<QuietHoursScheduler>,
    actions: Arc<ActionGateway>,
}

fn build_runtime(config: &OpsFlowConfig) -> Runtime {
    let adapters = build_adapters(&config.adapters);

    let scheduler = Arc::new(QuietHoursScheduler::new(
        config.quiet_hours_windows(),
        adapters.email.clone(),
    ));

    let processors: Vec<Arc<dyn FlowProcessor>> = vec![
        Arc::new(SalesFlow::new(
            adapters.clone(),
            config.sales.clone(),
            scheduler.clone(),
        )),
        Arc::new(TrainingFlow::new(adapters.clone(), config.training.clone())),
    ];
    let dispatcher = Arc::new(Dispatcher::new(processors));
    let actions = Arc::new(ActionGateway::new(&config.actions));

    Runtime { dispatcher, scheduler, actions }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => OpsFlowConfig::load_from(path)?,
        None => OpsFlowConfig::load()?,
    };

    let runtime = build_runtime(&config);

    match cli.command {
        Commands::Run => {
            spawn_flush_loop(runtime.scheduler.clone(), config.scheduler.flush_interval_secs);
            spawn_cleanup_loop(runtime.dispatcher.clone(), config.scheduler.cleanup_interval_secs);

            tracing::info!("opsflow running, reading events from stdin");
            let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                let event: Event = match serde_json::from_str(&line) {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping malformed event line");
                        continue;
                    }
                };
                if let Err(e) = runtime.dispatcher.handle(&event).await {
                    tracing::error!(event_id = %event.id, error = %e, "event failed");
                }
            }

            // Stdin closed: deliver anything already past its quiet window.
            let flushed = runtime.scheduler.flush_due().await;
            if flushed > 0 {
                tracing::info!(flushed, "deferred sends flushed on shutdown");
            }
        }
        Commands::Trigger { event, inline } => {
            let raw = match (event, inline) {
                (Some(path), _) => std::fs::read_to_string(path)?,
                (None, Some(json)) => json,
                (None, None) => anyhow::bail!("trigger needs --event <file> or --inline <json>"),
            };
            let event: Event = serde_json::from_str(&raw)?;
            runtime.dispatcher.handle(&event).await?;
            let flushed = runtime.scheduler.flush_due().await;
            tracing::info!(event_id = %event.id, flushed, "event dispatched");
        }
        Commands::Action { kind, queue_id, deal_id, actor_id, reason, enabled, key } => {
            let Some(kind) = ActionKind::parse(&kind) else {
                anyhow::bail!("unknown action: {kind}");
            };
            let request = ActionRequest { queue_id, deal_id, actor_id, reason, enabled };
            let result = runtime.actions.execute(kind, &request, key.as_deref());
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.ok {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_args_carry_the_full_request() {
        let cli = Cli::try_parse_from([
            "opsflow", "action", "reject",
            "--queue-id", "q1",
            "--actor-id", "ops-taro",
            "--reason", "wrong recipient",
            "--key", "op-123",
        ])
        .unwrap();

        let Commands::Action { kind, queue_id, actor_id, reason, key, .. } = cli.command else {
            panic!("expected action subcommand");
        };
        assert_eq!(ActionKind::parse(&kind), Some(ActionKind::Reject));
        assert_eq!(queue_id.as_deref(), Some("q1"));
        assert_eq!(actor_id.as_deref(), Some("ops-taro"));
        assert_eq!(reason.as_deref(), Some("wrong recipient"));
        assert_eq!(key.as_deref(), Some("op-123"));
    }
}
