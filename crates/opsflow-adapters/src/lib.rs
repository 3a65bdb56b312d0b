//! # OpsFlow Adapters
//!
//! Mock and real implementations of every collaborator contract in
//! `opsflow-core::traits`. The mock set is the default: it records every
//! call so flows can be exercised end to end without credentials. Real
//! adapters speak SMTP (lettre) and plain REST (reqwest) to the configured
//! integration endpoints.

pub mod calendar;
pub mod chat;
pub mod crm;
pub mod email;
pub mod mock;
pub mod sms;
pub mod storage;
pub mod template;

use std::path::PathBuf;
use std::sync::Arc;

use opsflow_core::config::AdaptersConfig;
use opsflow_core::traits::Adapters;

use crate::calendar::RestCalendarAdapter;
use crate::chat::RestChatAdapter;
use crate::crm::RestCrmAdapter;
use crate::email::SmtpEmailAdapter;
use crate::mock::MockSet;
use crate::sms::HttpSmsAdapter;
use crate::storage::LocalStorageAdapter;
use crate::template::TemplateEngine;

/// Build the adapter bundle selected by `config.mode` ("mock" or "real").
/// Anything other than "real" falls back to the mock set.
pub fn build_adapters(config: &AdaptersConfig) -> Adapters {
    if config.mode == "real" {
        tracing::info!("building real adapters");
        Adapters {
            email: Arc::new(SmtpEmailAdapter::new(config.smtp.clone())),
            sms: Arc::new(HttpSmsAdapter::new(config.sms.clone())),
            calendar: Arc::new(RestCalendarAdapter::new(config.calendar.clone())),
            chat: Arc::new(RestChatAdapter::new(config.chat.clone())),
            crm: Arc::new(RestCrmAdapter::new(config.crm.clone())),
            storage: Arc::new(LocalStorageAdapter::new(PathBuf::from(&config.storage_dir))),
            templates: Arc::new(TemplateEngine::new(PathBuf::from(&config.templates_dir))),
        }
    } else {
        tracing::info!("building mock adapters");
        MockSet::new().adapters()
    }
}
