//! OpsFlow configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::{Channel, QuietHoursWindow};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpsFlowConfig {
    #[serde(default)]
    pub adapters: AdaptersConfig,
    #[serde(default)]
    pub sales: SalesConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub actions: ActionsConfig,
}

impl OpsFlowConfig {
    /// Load config from the default path (~/.opsflow/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::OpsFlowError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| crate::error::OpsFlowError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the window math cannot represent.
    pub fn validate(&self) -> Result<()> {
        self.sales.quiet_hours.email.validate("sales.quiet_hours.email")?;
        self.sales.quiet_hours.sms.validate("sales.quiet_hours.sms")?;
        self.training.quiet_hours.chat.validate("training.quiet_hours.chat")?;
        Ok(())
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::OpsFlowError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".opsflow")
            .join("config.toml")
    }

    /// Quiet-hours windows for every configured channel.
    pub fn quiet_hours_windows(&self) -> Vec<QuietHoursWindow> {
        vec![
            self.sales.quiet_hours.email.to_window(Channel::Email),
            self.sales.quiet_hours.sms.to_window(Channel::Sms),
            self.training.quiet_hours.chat.to_window(Channel::Chat),
        ]
    }
}

/// Adapter wiring: mock or real implementations, plus per-integration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptersConfig {
    /// "mock" or "real".
    #[serde(default = "default_adapter_mode")]
    pub mode: String,
    #[serde(default)]
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub sms: SmsGatewayConfig,
    #[serde(default)]
    pub calendar: RestEndpointConfig,
    #[serde(default)]
    pub chat: RestEndpointConfig,
    #[serde(default)]
    pub crm: RestEndpointConfig,
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,
}

fn default_adapter_mode() -> String { "mock".into() }
fn default_storage_dir() -> String { "storage".into() }
fn default_templates_dir() -> String { "templates".into() }

impl Default for AdaptersConfig {
    fn default() -> Self {
        Self {
            mode: default_adapter_mode(),
            smtp: SmtpConfig::default(),
            sms: SmsGatewayConfig::default(),
            calendar: RestEndpointConfig::default(),
            chat: RestEndpointConfig::default(),
            crm: RestEndpointConfig::default(),
            storage_dir: default_storage_dir(),
            templates_dir: default_templates_dir(),
        }
    }
}

/// SMTP settings for the real email adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub from: String,
}

fn default_smtp_host() -> String { "smtp.gmail.com".into() }
fn default_smtp_port() -> u16 { 587 }

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            from: String::new(),
        }
    }
}

/// HTTP SMS gateway settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmsGatewayConfig {
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
}

/// Generic REST integration endpoint (calendar, chat room, CRM).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestEndpointConfig {
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub api_token: String,
}

/// Sales-domain settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesConfig {
    #[serde(default = "default_sales_bcc")]
    pub default_bcc: String,
    #[serde(default = "default_attachment_prefix")]
    pub attachment_prefix: String,
    #[serde(default)]
    pub quiet_hours: SalesQuietHours,
}

fn default_sales_bcc() -> String { "sales@opsflow.example".into() }
fn default_attachment_prefix() -> String { "Quote".into() }

impl Default for SalesConfig {
    fn default() -> Self {
        Self {
            default_bcc: default_sales_bcc(),
            attachment_prefix: default_attachment_prefix(),
            quiet_hours: SalesQuietHours::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesQuietHours {
    #[serde(default = "default_email_window")]
    pub email: WindowConfig,
    #[serde(default = "default_sms_window")]
    pub sms: WindowConfig,
}

impl Default for SalesQuietHours {
    fn default() -> Self {
        Self {
            email: default_email_window(),
            sms: default_sms_window(),
        }
    }
}

/// Training-domain settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(default = "default_training_bcc")]
    pub default_bcc: String,
    #[serde(default = "default_session_start_hour")]
    pub session_start_hour: u32,
    #[serde(default = "default_session_end_hour")]
    pub session_end_hour: u32,
    #[serde(default = "default_meeting_url_base")]
    pub meeting_url_base: String,
    #[serde(default)]
    pub reminders: ReminderConfig,
    #[serde(default)]
    pub quiet_hours: TrainingQuietHours,
}

fn default_training_bcc() -> String { "training@opsflow.example".into() }
fn default_session_start_hour() -> u32 { 10 }
fn default_session_end_hour() -> u32 { 17 }
fn default_meeting_url_base() -> String { "https://meet.opsflow.example".into() }

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            default_bcc: default_training_bcc(),
            session_start_hour: default_session_start_hour(),
            session_end_hour: default_session_end_hour(),
            meeting_url_base: default_meeting_url_base(),
            reminders: ReminderConfig::default(),
            quiet_hours: TrainingQuietHours::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    #[serde(default = "default_t3_days")]
    pub t3_days: u32,
    #[serde(default = "default_t1_days")]
    pub t1_days: u32,
}

fn default_t3_days() -> u32 { 3 }
fn default_t1_days() -> u32 { 1 }

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            t3_days: default_t3_days(),
            t1_days: default_t1_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingQuietHours {
    #[serde(default = "default_chat_window")]
    pub chat: WindowConfig,
}

impl Default for TrainingQuietHours {
    fn default() -> Self {
        Self { chat: default_chat_window() }
    }
}

/// One quiet-hours window in config form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    pub start_hour: u32,
    pub end_hour: u32,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_utc_offset")]
    pub utc_offset_hours: i32,
}

fn default_timezone() -> String { "Asia/Tokyo".into() }
fn default_utc_offset() -> i32 { 9 }

fn default_email_window() -> WindowConfig {
    WindowConfig { start_hour: 20, end_hour: 8, timezone: default_timezone(), utc_offset_hours: default_utc_offset() }
}
fn default_sms_window() -> WindowConfig {
    WindowConfig { start_hour: 21, end_hour: 8, timezone: default_timezone(), utc_offset_hours: default_utc_offset() }
}
fn default_chat_window() -> WindowConfig {
    WindowConfig { start_hour: 20, end_hour: 8, timezone: default_timezone(), utc_offset_hours: default_utc_offset() }
}

impl WindowConfig {
    /// Hours are hours-of-day; anything past 23 has no meaning for the
    /// window math and must be rejected rather than silently misdelivered.
    pub fn validate(&self, section: &str) -> crate::error::Result<()> {
        for (field, hour) in [("start_hour", self.start_hour), ("end_hour", self.end_hour)] {
            if hour > 23 {
                return Err(crate::error::OpsFlowError::Config(format!(
                    "{section}.{field} must be in 0..=23, got {hour}"
                )));
            }
        }
        Ok(())
    }

    pub fn to_window(&self, channel: Channel) -> QuietHoursWindow {
        QuietHoursWindow {
            channel,
            start_hour: self.start_hour,
            end_hour: self.end_hour,
            timezone: self.timezone.clone(),
            utc_offset_hours: self.utc_offset_hours,
        }
    }
}

/// Scheduler loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_flush_interval")]
    pub flush_interval_secs: u64,
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

fn default_flush_interval() -> u64 { 60 }
fn default_cleanup_interval() -> u64 { 3600 }

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            flush_interval_secs: default_flush_interval(),
            cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}

/// Action gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionsConfig {
    /// Idempotency keys older than this are evicted.
    #[serde(default = "default_key_ttl_hours")]
    pub key_ttl_hours: u64,
    #[serde(default = "default_utc_offset")]
    pub utc_offset_hours: i32,
}

fn default_key_ttl_hours() -> u64 { 168 }

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            key_ttl_hours: default_key_ttl_hours(),
            utc_offset_hours: default_utc_offset(),
        }
    }
}
