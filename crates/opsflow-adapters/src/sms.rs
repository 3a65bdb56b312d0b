//! HTTP SMS gateway adapter.

use async_trait::async_trait;

use opsflow_core::config::SmsGatewayConfig;
use opsflow_core::error::OpsFlowError;
use opsflow_core::traits::SmsAdapter;
use opsflow_core::Result;

pub struct HttpSmsAdapter {
    config: SmsGatewayConfig,
    client: reqwest::Client,
}

impl HttpSmsAdapter {
    pub fn new(config: SmsGatewayConfig) -> Self {
        Self { config, client: reqwest::Client::new() }
    }
}

#[async_trait]
impl SmsAdapter for HttpSmsAdapter {
    async fn send(&self, to: &str, body: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.config.api_url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&serde_json::json!({ "to": to, "body": body }))
            .send()
            .await
            .map_err(|e| OpsFlowError::Adapter(format!("SMS gateway: {e}")))?
            .error_for_status()
            .map_err(|e| OpsFlowError::Adapter(format!("SMS gateway: {e}")))?;

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OpsFlowError::Adapter(format!("SMS gateway response: {e}")))?;
        let message_id = payload["messageId"]
            .as_str()
            .map(String::from)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        tracing::info!(%message_id, "sms sent");
        Ok(message_id)
    }
}
