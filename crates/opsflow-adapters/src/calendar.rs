//! REST calendar adapter.

use async_trait::async_trait;

use opsflow_core::config::RestEndpointConfig;
use opsflow_core::error::OpsFlowError;
use opsflow_core::traits::CalendarAdapter;
use opsflow_core::types::CalendarEvent;
use opsflow_core::Result;

pub struct RestCalendarAdapter {
    config: RestEndpointConfig,
    client: reqwest::Client,
}

impl RestCalendarAdapter {
    pub fn new(config: RestEndpointConfig) -> Self {
        Self { config, client: reqwest::Client::new() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CalendarAdapter for RestCalendarAdapter {
    async fn create_event(&self, event: &CalendarEvent) -> Result<String> {
        let response = self
            .client
            .post(self.url("/events"))
            .header("Authorization", format!("Bearer {}", self.config.api_token))
            .json(event)
            .send()
            .await
            .map_err(|e| OpsFlowError::Adapter(format!("Calendar: {e}")))?
            .error_for_status()
            .map_err(|e| OpsFlowError::Adapter(format!("Calendar: {e}")))?;

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OpsFlowError::Adapter(format!("Calendar response: {e}")))?;
        let event_id = payload["id"]
            .as_str()
            .map(String::from)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        tracing::info!(%event_id, title = %event.title, "calendar event created");
        Ok(event_id)
    }

    async fn update_event(&self, event_id: &str, event: &CalendarEvent) -> Result<()> {
        self.client
            .put(self.url(&format!("/events/{event_id}")))
            .header("Authorization", format!("Bearer {}", self.config.api_token))
            .json(event)
            .send()
            .await
            .map_err(|e| OpsFlowError::Adapter(format!("Calendar: {e}")))?
            .error_for_status()
            .map_err(|e| OpsFlowError::Adapter(format!("Calendar: {e}")))?;
        Ok(())
    }

    async fn delete_event(&self, event_id: &str) -> Result<()> {
        self.client
            .delete(self.url(&format!("/events/{event_id}")))
            .header("Authorization", format!("Bearer {}", self.config.api_token))
            .send()
            .await
            .map_err(|e| OpsFlowError::Adapter(format!("Calendar: {e}")))?
            .error_for_status()
            .map_err(|e| OpsFlowError::Adapter(format!("Calendar: {e}")))?;
        Ok(())
    }
}
