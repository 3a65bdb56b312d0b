//! REST CRM adapter.

use async_trait::async_trait;

use opsflow_core::config::RestEndpointConfig;
use opsflow_core::error::OpsFlowError;
use opsflow_core::traits::CrmAdapter;
use opsflow_core::types::Deal;
use opsflow_core::Result;

pub struct RestCrmAdapter {
    config: RestEndpointConfig,
    client: reqwest::Client,
}

impl RestCrmAdapter {
    pub fn new(config: RestEndpointConfig) -> Self {
        Self { config, client: reqwest::Client::new() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CrmAdapter for RestCrmAdapter {
    async fn get_deal(&self, deal_id: &str) -> Result<Deal> {
        let response = self
            .client
            .get(self.url(&format!("/deals/{deal_id}")))
            .header("Authorization", format!("Bearer {}", self.config.api_token))
            .send()
            .await
            .map_err(|e| OpsFlowError::Adapter(format!("CRM: {e}")))?
            .error_for_status()
            .map_err(|e| OpsFlowError::Adapter(format!("CRM: {e}")))?;

        response
            .json()
            .await
            .map_err(|e| OpsFlowError::Adapter(format!("CRM deal response: {e}")))
    }

    async fn update_stage(&self, deal_id: &str, stage: &str) -> Result<()> {
        self.client
            .put(self.url(&format!("/deals/{deal_id}")))
            .header("Authorization", format!("Bearer {}", self.config.api_token))
            .json(&serde_json::json!({ "stage": stage }))
            .send()
            .await
            .map_err(|e| OpsFlowError::Adapter(format!("CRM: {e}")))?
            .error_for_status()
            .map_err(|e| OpsFlowError::Adapter(format!("CRM: {e}")))?;
        tracing::info!(deal_id, stage, "deal stage updated");
        Ok(())
    }

    async fn attach_file(&self, deal_id: &str, url: &str, filename: &str) -> Result<()> {
        self.client
            .post(self.url(&format!("/deals/{deal_id}/attachments")))
            .header("Authorization", format!("Bearer {}", self.config.api_token))
            .json(&serde_json::json!({ "url": url, "filename": filename }))
            .send()
            .await
            .map_err(|e| OpsFlowError::Adapter(format!("CRM: {e}")))?
            .error_for_status()
            .map_err(|e| OpsFlowError::Adapter(format!("CRM: {e}")))?;
        tracing::info!(deal_id, filename, "file attached to deal");
        Ok(())
    }
}
