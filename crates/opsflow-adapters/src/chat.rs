//! REST chat room adapter.
//!
//! Room ids are cached by name so repeated lookups for the same program
//! room cost one API call.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use opsflow_core::config::RestEndpointConfig;
use opsflow_core::error::OpsFlowError;
use opsflow_core::traits::ChatRoomAdapter;
use opsflow_core::Result;

pub struct RestChatAdapter {
    config: RestEndpointConfig,
    client: reqwest::Client,
    room_cache: Mutex<HashMap<String, String>>,
}

impl RestChatAdapter {
    pub fn new(config: RestEndpointConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            room_cache: Mutex::new(HashMap::new()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatRoomAdapter for RestChatAdapter {
    async fn post_message(&self, room_id: &str, message: &str) -> Result<String> {
        let response = self
            .client
            .post(self.url(&format!("/rooms/{room_id}/messages")))
            .header("Authorization", format!("Bearer {}", self.config.api_token))
            .json(&serde_json::json!({ "body": message }))
            .send()
            .await
            .map_err(|e| OpsFlowError::Adapter(format!("Chat: {e}")))?
            .error_for_status()
            .map_err(|e| OpsFlowError::Adapter(format!("Chat: {e}")))?;

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OpsFlowError::Adapter(format!("Chat response: {e}")))?;
        Ok(payload["messageId"]
            .as_str()
            .map(String::from)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()))
    }

    async fn get_or_create_room(&self, name: &str) -> Result<String> {
        if let Ok(cache) = self.room_cache.lock() {
            if let Some(id) = cache.get(name) {
                return Ok(id.clone());
            }
        }

        let response = self
            .client
            .post(self.url("/rooms"))
            .header("Authorization", format!("Bearer {}", self.config.api_token))
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await
            .map_err(|e| OpsFlowError::Adapter(format!("Chat: {e}")))?
            .error_for_status()
            .map_err(|e| OpsFlowError::Adapter(format!("Chat: {e}")))?;

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OpsFlowError::Adapter(format!("Chat response: {e}")))?;
        let room_id = payload["roomId"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| OpsFlowError::Adapter("Chat: room response missing roomId".into()))?;

        if let Ok(mut cache) = self.room_cache.lock() {
            cache.insert(name.to_string(), room_id.clone());
        }
        tracing::info!(%room_id, name, "chat room resolved");
        Ok(room_id)
    }
}
