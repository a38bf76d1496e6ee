//! Recording transport client
//!
//! Media capture itself is opaque to the orchestrator; only success/failure
//! and the object-storage locator are consumed.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::{AppError, Result};

#[async_trait]
pub trait RecordingTransport: Send + Sync {
    /// Begins durable capture; returns the object path the capture will be
    /// written to.
    async fn start(&self, session_id: Uuid) -> Result<String>;
    /// Finalizes the capture; returns the final object path.
    async fn stop(&self, session_id: Uuid) -> Result<String>;
}

#[derive(Deserialize)]
struct RecorderResponse {
    object_path: String,
}

/// Talks to the media node's recorder control endpoint.
pub struct HttpRecordingTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRecordingTransport {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    async fn control(&self, action: &str, session_id: Uuid) -> Result<String> {
        let url = format!("{}/recordings/{}", self.base_url, action);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "session_id": session_id }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "recorder {action} returned {}",
                response.status()
            )));
        }

        let body: RecorderResponse = response.json().await?;
        Ok(body.object_path)
    }
}

#[async_trait]
impl RecordingTransport for HttpRecordingTransport {
    async fn start(&self, session_id: Uuid) -> Result<String> {
        self.control("start", session_id).await
    }

    async fn stop(&self, session_id: Uuid) -> Result<String> {
        self.control("stop", session_id).await
    }
}
