//! Highlight detection client
//!
//! The analysis step is opaque; the orchestrator only persists the returned
//! segment boundaries as highlight artifacts.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct HighlightSegment {
    /// Seconds from stream start.
    pub start_offset_secs: i64,
    pub end_offset_secs: i64,
}

#[async_trait]
pub trait HighlightDetector: Send + Sync {
    async fn detect(
        &self,
        session_id: Uuid,
        full_recording_path: &str,
    ) -> Result<Vec<HighlightSegment>>;
}

#[derive(Deserialize)]
struct DetectResponse {
    segments: Vec<HighlightSegment>,
}

pub struct HttpHighlightDetector {
    client: reqwest::Client,
    base_url: String,
}

impl HttpHighlightDetector {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl HighlightDetector for HttpHighlightDetector {
    async fn detect(
        &self,
        session_id: Uuid,
        full_recording_path: &str,
    ) -> Result<Vec<HighlightSegment>> {
        let url = format!("{}/highlights/detect", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({
                "session_id": session_id,
                "object_path": full_recording_path,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "highlight detector returned {}",
                response.status()
            )));
        }

        let body: DetectResponse = response.json().await?;
        Ok(body.segments)
    }
}
