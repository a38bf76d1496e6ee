//! Recording orchestration
//!
//! Drives durable capture and highlight extraction off session lifecycle
//! transitions. Everything here is a best-effort side effect of the
//! transition that triggered it: callers log failures and move on.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::clients::{HighlightDetector, NotificationGateway, RecordingTransport};
use crate::error::{AppError, Result};
use crate::events::SessionEvent;
use crate::models::{RecordingArtifact, RecordingKind, RecordingStatus};
use crate::store::LiveSessionStore;

pub struct RecordingService {
    store: Arc<dyn LiveSessionStore>,
    transport: Arc<dyn RecordingTransport>,
    detector: Arc<dyn HighlightDetector>,
    gateway: Arc<dyn NotificationGateway>,
}

impl RecordingService {
    pub fn new(
        store: Arc<dyn LiveSessionStore>,
        transport: Arc<dyn RecordingTransport>,
        detector: Arc<dyn HighlightDetector>,
        gateway: Arc<dyn NotificationGateway>,
    ) -> Self {
        Self {
            store,
            transport,
            detector,
            gateway,
        }
    }

    /// Begins durable capture for the session. Idempotent: an existing
    /// `processing` or `ready` full recording is returned unchanged.
    pub async fn start_recording(&self, session_id: Uuid) -> Result<RecordingArtifact> {
        if let Some(existing) = self.store.full_recording(session_id).await? {
            return Ok(existing);
        }

        let object_path = self.transport.start(session_id).await?;
        let artifact = RecordingArtifact {
            id: Uuid::new_v4(),
            session_id,
            kind: RecordingKind::FullRecording,
            object_path,
            status: RecordingStatus::Processing,
            start_offset_secs: None,
            end_offset_secs: None,
            ai_generated: false,
            created_at: Utc::now(),
        };
        self.store.insert_recording(&artifact).await?;

        info!(%session_id, recording_id = %artifact.id, "recording started");
        Ok(artifact)
    }

    /// Finalizes the session's full recording (`processing` -> `ready`).
    /// No-op when nothing is recording or the capture is already final.
    pub async fn stop_recording(&self, session_id: Uuid) -> Result<Option<RecordingArtifact>> {
        let Some(mut artifact) = self.store.full_recording(session_id).await? else {
            return Ok(None);
        };
        if artifact.status == RecordingStatus::Ready {
            return Ok(Some(artifact));
        }

        let object_path = self.transport.stop(session_id).await?;
        artifact.object_path = object_path;
        artifact.status = RecordingStatus::Ready;
        self.store.update_recording(&artifact).await?;

        let event = SessionEvent::RecordingReady {
            session_id,
            recording_id: artifact.id,
            object_path: artifact.object_path.clone(),
            timestamp: Utc::now(),
        };
        if let Err(e) = self.gateway.publish(&event).await {
            warn!(%session_id, "failed to publish recording_ready event: {e}");
        }

        info!(%session_id, recording_id = %artifact.id, "recording finalized");
        Ok(Some(artifact))
    }

    /// Requests segment boundaries from the highlight detector and persists
    /// one `processing` highlight artifact per segment. Only meaningful once
    /// the full recording is `ready`.
    pub async fn generate_highlights(&self, session_id: Uuid) -> Result<Vec<RecordingArtifact>> {
        let Some(full) = self.store.full_recording(session_id).await? else {
            return Ok(Vec::new());
        };
        if full.status != RecordingStatus::Ready {
            return Ok(Vec::new());
        }

        let segments = self
            .detector
            .detect(session_id, &full.object_path)
            .await?;

        let mut artifacts = Vec::with_capacity(segments.len());
        for segment in segments {
            let id = Uuid::new_v4();
            let artifact = RecordingArtifact {
                id,
                session_id,
                kind: RecordingKind::Highlight,
                object_path: format!("sessions/{session_id}/highlights/{id}.mp4"),
                status: RecordingStatus::Processing,
                start_offset_secs: Some(segment.start_offset_secs),
                end_offset_secs: Some(segment.end_offset_secs),
                ai_generated: true,
                created_at: Utc::now(),
            };
            self.store.insert_recording(&artifact).await?;
            artifacts.push(artifact);
        }

        if !artifacts.is_empty() {
            let event = SessionEvent::HighlightsGenerated {
                session_id,
                highlight_count: artifacts.len(),
                timestamp: Utc::now(),
            };
            if let Err(e) = self.gateway.publish(&event).await {
                warn!(%session_id, "failed to publish highlights_generated event: {e}");
            }
        }

        info!(%session_id, count = artifacts.len(), "highlight extraction requested");
        Ok(artifacts)
    }

    /// All artifacts captured for a session.
    pub async fn list_recordings(&self, session_id: Uuid) -> Result<Vec<RecordingArtifact>> {
        if self.store.session(session_id).await?.is_none() {
            return Err(AppError::NotFound(format!("session {session_id}")));
        }
        self.store.session_recordings(session_id).await
    }
}
