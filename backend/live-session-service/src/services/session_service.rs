//! Session lifecycle
//!
//! The single authority allowed to mutate a session's status. Transitions
//! are monotonic (`scheduled -> live -> ended`); recording, highlight and
//! notification side effects are best-effort and never roll a transition
//! back.

use chrono::Utc;
use rand::RngCore;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::clients::NotificationGateway;
use crate::error::{AppError, Result};
use crate::events::SessionEvent;
use crate::models::{CreateSessionRequest, LiveSession, SessionStatus, Visibility};
use crate::services::locks::SessionLocks;
use crate::services::participant_service::ParticipantService;
use crate::services::recording_service::RecordingService;
use crate::store::LiveSessionStore;

pub struct SessionService {
    store: Arc<dyn LiveSessionStore>,
    locks: Arc<SessionLocks>,
    participants: Arc<ParticipantService>,
    recordings: Arc<RecordingService>,
    gateway: Arc<dyn NotificationGateway>,
    playback_base_url: String,
}

impl SessionService {
    pub fn new(
        store: Arc<dyn LiveSessionStore>,
        locks: Arc<SessionLocks>,
        participants: Arc<ParticipantService>,
        recordings: Arc<RecordingService>,
        gateway: Arc<dyn NotificationGateway>,
        playback_base_url: String,
    ) -> Self {
        Self {
            store,
            locks,
            participants,
            recordings,
            gateway,
            playback_base_url,
        }
    }

    /// Creates a session and admits the creator as its active host. A
    /// session with a future scheduled start stays `scheduled`; otherwise it
    /// goes live immediately, which also kicks off recording when enabled.
    pub async fn create(
        &self,
        creator_user_id: Uuid,
        request: CreateSessionRequest,
    ) -> Result<LiveSession> {
        request.validate()?;

        let now = Utc::now();
        let future_start = request
            .scheduled_start_time
            .map(|t| t > now)
            .unwrap_or(false);
        let status = if future_start {
            SessionStatus::Scheduled
        } else {
            SessionStatus::Live
        };

        let stream_key = generate_secret();
        let playback_url = format!("{}/watch/{}", self.playback_base_url, generate_secret());

        let session = LiveSession {
            id: Uuid::new_v4(),
            creator_user_id,
            title: request.title,
            description: request.description,
            status,
            visibility: request.visibility.unwrap_or(Visibility::Public),
            requires_co_star_verification: request.requires_co_star_verification,
            recording_enabled: request.recording_enabled,
            auto_highlights_enabled: request.auto_highlights_enabled,
            tips_enabled: request.tips_enabled,
            scheduled_start_time: request.scheduled_start_time,
            actual_start_time: (status == SessionStatus::Live).then_some(now),
            ended_at: None,
            current_viewer_count: 0,
            peak_viewer_count: 0,
            total_tips_cents: 0,
            stream_key,
            playback_url,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_session(&session).await?;

        self.participants
            .register_host(session.id, creator_user_id)
            .await?;

        if session.is_live() && session.recording_enabled {
            if let Err(e) = self.recordings.start_recording(session.id).await {
                warn!(session_id = %session.id, "failed to start recording: {e}");
            }
        }

        let created = SessionEvent::SessionCreated {
            session_id: session.id,
            creator_user_id,
            title: session.title.clone(),
            scheduled_start_time: session.scheduled_start_time,
            timestamp: Utc::now(),
        };
        if let Err(e) = self.gateway.publish(&created).await {
            warn!(session_id = %session.id, "failed to publish session_created event: {e}");
        }
        if session.is_live() {
            let started = SessionEvent::SessionStarted {
                session_id: session.id,
                creator_user_id,
                title: session.title.clone(),
                timestamp: Utc::now(),
            };
            if let Err(e) = self.gateway.publish(&started).await {
                warn!(session_id = %session.id, "failed to publish session_started event: {e}");
            }
        }

        info!(session_id = %session.id, status = %session.status, "session created");
        self.get_session(session.id).await
    }

    /// Takes a scheduled session live. Idempotent when already live; fails
    /// with `InvalidStateTransition` once ended.
    pub async fn start(&self, session_id: Uuid, requester_id: Uuid) -> Result<LiveSession> {
        let session = self.owned_session(session_id, requester_id).await?;

        if session.status == SessionStatus::Live {
            return Ok(session);
        }
        if !session.status.can_transition_to(SessionStatus::Live) {
            return Err(AppError::InvalidStateTransition(format!(
                "cannot start a session in status '{}'",
                session.status
            )));
        }

        let session = {
            let _guard = self.locks.lock(session_id).await;

            let mut session = self
                .store
                .session(session_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;
            if session.status == SessionStatus::Live {
                return Ok(session);
            }
            if !session.status.can_transition_to(SessionStatus::Live) {
                return Err(AppError::InvalidStateTransition(format!(
                    "cannot start a session in status '{}'",
                    session.status
                )));
            }

            let now = Utc::now();
            session.status = SessionStatus::Live;
            session.actual_start_time = Some(now);
            session.updated_at = now;
            self.store.update_session(&session).await?;
            session
        };

        if session.recording_enabled {
            if let Err(e) = self.recordings.start_recording(session_id).await {
                warn!(%session_id, "failed to start recording: {e}");
            }
        }

        let event = SessionEvent::SessionStarted {
            session_id,
            creator_user_id: session.creator_user_id,
            title: session.title.clone(),
            timestamp: Utc::now(),
        };
        if let Err(e) = self.gateway.publish(&event).await {
            warn!(%session_id, "failed to publish session_started event: {e}");
        }

        info!(%session_id, "session started");
        Ok(session)
    }

    /// Ends a live session: cascades participant exit in one pass, then
    /// finalizes the recording and requests highlights when enabled. The
    /// side effects never fail the transition itself.
    pub async fn end(&self, session_id: Uuid, requester_id: Uuid) -> Result<LiveSession> {
        let session = self.owned_session(session_id, requester_id).await?;
        if !session.status.can_transition_to(SessionStatus::Ended) {
            // A scheduled session never aired; cancellation is a separate
            // concern, not an end transition.
            return Err(AppError::InvalidStateTransition(format!(
                "cannot end a session in status '{}'",
                session.status
            )));
        }

        let (session, departed) = {
            let _guard = self.locks.lock(session_id).await;

            let mut session = self
                .store
                .session(session_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;
            if !session.status.can_transition_to(SessionStatus::Ended) {
                return Err(AppError::InvalidStateTransition(format!(
                    "cannot end a session in status '{}'",
                    session.status
                )));
            }

            let now = Utc::now();
            session.status = SessionStatus::Ended;
            session.ended_at = Some(now);
            let departed = self.participants.exit_all(session_id, now).await?;
            session.current_viewer_count = 0;
            session.updated_at = now;
            self.store.update_session(&session).await?;
            (session, departed)
        };

        if let Err(e) = self.recordings.stop_recording(session_id).await {
            warn!(%session_id, "failed to finalize recording: {e}");
        }
        if session.auto_highlights_enabled {
            if let Err(e) = self.recordings.generate_highlights(session_id).await {
                warn!(%session_id, "failed to generate highlights: {e}");
            }
        }

        let duration_seconds = match (session.actual_start_time, session.ended_at) {
            (Some(started), Some(ended)) => (ended - started).num_seconds().max(0),
            _ => 0,
        };
        let event = SessionEvent::SessionEnded {
            session_id,
            creator_user_id: session.creator_user_id,
            duration_seconds,
            peak_viewer_count: session.peak_viewer_count,
            total_tips_cents: session.total_tips_cents,
            timestamp: Utc::now(),
        };
        if let Err(e) = self.gateway.publish(&event).await {
            warn!(%session_id, "failed to publish session_ended event: {e}");
        }

        info!(%session_id, departed, duration_seconds, "session ended");
        Ok(session)
    }

    pub async fn get_session(&self, session_id: Uuid) -> Result<LiveSession> {
        self.store
            .session(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))
    }

    pub async fn list_creator_sessions(&self, creator_user_id: Uuid) -> Result<Vec<LiveSession>> {
        self.store.sessions_by_creator(creator_user_id).await
    }

    pub async fn list_live_sessions(&self) -> Result<Vec<LiveSession>> {
        self.store.live_sessions().await
    }

    async fn owned_session(&self, session_id: Uuid, requester_id: Uuid) -> Result<LiveSession> {
        let session = self.get_session(session_id).await?;
        if session.creator_user_id != requester_id {
            return Err(AppError::AccessDenied(
                "only the owning creator may change session state".to_string(),
            ));
        }
        Ok(session)
    }
}

/// Opaque high-entropy credential. Never derived from the session id.
fn generate_secret() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
