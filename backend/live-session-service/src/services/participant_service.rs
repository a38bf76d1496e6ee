//! Participant registry
//!
//! Tracks who is attached to a session and in what role, gates co-star
//! admission through the verification check, and keeps the session's viewer
//! counters derived from the active participant set. Counts are always
//! recomputed from the store, never incremented independently, so concurrent
//! joins and leaves cannot drift.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::clients::{NotificationGateway, VerificationGate};
use crate::error::{AppError, Result};
use crate::events::SessionEvent;
use crate::models::{Participant, ParticipantRole, SessionStatus};
use crate::services::locks::SessionLocks;
use crate::store::LiveSessionStore;

pub struct ParticipantService {
    store: Arc<dyn LiveSessionStore>,
    locks: Arc<SessionLocks>,
    verification_gate: Arc<dyn VerificationGate>,
    gateway: Arc<dyn NotificationGateway>,
}

impl ParticipantService {
    pub fn new(
        store: Arc<dyn LiveSessionStore>,
        locks: Arc<SessionLocks>,
        verification_gate: Arc<dyn VerificationGate>,
        gateway: Arc<dyn NotificationGateway>,
    ) -> Self {
        Self {
            store,
            locks,
            verification_gate,
            gateway,
        }
    }

    /// Attaches a user to a live session. Idempotent per (session, user):
    /// an existing active record is returned unchanged and the viewer count
    /// is not touched a second time.
    pub async fn join(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        role: ParticipantRole,
        verification_id: Option<Uuid>,
    ) -> Result<Participant> {
        let session = self
            .store
            .session(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;

        if session.status != SessionStatus::Live {
            return Err(AppError::InvalidStateTransition(format!(
                "cannot join a session in status '{}'",
                session.status
            )));
        }

        // The admission check is potentially slow I/O; it runs before the
        // session lock is taken.
        let admission_ref = if role == ParticipantRole::CoStar
            && session.requires_co_star_verification
        {
            let verification_id = verification_id.ok_or_else(|| {
                AppError::VerificationRequired(
                    "co-star admission requires a verification record".to_string(),
                )
            })?;
            let verified = self
                .verification_gate
                .check(verification_id, user_id)
                .await?;
            if !verified {
                return Err(AppError::VerificationRequired(
                    "verification record is missing, not verified, or owned by another user"
                        .to_string(),
                ));
            }
            Some(verification_id)
        } else {
            None
        };

        let participant;
        let current_viewer_count;
        {
            let _guard = self.locks.lock(session_id).await;

            // Re-read under the lock; the session may have ended while the
            // admission check was in flight.
            let mut session = self
                .store
                .session(session_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;
            if session.status != SessionStatus::Live {
                return Err(AppError::InvalidStateTransition(format!(
                    "cannot join a session in status '{}'",
                    session.status
                )));
            }

            if let Some(existing) = self.store.active_participant(session_id, user_id).await? {
                return Ok(existing);
            }

            participant = Participant {
                id: Uuid::new_v4(),
                session_id,
                user_id,
                role,
                co_star_verification_id: admission_ref,
                joined_at: Utc::now(),
                left_at: None,
                watch_time_seconds: 0,
                tips_sent_cents: 0,
            };
            self.store.insert_participant(&participant).await?;

            current_viewer_count = self.store.active_participant_count(session_id).await?;
            session.current_viewer_count = current_viewer_count;
            session.peak_viewer_count = session.peak_viewer_count.max(current_viewer_count);
            session.updated_at = Utc::now();
            self.store.update_session(&session).await?;
        }

        let event = SessionEvent::ParticipantJoined {
            session_id,
            user_id,
            role,
            current_viewer_count,
            timestamp: Utc::now(),
        };
        if let Err(e) = self.gateway.publish(&event).await {
            warn!(%session_id, %user_id, "failed to publish participant_joined event: {e}");
        }

        Ok(participant)
    }

    /// Marks the user's active record as departed. No-op when the user has
    /// no active attachment.
    pub async fn leave(&self, session_id: Uuid, user_id: Uuid) -> Result<()> {
        if self.store.session(session_id).await?.is_none() {
            return Err(AppError::NotFound(format!("session {session_id}")));
        }

        let current_viewer_count;
        {
            let _guard = self.locks.lock(session_id).await;

            let Some(participant) = self.store.active_participant(session_id, user_id).await?
            else {
                return Ok(());
            };
            self.store
                .mark_participant_left(participant.id, Utc::now())
                .await?;

            let mut session = self
                .store
                .session(session_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;
            current_viewer_count = self.store.active_participant_count(session_id).await?;
            session.current_viewer_count = current_viewer_count;
            session.updated_at = Utc::now();
            self.store.update_session(&session).await?;
        }

        let event = SessionEvent::ParticipantLeft {
            session_id,
            user_id,
            current_viewer_count,
            timestamp: Utc::now(),
        };
        if let Err(e) = self.gateway.publish(&event).await {
            warn!(%session_id, %user_id, "failed to publish participant_left event: {e}");
        }

        Ok(())
    }

    /// Full attendance log for the session, departed records included.
    pub async fn list_participants(&self, session_id: Uuid) -> Result<Vec<Participant>> {
        if self.store.session(session_id).await?.is_none() {
            return Err(AppError::NotFound(format!("session {session_id}")));
        }
        self.store.session_participants(session_id).await
    }

    /// Admits the owning creator as the host at creation time, before the
    /// session is necessarily live. Internal to the lifecycle.
    pub(crate) async fn register_host(
        &self,
        session_id: Uuid,
        creator_user_id: Uuid,
    ) -> Result<Participant> {
        let _guard = self.locks.lock(session_id).await;

        let mut session = self
            .store
            .session(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;

        let participant = Participant {
            id: Uuid::new_v4(),
            session_id,
            user_id: creator_user_id,
            role: ParticipantRole::Host,
            co_star_verification_id: None,
            joined_at: Utc::now(),
            left_at: None,
            watch_time_seconds: 0,
            tips_sent_cents: 0,
        };
        self.store.insert_participant(&participant).await?;

        let count = self.store.active_participant_count(session_id).await?;
        session.current_viewer_count = count;
        session.peak_viewer_count = session.peak_viewer_count.max(count);
        session.updated_at = Utc::now();
        self.store.update_session(&session).await?;

        Ok(participant)
    }

    /// Marks every active participant as departed in one pass. Called by the
    /// lifecycle during `end`, which already holds the session lock.
    pub(crate) async fn exit_all(&self, session_id: Uuid, at: DateTime<Utc>) -> Result<u64> {
        self.store.mark_all_participants_left(session_id, at).await
    }
}
