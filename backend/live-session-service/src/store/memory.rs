//! In-memory store double
//!
//! Test-only stand-in for the Postgres store. Keeps the same append-only
//! participant semantics; not intended for production use.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    LiveSession, Participant, RecordingArtifact, RecordingKind, RecordingStatus, Tip,
    VerificationRecord,
};
use crate::store::LiveSessionStore;

#[derive(Default)]
struct State {
    sessions: HashMap<Uuid, LiveSession>,
    participants: Vec<Participant>,
    tips: Vec<Tip>,
    recordings: Vec<RecordingArtifact>,
    verifications: HashMap<Uuid, VerificationRecord>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a verification record. Verdicts come from an external store in
    /// production; tests plant them here.
    pub async fn seed_verification(&self, record: VerificationRecord) {
        let mut state = self.state.write().await;
        state.verifications.insert(record.id, record);
    }
}

#[async_trait]
impl LiveSessionStore for InMemoryStore {
    async fn insert_session(&self, session: &LiveSession) -> Result<()> {
        let mut state = self.state.write().await;
        state.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn session(&self, session_id: Uuid) -> Result<Option<LiveSession>> {
        let state = self.state.read().await;
        Ok(state.sessions.get(&session_id).cloned())
    }

    async fn update_session(&self, session: &LiveSession) -> Result<()> {
        let mut state = self.state.write().await;
        match state.sessions.get_mut(&session.id) {
            Some(existing) => {
                *existing = session.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("session {}", session.id))),
        }
    }

    async fn sessions_by_creator(&self, creator_user_id: Uuid) -> Result<Vec<LiveSession>> {
        let state = self.state.read().await;
        let mut sessions: Vec<LiveSession> = state
            .sessions
            .values()
            .filter(|s| s.creator_user_id == creator_user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    async fn live_sessions(&self) -> Result<Vec<LiveSession>> {
        let state = self.state.read().await;
        let mut sessions: Vec<LiveSession> = state
            .sessions
            .values()
            .filter(|s| s.is_live())
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.actual_start_time.cmp(&a.actual_start_time));
        Ok(sessions)
    }

    async fn insert_participant(&self, participant: &Participant) -> Result<()> {
        let mut state = self.state.write().await;
        state.participants.push(participant.clone());
        Ok(())
    }

    async fn active_participant(
        &self,
        session_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Participant>> {
        let state = self.state.read().await;
        Ok(state
            .participants
            .iter()
            .find(|p| p.session_id == session_id && p.user_id == user_id && p.is_active())
            .cloned())
    }

    async fn active_participant_count(&self, session_id: Uuid) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state
            .participants
            .iter()
            .filter(|p| p.session_id == session_id && p.is_active())
            .count() as i64)
    }

    async fn mark_participant_left(
        &self,
        participant_id: Uuid,
        left_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(participant) = state
            .participants
            .iter_mut()
            .find(|p| p.id == participant_id && p.is_active())
        {
            participant.left_at = Some(left_at);
            participant.watch_time_seconds =
                (left_at - participant.joined_at).num_seconds().max(0);
        }
        Ok(())
    }

    async fn mark_all_participants_left(
        &self,
        session_id: Uuid,
        left_at: DateTime<Utc>,
    ) -> Result<u64> {
        let mut state = self.state.write().await;
        let mut updated = 0;
        for participant in state
            .participants
            .iter_mut()
            .filter(|p| p.session_id == session_id && p.is_active())
        {
            participant.left_at = Some(left_at);
            participant.watch_time_seconds =
                (left_at - participant.joined_at).num_seconds().max(0);
            updated += 1;
        }
        Ok(updated)
    }

    async fn session_participants(&self, session_id: Uuid) -> Result<Vec<Participant>> {
        let state = self.state.read().await;
        Ok(state
            .participants
            .iter()
            .filter(|p| p.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn add_participant_tip(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        amount_cents: i64,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        if let Some(participant) = state
            .participants
            .iter_mut()
            .find(|p| p.session_id == session_id && p.user_id == user_id && p.is_active())
        {
            participant.tips_sent_cents += amount_cents;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn insert_tip(&self, tip: &Tip) -> Result<()> {
        let mut state = self.state.write().await;
        state.tips.push(tip.clone());
        Ok(())
    }

    async fn session_tips(&self, session_id: Uuid) -> Result<Vec<Tip>> {
        let state = self.state.read().await;
        Ok(state
            .tips
            .iter()
            .filter(|t| t.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn insert_recording(&self, recording: &RecordingArtifact) -> Result<()> {
        let mut state = self.state.write().await;
        state.recordings.push(recording.clone());
        Ok(())
    }

    async fn full_recording(&self, session_id: Uuid) -> Result<Option<RecordingArtifact>> {
        let state = self.state.read().await;
        Ok(state
            .recordings
            .iter()
            .filter(|r| {
                r.session_id == session_id
                    && r.kind == RecordingKind::FullRecording
                    && r.status != RecordingStatus::Failed
            })
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn update_recording(&self, recording: &RecordingArtifact) -> Result<()> {
        let mut state = self.state.write().await;
        match state.recordings.iter_mut().find(|r| r.id == recording.id) {
            Some(existing) => {
                *existing = recording.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("recording {}", recording.id))),
        }
    }

    async fn session_recordings(&self, session_id: Uuid) -> Result<Vec<RecordingArtifact>> {
        let state = self.state.read().await;
        Ok(state
            .recordings
            .iter()
            .filter(|r| r.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn verification_record(
        &self,
        verification_id: Uuid,
    ) -> Result<Option<VerificationRecord>> {
        let state = self.state.read().await;
        Ok(state.verifications.get(&verification_id).cloned())
    }
}
