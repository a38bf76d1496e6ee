//! Storage seam for the orchestrator
//!
//! Services talk to a [`LiveSessionStore`] trait object. Production uses the
//! Postgres implementation; tests substitute the in-memory double. The store
//! never enforces lifecycle rules, only persistence; sequencing is owned by
//! the services and their per-session locks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{LiveSession, Participant, RecordingArtifact, Tip, VerificationRecord};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait LiveSessionStore: Send + Sync {
    // Sessions
    async fn insert_session(&self, session: &LiveSession) -> Result<()>;
    async fn session(&self, session_id: Uuid) -> Result<Option<LiveSession>>;
    /// Whole-row update of mutable session state (status, timestamps,
    /// counters, totals). The row must already exist.
    async fn update_session(&self, session: &LiveSession) -> Result<()>;
    /// Sessions owned by a creator, newest first.
    async fn sessions_by_creator(&self, creator_user_id: Uuid) -> Result<Vec<LiveSession>>;
    async fn live_sessions(&self) -> Result<Vec<LiveSession>>;

    // Participants
    async fn insert_participant(&self, participant: &Participant) -> Result<()>;
    async fn active_participant(
        &self,
        session_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Participant>>;
    /// Count of participant records with no `left_at` for the session. The
    /// session's viewer count is always derived from this, never counted
    /// independently.
    async fn active_participant_count(&self, session_id: Uuid) -> Result<i64>;
    async fn mark_participant_left(
        &self,
        participant_id: Uuid,
        left_at: DateTime<Utc>,
    ) -> Result<()>;
    /// Marks every active participant of the session as departed in one
    /// pass. Returns how many records were updated.
    async fn mark_all_participants_left(
        &self,
        session_id: Uuid,
        left_at: DateTime<Utc>,
    ) -> Result<u64>;
    async fn session_participants(&self, session_id: Uuid) -> Result<Vec<Participant>>;
    /// Adds to the active sender's running tip total. Returns false when the
    /// sender is not an active participant of the session.
    async fn add_participant_tip(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        amount_cents: i64,
    ) -> Result<bool>;

    // Tips
    async fn insert_tip(&self, tip: &Tip) -> Result<()>;
    async fn session_tips(&self, session_id: Uuid) -> Result<Vec<Tip>>;

    // Recordings
    async fn insert_recording(&self, recording: &RecordingArtifact) -> Result<()>;
    /// The session's full-recording artifact, ignoring failed attempts.
    async fn full_recording(&self, session_id: Uuid) -> Result<Option<RecordingArtifact>>;
    async fn update_recording(&self, recording: &RecordingArtifact) -> Result<()>;
    async fn session_recordings(&self, session_id: Uuid) -> Result<Vec<RecordingArtifact>>;

    // Verification records (read-only; verdicts are produced elsewhere)
    async fn verification_record(
        &self,
        verification_id: Uuid,
    ) -> Result<Option<VerificationRecord>>;
}
