//! Domain events published to the notification gateway
//!
//! Publishing is fire-and-forget: a failed publish is logged and never
//! fails the state change that produced the event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ParticipantRole;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum SessionEvent {
    SessionCreated {
        session_id: Uuid,
        creator_user_id: Uuid,
        title: String,
        scheduled_start_time: Option<DateTime<Utc>>,
        timestamp: DateTime<Utc>,
    },
    SessionStarted {
        session_id: Uuid,
        creator_user_id: Uuid,
        title: String,
        timestamp: DateTime<Utc>,
    },
    SessionEnded {
        session_id: Uuid,
        creator_user_id: Uuid,
        duration_seconds: i64,
        peak_viewer_count: i64,
        total_tips_cents: i64,
        timestamp: DateTime<Utc>,
    },
    ParticipantJoined {
        session_id: Uuid,
        user_id: Uuid,
        role: ParticipantRole,
        current_viewer_count: i64,
        timestamp: DateTime<Utc>,
    },
    ParticipantLeft {
        session_id: Uuid,
        user_id: Uuid,
        current_viewer_count: i64,
        timestamp: DateTime<Utc>,
    },
    SessionTip {
        session_id: Uuid,
        tip_id: Uuid,
        from_user_id: Uuid,
        to_user_id: Uuid,
        amount_cents: i64,
        timestamp: DateTime<Utc>,
    },
    SessionTipFailed {
        session_id: Uuid,
        tip_id: Uuid,
        from_user_id: Uuid,
        to_user_id: Uuid,
        amount_cents: i64,
        timestamp: DateTime<Utc>,
    },
    RecordingReady {
        session_id: Uuid,
        recording_id: Uuid,
        object_path: String,
        timestamp: DateTime<Utc>,
    },
    HighlightsGenerated {
        session_id: Uuid,
        highlight_count: usize,
        timestamp: DateTime<Utc>,
    },
}

impl SessionEvent {
    /// Session the event belongs to; used as the pub/sub routing key.
    pub fn session_id(&self) -> Uuid {
        match self {
            SessionEvent::SessionCreated { session_id, .. }
            | SessionEvent::SessionStarted { session_id, .. }
            | SessionEvent::SessionEnded { session_id, .. }
            | SessionEvent::ParticipantJoined { session_id, .. }
            | SessionEvent::ParticipantLeft { session_id, .. }
            | SessionEvent::SessionTip { session_id, .. }
            | SessionEvent::SessionTipFailed { session_id, .. }
            | SessionEvent::RecordingReady { session_id, .. }
            | SessionEvent::HighlightsGenerated { session_id, .. } => *session_id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::SessionCreated { .. } => "session_created",
            SessionEvent::SessionStarted { .. } => "session_started",
            SessionEvent::SessionEnded { .. } => "session_ended",
            SessionEvent::ParticipantJoined { .. } => "participant_joined",
            SessionEvent::ParticipantLeft { .. } => "participant_left",
            SessionEvent::SessionTip { .. } => "session_tip",
            SessionEvent::SessionTipFailed { .. } => "session_tip_failed",
            SessionEvent::RecordingReady { .. } => "recording_ready",
            SessionEvent::HighlightsGenerated { .. } => "highlights_generated",
        }
    }
}
