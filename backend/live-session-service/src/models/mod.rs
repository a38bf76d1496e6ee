//! Domain models for live broadcast sessions
//!
//! Status enums are stored as text columns; parsing lives here so the
//! Postgres store and the in-memory test double share one definition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

/// Lifecycle status of a live session.
///
/// Transitions are monotonic: `scheduled -> live -> ended`, or
/// `live -> ended` for sessions that go live at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Scheduled,
    Live,
    Ended,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "scheduled",
            SessionStatus::Live => "live",
            SessionStatus::Ended => "ended",
        }
    }

    /// Whether `next` is reachable from `self`. No transition ever reverses.
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        matches!(
            (self, next),
            (SessionStatus::Scheduled, SessionStatus::Live)
                | (SessionStatus::Live, SessionStatus::Ended)
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(SessionStatus::Scheduled),
            "live" => Ok(SessionStatus::Live),
            "ended" => Ok(SessionStatus::Ended),
            other => Err(AppError::Internal(format!(
                "unknown session status: {other}"
            ))),
        }
    }
}

/// Who is allowed to watch a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Subscribers,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Subscribers => "subscribers",
            Visibility::Private => "private",
        }
    }
}

impl FromStr for Visibility {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "subscribers" => Ok(Visibility::Subscribers),
            "private" => Ok(Visibility::Private),
            other => Err(AppError::Internal(format!("unknown visibility: {other}"))),
        }
    }
}

/// One live broadcast instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveSession {
    pub id: Uuid,
    pub creator_user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: SessionStatus,
    pub visibility: Visibility,
    pub requires_co_star_verification: bool,
    pub recording_enabled: bool,
    pub auto_highlights_enabled: bool,
    pub tips_enabled: bool,
    pub scheduled_start_time: Option<DateTime<Utc>>,
    pub actual_start_time: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub current_viewer_count: i64,
    /// Monotonic high-water mark; never drops below `current_viewer_count`.
    pub peak_viewer_count: i64,
    pub total_tips_cents: i64,
    /// Private ingest secret. Generated once at creation, immutable.
    pub stream_key: String,
    /// Public viewing locator. Generated once at creation, immutable.
    pub playback_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LiveSession {
    pub fn is_live(&self) -> bool {
        self.status == SessionStatus::Live
    }
}

/// Parameters for creating a session.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateSessionRequest {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub description: Option<String>,
    pub scheduled_start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub requires_co_star_verification: bool,
    #[serde(default = "default_true")]
    pub recording_enabled: bool,
    #[serde(default = "default_true")]
    pub auto_highlights_enabled: bool,
    #[serde(default = "default_true")]
    pub tips_enabled: bool,
    pub visibility: Option<Visibility>,
}

fn default_true() -> bool {
    true
}

/// Role of an actor attached to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Host,
    CoStar,
    Moderator,
    Viewer,
}

impl ParticipantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::Host => "host",
            ParticipantRole::CoStar => "co_star",
            ParticipantRole::Moderator => "moderator",
            ParticipantRole::Viewer => "viewer",
        }
    }
}

impl FromStr for ParticipantRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "host" => Ok(ParticipantRole::Host),
            "co_star" => Ok(ParticipantRole::CoStar),
            "moderator" => Ok(ParticipantRole::Moderator),
            "viewer" => Ok(ParticipantRole::Viewer),
            other => Err(AppError::Internal(format!(
                "unknown participant role: {other}"
            ))),
        }
    }
}

/// One actor's attachment to a session. Records are append-only: leaving
/// sets `left_at`, nothing is ever deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub role: ParticipantRole,
    /// Verification record used for admission. Present only for co-stars
    /// joining a verification-required session.
    pub co_star_verification_id: Option<Uuid>,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
    pub watch_time_seconds: i64,
    pub tips_sent_cents: i64,
}

impl Participant {
    pub fn is_active(&self) -> bool {
        self.left_at.is_none()
    }
}

/// Settlement outcome recorded on a tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipStatus {
    Completed,
    Failed,
}

impl TipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipStatus::Completed => "completed",
            TipStatus::Failed => "failed",
        }
    }
}

impl FromStr for TipStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(TipStatus::Completed),
            "failed" => Ok(TipStatus::Failed),
            other => Err(AppError::Internal(format!("unknown tip status: {other}"))),
        }
    }
}

/// One in-session value transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tip {
    pub id: Uuid,
    pub session_id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub amount_cents: i64,
    pub message: Option<String>,
    pub status: TipStatus,
    pub created_at: DateTime<Utc>,
}

/// Kind of captured artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingKind {
    FullRecording,
    Highlight,
}

impl RecordingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordingKind::FullRecording => "full_recording",
            RecordingKind::Highlight => "highlight",
        }
    }
}

impl FromStr for RecordingKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full_recording" => Ok(RecordingKind::FullRecording),
            "highlight" => Ok(RecordingKind::Highlight),
            other => Err(AppError::Internal(format!(
                "unknown recording kind: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingStatus {
    Processing,
    Ready,
    Failed,
}

impl RecordingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordingStatus::Processing => "processing",
            RecordingStatus::Ready => "ready",
            RecordingStatus::Failed => "failed",
        }
    }
}

impl FromStr for RecordingStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(RecordingStatus::Processing),
            "ready" => Ok(RecordingStatus::Ready),
            "failed" => Ok(RecordingStatus::Failed),
            other => Err(AppError::Internal(format!(
                "unknown recording status: {other}"
            ))),
        }
    }
}

/// One capture or highlight segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingArtifact {
    pub id: Uuid,
    pub session_id: Uuid,
    pub kind: RecordingKind,
    pub object_path: String,
    pub status: RecordingStatus,
    /// Offsets in seconds from stream start; highlights only.
    pub start_offset_secs: Option<i64>,
    pub end_offset_secs: Option<i64>,
    pub ai_generated: bool,
    pub created_at: DateTime<Utc>,
}

/// Verification verdict status for a co-star record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for VerificationStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(VerificationStatus::Pending),
            "verified" => Ok(VerificationStatus::Verified),
            "rejected" => Ok(VerificationStatus::Rejected),
            other => Err(AppError::Internal(format!(
                "unknown verification status: {other}"
            ))),
        }
    }
}

/// Identity-verification record consumed by the admission gate. The decision
/// logic that produces the verdict lives outside this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: VerificationStatus,
    pub created_at: DateTime<Utc>,
}
