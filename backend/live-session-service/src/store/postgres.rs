//! Postgres store
//!
//! Runtime-checked sqlx queries against the tables created by
//! `migrations/`. Status enums are stored as text and parsed through the
//! model `FromStr` impls.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Row};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    LiveSession, Participant, RecordingArtifact, Tip, VerificationRecord,
};
use crate::store::LiveSessionStore;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(FromRow)]
struct SessionRow {
    id: Uuid,
    creator_user_id: Uuid,
    title: String,
    description: Option<String>,
    status: String,
    visibility: String,
    requires_co_star_verification: bool,
    recording_enabled: bool,
    auto_highlights_enabled: bool,
    tips_enabled: bool,
    scheduled_start_time: Option<DateTime<Utc>>,
    actual_start_time: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    current_viewer_count: i64,
    peak_viewer_count: i64,
    total_tips_cents: i64,
    stream_key: String,
    playback_url: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SessionRow> for LiveSession {
    type Error = AppError;

    fn try_from(row: SessionRow) -> Result<Self> {
        Ok(LiveSession {
            id: row.id,
            creator_user_id: row.creator_user_id,
            title: row.title,
            description: row.description,
            status: row.status.parse()?,
            visibility: row.visibility.parse()?,
            requires_co_star_verification: row.requires_co_star_verification,
            recording_enabled: row.recording_enabled,
            auto_highlights_enabled: row.auto_highlights_enabled,
            tips_enabled: row.tips_enabled,
            scheduled_start_time: row.scheduled_start_time,
            actual_start_time: row.actual_start_time,
            ended_at: row.ended_at,
            current_viewer_count: row.current_viewer_count,
            peak_viewer_count: row.peak_viewer_count,
            total_tips_cents: row.total_tips_cents,
            stream_key: row.stream_key,
            playback_url: row.playback_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SESSION_COLUMNS: &str = "id, creator_user_id, title, description, status, visibility, \
     requires_co_star_verification, recording_enabled, auto_highlights_enabled, tips_enabled, \
     scheduled_start_time, actual_start_time, ended_at, current_viewer_count, peak_viewer_count, \
     total_tips_cents, stream_key, playback_url, created_at, updated_at";

#[derive(FromRow)]
struct ParticipantRow {
    id: Uuid,
    session_id: Uuid,
    user_id: Uuid,
    role: String,
    co_star_verification_id: Option<Uuid>,
    joined_at: DateTime<Utc>,
    left_at: Option<DateTime<Utc>>,
    watch_time_seconds: i64,
    tips_sent_cents: i64,
}

impl TryFrom<ParticipantRow> for Participant {
    type Error = AppError;

    fn try_from(row: ParticipantRow) -> Result<Self> {
        Ok(Participant {
            id: row.id,
            session_id: row.session_id,
            user_id: row.user_id,
            role: row.role.parse()?,
            co_star_verification_id: row.co_star_verification_id,
            joined_at: row.joined_at,
            left_at: row.left_at,
            watch_time_seconds: row.watch_time_seconds,
            tips_sent_cents: row.tips_sent_cents,
        })
    }
}

#[derive(FromRow)]
struct TipRow {
    id: Uuid,
    session_id: Uuid,
    from_user_id: Uuid,
    to_user_id: Uuid,
    amount_cents: i64,
    message: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<TipRow> for Tip {
    type Error = AppError;

    fn try_from(row: TipRow) -> Result<Self> {
        Ok(Tip {
            id: row.id,
            session_id: row.session_id,
            from_user_id: row.from_user_id,
            to_user_id: row.to_user_id,
            amount_cents: row.amount_cents,
            message: row.message,
            status: row.status.parse()?,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct RecordingRow {
    id: Uuid,
    session_id: Uuid,
    kind: String,
    object_path: String,
    status: String,
    start_offset_secs: Option<i64>,
    end_offset_secs: Option<i64>,
    ai_generated: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<RecordingRow> for RecordingArtifact {
    type Error = AppError;

    fn try_from(row: RecordingRow) -> Result<Self> {
        Ok(RecordingArtifact {
            id: row.id,
            session_id: row.session_id,
            kind: row.kind.parse()?,
            object_path: row.object_path,
            status: row.status.parse()?,
            start_offset_secs: row.start_offset_secs,
            end_offset_secs: row.end_offset_secs,
            ai_generated: row.ai_generated,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct VerificationRow {
    id: Uuid,
    user_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<VerificationRow> for VerificationRecord {
    type Error = AppError;

    fn try_from(row: VerificationRow) -> Result<Self> {
        Ok(VerificationRecord {
            id: row.id,
            user_id: row.user_id,
            status: row.status.parse()?,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl LiveSessionStore for PgStore {
    async fn insert_session(&self, session: &LiveSession) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO live_sessions (
                id, creator_user_id, title, description, status, visibility,
                requires_co_star_verification, recording_enabled, auto_highlights_enabled,
                tips_enabled, scheduled_start_time, actual_start_time, ended_at,
                current_viewer_count, peak_viewer_count, total_tips_cents,
                stream_key, playback_url, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16, $17, $18, $19, $20)
            "#,
        )
        .bind(session.id)
        .bind(session.creator_user_id)
        .bind(&session.title)
        .bind(&session.description)
        .bind(session.status.as_str())
        .bind(session.visibility.as_str())
        .bind(session.requires_co_star_verification)
        .bind(session.recording_enabled)
        .bind(session.auto_highlights_enabled)
        .bind(session.tips_enabled)
        .bind(session.scheduled_start_time)
        .bind(session.actual_start_time)
        .bind(session.ended_at)
        .bind(session.current_viewer_count)
        .bind(session.peak_viewer_count)
        .bind(session.total_tips_cents)
        .bind(&session.stream_key)
        .bind(&session.playback_url)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn session(&self, session_id: Uuid) -> Result<Option<LiveSession>> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM live_sessions WHERE id = $1"
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(LiveSession::try_from).transpose()
    }

    async fn update_session(&self, session: &LiveSession) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE live_sessions
            SET status = $2,
                actual_start_time = $3,
                ended_at = $4,
                current_viewer_count = $5,
                peak_viewer_count = $6,
                total_tips_cents = $7,
                updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(session.id)
        .bind(session.status.as_str())
        .bind(session.actual_start_time)
        .bind(session.ended_at)
        .bind(session.current_viewer_count)
        .bind(session.peak_viewer_count)
        .bind(session.total_tips_cents)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("session {}", session.id)));
        }
        Ok(())
    }

    async fn sessions_by_creator(&self, creator_user_id: Uuid) -> Result<Vec<LiveSession>> {
        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM live_sessions \
             WHERE creator_user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(creator_user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(LiveSession::try_from).collect()
    }

    async fn live_sessions(&self) -> Result<Vec<LiveSession>> {
        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM live_sessions \
             WHERE status = 'live' ORDER BY actual_start_time DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(LiveSession::try_from).collect()
    }

    async fn insert_participant(&self, participant: &Participant) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO session_participants (
                id, session_id, user_id, role, co_star_verification_id,
                joined_at, left_at, watch_time_seconds, tips_sent_cents
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(participant.id)
        .bind(participant.session_id)
        .bind(participant.user_id)
        .bind(participant.role.as_str())
        .bind(participant.co_star_verification_id)
        .bind(participant.joined_at)
        .bind(participant.left_at)
        .bind(participant.watch_time_seconds)
        .bind(participant.tips_sent_cents)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn active_participant(
        &self,
        session_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Participant>> {
        let row = sqlx::query_as::<_, ParticipantRow>(
            r#"
            SELECT id, session_id, user_id, role, co_star_verification_id,
                   joined_at, left_at, watch_time_seconds, tips_sent_cents
            FROM session_participants
            WHERE session_id = $1 AND user_id = $2 AND left_at IS NULL
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Participant::try_from).transpose()
    }

    async fn active_participant_count(&self, session_id: Uuid) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM session_participants \
             WHERE session_id = $1 AND left_at IS NULL",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get::<i64, _>("count"))
    }

    async fn mark_participant_left(
        &self,
        participant_id: Uuid,
        left_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE session_participants
            SET left_at = $2,
                watch_time_seconds = GREATEST(EXTRACT(EPOCH FROM ($2 - joined_at))::BIGINT, 0)
            WHERE id = $1 AND left_at IS NULL
            "#,
        )
        .bind(participant_id)
        .bind(left_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_all_participants_left(
        &self,
        session_id: Uuid,
        left_at: DateTime<Utc>,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE session_participants
            SET left_at = $2,
                watch_time_seconds = GREATEST(EXTRACT(EPOCH FROM ($2 - joined_at))::BIGINT, 0)
            WHERE session_id = $1 AND left_at IS NULL
            "#,
        )
        .bind(session_id)
        .bind(left_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn session_participants(&self, session_id: Uuid) -> Result<Vec<Participant>> {
        let rows = sqlx::query_as::<_, ParticipantRow>(
            r#"
            SELECT id, session_id, user_id, role, co_star_verification_id,
                   joined_at, left_at, watch_time_seconds, tips_sent_cents
            FROM session_participants
            WHERE session_id = $1
            ORDER BY joined_at ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Participant::try_from).collect()
    }

    async fn add_participant_tip(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        amount_cents: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE session_participants
            SET tips_sent_cents = tips_sent_cents + $3
            WHERE session_id = $1 AND user_id = $2 AND left_at IS NULL
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .bind(amount_cents)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_tip(&self, tip: &Tip) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO session_tips (
                id, session_id, from_user_id, to_user_id, amount_cents,
                message, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(tip.id)
        .bind(tip.session_id)
        .bind(tip.from_user_id)
        .bind(tip.to_user_id)
        .bind(tip.amount_cents)
        .bind(&tip.message)
        .bind(tip.status.as_str())
        .bind(tip.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn session_tips(&self, session_id: Uuid) -> Result<Vec<Tip>> {
        let rows = sqlx::query_as::<_, TipRow>(
            r#"
            SELECT id, session_id, from_user_id, to_user_id, amount_cents,
                   message, status, created_at
            FROM session_tips
            WHERE session_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Tip::try_from).collect()
    }

    async fn insert_recording(&self, recording: &RecordingArtifact) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO session_recordings (
                id, session_id, kind, object_path, status,
                start_offset_secs, end_offset_secs, ai_generated, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(recording.id)
        .bind(recording.session_id)
        .bind(recording.kind.as_str())
        .bind(&recording.object_path)
        .bind(recording.status.as_str())
        .bind(recording.start_offset_secs)
        .bind(recording.end_offset_secs)
        .bind(recording.ai_generated)
        .bind(recording.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn full_recording(&self, session_id: Uuid) -> Result<Option<RecordingArtifact>> {
        let row = sqlx::query_as::<_, RecordingRow>(
            r#"
            SELECT id, session_id, kind, object_path, status,
                   start_offset_secs, end_offset_secs, ai_generated, created_at
            FROM session_recordings
            WHERE session_id = $1 AND kind = 'full_recording' AND status <> 'failed'
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(RecordingArtifact::try_from).transpose()
    }

    async fn update_recording(&self, recording: &RecordingArtifact) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE session_recordings
            SET status = $2, object_path = $3
            WHERE id = $1
            "#,
        )
        .bind(recording.id)
        .bind(recording.status.as_str())
        .bind(&recording.object_path)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("recording {}", recording.id)));
        }
        Ok(())
    }

    async fn session_recordings(&self, session_id: Uuid) -> Result<Vec<RecordingArtifact>> {
        let rows = sqlx::query_as::<_, RecordingRow>(
            r#"
            SELECT id, session_id, kind, object_path, status,
                   start_offset_secs, end_offset_secs, ai_generated, created_at
            FROM session_recordings
            WHERE session_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(RecordingArtifact::try_from).collect()
    }

    async fn verification_record(
        &self,
        verification_id: Uuid,
    ) -> Result<Option<VerificationRecord>> {
        let row = sqlx::query_as::<_, VerificationRow>(
            "SELECT id, user_id, status, created_at \
             FROM co_star_verifications WHERE id = $1",
        )
        .bind(verification_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(VerificationRecord::try_from).transpose()
    }
}
