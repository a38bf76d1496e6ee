//! Monetization ledger
//!
//! Records in-session tips and keeps the session and sender running totals.
//! Settlement runs outside the session lock; a declined or failed transfer
//! is kept in the ledger with status `failed` and leaves totals untouched.
//! The live status is rechecked under the lock after settlement, so a tip
//! racing the end transition also lands as `failed` instead of mutating an
//! ended session.

use chrono::Utc;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::clients::{NotificationGateway, SettlementProcessor};
use crate::error::{AppError, Result};
use crate::events::SessionEvent;
use crate::models::{SessionStatus, Tip, TipStatus};
use crate::services::locks::SessionLocks;
use crate::store::LiveSessionStore;

pub struct TipService {
    store: Arc<dyn LiveSessionStore>,
    locks: Arc<SessionLocks>,
    settlement: Arc<dyn SettlementProcessor>,
    gateway: Arc<dyn NotificationGateway>,
}

impl TipService {
    pub fn new(
        store: Arc<dyn LiveSessionStore>,
        locks: Arc<SessionLocks>,
        settlement: Arc<dyn SettlementProcessor>,
        gateway: Arc<dyn NotificationGateway>,
    ) -> Self {
        Self {
            store,
            locks,
            settlement,
            gateway,
        }
    }

    /// Sends a tip within a live session. The sender does not have to be a
    /// tracked participant; for a non-joined viewer only the session total
    /// is updated.
    pub async fn send_tip(
        &self,
        session_id: Uuid,
        from_user_id: Uuid,
        to_user_id: Uuid,
        amount_cents: i64,
        message: Option<String>,
    ) -> Result<Tip> {
        if amount_cents <= 0 {
            return Err(AppError::InvalidInput(
                "tip amount must be positive".to_string(),
            ));
        }

        let session = self
            .store
            .session(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;
        if session.status != SessionStatus::Live {
            return Err(AppError::InvalidStateTransition(format!(
                "cannot tip a session in status '{}'",
                session.status
            )));
        }
        if !session.tips_enabled {
            return Err(AppError::TipsDisabled);
        }

        // Settlement is long-latency I/O; it must not run under the session
        // lock.
        let mut completed = match self
            .settlement
            .transfer(from_user_id, to_user_id, amount_cents)
            .await
        {
            Ok(outcome) => outcome.completed,
            Err(e) => {
                warn!(%session_id, %from_user_id, "settlement transfer failed: {e}");
                false
            }
        };

        let tip = {
            let _guard = self.locks.lock(session_id).await;
            let mut session = self
                .store
                .session(session_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;
            // The session may have ended while settlement was in flight; its
            // final totals were already published, so a late tip is kept as
            // failed.
            if completed && session.status != SessionStatus::Live {
                warn!(%session_id, "session ended during settlement, keeping tip as failed");
                completed = false;
            }

            let tip = Tip {
                id: Uuid::new_v4(),
                session_id,
                from_user_id,
                to_user_id,
                amount_cents,
                message,
                status: if completed {
                    TipStatus::Completed
                } else {
                    TipStatus::Failed
                },
                created_at: Utc::now(),
            };
            self.store.insert_tip(&tip).await?;

            if completed {
                session.total_tips_cents += amount_cents;
                session.updated_at = Utc::now();
                self.store.update_session(&session).await?;
                // Sender-level counter only exists when the sender joined.
                self.store
                    .add_participant_tip(session_id, from_user_id, amount_cents)
                    .await?;
            }
            tip
        };

        let event = if completed {
            SessionEvent::SessionTip {
                session_id,
                tip_id: tip.id,
                from_user_id,
                to_user_id,
                amount_cents,
                timestamp: Utc::now(),
            }
        } else {
            SessionEvent::SessionTipFailed {
                session_id,
                tip_id: tip.id,
                from_user_id,
                to_user_id,
                amount_cents,
                timestamp: Utc::now(),
            }
        };
        if let Err(e) = self.gateway.publish(&event).await {
            warn!(%session_id, "failed to publish tip event: {e}");
        }

        Ok(tip)
    }

    /// Ledger entries for a session, oldest first.
    pub async fn session_tips(&self, session_id: Uuid) -> Result<Vec<Tip>> {
        if self.store.session(session_id).await?.is_none() {
            return Err(AppError::NotFound(format!("session {session_id}")));
        }
        self.store.session_tips(session_id).await
    }
}
