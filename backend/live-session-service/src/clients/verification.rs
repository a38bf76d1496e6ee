//! Co-star admission gate
//!
//! Pure lookup against the verification store: the verdict is produced by
//! the compliance pipeline, this gate only consumes it at admission time.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;
use crate::models::VerificationStatus;
use crate::store::LiveSessionStore;

#[async_trait]
pub trait VerificationGate: Send + Sync {
    /// True when the referenced record exists, belongs to `expected_user_id`
    /// and is verified. Checked at admission time, never retroactively.
    async fn check(&self, verification_id: Uuid, expected_user_id: Uuid) -> Result<bool>;
}

pub struct StoreVerificationGate {
    store: Arc<dyn LiveSessionStore>,
}

impl StoreVerificationGate {
    pub fn new(store: Arc<dyn LiveSessionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl VerificationGate for StoreVerificationGate {
    async fn check(&self, verification_id: Uuid, expected_user_id: Uuid) -> Result<bool> {
        let Some(record) = self.store.verification_record(verification_id).await? else {
            return Ok(false);
        };
        Ok(record.user_id == expected_user_id && record.status == VerificationStatus::Verified)
    }
}
