//! Settlement processor client
//!
//! The payment rail is opaque: the ledger records tips, the processor moves
//! the money. A declined transfer is a normal outcome, not a transport error.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SettlementOutcome {
    pub completed: bool,
}

#[async_trait]
pub trait SettlementProcessor: Send + Sync {
    async fn transfer(
        &self,
        from_user_id: Uuid,
        to_user_id: Uuid,
        amount_cents: i64,
    ) -> Result<SettlementOutcome>;
}

pub struct HttpSettlementProcessor {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSettlementProcessor {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl SettlementProcessor for HttpSettlementProcessor {
    async fn transfer(
        &self,
        from_user_id: Uuid,
        to_user_id: Uuid,
        amount_cents: i64,
    ) -> Result<SettlementOutcome> {
        let url = format!("{}/transfers", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({
                "from_user_id": from_user_id,
                "to_user_id": to_user_id,
                "amount_cents": amount_cents,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "settlement processor returned {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}
