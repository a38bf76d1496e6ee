//! Notification gateway
//!
//! Fire-and-forget fan-out of lifecycle and monetization events. The
//! production gateway publishes JSON onto a Redis channel; subscribers
//! (websocket fan-out, push pipeline) consume it downstream.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::error::Result;
use crate::events::SessionEvent;

#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn publish(&self, event: &SessionEvent) -> Result<()>;
}

pub struct RedisNotificationGateway {
    conn: ConnectionManager,
    channel: String,
}

impl RedisNotificationGateway {
    pub fn new(conn: ConnectionManager, channel: String) -> Self {
        Self { conn, channel }
    }

    pub async fn connect(redis_url: &str, channel: String) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn, channel })
    }
}

#[async_trait]
impl NotificationGateway for RedisNotificationGateway {
    async fn publish(&self, event: &SessionEvent) -> Result<()> {
        let payload = serde_json::to_string(event)?;
        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(&self.channel, payload).await?;
        Ok(())
    }
}
