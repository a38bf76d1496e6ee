//! Configuration for the live session service
//!
//! Loaded from environment variables; every knob has a development default.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub events: EventsConfig,
    pub media: MediaConfig,
    pub settlement: SettlementConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Redis channel the notification gateway publishes to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    pub redis_url: String,
    pub channel: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Base URL for public playback locators.
    pub playback_base_url: String,
    /// Recorder control endpoint on the media node.
    pub recorder_base_url: String,
    /// Highlight detection endpoint.
    pub highlight_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementConfig {
    pub base_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/live_sessions".to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(10),
            },
            events: EventsConfig {
                redis_url: std::env::var("REDIS_URL")
                    .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
                channel: std::env::var("SESSION_EVENTS_CHANNEL")
                    .unwrap_or_else(|_| "events:sessions".to_string()),
            },
            media: MediaConfig {
                playback_base_url: std::env::var("PLAYBACK_BASE_URL")
                    .unwrap_or_else(|_| "https://live.fanzlab.dev".to_string()),
                recorder_base_url: std::env::var("RECORDER_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:8090".to_string()),
                highlight_base_url: std::env::var("HIGHLIGHT_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:8091".to_string()),
            },
            settlement: SettlementConfig {
                base_url: std::env::var("SETTLEMENT_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:8092".to_string()),
            },
        }
    }
}
