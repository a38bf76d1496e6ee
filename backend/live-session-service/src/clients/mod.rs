//! External collaborator interfaces
//!
//! The orchestrator consumes these as trait objects so tests can substitute
//! fakes and real integrations can be swapped without touching the services.

pub mod highlights;
pub mod notifications;
pub mod recording;
pub mod settlement;
pub mod verification;

pub use highlights::{HighlightDetector, HighlightSegment, HttpHighlightDetector};
pub use notifications::{NotificationGateway, RedisNotificationGateway};
pub use recording::{HttpRecordingTransport, RecordingTransport};
pub use settlement::{HttpSettlementProcessor, SettlementOutcome, SettlementProcessor};
pub use verification::{StoreVerificationGate, VerificationGate};
