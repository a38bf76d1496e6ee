//! Business logic layer

pub mod locks;
pub mod participant_service;
pub mod recording_service;
pub mod session_service;
pub mod tip_service;

pub use locks::SessionLocks;
pub use participant_service::ParticipantService;
pub use recording_service::RecordingService;
pub use session_service::SessionService;
pub use tip_service::TipService;

use std::sync::Arc;

use crate::clients::{
    HighlightDetector, NotificationGateway, RecordingTransport, SettlementProcessor,
    VerificationGate,
};
use crate::store::LiveSessionStore;

/// External collaborators the orchestrator depends on. Constructed
/// explicitly so tests can pass fakes; there is no hidden global state.
pub struct Collaborators {
    pub verification_gate: Arc<dyn VerificationGate>,
    pub recording_transport: Arc<dyn RecordingTransport>,
    pub highlight_detector: Arc<dyn HighlightDetector>,
    pub settlement: Arc<dyn SettlementProcessor>,
    pub gateway: Arc<dyn NotificationGateway>,
}

/// The assembled service layer sharing one store and one lock registry.
pub struct LiveSessionServices {
    pub sessions: Arc<SessionService>,
    pub participants: Arc<ParticipantService>,
    pub tips: Arc<TipService>,
    pub recordings: Arc<RecordingService>,
}

impl LiveSessionServices {
    pub fn build(
        store: Arc<dyn LiveSessionStore>,
        collaborators: Collaborators,
        playback_base_url: String,
    ) -> Self {
        let locks = Arc::new(SessionLocks::new());

        let recordings = Arc::new(RecordingService::new(
            Arc::clone(&store),
            collaborators.recording_transport,
            collaborators.highlight_detector,
            Arc::clone(&collaborators.gateway),
        ));
        let participants = Arc::new(ParticipantService::new(
            Arc::clone(&store),
            Arc::clone(&locks),
            collaborators.verification_gate,
            Arc::clone(&collaborators.gateway),
        ));
        let tips = Arc::new(TipService::new(
            Arc::clone(&store),
            Arc::clone(&locks),
            collaborators.settlement,
            Arc::clone(&collaborators.gateway),
        ));
        let sessions = Arc::new(SessionService::new(
            store,
            locks,
            Arc::clone(&participants),
            Arc::clone(&recordings),
            collaborators.gateway,
            playback_base_url,
        ));

        Self {
            sessions,
            participants,
            tips,
            recordings,
        }
    }
}
