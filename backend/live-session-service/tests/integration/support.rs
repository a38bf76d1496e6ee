//! Shared fixtures: in-memory store plus fake collaborators.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use uuid::Uuid;

use live_session_service::clients::{
    HighlightDetector, HighlightSegment, NotificationGateway, RecordingTransport,
    SettlementOutcome, SettlementProcessor, StoreVerificationGate,
};
use live_session_service::error::{AppError, Result};
use live_session_service::events::SessionEvent;
use live_session_service::models::{
    CreateSessionRequest, VerificationRecord, VerificationStatus,
};
use live_session_service::services::{Collaborators, LiveSessionServices};
use live_session_service::store::{InMemoryStore, LiveSessionStore};

pub struct FakeRecordingTransport {
    pub start_calls: AtomicUsize,
    pub stop_calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl FakeRecordingTransport {
    pub fn new() -> Self {
        Self {
            start_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl RecordingTransport for FakeRecordingTransport {
    async fn start(&self, session_id: Uuid) -> Result<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Internal("recorder unreachable".to_string()));
        }
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("sessions/{session_id}/full.mp4"))
    }

    async fn stop(&self, session_id: Uuid) -> Result<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Internal("recorder unreachable".to_string()));
        }
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("sessions/{session_id}/full.mp4"))
    }
}

pub struct FakeHighlightDetector {
    pub segments: Vec<(i64, i64)>,
    pub fail: AtomicBool,
}

impl FakeHighlightDetector {
    pub fn new() -> Self {
        Self {
            segments: vec![(15, 45), (120, 160)],
            fail: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl HighlightDetector for FakeHighlightDetector {
    async fn detect(
        &self,
        _session_id: Uuid,
        _full_recording_path: &str,
    ) -> Result<Vec<HighlightSegment>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Internal(
                "highlight detector unreachable".to_string(),
            ));
        }
        Ok(self
            .segments
            .iter()
            .map(|&(start, end)| HighlightSegment {
                start_offset_secs: start,
                end_offset_secs: end,
            })
            .collect())
    }
}

pub struct FakeSettlementProcessor {
    pub decline: AtomicBool,
    pub fail: AtomicBool,
    pub transfer_calls: AtomicUsize,
    /// When `hold` is set, `transfer` signals `entered` and parks until
    /// `release` is notified, letting a test interleave other operations
    /// mid-settlement.
    pub hold: AtomicBool,
    pub entered: Notify,
    pub release: Notify,
}

impl FakeSettlementProcessor {
    pub fn new() -> Self {
        Self {
            decline: AtomicBool::new(false),
            fail: AtomicBool::new(false),
            transfer_calls: AtomicUsize::new(0),
            hold: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl SettlementProcessor for FakeSettlementProcessor {
    async fn transfer(
        &self,
        _from_user_id: Uuid,
        _to_user_id: Uuid,
        _amount_cents: i64,
    ) -> Result<SettlementOutcome> {
        self.transfer_calls.fetch_add(1, Ordering::SeqCst);
        if self.hold.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Internal("payment rail unreachable".to_string()));
        }
        Ok(SettlementOutcome {
            completed: !self.decline.load(Ordering::SeqCst),
        })
    }
}

#[derive(Default)]
pub struct CapturingGateway {
    events: Mutex<Vec<SessionEvent>>,
    pub fail: AtomicBool,
}

impl CapturingGateway {
    pub async fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().await.clone()
    }

    pub async fn event_types(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .await
            .iter()
            .map(|e| e.event_type())
            .collect()
    }
}

#[async_trait]
impl NotificationGateway for CapturingGateway {
    async fn publish(&self, event: &SessionEvent) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Internal("event bus unreachable".to_string()));
        }
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}

pub struct Harness {
    pub services: LiveSessionServices,
    pub store: Arc<InMemoryStore>,
    pub transport: Arc<FakeRecordingTransport>,
    pub detector: Arc<FakeHighlightDetector>,
    pub settlement: Arc<FakeSettlementProcessor>,
    pub gateway: Arc<CapturingGateway>,
}

pub fn harness() -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let transport = Arc::new(FakeRecordingTransport::new());
    let detector = Arc::new(FakeHighlightDetector::new());
    let settlement = Arc::new(FakeSettlementProcessor::new());
    let gateway = Arc::new(CapturingGateway::default());

    let store_dyn: Arc<dyn LiveSessionStore> = store.clone();
    let services = LiveSessionServices::build(
        store_dyn.clone(),
        Collaborators {
            verification_gate: Arc::new(StoreVerificationGate::new(store_dyn)),
            recording_transport: transport.clone(),
            highlight_detector: detector.clone(),
            settlement: settlement.clone(),
            gateway: gateway.clone(),
        },
        "https://live.test".to_string(),
    );

    Harness {
        services,
        store,
        transport,
        detector,
        settlement,
        gateway,
    }
}

/// A session that goes live immediately with everything enabled.
pub fn live_request(title: &str) -> CreateSessionRequest {
    CreateSessionRequest {
        title: title.to_string(),
        description: None,
        scheduled_start_time: None,
        requires_co_star_verification: false,
        recording_enabled: true,
        auto_highlights_enabled: true,
        tips_enabled: true,
        visibility: None,
    }
}

pub async fn seed_verification(
    store: &InMemoryStore,
    user_id: Uuid,
    status: VerificationStatus,
) -> Uuid {
    let id = Uuid::new_v4();
    store
        .seed_verification(VerificationRecord {
            id,
            user_id,
            status,
            created_at: Utc::now(),
        })
        .await;
    id
}
