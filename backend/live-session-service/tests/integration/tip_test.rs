use std::sync::atomic::Ordering;
use std::sync::Arc;
use uuid::Uuid;

use live_session_service::error::AppError;
use live_session_service::models::{ParticipantRole, TipStatus};

use super::support::{harness, live_request};

#[tokio::test]
async fn tip_updates_session_and_sender_totals() {
    let h = harness();
    let creator = Uuid::new_v4();
    let session = h
        .services
        .sessions
        .create(creator, live_request("tip jar"))
        .await
        .unwrap();

    let fan = Uuid::new_v4();
    h.services
        .participants
        .join(session.id, fan, ParticipantRole::Viewer, None)
        .await
        .unwrap();

    let tip = h
        .services
        .tips
        .send_tip(session.id, fan, creator, 500, Some("great show".to_string()))
        .await
        .unwrap();
    assert_eq!(tip.status, TipStatus::Completed);
    assert_eq!(tip.amount_cents, 500);

    h.services
        .tips
        .send_tip(session.id, fan, creator, 250, None)
        .await
        .unwrap();

    let session = h.services.sessions.get_session(session.id).await.unwrap();
    assert_eq!(session.total_tips_cents, 750);

    let participants = h
        .services
        .participants
        .list_participants(session.id)
        .await
        .unwrap();
    let sender = participants.iter().find(|p| p.user_id == fan).unwrap();
    assert_eq!(sender.tips_sent_cents, 750);

    let ledger = h.services.tips.session_tips(session.id).await.unwrap();
    assert_eq!(ledger.len(), 2);

    let types = h.gateway.event_types().await;
    assert_eq!(types.iter().filter(|t| **t == "session_tip").count(), 2);
}

#[tokio::test]
async fn tip_from_non_participant_updates_session_total_only() {
    let h = harness();
    let creator = Uuid::new_v4();
    let session = h
        .services
        .sessions
        .create(creator, live_request("drive by"))
        .await
        .unwrap();

    let stranger = Uuid::new_v4();
    h.services
        .tips
        .send_tip(session.id, stranger, creator, 1000, None)
        .await
        .unwrap();

    let session = h.services.sessions.get_session(session.id).await.unwrap();
    assert_eq!(session.total_tips_cents, 1000);

    let participants = h
        .services
        .participants
        .list_participants(session.id)
        .await
        .unwrap();
    assert!(participants.iter().all(|p| p.user_id != stranger));
}

#[tokio::test]
async fn tip_requires_positive_amount() {
    let h = harness();
    let creator = Uuid::new_v4();
    let session = h
        .services
        .sessions
        .create(creator, live_request("freebie"))
        .await
        .unwrap();

    for amount in [0, -100] {
        let result = h
            .services
            .tips
            .send_tip(session.id, Uuid::new_v4(), creator, amount, None)
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
    assert_eq!(h.settlement.transfer_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn tip_requires_live_session_with_tips_enabled() {
    let h = harness();
    let creator = Uuid::new_v4();

    let mut request = live_request("no tips");
    request.tips_enabled = false;
    let session = h.services.sessions.create(creator, request).await.unwrap();
    let result = h
        .services
        .tips
        .send_tip(session.id, Uuid::new_v4(), creator, 100, None)
        .await;
    assert!(matches!(result, Err(AppError::TipsDisabled)));

    let session = h
        .services
        .sessions
        .create(creator, live_request("closing"))
        .await
        .unwrap();
    h.services.sessions.end(session.id, creator).await.unwrap();
    let result = h
        .services
        .tips
        .send_tip(session.id, Uuid::new_v4(), creator, 100, None)
        .await;
    assert!(matches!(result, Err(AppError::InvalidStateTransition(_))));

    let missing = h
        .services
        .tips
        .send_tip(Uuid::new_v4(), Uuid::new_v4(), creator, 100, None)
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
    assert_eq!(h.settlement.transfer_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn declined_transfer_keeps_tip_as_failed_without_totals() {
    let h = harness();
    let creator = Uuid::new_v4();
    let session = h
        .services
        .sessions
        .create(creator, live_request("card declined"))
        .await
        .unwrap();

    let fan = Uuid::new_v4();
    h.services
        .participants
        .join(session.id, fan, ParticipantRole::Viewer, None)
        .await
        .unwrap();

    h.settlement.decline.store(true, Ordering::SeqCst);
    let tip = h
        .services
        .tips
        .send_tip(session.id, fan, creator, 500, None)
        .await
        .unwrap();
    assert_eq!(tip.status, TipStatus::Failed);

    let session = h.services.sessions.get_session(session.id).await.unwrap();
    assert_eq!(session.total_tips_cents, 0);

    let participants = h
        .services
        .participants
        .list_participants(session.id)
        .await
        .unwrap();
    let sender = participants.iter().find(|p| p.user_id == fan).unwrap();
    assert_eq!(sender.tips_sent_cents, 0);

    // The attempt still lands in the ledger.
    let ledger = h.services.tips.session_tips(session.id).await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].status, TipStatus::Failed);

    let types = h.gateway.event_types().await;
    assert!(types.contains(&"session_tip_failed"));
    assert!(!types.contains(&"session_tip"));
}

#[tokio::test]
async fn settlement_outage_is_treated_as_a_failed_tip() {
    let h = harness();
    let creator = Uuid::new_v4();
    let session = h
        .services
        .sessions
        .create(creator, live_request("rail down"))
        .await
        .unwrap();

    h.settlement.fail.store(true, Ordering::SeqCst);
    let tip = h
        .services
        .tips
        .send_tip(session.id, Uuid::new_v4(), creator, 300, None)
        .await
        .unwrap();

    assert_eq!(tip.status, TipStatus::Failed);
    let session = h.services.sessions.get_session(session.id).await.unwrap();
    assert_eq!(session.total_tips_cents, 0);
}

#[tokio::test]
async fn tip_racing_session_end_is_kept_as_failed() {
    let h = harness();
    let creator = Uuid::new_v4();
    let session = h
        .services
        .sessions
        .create(creator, live_request("last call"))
        .await
        .unwrap();

    // Park the transfer mid-flight and end the session underneath it.
    h.settlement.hold.store(true, Ordering::SeqCst);
    let tips = Arc::clone(&h.services.tips);
    let session_id = session.id;
    let sender = Uuid::new_v4();
    let in_flight =
        tokio::spawn(async move { tips.send_tip(session_id, sender, creator, 800, None).await });

    h.settlement.entered.notified().await;
    h.services.sessions.end(session.id, creator).await.unwrap();
    h.settlement.release.notify_one();

    let tip = in_flight.await.unwrap().unwrap();
    assert_eq!(tip.status, TipStatus::Failed);

    let session = h.services.sessions.get_session(session.id).await.unwrap();
    assert_eq!(session.total_tips_cents, 0);

    let ledger = h.services.tips.session_tips(session.id).await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].status, TipStatus::Failed);

    let types = h.gateway.event_types().await;
    assert!(types.contains(&"session_tip_failed"));
}

#[tokio::test]
async fn ledger_survives_session_end() {
    let h = harness();
    let creator = Uuid::new_v4();
    let session = h
        .services
        .sessions
        .create(creator, live_request("final tally"))
        .await
        .unwrap();

    h.services
        .tips
        .send_tip(session.id, Uuid::new_v4(), creator, 2000, None)
        .await
        .unwrap();
    let ended = h.services.sessions.end(session.id, creator).await.unwrap();
    assert_eq!(ended.total_tips_cents, 2000);

    let ledger = h.services.tips.session_tips(session.id).await.unwrap();
    assert_eq!(ledger.len(), 1);
}
