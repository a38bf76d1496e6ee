use uuid::Uuid;

use live_session_service::error::AppError;
use live_session_service::models::{ParticipantRole, VerificationStatus};

use super::support::{harness, live_request, seed_verification};

#[tokio::test]
async fn viewer_join_and_leave_update_counts() {
    let h = harness();
    let creator = Uuid::new_v4();
    let session = h
        .services
        .sessions
        .create(creator, live_request("counts"))
        .await
        .unwrap();

    let viewer = Uuid::new_v4();
    h.services
        .participants
        .join(session.id, viewer, ParticipantRole::Viewer, None)
        .await
        .unwrap();

    let session = h.services.sessions.get_session(session.id).await.unwrap();
    assert_eq!(session.current_viewer_count, 2);
    assert_eq!(session.peak_viewer_count, 2);

    h.services
        .participants
        .leave(session.id, viewer)
        .await
        .unwrap();

    let session = h.services.sessions.get_session(session.id).await.unwrap();
    assert_eq!(session.current_viewer_count, 1);
    // Peak is a high-water mark; it never comes back down.
    assert_eq!(session.peak_viewer_count, 2);
}

#[tokio::test]
async fn peak_never_drops_below_current() {
    let h = harness();
    let creator = Uuid::new_v4();
    let session = h
        .services
        .sessions
        .create(creator, live_request("invariant"))
        .await
        .unwrap();

    let viewers: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
    for viewer in &viewers {
        h.services
            .participants
            .join(session.id, *viewer, ParticipantRole::Viewer, None)
            .await
            .unwrap();
        let s = h.services.sessions.get_session(session.id).await.unwrap();
        assert!(s.peak_viewer_count >= s.current_viewer_count);
    }
    for viewer in &viewers {
        h.services
            .participants
            .leave(session.id, *viewer)
            .await
            .unwrap();
        let s = h.services.sessions.get_session(session.id).await.unwrap();
        assert!(s.peak_viewer_count >= s.current_viewer_count);
    }

    let s = h.services.sessions.get_session(session.id).await.unwrap();
    assert_eq!(s.current_viewer_count, 1);
    assert_eq!(s.peak_viewer_count, 6);
}

#[tokio::test]
async fn current_count_equals_active_records() {
    let h = harness();
    let creator = Uuid::new_v4();
    let session = h
        .services
        .sessions
        .create(creator, live_request("derived"))
        .await
        .unwrap();

    for _ in 0..3 {
        h.services
            .participants
            .join(session.id, Uuid::new_v4(), ParticipantRole::Viewer, None)
            .await
            .unwrap();
    }

    let participants = h
        .services
        .participants
        .list_participants(session.id)
        .await
        .unwrap();
    let active = participants.iter().filter(|p| p.is_active()).count() as i64;
    let session = h.services.sessions.get_session(session.id).await.unwrap();
    assert_eq!(session.current_viewer_count, active);
}

#[tokio::test]
async fn join_is_idempotent_per_active_attachment() {
    let h = harness();
    let creator = Uuid::new_v4();
    let session = h
        .services
        .sessions
        .create(creator, live_request("idempotent"))
        .await
        .unwrap();

    let viewer = Uuid::new_v4();
    let first = h
        .services
        .participants
        .join(session.id, viewer, ParticipantRole::Viewer, None)
        .await
        .unwrap();
    let second = h
        .services
        .participants
        .join(session.id, viewer, ParticipantRole::Viewer, None)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    let session = h.services.sessions.get_session(session.id).await.unwrap();
    assert_eq!(session.current_viewer_count, 2);

    // Rejoining after a leave creates a fresh attendance record.
    h.services
        .participants
        .leave(session.id, viewer)
        .await
        .unwrap();
    let third = h
        .services
        .participants
        .join(session.id, viewer, ParticipantRole::Viewer, None)
        .await
        .unwrap();
    assert_ne!(first.id, third.id);

    let participants = h
        .services
        .participants
        .list_participants(session.id)
        .await
        .unwrap();
    assert_eq!(
        participants.iter().filter(|p| p.user_id == viewer).count(),
        2
    );
}

#[tokio::test]
async fn join_requires_live_session() {
    let h = harness();
    let creator = Uuid::new_v4();
    let session = h
        .services
        .sessions
        .create(creator, live_request("over"))
        .await
        .unwrap();
    h.services.sessions.end(session.id, creator).await.unwrap();

    let result = h
        .services
        .participants
        .join(session.id, Uuid::new_v4(), ParticipantRole::Viewer, None)
        .await;
    assert!(matches!(result, Err(AppError::InvalidStateTransition(_))));

    let missing = h
        .services
        .participants
        .join(Uuid::new_v4(), Uuid::new_v4(), ParticipantRole::Viewer, None)
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn co_star_admission_requires_verified_owner_matching_record() {
    let h = harness();
    let creator = Uuid::new_v4();
    let mut request = live_request("verified only");
    request.requires_co_star_verification = true;
    let session = h.services.sessions.create(creator, request).await.unwrap();

    let co_star = Uuid::new_v4();

    // No reference at all.
    let result = h
        .services
        .participants
        .join(session.id, co_star, ParticipantRole::CoStar, None)
        .await;
    assert!(matches!(result, Err(AppError::VerificationRequired(_))));

    // Reference owned by somebody else.
    let foreign = seed_verification(&h.store, Uuid::new_v4(), VerificationStatus::Verified).await;
    let result = h
        .services
        .participants
        .join(session.id, co_star, ParticipantRole::CoStar, Some(foreign))
        .await;
    assert!(matches!(result, Err(AppError::VerificationRequired(_))));

    // Owner-matching but still pending.
    let pending = seed_verification(&h.store, co_star, VerificationStatus::Pending).await;
    let result = h
        .services
        .participants
        .join(session.id, co_star, ParticipantRole::CoStar, Some(pending))
        .await;
    assert!(matches!(result, Err(AppError::VerificationRequired(_))));

    // Verified and owner-matching.
    let verified = seed_verification(&h.store, co_star, VerificationStatus::Verified).await;
    let participant = h
        .services
        .participants
        .join(session.id, co_star, ParticipantRole::CoStar, Some(verified))
        .await
        .unwrap();
    assert_eq!(participant.co_star_verification_id, Some(verified));

    let session = h.services.sessions.get_session(session.id).await.unwrap();
    assert_eq!(session.current_viewer_count, 2);
}

#[tokio::test]
async fn co_star_join_without_requirement_skips_the_gate() {
    let h = harness();
    let creator = Uuid::new_v4();
    let session = h
        .services
        .sessions
        .create(creator, live_request("open stage"))
        .await
        .unwrap();

    let participant = h
        .services
        .participants
        .join(session.id, Uuid::new_v4(), ParticipantRole::CoStar, None)
        .await
        .unwrap();
    // The reference is only recorded when the session demanded it.
    assert_eq!(participant.co_star_verification_id, None);
}

#[tokio::test]
async fn leave_without_active_record_is_a_no_op() {
    let h = harness();
    let creator = Uuid::new_v4();
    let session = h
        .services
        .sessions
        .create(creator, live_request("quiet"))
        .await
        .unwrap();

    h.services
        .participants
        .leave(session.id, Uuid::new_v4())
        .await
        .unwrap();

    let session = h.services.sessions.get_session(session.id).await.unwrap();
    assert_eq!(session.current_viewer_count, 1);

    let result = h
        .services
        .participants
        .leave(Uuid::new_v4(), Uuid::new_v4())
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn departed_participants_keep_watch_time() {
    let h = harness();
    let creator = Uuid::new_v4();
    let session = h
        .services
        .sessions
        .create(creator, live_request("attendance log"))
        .await
        .unwrap();

    let viewer = Uuid::new_v4();
    h.services
        .participants
        .join(session.id, viewer, ParticipantRole::Viewer, None)
        .await
        .unwrap();
    h.services
        .participants
        .leave(session.id, viewer)
        .await
        .unwrap();

    let participants = h
        .services
        .participants
        .list_participants(session.id)
        .await
        .unwrap();
    let record = participants.iter().find(|p| p.user_id == viewer).unwrap();
    assert!(record.left_at.is_some());
    assert!(record.watch_time_seconds >= 0);
}
