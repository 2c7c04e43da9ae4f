mod common;

use std::collections::BTreeSet;

use bookclub_core::{
  Error,
  attendance::AttendanceManager,
  meeting::{MeetingPatch, MeetingStatus},
  member::{NewMember, Role},
  store::ClubStore,
};
use chrono::{Duration, Utc};
use common::{admin, meeting_at, member, store};
use uuid::Uuid;

#[tokio::test]
async fn join_reports_capacity() {
  let s = store().await;
  let mgr = AttendanceManager::new(s.clone());
  let m = meeting_at(&s, Utc::now() + Duration::days(3), 2).await;
  let who = member(&s, "a").await;

  let joined = mgr.toggle_attendance(m.meeting_id, &who).await.unwrap();
  assert!(joined.attending);
  assert_eq!(joined.meeting.attendee_count, 1);
  assert_eq!(joined.meeting.spots_left, Some(1));
  assert!(!joined.meeting.is_full);

  let left = mgr.toggle_attendance(m.meeting_id, &who).await.unwrap();
  assert!(!left.attending);
  assert_eq!(left.meeting.spots_left, Some(2));
}

#[tokio::test]
async fn last_seat_race_has_one_winner() {
  let s = store().await;
  let mgr = AttendanceManager::new(s.clone());
  let m = meeting_at(&s, Utc::now() + Duration::days(3), 2).await;
  let early = member(&s, "early").await;
  mgr.toggle_attendance(m.meeting_id, &early).await.unwrap();

  let (a, b) = (member(&s, "a").await, member(&s, "b").await);
  let (ra, rb) = tokio::join!(
    mgr.toggle_attendance(m.meeting_id, &a),
    mgr.toggle_attendance(m.meeting_id, &b),
  );

  let results = [ra, rb];
  assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
  let loser = results.into_iter().find_map(Result::err).unwrap();
  assert!(matches!(loser, Error::MeetingFull(_)));
  assert!(!loser.is_retryable());

  let view = mgr.get_meeting(m.meeting_id).await.unwrap();
  assert_eq!(view.attendee_count, 2);
  assert!(view.is_full);
  assert_eq!(view.spots_left, Some(0));
}

#[tokio::test]
async fn spawned_joins_fill_exactly_to_capacity() {
  let s = store().await;
  let mgr = AttendanceManager::new(s.clone());
  let m = meeting_at(&s, Utc::now() + Duration::days(3), 4).await;

  let mut handles = Vec::new();
  for i in 0..12 {
    let who = member(&s, &format!("m{i}")).await;
    let mgr = mgr.clone();
    let meeting_id = m.meeting_id;
    handles.push(tokio::spawn(async move {
      mgr.toggle_attendance(meeting_id, &who).await
    }));
  }

  let mut admitted = 0;
  for h in handles {
    match h.await.unwrap() {
      Ok(a) => {
        assert!(a.attending);
        admitted += 1;
      }
      Err(Error::MeetingFull(_)) => {}
      Err(e) => panic!("unexpected error: {e}"),
    }
  }
  assert_eq!(admitted, 4);

  let view = mgr.get_meeting(m.meeting_id).await.unwrap();
  let unique: BTreeSet<_> = view.meeting.attendees.iter().copied().collect();
  assert_eq!(unique.len(), 4);
  assert_eq!(view.meeting.attendees.len(), 4);
}

#[tokio::test]
async fn unlimited_meeting_never_fills() {
  let s = store().await;
  let mgr = AttendanceManager::new(s.clone());
  let m = meeting_at(&s, Utc::now() + Duration::days(3), 0).await;

  for i in 0..5 {
    let who = member(&s, &format!("m{i}")).await;
    mgr.toggle_attendance(m.meeting_id, &who).await.unwrap();
  }
  let view = mgr.get_meeting(m.meeting_id).await.unwrap();
  assert_eq!(view.attendee_count, 5);
  assert_eq!(view.spots_left, None);
  assert!(!view.is_full);
}

#[tokio::test]
async fn elapsed_meeting_settles_and_rejects() {
  let s = store().await;
  let mgr = AttendanceManager::new(s.clone());
  let m = meeting_at(&s, Utc::now() - Duration::hours(2), 0).await;
  assert_eq!(m.status, MeetingStatus::Upcoming);
  let who = member(&s, "a").await;

  let err = mgr.toggle_attendance(m.meeting_id, &who).await.unwrap_err();
  assert!(matches!(err, Error::MeetingClosed(_)));

  // The transition was written back, not just computed.
  let stored = s.get_meeting(m.meeting_id).await.unwrap().unwrap();
  assert_eq!(stored.status, MeetingStatus::Past);
}

#[tokio::test]
async fn listing_settles_elapsed_meetings() {
  let s = store().await;
  let mgr = AttendanceManager::new(s.clone());
  let past = meeting_at(&s, Utc::now() - Duration::days(1), 0).await;
  let next = meeting_at(&s, Utc::now() + Duration::days(1), 0).await;

  let views = mgr.list_meetings().await.unwrap();
  let statuses: Vec<_> =
    views.iter().map(|v| (v.meeting.meeting_id, v.meeting.status)).collect();
  assert_eq!(
    statuses,
    [
      (past.meeting_id, MeetingStatus::Past),
      (next.meeting_id, MeetingStatus::Upcoming),
    ]
  );
}

#[tokio::test]
async fn unapproved_members_cannot_rsvp() {
  let s = store().await;
  let mgr = AttendanceManager::new(s.clone());
  let m = meeting_at(&s, Utc::now() + Duration::days(3), 0).await;
  let pending = s
    .add_member(NewMember {
      name:     "pending".into(),
      role:     Role::Member,
      approved: false,
    })
    .await
    .unwrap();

  let err = mgr.toggle_attendance(m.meeting_id, &pending).await.unwrap_err();
  assert!(matches!(err, Error::Forbidden(_)));

  // Admins are approved implicitly.
  let boss = admin(&s).await;
  assert!(mgr.toggle_attendance(m.meeting_id, &boss).await.unwrap().attending);
}

#[tokio::test]
async fn only_admins_cancel() {
  let s = store().await;
  let mgr = AttendanceManager::new(s.clone());
  let m = meeting_at(&s, Utc::now() + Duration::days(3), 0).await;
  let plain = member(&s, "a").await;
  let boss = admin(&s).await;

  let err = mgr.cancel_meeting(m.meeting_id, &plain).await.unwrap_err();
  assert!(matches!(err, Error::Forbidden(_)));

  let view = mgr.cancel_meeting(m.meeting_id, &boss).await.unwrap();
  assert_eq!(view.meeting.status, MeetingStatus::Cancelled);

  let err = mgr.toggle_attendance(m.meeting_id, &plain).await.unwrap_err();
  assert!(matches!(err, Error::MeetingClosed(_)));
}

#[tokio::test]
async fn missing_meeting_is_not_found() {
  let s = store().await;
  let mgr = AttendanceManager::new(s.clone());
  let who = member(&s, "a").await;

  let err = mgr.toggle_attendance(Uuid::new_v4(), &who).await.unwrap_err();
  assert!(matches!(err, Error::MeetingNotFound(_)));
  let err = mgr.get_meeting(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::MeetingNotFound(_)));
}

#[tokio::test]
async fn editing_an_elapsed_meeting_persists_past() {
  let s = store().await;
  let mgr = AttendanceManager::new(s.clone());
  let boss = admin(&s).await;
  let m = meeting_at(&s, Utc::now() - Duration::hours(1), 0).await;

  let patch = MeetingPatch { location: Some("Back room".into()), ..Default::default() };
  let view = mgr.update_meeting(m.meeting_id, patch, &boss).await.unwrap();
  assert_eq!(view.meeting.status, MeetingStatus::Past);
  assert_eq!(view.meeting.location.as_deref(), Some("Back room"));

  let stored = s.get_meeting(m.meeting_id).await.unwrap().unwrap();
  assert_eq!(stored.status, MeetingStatus::Past);
}

#[tokio::test]
async fn only_admins_edit_meetings() {
  let s = store().await;
  let mgr = AttendanceManager::new(s.clone());
  let m = meeting_at(&s, Utc::now() + Duration::days(2), 0).await;
  let who = member(&s, "a").await;

  let patch = MeetingPatch { title: Some("Mine now".into()), ..Default::default() };
  let err = mgr.update_meeting(m.meeting_id, patch, &who).await.unwrap_err();
  assert!(matches!(err, Error::Forbidden(_)));

  let blank = MeetingPatch { title: Some("  ".into()), ..Default::default() };
  let boss = admin(&s).await;
  let err = mgr.update_meeting(m.meeting_id, blank, &boss).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
}
