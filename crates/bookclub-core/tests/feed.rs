mod common;

use std::{sync::Arc, time::Duration as StdDuration};

use bookclub_core::{
  activity::{
    ActivityKind, ActivityPayload, ActivitySubject, MeetingActivityRow,
    ReviewActivityRow, StatusActivityRow,
  },
  book::{Book, NewBook},
  feed::{ActivityComposer, ActivitySource, FeedConfig},
  meeting::{Meeting, MeetingPatch, MeetingStatus, NewMeeting},
  member::{Member, NewMember},
  rating::RatingSummary,
  reading::{ReadingState, ReadingStatus, ReadingStatusUpdate},
  review::{LikeOutcome, NewReview, Review, ReviewPatch},
  store::ClubStore,
};
use bookclub_store_sqlite::{Error as StoreError, SqliteStore};
use chrono::{DateTime, Duration, Utc};
use common::{book, meeting_at, member, review, store};
use uuid::Uuid;

fn status(state: ReadingState) -> ReadingStatusUpdate {
  ReadingStatusUpdate {
    status:      state,
    started_at:  None,
    finished_at: None,
    notes:       None,
  }
}

fn composer<S: ClubStore>(s: Arc<S>) -> ActivityComposer<S> {
  ActivityComposer::new(s, FeedConfig::default())
}

#[tokio::test]
async fn newest_events_first_across_sources() {
  let s = store().await;
  let now = Utc::now();
  let b = book(&s, "Lilith's Brood").await;
  let m = member(&s, "ana").await;

  let meeting = meeting_at(&s, now - Duration::days(2), 0).await;
  s.set_reading_status(
    m.member_id,
    b,
    status(ReadingState::CurrentlyReading),
    now - Duration::hours(1),
  )
  .await
  .unwrap();
  let r = s.create_review(review(b, m.member_id, 5)).await.unwrap();

  let feed = composer(s.clone()).activity_feed(Some(2)).await;
  assert!(feed.degraded.is_empty());
  let kinds: Vec<_> = feed.events.iter().map(|e| e.kind).collect();
  assert_eq!(kinds, [ActivityKind::Review, ActivityKind::Status]);
  assert_eq!(feed.events[0].event_id, r.review_id);

  let full = composer(s.clone()).activity_feed(Some(10)).await;
  assert_eq!(full.events.len(), 3);
  let last = &full.events[2];
  assert_eq!(last.event_id, meeting.meeting_id);
  // Displayed as past even though nothing has written the transition yet.
  assert!(matches!(
    last.payload,
    ActivityPayload::Meeting { status: MeetingStatus::Past, .. }
  ));
}

#[tokio::test]
async fn events_carry_resolved_references() {
  let s = store().await;
  let b = book(&s, "Fledgling").await;
  let m = member(&s, "ana").await;
  s.create_review(review(b, m.member_id, 4)).await.unwrap();

  let feed = composer(s.clone()).activity_feed(None).await;
  let event = &feed.events[0];
  assert_eq!(event.actor.as_ref().unwrap().name, "ana");
  match &event.subject {
    ActivitySubject::Book(r) => assert_eq!(r.title, "Fledgling"),
    other => panic!("unexpected subject: {other:?}"),
  }
  assert!(matches!(
    event.payload,
    ActivityPayload::Review { rating: 4, spoilers: false, .. }
  ));
}

#[tokio::test]
async fn limit_is_capped_and_defaulted() {
  let s = store().await;
  let b = book(&s, "Kindred").await;
  for i in 0..6 {
    let m = member(&s, &format!("m{i}")).await;
    s.create_review(review(b, m.member_id, 3)).await.unwrap();
  }

  let config = FeedConfig { default_limit: 2, max_limit: 4, ..Default::default() };
  let c = ActivityComposer::new(s.clone(), config);
  assert_eq!(c.activity_feed(None).await.events.len(), 2);
  assert_eq!(c.activity_feed(Some(100)).await.events.len(), 4);
  assert!(c.activity_feed(Some(0)).await.events.is_empty());
}

#[tokio::test]
async fn dangling_references_are_dropped() {
  let s = store().await;
  let kept = book(&s, "Kept").await;
  let gone = book(&s, "Gone").await;
  let m = member(&s, "ana").await;

  s.create_review(review(kept, m.member_id, 4)).await.unwrap();
  s.create_review(review(gone, m.member_id, 2)).await.unwrap();
  s.set_reading_status(m.member_id, gone, status(ReadingState::Read), Utc::now())
    .await
    .unwrap();
  s.create_meeting(NewMeeting {
    title: "About a gone book".into(),
    book_id: Some(gone),
    date: Utc::now() + Duration::days(5),
    location: None,
    notes: None,
    max_attendees: 0,
  })
  .await
  .unwrap();
  s.delete_book(gone).await.unwrap();

  let feed = composer(s.clone()).activity_feed(None).await;
  assert!(feed.degraded.is_empty());
  assert_eq!(feed.events.len(), 1);
  assert!(matches!(
    &feed.events[0].subject,
    ActivitySubject::Book(r) if r.book_id == kept
  ));
}

#[tokio::test]
async fn dangling_rows_are_not_backfilled() {
  let s = store().await;
  let kept = book(&s, "Kept").await;
  let gone = book(&s, "Gone").await;
  let (a, b) = (member(&s, "ana").await, member(&s, "bo").await);

  s.create_review(review(kept, a.member_id, 4)).await.unwrap();
  s.set_reading_status(a.member_id, kept, status(ReadingState::Read), Utc::now())
    .await
    .unwrap();
  s.create_review(review(gone, a.member_id, 2)).await.unwrap();
  s.create_review(review(gone, b.member_id, 3)).await.unwrap();
  s.delete_book(gone).await.unwrap();

  // The two newest reviews fill the review slice and are both dropped; the
  // older surviving review is not fetched in their place.
  let feed = composer(s.clone()).activity_feed(Some(2)).await;
  let kinds: Vec<_> = feed.events.iter().map(|e| e.kind).collect();
  assert_eq!(kinds, [ActivityKind::Status]);
}

#[tokio::test]
async fn meetings_outside_the_window_are_ignored() {
  let s = store().await;
  meeting_at(&s, Utc::now() + Duration::days(200), 0).await;
  meeting_at(&s, Utc::now() - Duration::days(200), 0).await;
  let near = meeting_at(&s, Utc::now() + Duration::days(10), 0).await;

  let feed = composer(s.clone()).activity_feed(None).await;
  let ids: Vec<_> = feed.events.iter().map(|e| e.event_id).collect();
  assert_eq!(ids, [near.meeting_id]);
}

// ─── Degraded sources ────────────────────────────────────────────────────────

/// Delegates to SQLite but can break the activity sources.
struct Flaky {
  inner:          Arc<SqliteStore>,
  fail_statuses:  bool,
  stall_meetings: bool,
}

impl ClubStore for Flaky {
  type Error = StoreError;

  async fn add_member(&self, input: NewMember) -> Result<Member, StoreError> {
    self.inner.add_member(input).await
  }

  async fn get_member(&self, id: Uuid) -> Result<Option<Member>, StoreError> {
    self.inner.get_member(id).await
  }

  async fn set_member_approved(
    &self,
    id: Uuid,
    approved: bool,
  ) -> Result<Member, StoreError> {
    self.inner.set_member_approved(id, approved).await
  }

  async fn add_book(&self, input: NewBook) -> Result<Book, StoreError> {
    self.inner.add_book(input).await
  }

  async fn get_book(&self, id: Uuid) -> Result<Option<Book>, StoreError> {
    self.inner.get_book(id).await
  }

  async fn list_books(&self) -> Result<Vec<Book>, StoreError> {
    self.inner.list_books().await
  }

  async fn delete_book(&self, id: Uuid) -> Result<bool, StoreError> {
    self.inner.delete_book(id).await
  }

  async fn refresh_book_rating(
    &self,
    id: Uuid,
  ) -> Result<RatingSummary, StoreError> {
    self.inner.refresh_book_rating(id).await
  }

  async fn create_review(&self, input: NewReview) -> Result<Review, StoreError> {
    self.inner.create_review(input).await
  }

  async fn get_review(&self, id: Uuid) -> Result<Option<Review>, StoreError> {
    self.inner.get_review(id).await
  }

  async fn update_review(
    &self,
    id: Uuid,
    patch: ReviewPatch,
  ) -> Result<Review, StoreError> {
    self.inner.update_review(id, patch).await
  }

  async fn delete_review(&self, id: Uuid) -> Result<Option<Review>, StoreError> {
    self.inner.delete_review(id).await
  }

  async fn list_reviews_for_book(
    &self,
    id: Uuid,
  ) -> Result<Vec<Review>, StoreError> {
    self.inner.list_reviews_for_book(id).await
  }

  async fn toggle_like(
    &self,
    review_id: Uuid,
    member_id: Uuid,
  ) -> Result<LikeOutcome, StoreError> {
    self.inner.toggle_like(review_id, member_id).await
  }

  async fn create_meeting(&self, input: NewMeeting) -> Result<Meeting, StoreError> {
    self.inner.create_meeting(input).await
  }

  async fn get_meeting(&self, id: Uuid) -> Result<Option<Meeting>, StoreError> {
    self.inner.get_meeting(id).await
  }

  async fn list_meetings(&self) -> Result<Vec<Meeting>, StoreError> {
    self.inner.list_meetings().await
  }

  async fn update_meeting_details(
    &self,
    id: Uuid,
    patch: MeetingPatch,
  ) -> Result<Meeting, StoreError> {
    self.inner.update_meeting_details(id, patch).await
  }

  async fn cancel_meeting(&self, id: Uuid) -> Result<Meeting, StoreError> {
    self.inner.cancel_meeting(id).await
  }

  async fn delete_meeting(&self, id: Uuid) -> Result<bool, StoreError> {
    self.inner.delete_meeting(id).await
  }

  async fn settle_meetings(
    &self,
    now: DateTime<Utc>,
    scope: Option<Uuid>,
  ) -> Result<u64, StoreError> {
    self.inner.settle_meetings(now, scope).await
  }

  async fn toggle_attendance(
    &self,
    meeting_id: Uuid,
    member_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<(bool, Meeting), StoreError> {
    self.inner.toggle_attendance(meeting_id, member_id, now).await
  }

  async fn set_reading_status(
    &self,
    member_id: Uuid,
    book_id: Uuid,
    update: ReadingStatusUpdate,
    now: DateTime<Utc>,
  ) -> Result<ReadingStatus, StoreError> {
    self.inner.set_reading_status(member_id, book_id, update, now).await
  }

  async fn get_reading_status(
    &self,
    member_id: Uuid,
    book_id: Uuid,
  ) -> Result<Option<ReadingStatus>, StoreError> {
    self.inner.get_reading_status(member_id, book_id).await
  }

  async fn list_reading_statuses(
    &self,
    member_id: Uuid,
  ) -> Result<Vec<ReadingStatus>, StoreError> {
    self.inner.list_reading_statuses(member_id).await
  }

  async fn recent_reviews(
    &self,
    limit: usize,
  ) -> Result<Vec<ReviewActivityRow>, StoreError> {
    self.inner.recent_reviews(limit).await
  }

  async fn recent_status_changes(
    &self,
    limit: usize,
  ) -> Result<Vec<StatusActivityRow>, StoreError> {
    if self.fail_statuses {
      return Err(StoreError::Decode("status table unavailable".into()));
    }
    self.inner.recent_status_changes(limit).await
  }

  async fn meetings_between(
    &self,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
  ) -> Result<Vec<MeetingActivityRow>, StoreError> {
    if self.stall_meetings {
      tokio::time::sleep(StdDuration::from_secs(10)).await;
    }
    self.inner.meetings_between(from, to).await
  }
}

#[tokio::test]
async fn failing_and_slow_sources_degrade_the_feed() {
  let inner = store().await;
  let b = book(&inner, "Kindred").await;
  let m = member(&inner, "ana").await;
  inner.create_review(review(b, m.member_id, 4)).await.unwrap();
  inner
    .set_reading_status(m.member_id, b, status(ReadingState::Read), Utc::now())
    .await
    .unwrap();
  meeting_at(&inner, Utc::now() + Duration::days(1), 0).await;

  let flaky = Arc::new(Flaky {
    inner,
    fail_statuses: true,
    stall_meetings: true,
  });
  let config = FeedConfig { source_timeout_ms: 50, ..Default::default() };
  let feed = ActivityComposer::new(flaky, config).activity_feed(None).await;

  assert_eq!(feed.degraded, [ActivitySource::Statuses, ActivitySource::Meetings]);
  assert_eq!(feed.events.len(), 1);
  assert_eq!(feed.events[0].kind, ActivityKind::Review);
}

#[tokio::test]
async fn healthy_wrapper_is_not_degraded() {
  let inner = store().await;
  let flaky = Arc::new(Flaky {
    inner,
    fail_statuses: false,
    stall_meetings: false,
  });
  let feed = composer(flaky).activity_feed(None).await;
  assert!(feed.degraded.is_empty());
  assert!(feed.events.is_empty());
}

#[tokio::test]
async fn adding_books_does_not_add_events() {
  let s = store().await;
  s.add_book(NewBook { title: "Quiet".into(), author: "Nobody".into() })
    .await
    .unwrap();
  assert!(composer(s).activity_feed(None).await.events.is_empty());
}
