//! The `ClubStore` trait: the storage seam every component is written against.
//!
//! Handlers may run in different processes against the same backing store,
//! so implementations must not rely on in-process locks. Every method that
//! guards an invariant documents the atomicity it requires; backends satisfy
//! it with a transaction or a single conditional statement.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  activity::{MeetingActivityRow, ReviewActivityRow, StatusActivityRow},
  book::{Book, NewBook},
  meeting::{Meeting, MeetingPatch, NewMeeting},
  member::{Member, NewMember},
  rating::RatingSummary,
  reading::{ReadingStatus, ReadingStatusUpdate},
  review::{LikeOutcome, NewReview, Review, ReviewPatch},
};

/// Abstraction over a book club store backend.
///
/// Domain failures (not found, duplicate review, full meeting, ...) are
/// reported through `Self::Error` and must convert into the matching
/// [`crate::Error`] variant; everything else becomes [`crate::Error::Store`].
pub trait ClubStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static + Into<crate::Error>;

  // ── Members ───────────────────────────────────────────────────────────

  fn add_member(
    &self,
    input: NewMember,
  ) -> impl Future<Output = Result<Member, Self::Error>> + Send + '_;

  fn get_member(
    &self,
    member_id: Uuid,
  ) -> impl Future<Output = Result<Option<Member>, Self::Error>> + Send + '_;

  /// Fails with `MemberNotFound` if the member does not exist.
  fn set_member_approved(
    &self,
    member_id: Uuid,
    approved: bool,
  ) -> impl Future<Output = Result<Member, Self::Error>> + Send + '_;

  // ── Books ─────────────────────────────────────────────────────────────

  /// Persist a new book with a zero rating aggregate.
  fn add_book(
    &self,
    input: NewBook,
  ) -> impl Future<Output = Result<Book, Self::Error>> + Send + '_;

  fn get_book(
    &self,
    book_id: Uuid,
  ) -> impl Future<Output = Result<Option<Book>, Self::Error>> + Send + '_;

  fn list_books(
    &self,
  ) -> impl Future<Output = Result<Vec<Book>, Self::Error>> + Send + '_;

  /// Delete a book. Reviews, statuses and meetings that reference it are left
  /// in place. Returns `false` if the book did not exist.
  fn delete_book(
    &self,
    book_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Recompute the book's rating aggregate from every one of its reviews and
  /// write it back, as one atomic read-then-write. Fails with `BookNotFound`.
  ///
  /// Must compute through [`RatingSummary::from_ratings`] so every backend
  /// rounds identically.
  fn refresh_book_rating(
    &self,
    book_id: Uuid,
  ) -> impl Future<Output = Result<RatingSummary, Self::Error>> + Send + '_;

  // ── Reviews ───────────────────────────────────────────────────────────

  /// Insert a validated review. Fails with `BookNotFound` for an unknown
  /// book and `DuplicateReview` if the author already reviewed it.
  fn create_review(
    &self,
    input: NewReview,
  ) -> impl Future<Output = Result<Review, Self::Error>> + Send + '_;

  fn get_review(
    &self,
    review_id: Uuid,
  ) -> impl Future<Output = Result<Option<Review>, Self::Error>> + Send + '_;

  /// Apply a validated patch. Fails with `ReviewNotFound`.
  fn update_review(
    &self,
    review_id: Uuid,
    patch: ReviewPatch,
  ) -> impl Future<Output = Result<Review, Self::Error>> + Send + '_;

  /// Delete a review and its likes. Returns the deleted review, if any.
  fn delete_review(
    &self,
    review_id: Uuid,
  ) -> impl Future<Output = Result<Option<Review>, Self::Error>> + Send + '_;

  /// All reviews of a book, newest first.
  fn list_reviews_for_book(
    &self,
    book_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Review>, Self::Error>> + Send + '_;

  /// Flip `member_id` in the review's like-set and rewrite `like_count` from
  /// the resulting set, as one atomic read-modify-write. Fails with
  /// `ReviewNotFound`.
  fn toggle_like(
    &self,
    review_id: Uuid,
    member_id: Uuid,
  ) -> impl Future<Output = Result<LikeOutcome, Self::Error>> + Send + '_;

  // ── Meetings ──────────────────────────────────────────────────────────

  fn create_meeting(
    &self,
    input: NewMeeting,
  ) -> impl Future<Output = Result<Meeting, Self::Error>> + Send + '_;

  fn get_meeting(
    &self,
    meeting_id: Uuid,
  ) -> impl Future<Output = Result<Option<Meeting>, Self::Error>> + Send + '_;

  /// All meetings, soonest first.
  fn list_meetings(
    &self,
  ) -> impl Future<Output = Result<Vec<Meeting>, Self::Error>> + Send + '_;

  /// Fails with `MeetingNotFound`.
  fn update_meeting_details(
    &self,
    meeting_id: Uuid,
    patch: MeetingPatch,
  ) -> impl Future<Output = Result<Meeting, Self::Error>> + Send + '_;

  /// Move an `upcoming` meeting to `cancelled`. Fails with `MeetingClosed`
  /// if it is already past or cancelled, `MeetingNotFound` if absent.
  fn cancel_meeting(
    &self,
    meeting_id: Uuid,
  ) -> impl Future<Output = Result<Meeting, Self::Error>> + Send + '_;

  /// Returns `false` if the meeting did not exist.
  fn delete_meeting(
    &self,
    meeting_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Conditionally move `upcoming` meetings dated before `now` to `past`.
  /// `scope` restricts the sweep to one meeting. Returns how many moved.
  fn settle_meetings(
    &self,
    now: DateTime<Utc>,
    scope: Option<Uuid>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Toggle `member_id`'s attendance in one atomic step and return whether
  /// they now attend together with the committed meeting.
  ///
  /// Admission must be a single conditional write evaluated against the live
  /// attendee count: add only if the meeting is `upcoming`, dated after
  /// `now`, has a free seat, and does not already list the member. Fails with
  /// `MeetingClosed`, `MeetingFull`, `AlreadyRegistered` or
  /// `MeetingNotFound`. Leaving succeeds whenever the meeting is open.
  fn toggle_attendance(
    &self,
    meeting_id: Uuid,
    member_id: Uuid,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<(bool, Meeting), Self::Error>> + Send + '_;

  // ── Reading statuses ──────────────────────────────────────────────────

  /// Upsert the unique `(member, book)` status through
  /// [`ReadingStatusUpdate::apply`], atomically. Fails with `BookNotFound`.
  fn set_reading_status(
    &self,
    member_id: Uuid,
    book_id: Uuid,
    update: ReadingStatusUpdate,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<ReadingStatus, Self::Error>> + Send + '_;

  fn get_reading_status(
    &self,
    member_id: Uuid,
    book_id: Uuid,
  ) -> impl Future<Output = Result<Option<ReadingStatus>, Self::Error>> + Send + '_;

  /// A member's statuses, most recently updated first.
  fn list_reading_statuses(
    &self,
    member_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ReadingStatus>, Self::Error>> + Send + '_;

  // ── Activity sources ──────────────────────────────────────────────────

  /// The `limit` newest reviews with their book and author resolved (or
  /// `None` where the reference dangles).
  fn recent_reviews(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<ReviewActivityRow>, Self::Error>> + Send + '_;

  /// The `limit` most recently updated reading statuses, references resolved.
  fn recent_status_changes(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<StatusActivityRow>, Self::Error>> + Send + '_;

  /// Meetings dated within `[from, to]`, any status.
  fn meetings_between(
    &self,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<MeetingActivityRow>, Self::Error>> + Send + '_;
}
