//! Activity events: a read-only projection over reviews, reading statuses
//! and meetings. Never persisted.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  book::BookRef,
  meeting::{Meeting, MeetingStatus},
  member::MemberRef,
  reading::{ReadingState, ReadingStatus},
  review::Review,
};

// ─── Source rows ─────────────────────────────────────────────────────────────

/// A review as fetched for the feed; `None` marks a dangling reference.
#[derive(Debug, Clone)]
pub struct ReviewActivityRow {
  pub review: Review,
  pub book:   Option<BookRef>,
  pub author: Option<MemberRef>,
}

#[derive(Debug, Clone)]
pub struct StatusActivityRow {
  pub status: ReadingStatus,
  pub member: Option<MemberRef>,
  pub book:   Option<BookRef>,
}

#[derive(Debug, Clone)]
pub struct MeetingActivityRow {
  pub meeting: Meeting,
  /// Resolved only when the meeting names a book.
  pub book:    Option<BookRef>,
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// Which source an event came from. Declaration order is the tie-break order.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ActivityKind {
  Review,
  Status,
  Meeting,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivitySubject {
  Book(BookRef),
  Meeting { meeting_id: Uuid, title: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityPayload {
  Review {
    rating:   u8,
    title:    Option<String>,
    spoilers: bool,
  },
  Status {
    status: ReadingState,
  },
  Meeting {
    status:         MeetingStatus,
    attendee_count: u32,
    book:           Option<BookRef>,
  },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
  /// Id of the underlying record (review, meeting) or a stable id derived
  /// from the `(member, book)` pair for statuses.
  pub event_id:  Uuid,
  pub kind:      ActivityKind,
  /// `created_at` for reviews, `updated_at` for statuses, `date` for meetings.
  pub timestamp: DateTime<Utc>,
  pub actor:     Option<MemberRef>,
  pub subject:   ActivitySubject,
  pub payload:   ActivityPayload,
}

impl ActivityEvent {
  /// Newest first; equal timestamps fall back to kind, then id.
  pub fn feed_order(a: &Self, b: &Self) -> Ordering {
    b.timestamp
      .cmp(&a.timestamp)
      .then_with(|| a.kind.cmp(&b.kind))
      .then_with(|| b.event_id.cmp(&a.event_id))
  }
}

// ─── Normalisation ───────────────────────────────────────────────────────────

impl ReviewActivityRow {
  pub fn into_event(self) -> Option<ActivityEvent> {
    let book = self.book?;
    let author = self.author?;
    Some(ActivityEvent {
      event_id:  self.review.review_id,
      kind:      ActivityKind::Review,
      timestamp: self.review.created_at,
      actor:     Some(author),
      subject:   ActivitySubject::Book(book),
      payload:   ActivityPayload::Review {
        rating:   self.review.rating,
        title:    self.review.title,
        spoilers: self.review.spoilers,
      },
    })
  }
}

impl StatusActivityRow {
  pub fn into_event(self) -> Option<ActivityEvent> {
    let member = self.member?;
    let book = self.book?;
    Some(ActivityEvent {
      event_id:  status_event_id(self.status.member_id, self.status.book_id),
      kind:      ActivityKind::Status,
      timestamp: self.status.updated_at,
      actor:     Some(member),
      subject:   ActivitySubject::Book(book),
      payload:   ActivityPayload::Status { status: self.status.status },
    })
  }
}

impl MeetingActivityRow {
  /// `now` applies the lazy status transition for display; the feed never
  /// writes it back.
  pub fn into_event(self, now: DateTime<Utc>) -> Option<ActivityEvent> {
    if self.meeting.book_id.is_some() && self.book.is_none() {
      return None;
    }
    let meeting = self.meeting.settled(now);
    Some(ActivityEvent {
      event_id:  meeting.meeting_id,
      kind:      ActivityKind::Meeting,
      timestamp: meeting.date,
      actor:     None,
      payload:   ActivityPayload::Meeting {
        status:         meeting.status,
        attendee_count: meeting.attendee_count(),
        book:           self.book,
      },
      subject:   ActivitySubject::Meeting {
        meeting_id: meeting.meeting_id,
        title:      meeting.title,
      },
    })
  }
}

/// Reading statuses have no id of their own; fold the pair into one.
fn status_event_id(member_id: Uuid, book_id: Uuid) -> Uuid {
  Uuid::from_u128(member_id.as_u128() ^ book_id.as_u128().rotate_left(64))
}

// ─── Merge ───────────────────────────────────────────────────────────────────

/// Concatenate normalised events, order newest first, keep `limit`.
pub fn merge(
  sources: impl IntoIterator<Item = Vec<ActivityEvent>>,
  limit: usize,
) -> Vec<ActivityEvent> {
  let mut events: Vec<ActivityEvent> = sources.into_iter().flatten().collect();
  events.sort_by(ActivityEvent::feed_order);
  events.truncate(limit);
  events
}
