//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings with microsecond
//! precision, so string comparison in SQL is chronological comparison. UUIDs
//! are stored as hyphenated lowercase strings; enums as their kebab/lowercase
//! names.

use std::{collections::BTreeSet, str::FromStr};

use bookclub_core::{
  book::{Book, BookRef},
  meeting::{Meeting, MeetingStatus},
  member::{Member, MemberRef, Role},
  reading::{ReadingState, ReadingStatus},
  review::Review,
};
use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

/// The current instant at storage precision.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── Enums ────────────────────────────────────────────────────────────────────

fn decode_enum<T: FromStr>(what: &str, s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown {what}: {s:?}")))
}

fn decode_count(what: &str, n: i64) -> Result<u32> {
  u32::try_from(n).map_err(|_| Error::Decode(format!("{what} out of range: {n}")))
}

// ─── Column lists ─────────────────────────────────────────────────────────────

pub const MEMBER_COLUMNS: &str = "member_id, name, role, approved, created_at";

pub const BOOK_COLUMNS: &str =
  "book_id, title, author, average_rating, review_count, created_at";

pub const REVIEW_COLUMNS: &str = "r.review_id, r.book_id, r.author_id, \
  r.rating, r.title, r.content, r.spoilers, r.like_count, r.created_at, \
  r.updated_at";

pub const MEETING_COLUMNS: &str = "m.meeting_id, m.title, m.book_id, m.date, \
  m.location, m.notes, m.status, m.max_attendees, m.created_at";

pub const STATUS_COLUMNS: &str = "s.member_id, s.book_id, s.status, \
  s.started_at, s.finished_at, s.notes, s.updated_at";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `members` row.
pub struct RawMember {
  pub member_id:  String,
  pub name:       String,
  pub role:       String,
  pub approved:   bool,
  pub created_at: String,
}

impl RawMember {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      member_id:  row.get(0)?,
      name:       row.get(1)?,
      role:       row.get(2)?,
      approved:   row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_member(self) -> Result<Member> {
    Ok(Member {
      member_id:  decode_uuid(&self.member_id)?,
      name:       self.name,
      role:       decode_enum::<Role>("role", &self.role)?,
      approved:   self.approved,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `books` row.
pub struct RawBook {
  pub book_id:        String,
  pub title:          String,
  pub author:         String,
  pub average_rating: f64,
  pub review_count:   i64,
  pub created_at:     String,
}

impl RawBook {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      book_id:        row.get(0)?,
      title:          row.get(1)?,
      author:         row.get(2)?,
      average_rating: row.get(3)?,
      review_count:   row.get(4)?,
      created_at:     row.get(5)?,
    })
  }

  pub fn into_book(self) -> Result<Book> {
    Ok(Book {
      book_id:        decode_uuid(&self.book_id)?,
      title:          self.title,
      author:         self.author,
      average_rating: self.average_rating,
      review_count:   decode_count("review_count", self.review_count)?,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values from a `reviews` row (see [`REVIEW_COLUMNS`]). The like-set
/// lives in `review_likes` and is attached by [`RawReview::into_review`].
pub struct RawReview {
  pub review_id:  String,
  pub book_id:    String,
  pub author_id:  String,
  pub rating:     i64,
  pub title:      Option<String>,
  pub content:    String,
  pub spoilers:   bool,
  pub like_count: i64,
  pub created_at: String,
  pub updated_at: String,
}

impl RawReview {
  pub const WIDTH: usize = 10;

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      review_id:  row.get(0)?,
      book_id:    row.get(1)?,
      author_id:  row.get(2)?,
      rating:     row.get(3)?,
      title:      row.get(4)?,
      content:    row.get(5)?,
      spoilers:   row.get(6)?,
      like_count: row.get(7)?,
      created_at: row.get(8)?,
      updated_at: row.get(9)?,
    })
  }

  pub fn into_review(self, likes: Vec<String>) -> Result<Review> {
    let likes = likes
      .iter()
      .map(|s| decode_uuid(s))
      .collect::<Result<BTreeSet<_>>>()?;
    let rating = u8::try_from(self.rating)
      .map_err(|_| Error::Decode(format!("rating out of range: {}", self.rating)))?;

    Ok(Review {
      review_id: decode_uuid(&self.review_id)?,
      book_id: decode_uuid(&self.book_id)?,
      author_id: decode_uuid(&self.author_id)?,
      rating,
      title: self.title,
      content: self.content,
      spoilers: self.spoilers,
      likes,
      like_count: decode_count("like_count", self.like_count)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values from a `meetings` row (see [`MEETING_COLUMNS`]).
pub struct RawMeeting {
  pub meeting_id:    String,
  pub title:         String,
  pub book_id:       Option<String>,
  pub date:          String,
  pub location:      Option<String>,
  pub notes:         Option<String>,
  pub status:        String,
  pub max_attendees: i64,
  pub created_at:    String,
}

impl RawMeeting {
  pub const WIDTH: usize = 9;

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      meeting_id:    row.get(0)?,
      title:         row.get(1)?,
      book_id:       row.get(2)?,
      date:          row.get(3)?,
      location:      row.get(4)?,
      notes:         row.get(5)?,
      status:        row.get(6)?,
      max_attendees: row.get(7)?,
      created_at:    row.get(8)?,
    })
  }

  pub fn into_meeting(self, attendees: Vec<String>) -> Result<Meeting> {
    Ok(Meeting {
      meeting_id:    decode_uuid(&self.meeting_id)?,
      title:         self.title,
      book_id:       self.book_id.as_deref().map(decode_uuid).transpose()?,
      date:          decode_dt(&self.date)?,
      location:      self.location,
      notes:         self.notes,
      status:        decode_enum::<MeetingStatus>("meeting status", &self.status)?,
      max_attendees: decode_count("max_attendees", self.max_attendees)?,
      attendees:     attendees
        .iter()
        .map(|s| decode_uuid(s))
        .collect::<Result<_>>()?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values from a `reading_statuses` row (see [`STATUS_COLUMNS`]).
pub struct RawReadingStatus {
  pub member_id:   String,
  pub book_id:     String,
  pub status:      String,
  pub started_at:  Option<String>,
  pub finished_at: Option<String>,
  pub notes:       Option<String>,
  pub updated_at:  String,
}

impl RawReadingStatus {
  pub const WIDTH: usize = 7;

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      member_id:   row.get(0)?,
      book_id:     row.get(1)?,
      status:      row.get(2)?,
      started_at:  row.get(3)?,
      finished_at: row.get(4)?,
      notes:       row.get(5)?,
      updated_at:  row.get(6)?,
    })
  }

  pub fn into_status(self) -> Result<ReadingStatus> {
    Ok(ReadingStatus {
      member_id:   decode_uuid(&self.member_id)?,
      book_id:     decode_uuid(&self.book_id)?,
      status:      decode_enum::<ReadingState>("reading status", &self.status)?,
      started_at:  decode_opt_dt(self.started_at)?,
      finished_at: decode_opt_dt(self.finished_at)?,
      notes:       self.notes,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Joined references ───────────────────────────────────────────────────────

/// Decode a `(id, label)` pair from a LEFT JOIN; both NULL means dangling.
pub fn decode_book_ref(
  id: Option<String>,
  title: Option<String>,
) -> Result<Option<BookRef>> {
  match (id, title) {
    (Some(id), Some(title)) => {
      Ok(Some(BookRef { book_id: decode_uuid(&id)?, title }))
    }
    _ => Ok(None),
  }
}

pub fn decode_member_ref(
  id: Option<String>,
  name: Option<String>,
) -> Result<Option<MemberRef>> {
  match (id, name) {
    (Some(id), Some(name)) => {
      Ok(Some(MemberRef { member_id: decode_uuid(&id)?, name }))
    }
    _ => Ok(None),
  }
}
