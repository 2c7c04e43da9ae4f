//! Reading statuses: one member's relationship to one book.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ReadingState {
  ToRead,
  CurrentlyReading,
  Read,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingStatus {
  pub member_id:   Uuid,
  pub book_id:     Uuid,
  pub status:      ReadingState,
  /// Set the first time the status becomes `currently-reading`.
  pub started_at:  Option<DateTime<Utc>>,
  /// Set the first time the status becomes `read`.
  pub finished_at: Option<DateTime<Utc>>,
  pub notes:       Option<String>,
  pub updated_at:  DateTime<Utc>,
}

/// Input to [`crate::store::ClubStore::set_reading_status`].
///
/// Explicit dates overwrite the stored ones, so a member can backdate.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadingStatusUpdate {
  pub status:      ReadingState,
  pub started_at:  Option<DateTime<Utc>>,
  pub finished_at: Option<DateTime<Utc>>,
  pub notes:       Option<String>,
}

impl ReadingStatusUpdate {
  /// Fold this update into the current record (if any). The stamps are set
  /// once and never cleared.
  pub fn apply(
    self,
    current: Option<ReadingStatus>,
    member_id: Uuid,
    book_id: Uuid,
    now: DateTime<Utc>,
  ) -> ReadingStatus {
    let (mut started_at, mut finished_at, mut notes) = current
      .map(|c| (c.started_at, c.finished_at, c.notes))
      .unwrap_or_default();

    if self.started_at.is_some() {
      started_at = self.started_at;
    } else if started_at.is_none()
      && self.status == ReadingState::CurrentlyReading
    {
      started_at = Some(now);
    }

    if self.finished_at.is_some() {
      finished_at = self.finished_at;
    } else if finished_at.is_none() && self.status == ReadingState::Read {
      finished_at = Some(now);
    }

    if self.notes.is_some() {
      notes = self.notes;
    }

    ReadingStatus {
      member_id,
      book_id,
      status: self.status,
      started_at,
      finished_at,
      notes,
      updated_at: now,
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::*;

  fn update(status: ReadingState) -> ReadingStatusUpdate {
    ReadingStatusUpdate {
      status,
      started_at: None,
      finished_at: None,
      notes: None,
    }
  }

  #[test]
  fn stamps_are_set_once() {
    let (member, book) = (Uuid::new_v4(), Uuid::new_v4());
    let t0 = Utc::now();
    let t1 = t0 + Duration::days(1);
    let t2 = t0 + Duration::days(2);

    let reading =
      update(ReadingState::CurrentlyReading).apply(None, member, book, t0);
    assert_eq!(reading.started_at, Some(t0));
    assert_eq!(reading.finished_at, None);

    let done = update(ReadingState::Read).apply(Some(reading), member, book, t1);
    assert_eq!(done.started_at, Some(t0));
    assert_eq!(done.finished_at, Some(t1));

    // Re-reading does not move either stamp, nor does going back to the list.
    let again =
      update(ReadingState::CurrentlyReading).apply(Some(done), member, book, t2);
    let shelved = update(ReadingState::ToRead).apply(Some(again), member, book, t2);
    assert_eq!(shelved.started_at, Some(t0));
    assert_eq!(shelved.finished_at, Some(t1));
    assert_eq!(shelved.updated_at, t2);
  }

  #[test]
  fn explicit_dates_backdate() {
    let (member, book) = (Uuid::new_v4(), Uuid::new_v4());
    let now = Utc::now();
    let earlier = now - Duration::days(30);

    let mut input = update(ReadingState::Read);
    input.finished_at = Some(earlier);
    let status = input.apply(None, member, book, now);
    assert_eq!(status.finished_at, Some(earlier));
    assert_eq!(status.started_at, None);
  }

  #[test]
  fn to_read_sets_no_stamps() {
    let status =
      update(ReadingState::ToRead).apply(None, Uuid::new_v4(), Uuid::new_v4(), Utc::now());
    assert!(status.started_at.is_none());
    assert!(status.finished_at.is_none());
    assert_eq!(status.status.to_string(), "to-read");
  }
}
