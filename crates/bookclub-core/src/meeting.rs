//! Meetings: scheduled gatherings with a bounded attendee list.
//!
//! Status moves `upcoming → past` lazily, whenever a meeting is touched after
//! its date. `cancelled` is terminal and only reachable by an admin. The
//! attendee list is only mutable while `upcoming`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MeetingStatus {
  Upcoming,
  Past,
  Cancelled,
}

impl MeetingStatus {
  /// Status after applying the lazy time transition.
  pub fn settle(self, date: DateTime<Utc>, now: DateTime<Utc>) -> Self {
    match self {
      Self::Upcoming if date < now => Self::Past,
      other => other,
    }
  }

  pub fn accepts_attendance(self) -> bool { self == Self::Upcoming }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
  pub meeting_id:    Uuid,
  pub title:         String,
  pub book_id:       Option<Uuid>,
  pub date:          DateTime<Utc>,
  pub location:      Option<String>,
  pub notes:         Option<String>,
  pub status:        MeetingStatus,
  /// `0` means unlimited.
  pub max_attendees: u32,
  /// Member ids in join order; never contains duplicates.
  pub attendees:     Vec<Uuid>,
  pub created_at:    DateTime<Utc>,
}

impl Meeting {
  pub fn is_attending(&self, member_id: Uuid) -> bool {
    self.attendees.contains(&member_id)
  }

  pub fn attendee_count(&self) -> u32 {
    u32::try_from(self.attendees.len()).unwrap_or(u32::MAX)
  }

  pub fn is_full(&self) -> bool {
    self.max_attendees > 0 && self.attendee_count() >= self.max_attendees
  }

  /// Copy of this meeting with the time transition applied, for read paths
  /// that must not write back.
  pub fn settled(mut self, now: DateTime<Utc>) -> Self {
    self.status = self.status.settle(self.date, now);
    self
  }
}

/// Input to [`crate::store::ClubStore::create_meeting`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewMeeting {
  pub title:         String,
  pub book_id:       Option<Uuid>,
  pub date:          DateTime<Utc>,
  pub location:      Option<String>,
  pub notes:         Option<String>,
  #[serde(default)]
  pub max_attendees: u32,
}

impl NewMeeting {
  pub fn validate(&self, now: DateTime<Utc>) -> Result<()> {
    if self.title.trim().is_empty() {
      return Err(Error::Validation("meeting title is required".into()));
    }
    if self.date <= now {
      return Err(Error::Validation(
        "meeting date must be in the future".into(),
      ));
    }
    Ok(())
  }
}

/// Admin-editable details. Status and attendees have their own operations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeetingPatch {
  pub title:    Option<String>,
  pub location: Option<String>,
  pub notes:    Option<String>,
}

impl MeetingPatch {
  pub fn validate(&self) -> Result<()> {
    if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
      return Err(Error::Validation("meeting title cannot be blank".into()));
    }
    Ok(())
  }
}

/// What callers render: the meeting plus capacity figures.
#[derive(Debug, Clone, Serialize)]
pub struct MeetingView {
  #[serde(flatten)]
  pub meeting:        Meeting,
  pub attendee_count: u32,
  /// `None` when the meeting is unlimited.
  pub spots_left:     Option<u32>,
  pub is_full:        bool,
}

impl From<Meeting> for MeetingView {
  fn from(meeting: Meeting) -> Self {
    let attendee_count = meeting.attendee_count();
    let spots_left = (meeting.max_attendees > 0)
      .then(|| meeting.max_attendees.saturating_sub(attendee_count));
    let is_full = meeting.is_full();
    Self { meeting, attendee_count, spots_left, is_full }
  }
}

/// Result of [`crate::attendance::AttendanceManager::toggle_attendance`].
#[derive(Debug, Clone, Serialize)]
pub struct Attendance {
  pub attending: bool,
  pub meeting:   MeetingView,
}
