//! Error types for `bookclub-core`.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed: {0}")]
  Validation(String),

  #[error("member {member_id} has already reviewed book {book_id}")]
  DuplicateReview { book_id: Uuid, member_id: Uuid },

  #[error("book not found: {0}")]
  BookNotFound(Uuid),

  #[error("review not found: {0}")]
  ReviewNotFound(Uuid),

  #[error("meeting not found: {0}")]
  MeetingNotFound(Uuid),

  #[error("member not found: {0}")]
  MemberNotFound(Uuid),

  #[error("meeting {0} is full")]
  MeetingFull(Uuid),

  #[error("meeting {0} is closed for attendance changes")]
  MeetingClosed(Uuid),

  #[error("member {member_id} is already attending meeting {meeting_id}")]
  AlreadyRegistered { meeting_id: Uuid, member_id: Uuid },

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Coarse classification used at the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  Validation,
  NotFound,
  /// A bounded resource is exhausted (`MeetingFull`).
  Capacity,
  /// The entity is in a state that forbids the operation, or a concurrent
  /// write won the race.
  Conflict,
  Forbidden,
  Internal,
}

impl Error {
  /// Wrap a backend failure.
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation(_) | Self::DuplicateReview { .. } => ErrorKind::Validation,
      Self::BookNotFound(_)
      | Self::ReviewNotFound(_)
      | Self::MeetingNotFound(_)
      | Self::MemberNotFound(_) => ErrorKind::NotFound,
      Self::MeetingFull(_) => ErrorKind::Capacity,
      Self::MeetingClosed(_) | Self::AlreadyRegistered { .. } => {
        ErrorKind::Conflict
      }
      Self::Forbidden(_) => ErrorKind::Forbidden,
      Self::Store(_) => ErrorKind::Internal,
    }
  }

  /// Stable machine-readable name of the variant.
  pub fn code(&self) -> &'static str {
    match self {
      Self::Validation(_) => "validation",
      Self::DuplicateReview { .. } => "duplicate_review",
      Self::BookNotFound(_) => "book_not_found",
      Self::ReviewNotFound(_) => "review_not_found",
      Self::MeetingNotFound(_) => "meeting_not_found",
      Self::MemberNotFound(_) => "member_not_found",
      Self::MeetingFull(_) => "meeting_full",
      Self::MeetingClosed(_) => "meeting_closed",
      Self::AlreadyRegistered { .. } => "already_registered",
      Self::Forbidden(_) => "forbidden",
      Self::Store(_) => "internal",
    }
  }

  /// Whether a client may sensibly offer "try again". Never true for a full
  /// or closed meeting; nothing in this workspace retries on its own.
  pub fn is_retryable(&self) -> bool {
    matches!(self, Self::AlreadyRegistered { .. })
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
