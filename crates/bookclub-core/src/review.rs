//! Reviews: one member's opinion of one book.
//!
//! `(book_id, author_id)` is unique. The like-set and its count travel
//! together: `like_count` is always derived from `likes` by the store and is
//! never accepted from callers.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;
pub const MAX_TITLE_CHARS: usize = 100;
pub const MIN_CONTENT_CHARS: usize = 10;
pub const MAX_CONTENT_CHARS: usize = 5000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
  pub review_id:  Uuid,
  pub book_id:    Uuid,
  pub author_id:  Uuid,
  pub rating:     u8,
  pub title:      Option<String>,
  pub content:    String,
  pub spoilers:   bool,
  pub likes:      BTreeSet<Uuid>,
  pub like_count: u32,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Review {
  pub fn is_liked_by(&self, member_id: Uuid) -> bool {
    self.likes.contains(&member_id)
  }
}

/// Input to [`crate::store::ClubStore::create_review`].
#[derive(Debug, Clone)]
pub struct NewReview {
  pub book_id:   Uuid,
  pub author_id: Uuid,
  pub rating:    u8,
  pub title:     Option<String>,
  pub content:   String,
  pub spoilers:  bool,
}

impl NewReview {
  /// Reject bad input before anything is written. Trims the free-text fields
  /// in place and drops an empty title.
  pub fn validate(&mut self) -> Result<()> {
    validate_rating(self.rating)?;
    self.title = normalize_title(self.title.take())?;
    self.content = normalize_content(&self.content)?;
    Ok(())
  }
}

/// Partial update of a review's content fields. Likes are not patchable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewPatch {
  pub rating:   Option<u8>,
  /// `Some(None)` clears the title; `None` leaves it untouched.
  #[serde(default, with = "double_option")]
  pub title:    Option<Option<String>>,
  pub content:  Option<String>,
  pub spoilers: Option<bool>,
}

impl ReviewPatch {
  pub fn validate(&mut self) -> Result<()> {
    if let Some(rating) = self.rating {
      validate_rating(rating)?;
    }
    if let Some(title) = self.title.take() {
      self.title = Some(normalize_title(title)?);
    }
    if let Some(content) = &self.content {
      self.content = Some(normalize_content(content)?);
    }
    Ok(())
  }

  pub fn is_empty(&self) -> bool {
    self.rating.is_none()
      && self.title.is_none()
      && self.content.is_none()
      && self.spoilers.is_none()
  }

  /// Apply the patch onto an existing review.
  pub fn apply(self, review: &mut Review, now: DateTime<Utc>) {
    if let Some(rating) = self.rating {
      review.rating = rating;
    }
    if let Some(title) = self.title {
      review.title = title;
    }
    if let Some(content) = self.content {
      review.content = content;
    }
    if let Some(spoilers) = self.spoilers {
      review.spoilers = spoilers;
    }
    review.updated_at = now;
  }
}

/// Result of [`crate::likes::LikeToggler::toggle_like`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeOutcome {
  pub like_count: u32,
  /// Whether the member likes the review after the toggle.
  pub liked:      bool,
}

fn validate_rating(rating: u8) -> Result<()> {
  if !(MIN_RATING..=MAX_RATING).contains(&rating) {
    return Err(Error::Validation(format!(
      "rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
    )));
  }
  Ok(())
}

fn normalize_title(title: Option<String>) -> Result<Option<String>> {
  let Some(title) = title else { return Ok(None) };
  let title = title.trim();
  if title.is_empty() {
    return Ok(None);
  }
  if title.chars().count() > MAX_TITLE_CHARS {
    return Err(Error::Validation(format!(
      "review title must be at most {MAX_TITLE_CHARS} characters"
    )));
  }
  Ok(Some(title.to_owned()))
}

fn normalize_content(content: &str) -> Result<String> {
  let content = content.trim();
  let len = content.chars().count();
  if !(MIN_CONTENT_CHARS..=MAX_CONTENT_CHARS).contains(&len) {
    return Err(Error::Validation(format!(
      "review content must be between {MIN_CONTENT_CHARS} and \
       {MAX_CONTENT_CHARS} characters, got {len}"
    )));
  }
  Ok(content.to_owned())
}

/// Distinguishes an absent field from an explicit `null`.
mod double_option {
  use serde::{Deserialize, Deserializer};

  pub fn deserialize<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
  where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
  {
    Option::<T>::deserialize(de).map(Some)
  }
}
