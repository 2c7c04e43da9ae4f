//! Books and their materialised rating aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, rating::RatingSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
  pub book_id:        Uuid,
  pub title:          String,
  pub author:         String,
  /// Derived from the book's reviews; written only by the rating aggregator.
  pub average_rating: f64,
  /// Derived from the book's reviews; written only by the rating aggregator.
  pub review_count:   u32,
  pub created_at:     DateTime<Utc>,
}

impl Book {
  pub fn rating(&self) -> RatingSummary {
    RatingSummary {
      average_rating: self.average_rating,
      review_count:   self.review_count,
    }
  }
}

/// Input to [`crate::store::ClubStore::add_book`]. Carries no aggregate
/// fields; a new book starts at zero reviews.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBook {
  pub title:  String,
  pub author: String,
}

impl NewBook {
  pub fn validate(&self) -> Result<()> {
    if self.title.trim().is_empty() {
      return Err(Error::Validation("book title is required".into()));
    }
    if self.author.trim().is_empty() {
      return Err(Error::Validation("book author is required".into()));
    }
    Ok(())
  }
}

/// A resolved book reference as embedded in activity events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRef {
  pub book_id: Uuid,
  pub title:   String,
}
