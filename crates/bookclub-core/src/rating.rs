//! The rating aggregate kept on every book.
//!
//! The aggregate is recomputed from scratch on each review write rather than
//! adjusted by deltas, so concurrent recomputes converge on the same value
//! and any missed update is repaired by the next one.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{Result, store::ClubStore};

// ─── Summary ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingSummary {
  /// Mean rating rounded half-up to one decimal; `0` with no reviews.
  pub average_rating: f64,
  pub review_count:   u32,
}

impl RatingSummary {
  /// Count and average in one pass.
  ///
  /// Rounding is done on integer tenths so `4.25` becomes `4.3` exactly
  /// instead of depending on how the float happens to be represented.
  pub fn from_ratings(ratings: impl IntoIterator<Item = u8>) -> Self {
    let (count, sum) = ratings
      .into_iter()
      .fold((0u64, 0u64), |(n, s), r| (n + 1, s + u64::from(r)));

    if count == 0 {
      return Self::default();
    }

    // round(sum / count * 10) with halves going up.
    let tenths = (sum * 20 + count) / (count * 2);
    Self {
      average_rating: tenths as f64 / 10.0,
      review_count:   u32::try_from(count).unwrap_or(u32::MAX),
    }
  }
}

// ─── Aggregator ──────────────────────────────────────────────────────────────

/// Outcome of [`RatingAggregator::repair_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
  pub checked:  usize,
  /// Books whose stored aggregate differed from the recomputed one.
  pub repaired: usize,
  pub failed:   usize,
}

/// Keeps `Book::average_rating` / `Book::review_count` equal to the
/// aggregate of the book's reviews.
pub struct RatingAggregator<S> {
  store: Arc<S>,
}

impl<S> Clone for RatingAggregator<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S> RatingAggregator<S>
where
  S: ClubStore + 'static,
{
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Recompute and persist the aggregate for one book.
  pub async fn recompute(&self, book_id: Uuid) -> Result<RatingSummary> {
    self
      .store
      .refresh_book_rating(book_id)
      .await
      .map_err(Into::into)
  }

  /// Hook to call after any committed review create, update, or delete.
  ///
  /// Never fails: the review write already stands, so a failed recompute is
  /// logged and left for the next write (or [`Self::repair_all`]) to fix.
  pub async fn on_review_written(&self, book_id: Uuid) {
    match self.recompute(book_id).await {
      Ok(summary) => tracing::debug!(
        %book_id,
        review_count = summary.review_count,
        average_rating = summary.average_rating,
        "book rating recomputed"
      ),
      Err(e) => tracing::warn!(
        %book_id,
        error = %e,
        "book rating recompute failed; aggregate left stale"
      ),
    }
  }

  /// Fire-and-forget variant of [`Self::on_review_written`].
  pub fn schedule(&self, book_id: Uuid) -> JoinHandle<()> {
    let this = self.clone();
    tokio::spawn(async move { this.on_review_written(book_id).await })
  }

  /// Out-of-band sweep: recompute every book, counting the ones whose stored
  /// aggregate had drifted.
  pub async fn repair_all(&self) -> Result<RepairReport> {
    let books = self
      .store
      .list_books()
      .await
      .map_err(Into::<crate::Error>::into)?;
    let mut report = RepairReport::default();

    for book in books {
      report.checked += 1;
      match self.recompute(book.book_id).await {
        Ok(summary) if summary != book.rating() => {
          tracing::info!(
            book_id = %book.book_id,
            before = ?book.rating(),
            after = ?summary,
            "repaired drifted book rating"
          );
          report.repaired += 1;
        }
        Ok(_) => {}
        Err(e) => {
          tracing::warn!(book_id = %book.book_id, error = %e, "repair failed");
          report.failed += 1;
        }
      }
    }

    Ok(report)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_set_is_zero() {
    let summary = RatingSummary::from_ratings(std::iter::empty());
    assert_eq!(summary.review_count, 0);
    assert_eq!(summary.average_rating, 0.0);
  }

  #[test]
  fn mean_of_four_five_three() {
    let summary = RatingSummary::from_ratings([4, 5, 3]);
    assert_eq!(summary.review_count, 3);
    assert_eq!(summary.average_rating, 4.0);

    let after_delete = RatingSummary::from_ratings([4, 5]);
    assert_eq!(after_delete.review_count, 2);
    assert_eq!(after_delete.average_rating, 4.5);
  }

  #[test]
  fn halves_round_up() {
    // 17 / 4 = 4.25
    assert_eq!(RatingSummary::from_ratings([5, 4, 4, 4]).average_rating, 4.3);
    // 13 / 3 = 4.333..
    assert_eq!(RatingSummary::from_ratings([5, 4, 4]).average_rating, 4.3);
    // 11 / 3 = 3.666..
    assert_eq!(RatingSummary::from_ratings([4, 4, 3]).average_rating, 3.7);
    // 21 / 8 = 2.625
    assert_eq!(
      RatingSummary::from_ratings([1, 2, 3, 4, 5, 1, 2, 3]).average_rating,
      2.6
    );
  }
}
