//! Like toggling on reviews.

use std::sync::Arc;

use uuid::Uuid;

use crate::{Result, review::LikeOutcome, store::ClubStore};

/// Flips a member's presence in a review's like-set.
///
/// The whole read-modify-write happens inside the store, so two members
/// liking at once both land and a double-click by one member is serialised
/// into like-then-unlike rather than counted twice.
pub struct LikeToggler<S> {
  store: Arc<S>,
}

impl<S> Clone for LikeToggler<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: ClubStore> LikeToggler<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub async fn toggle_like(
    &self,
    review_id: Uuid,
    member_id: Uuid,
  ) -> Result<LikeOutcome> {
    let outcome = self
      .store
      .toggle_like(review_id, member_id)
      .await
      .map_err(Into::<crate::Error>::into)?;

    tracing::debug!(
      %review_id,
      %member_id,
      liked = outcome.liked,
      like_count = outcome.like_count,
      "review like toggled"
    );
    Ok(outcome)
  }
}
