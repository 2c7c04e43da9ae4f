//! Handlers for reviews and likes.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/books/:id/reviews` | Newest first |
//! | `POST`   | `/books/:id/reviews` | Body: [`CreateReviewBody`]; one review per member and book |
//! | `GET`    | `/reviews/:id` | Single review |
//! | `PATCH`  | `/reviews/:id` | Owner or admin; body: [`ReviewPatch`] |
//! | `DELETE` | `/reviews/:id` | Owner or admin |
//! | `POST`   | `/reviews/:id/like` | Toggle the caller's like |
//!
//! Every committed create, update, and delete is followed by a rating
//! recompute for the review's book.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use bookclub_core::{
  Error,
  review::{LikeOutcome, NewReview, Review, ReviewPatch},
  store::ClubStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  actor::Actor,
  error::{self, ApiError},
  extract::{Body, Path},
};

async fn load<S: ClubStore + 'static>(
  state: &AppState<S>,
  id: Uuid,
) -> Result<Review, ApiError> {
  state
    .store
    .get_review(id)
    .await
    .map_err(error::store)?
    .ok_or_else(|| Error::ReviewNotFound(id).into())
}

// ─── Reads ───────────────────────────────────────────────────────────────────

/// `GET /books/:id/reviews`
pub async fn list_for_book<S>(
  State(state): State<AppState<S>>,
  Path(book_id): Path<Uuid>,
) -> Result<Json<Vec<Review>>, ApiError>
where
  S: ClubStore + 'static,
{
  let reviews = state
    .store
    .list_reviews_for_book(book_id)
    .await
    .map_err(error::store)?;
  Ok(Json(reviews))
}

/// `GET /reviews/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Review>, ApiError>
where
  S: ClubStore + 'static,
{
  Ok(Json(load(&state, id).await?))
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /books/:id/reviews`. The author is the caller.
#[derive(Debug, Deserialize)]
pub struct CreateReviewBody {
  pub rating:   u8,
  pub title:    Option<String>,
  pub content:  String,
  #[serde(default)]
  pub spoilers: bool,
}

/// `POST /books/:id/reviews` — returns 201 + the stored review.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(book_id): Path<Uuid>,
  Body(body): Body<CreateReviewBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ClubStore + 'static,
{
  let mut input = NewReview {
    book_id,
    author_id: actor.0.member_id,
    rating: body.rating,
    title: body.title,
    content: body.content,
    spoilers: body.spoilers,
  };
  input.validate()?;

  let review = state.store.create_review(input).await.map_err(error::store)?;
  tracing::info!(review_id = %review.review_id, %book_id, "review created");
  state.ratings.on_review_written(book_id).await;
  Ok((StatusCode::CREATED, Json(review)))
}

/// `PATCH /reviews/:id`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
  Body(mut patch): Body<ReviewPatch>,
) -> Result<Json<Review>, ApiError>
where
  S: ClubStore + 'static,
{
  let existing = load(&state, id).await?;
  actor.require_owner_or_admin(existing.author_id)?;

  patch.validate()?;
  if patch.is_empty() {
    return Err(Error::Validation("nothing to update".into()).into());
  }

  let review = state.store.update_review(id, patch).await.map_err(error::store)?;
  tracing::info!(review_id = %id, "review updated");
  state.ratings.on_review_written(review.book_id).await;
  Ok(Json(review))
}

/// `DELETE /reviews/:id`
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: ClubStore + 'static,
{
  let existing = load(&state, id).await?;
  actor.require_owner_or_admin(existing.author_id)?;

  let deleted = state
    .store
    .delete_review(id)
    .await
    .map_err(error::store)?
    .ok_or(Error::ReviewNotFound(id))?;
  tracing::info!(review_id = %id, "review deleted");
  state.ratings.on_review_written(deleted.book_id).await;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /reviews/:id/like`
pub async fn toggle_like<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<LikeOutcome>, ApiError>
where
  S: ClubStore + 'static,
{
  let outcome = state.likes.toggle_like(id, actor.0.member_id).await?;
  Ok(Json(outcome))
}
