//! Handlers for the caller's reading statuses.

use axum::{
  Json,
  extract::State,
};
use bookclub_core::{
  reading::{ReadingStatus, ReadingStatusUpdate},
  store::ClubStore,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
  AppState,
  actor::Actor,
  error::{self, ApiError},
  extract::{Body, Path},
};

/// `GET /reading-status` — most recently updated first.
pub async fn list_mine<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
) -> Result<Json<Vec<ReadingStatus>>, ApiError>
where
  S: ClubStore + 'static,
{
  let statuses = state
    .store
    .list_reading_statuses(actor.0.member_id)
    .await
    .map_err(error::store)?;
  Ok(Json(statuses))
}

/// `PUT /reading-status/:book_id`
pub async fn set<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(book_id): Path<Uuid>,
  Body(update): Body<ReadingStatusUpdate>,
) -> Result<Json<ReadingStatus>, ApiError>
where
  S: ClubStore + 'static,
{
  let member_id = actor.0.member_id;
  let status = state
    .store
    .set_reading_status(member_id, book_id, update, Utc::now())
    .await
    .map_err(error::store)?;
  tracing::debug!(%member_id, %book_id, status = %status.status, "reading status set");
  Ok(Json(status))
}
