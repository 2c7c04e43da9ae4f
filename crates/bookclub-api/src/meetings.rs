//! Handlers for `/meetings` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/meetings` | Soonest first; elapsed meetings settle to `past` |
//! | `POST`   | `/meetings` | Admin; body: [`NewMeeting`] |
//! | `GET`    | `/meetings/:id` | Single meeting |
//! | `PATCH`  | `/meetings/:id` | Admin; title, location, notes |
//! | `DELETE` | `/meetings/:id` | Admin |
//! | `POST`   | `/meetings/:id/cancel` | Admin; only from `upcoming` |
//! | `POST`   | `/meetings/:id/attendance` | Toggle the caller's RSVP |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use bookclub_core::{
  Error,
  meeting::{Attendance, MeetingPatch, MeetingView, NewMeeting},
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

/// `GET /meetings`
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<MeetingView>>, ApiError>
where
  S: ClubStore + 'static,
{
  Ok(Json(state.attendance.list_meetings().await?))
}

/// `POST /meetings` — returns 201 + the stored meeting.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Body(body): Body<NewMeeting>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ClubStore + 'static,
{
  actor.require_admin("schedule meetings")?;
  body.validate(Utc::now())?;
  let meeting = state.store.create_meeting(body).await.map_err(error::store)?;
  tracing::info!(
    meeting_id = %meeting.meeting_id,
    date = %meeting.date,
    max_attendees = meeting.max_attendees,
    "meeting scheduled"
  );
  Ok((StatusCode::CREATED, Json(MeetingView::from(meeting))))
}

/// `GET /meetings/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<MeetingView>, ApiError>
where
  S: ClubStore + 'static,
{
  Ok(Json(state.attendance.get_meeting(id).await?))
}

/// `PATCH /meetings/:id`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
  Body(patch): Body<MeetingPatch>,
) -> Result<Json<MeetingView>, ApiError>
where
  S: ClubStore + 'static,
{
  Ok(Json(state.attendance.update_meeting(id, patch, &actor.0).await?))
}

/// `DELETE /meetings/:id`
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: ClubStore + 'static,
{
  actor.require_admin("delete meetings")?;
  if !state.store.delete_meeting(id).await.map_err(error::store)? {
    return Err(Error::MeetingNotFound(id).into());
  }
  tracing::info!(meeting_id = %id, "meeting deleted");
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /meetings/:id/cancel`
pub async fn cancel<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<MeetingView>, ApiError>
where
  S: ClubStore + 'static,
{
  Ok(Json(state.attendance.cancel_meeting(id, &actor.0).await?))
}

/// `POST /meetings/:id/attendance`
pub async fn toggle_attendance<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<Attendance>, ApiError>
where
  S: ClubStore + 'static,
{
  Ok(Json(state.attendance.toggle_attendance(id, &actor.0).await?))
}
