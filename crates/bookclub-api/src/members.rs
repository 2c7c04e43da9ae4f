//! Handlers for `/members` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/members` | Open registration; only admins may set role/approval |
//! | `GET`  | `/members/:id` | Single member |
//! | `POST` | `/members/:id/approval` | Admin; body `{"approved": bool}` |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use bookclub_core::{
  Error,
  member::{Member, NewMember, Role},
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

/// `POST /members` — returns 201 + the stored member.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  actor: Option<Actor>,
  Body(mut body): Body<NewMember>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ClubStore + 'static,
{
  if body.name.trim().is_empty() {
    return Err(Error::Validation("member name is required".into()).into());
  }
  body.name = body.name.trim().to_string();

  if !actor.is_some_and(|a| a.0.is_admin()) {
    body.role = Role::Member;
    body.approved = false;
  }

  let member = state.store.add_member(body).await.map_err(error::store)?;
  tracing::info!(member_id = %member.member_id, role = %member.role, "member added");
  Ok((StatusCode::CREATED, Json(member)))
}

/// `GET /members/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Member>, ApiError>
where
  S: ClubStore + 'static,
{
  let member = state
    .store
    .get_member(id)
    .await
    .map_err(error::store)?
    .ok_or(Error::MemberNotFound(id))?;
  Ok(Json(member))
}

#[derive(Debug, Deserialize)]
pub struct ApprovalBody {
  pub approved: bool,
}

/// `POST /members/:id/approval`
pub async fn set_approval<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
  Body(body): Body<ApprovalBody>,
) -> Result<Json<Member>, ApiError>
where
  S: ClubStore + 'static,
{
  actor.require_admin("approve members")?;
  let member = state
    .store
    .set_member_approved(id, body.approved)
    .await
    .map_err(error::store)?;
  tracing::info!(member_id = %id, approved = body.approved, "member approval changed");
  Ok(Json(member))
}
