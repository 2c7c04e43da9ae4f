//! Caller identification.
//!
//! Authentication happens in front of this API; by the time a request arrives
//! its `X-User-Id` header names an existing member. The extractor resolves
//! that member so handlers can apply the owner-or-admin rule.

use axum::{
  extract::{FromRequestParts, OptionalFromRequestParts},
  http::{HeaderMap, request::Parts},
};
use bookclub_core::{Error, member::Member, store::ClubStore};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

pub const USER_ID_HEADER: &str = "x-user-id";

/// The member on whose behalf the request runs.
pub struct Actor(pub Member);

impl Actor {
  pub fn require_admin(&self, action: &str) -> Result<(), ApiError> {
    if self.0.is_admin() {
      Ok(())
    } else {
      Err(Error::Forbidden(format!("only admins may {action}")).into())
    }
  }

  pub fn require_owner_or_admin(&self, owner_id: Uuid) -> Result<(), ApiError> {
    if self.0.may_modify(owner_id) {
      Ok(())
    } else {
      Err(Error::Forbidden("only the author or an admin may do that".into()).into())
    }
  }
}

fn header_id(headers: &HeaderMap) -> Result<Option<Uuid>, ApiError> {
  let Some(raw) = headers.get(USER_ID_HEADER) else {
    return Ok(None);
  };
  let id = raw
    .to_str()
    .ok()
    .and_then(|s| Uuid::parse_str(s.trim()).ok())
    .ok_or(ApiError::Unauthenticated)?;
  Ok(Some(id))
}

async fn resolve<S: ClubStore + 'static>(
  state: &AppState<S>,
  member_id: Uuid,
) -> Result<Actor, ApiError> {
  state
    .store
    .get_member(member_id)
    .await
    .map_err(crate::error::store)?
    .map(Actor)
    .ok_or(ApiError::Unauthenticated)
}

impl<S> FromRequestParts<AppState<S>> for Actor
where
  S: ClubStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let id = header_id(&parts.headers)?.ok_or(ApiError::Unauthenticated)?;
    resolve(state, id).await
  }
}

impl<S> OptionalFromRequestParts<AppState<S>> for Actor
where
  S: ClubStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Option<Self>, Self::Rejection> {
    match header_id(&parts.headers)? {
      Some(id) => resolve(state, id).await.map(Some),
      None => Ok(None),
    }
  }
}
