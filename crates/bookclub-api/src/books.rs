//! Handlers for `/books` endpoints. The rating aggregate is read-only here.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use bookclub_core::{
  Error,
  book::{Book, NewBook},
  store::ClubStore,
};
use uuid::Uuid;

use crate::{
  AppState,
  actor::Actor,
  error::{self, ApiError},
  extract::{Body, Path},
};

/// `GET /books`
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Book>>, ApiError>
where
  S: ClubStore + 'static,
{
  let books = state.store.list_books().await.map_err(error::store)?;
  Ok(Json(books))
}

/// `POST /books` — admin; returns 201 + the stored book.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Body(body): Body<NewBook>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ClubStore + 'static,
{
  actor.require_admin("add books")?;
  body.validate()?;
  let book = state.store.add_book(body).await.map_err(error::store)?;
  tracing::info!(book_id = %book.book_id, "book added");
  Ok((StatusCode::CREATED, Json(book)))
}

/// `GET /books/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Book>, ApiError>
where
  S: ClubStore + 'static,
{
  let book = state
    .store
    .get_book(id)
    .await
    .map_err(error::store)?
    .ok_or(Error::BookNotFound(id))?;
  Ok(Json(book))
}

/// `DELETE /books/:id` — admin; reviews and statuses are left dangling.
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: ClubStore + 'static,
{
  actor.require_admin("delete books")?;
  if !state.store.delete_book(id).await.map_err(error::store)? {
    return Err(Error::BookNotFound(id).into());
  }
  tracing::info!(book_id = %id, "book deleted");
  Ok(StatusCode::NO_CONTENT)
}
