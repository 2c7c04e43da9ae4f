//! JSON REST API for the book club.
//!
//! Exposes an axum [`Router`] backed by any [`bookclub_core::store::ClubStore`].
//! Authentication, TLS, and transport concerns are the caller's
//! responsibility; the caller is identified by the `X-User-Id` header.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", bookclub_api::api_router(AppState::new(store, feed_config)))
//! ```

pub mod activity;
pub mod actor;
pub mod books;
pub mod error;
pub mod extract;
pub mod meetings;
pub mod members;
pub mod reading;
pub mod reviews;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use bookclub_core::{
  attendance::AttendanceManager,
  feed::{ActivityComposer, FeedConfig},
  likes::LikeToggler,
  rating::RatingAggregator,
  store::ClubStore,
};

pub use actor::Actor;
pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers: the store plus the components
/// that own every derived-state write.
pub struct AppState<S> {
  pub store:      Arc<S>,
  pub ratings:    RatingAggregator<S>,
  pub likes:      LikeToggler<S>,
  pub attendance: AttendanceManager<S>,
  pub feed:       ActivityComposer<S>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:      Arc::clone(&self.store),
      ratings:    self.ratings.clone(),
      likes:      self.likes.clone(),
      attendance: self.attendance.clone(),
      feed:       self.feed.clone(),
    }
  }
}

impl<S: ClubStore + 'static> AppState<S> {
  pub fn new(store: Arc<S>, feed: FeedConfig) -> Self {
    Self {
      ratings:    RatingAggregator::new(Arc::clone(&store)),
      likes:      LikeToggler::new(Arc::clone(&store)),
      attendance: AttendanceManager::new(Arc::clone(&store)),
      feed:       ActivityComposer::new(Arc::clone(&store), feed),
      store,
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: ClubStore + 'static,
{
  Router::new()
    // Members
    .route("/members", post(members::create::<S>))
    .route("/members/{id}", get(members::get_one::<S>))
    .route("/members/{id}/approval", post(members::set_approval::<S>))
    // Books
    .route("/books", get(books::list::<S>).post(books::create::<S>))
    .route("/books/{id}", get(books::get_one::<S>).delete(books::delete_one::<S>))
    // Reviews
    .route(
      "/books/{id}/reviews",
      get(reviews::list_for_book::<S>).post(reviews::create::<S>),
    )
    .route(
      "/reviews/{id}",
      get(reviews::get_one::<S>)
        .patch(reviews::update::<S>)
        .delete(reviews::delete_one::<S>),
    )
    .route("/reviews/{id}/like", post(reviews::toggle_like::<S>))
    // Meetings
    .route("/meetings", get(meetings::list::<S>).post(meetings::create::<S>))
    .route(
      "/meetings/{id}",
      get(meetings::get_one::<S>)
        .patch(meetings::update::<S>)
        .delete(meetings::delete_one::<S>),
    )
    .route("/meetings/{id}/cancel", post(meetings::cancel::<S>))
    .route("/meetings/{id}/attendance", post(meetings::toggle_attendance::<S>))
    // Reading statuses
    .route("/reading-status", get(reading::list_mine::<S>))
    .route("/reading-status/{book_id}", put(reading::set::<S>))
    // Activity
    .route("/activity", get(activity::feed::<S>))
    .with_state(state)
}
