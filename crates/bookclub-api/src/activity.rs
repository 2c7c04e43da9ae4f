//! `GET /activity` — the dashboard feed.

use axum::{
  Json,
  extract::State,
};
use bookclub_core::{feed::FeedReport, store::ClubStore};
use serde::Deserialize;

use crate::{AppState, extract::Query};

#[derive(Debug, Deserialize)]
pub struct FeedParams {
  /// Capped at the configured maximum; the configured default when absent.
  pub limit: Option<usize>,
}

/// `GET /activity[?limit=N]` — never fails; degraded sources are listed in
/// the response instead.
pub async fn feed<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<FeedParams>,
) -> Json<FeedReport>
where
  S: ClubStore + 'static,
{
  Json(state.feed.activity_feed(params.limit).await)
}
