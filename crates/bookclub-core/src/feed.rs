//! The dashboard activity feed.
//!
//! Pull-based and stateless: each request fetches bounded slices of the three
//! sources concurrently, normalises them and merges. Nothing is stored.

use std::{fmt::Display, future::Future, sync::Arc, time::Duration};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
  activity::{self, ActivityEvent, MeetingActivityRow, ReviewActivityRow, StatusActivityRow},
  store::ClubStore,
};

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
  /// Used when the caller does not ask for a size.
  pub default_limit:       usize,
  /// Hard cap on any requested size.
  pub max_limit:           usize,
  /// Meetings are taken from `now ± meeting_window_days`.
  pub meeting_window_days: i64,
  /// Per-source budget; a source that misses it is left out of the feed.
  pub source_timeout_ms:   u64,
}

impl Default for FeedConfig {
  fn default() -> Self {
    Self {
      default_limit:       20,
      max_limit:           50,
      meeting_window_days: 60,
      source_timeout_ms:   2_000,
    }
  }
}

// ─── Report ──────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ActivitySource {
  Reviews,
  Statuses,
  Meetings,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedReport {
  pub events:   Vec<ActivityEvent>,
  /// Sources that failed or timed out and are missing from `events`.
  pub degraded: Vec<ActivitySource>,
}

// ─── Composer ────────────────────────────────────────────────────────────────

pub struct ActivityComposer<S> {
  store:  Arc<S>,
  config: FeedConfig,
}

impl<S> Clone for ActivityComposer<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), config: self.config.clone() }
  }
}

impl<S: ClubStore> ActivityComposer<S> {
  pub fn new(store: Arc<S>, config: FeedConfig) -> Self {
    Self { store, config }
  }

  pub fn config(&self) -> &FeedConfig { &self.config }

  /// Build the feed. Never fails: a broken source degrades to "no events
  /// from that source" and is listed in [`FeedReport::degraded`].
  pub async fn activity_feed(&self, limit: Option<usize>) -> FeedReport {
    let limit = limit
      .unwrap_or(self.config.default_limit)
      .min(self.config.max_limit);
    if limit == 0 {
      return FeedReport { events: Vec::new(), degraded: Vec::new() };
    }

    let now = Utc::now();
    let window = chrono::Duration::days(self.config.meeting_window_days);

    // Each source is cut at `limit` before dangling rows are dropped, and
    // dropped rows are not backfilled: such a source can under-fill and let
    // older events from the other sources into the page.
    let (reviews, statuses, meetings) = tokio::join!(
      self.fetch(ActivitySource::Reviews, self.store.recent_reviews(limit)),
      self.fetch(
        ActivitySource::Statuses,
        self.store.recent_status_changes(limit)
      ),
      self.fetch(
        ActivitySource::Meetings,
        self.store.meetings_between(now - window, now + window)
      ),
    );

    let mut degraded = Vec::new();
    let mut normalised = Vec::with_capacity(3);

    match reviews {
      Some(rows) => normalised.push(normalise(
        ActivitySource::Reviews,
        rows,
        ReviewActivityRow::into_event,
      )),
      None => degraded.push(ActivitySource::Reviews),
    }
    match statuses {
      Some(rows) => normalised.push(normalise(
        ActivitySource::Statuses,
        rows,
        StatusActivityRow::into_event,
      )),
      None => degraded.push(ActivitySource::Statuses),
    }
    match meetings {
      Some(rows) => normalised.push(normalise(
        ActivitySource::Meetings,
        rows,
        |row: MeetingActivityRow| row.into_event(now),
      )),
      None => degraded.push(ActivitySource::Meetings),
    }

    FeedReport { events: activity::merge(normalised, limit), degraded }
  }

  async fn fetch<T, E>(
    &self,
    source: ActivitySource,
    fut: impl Future<Output = Result<Vec<T>, E>>,
  ) -> Option<Vec<T>>
  where
    E: Display,
  {
    let budget = Duration::from_millis(self.config.source_timeout_ms);
    match tokio::time::timeout(budget, fut).await {
      Ok(Ok(rows)) => Some(rows),
      Ok(Err(e)) => {
        tracing::warn!(%source, error = %e, "activity source failed; omitting");
        None
      }
      Err(_) => {
        tracing::warn!(
          %source,
          timeout_ms = self.config.source_timeout_ms,
          "activity source timed out; omitting"
        );
        None
      }
    }
  }
}

fn normalise<R>(
  source: ActivitySource,
  rows: Vec<R>,
  into_event: impl Fn(R) -> Option<ActivityEvent>,
) -> Vec<ActivityEvent> {
  let fetched = rows.len();
  let events: Vec<ActivityEvent> = rows.into_iter().filter_map(into_event).collect();
  if events.len() < fetched {
    tracing::debug!(
      %source,
      dropped = fetched - events.len(),
      "dropped activity rows with dangling references"
    );
  }
  events
}
