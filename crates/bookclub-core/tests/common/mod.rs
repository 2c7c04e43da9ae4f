//! Fixtures shared by the component tests. Each test binary uses a subset.
#![allow(dead_code)]

use std::sync::Arc;

use bookclub_core::{
  book::NewBook,
  meeting::{Meeting, NewMeeting},
  member::{Member, NewMember, Role},
  review::NewReview,
  store::ClubStore,
};
use bookclub_store_sqlite::SqliteStore;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub async fn store() -> Arc<SqliteStore> {
  Arc::new(
    SqliteStore::open_in_memory()
      .await
      .expect("in-memory store"),
  )
}

pub async fn member(s: &SqliteStore, name: &str) -> Member {
  s.add_member(NewMember {
    name:     name.into(),
    role:     Role::Member,
    approved: true,
  })
  .await
  .unwrap()
}

pub async fn admin(s: &SqliteStore) -> Member {
  s.add_member(NewMember {
    name:     "admin".into(),
    role:     Role::Admin,
    approved: false,
  })
  .await
  .unwrap()
}

pub async fn book(s: &SqliteStore, title: &str) -> Uuid {
  s.add_book(NewBook { title: title.into(), author: "Octavia E. Butler".into() })
    .await
    .unwrap()
    .book_id
}

pub fn review(book_id: Uuid, author_id: Uuid, rating: u8) -> NewReview {
  NewReview {
    book_id,
    author_id,
    rating,
    title: Some("Thoughts".into()),
    content: "Stayed with me for weeks afterwards.".into(),
    spoilers: false,
  }
}

/// Insert a meeting directly, bypassing the future-date check.
pub async fn meeting_at(
  s: &SqliteStore,
  date: DateTime<Utc>,
  max_attendees: u32,
) -> Meeting {
  s.create_meeting(NewMeeting {
    title: "Book night".into(),
    book_id: None,
    date,
    location: None,
    notes: None,
    max_attendees,
  })
  .await
  .unwrap()
}
