//! [`SqliteStore`]: the SQLite implementation of [`ClubStore`].
//!
//! Each trait method runs one closure on a connection thread: the activity
//! queries on their own readers, everything else on the writer. Methods that
//! guard an invariant open an `IMMEDIATE` transaction (taking the write lock
//! up front) or express the guard as a single conditional statement, so they
//! stay correct when several processes share the database file.

use std::{path::Path, time::Duration};

use bookclub_core::{
  Error as CoreError,
  activity::{MeetingActivityRow, ReviewActivityRow, StatusActivityRow},
  book::{Book, NewBook},
  meeting::{Meeting, MeetingPatch, MeetingStatus, NewMeeting},
  member::{Member, NewMember},
  rating::RatingSummary,
  reading::{ReadingStatus, ReadingStatusUpdate},
  review::{LikeOutcome, NewReview, Review, ReviewPatch},
  store::ClubStore,
};
use chrono::{DateTime, Utc};
use rusqlite::{
  Connection, ErrorCode, OptionalExtension as _, TransactionBehavior, params,
};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    BOOK_COLUMNS, MEETING_COLUMNS, MEMBER_COLUMNS, REVIEW_COLUMNS,
    STATUS_COLUMNS, RawBook, RawMeeting, RawMember, RawReadingStatus,
    RawReview, decode_book_ref, decode_member_ref, encode_dt, encode_uuid,
    now,
  },
  schema::SCHEMA,
};

/// How long a writer waits for another process's lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A book club store backed by a single SQLite file.
///
/// Writes and point reads share one connection. Each activity source reads
/// through its own query-only connection, so a slow source or a burst of
/// writes never holds up the other sources.
///
/// Cloning is cheap; the inner connections are reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:    tokio_rusqlite::Connection,
  readers: [tokio_rusqlite::Connection; 3],
}

/// Which reader connection an activity query runs on.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Lane {
  Reviews,
  Statuses,
  Meetings,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation. The
  /// file is switched to WAL so the readers never wait on a writer.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self::with_readers(conn, path, true).await?;
    tracing::debug!(path = %path.display(), "sqlite store opened");
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    // Every connection opening the same `memdb` name shares one database,
    // which lives until the last of them closes.
    let name = format!("file:/bookclub-{}?vfs=memdb", Uuid::new_v4());
    let path = Path::new(&name);
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::with_readers(conn, path, false).await
  }

  async fn with_readers(
    conn: tokio_rusqlite::Connection,
    path: &Path,
    wal: bool,
  ) -> Result<Self> {
    conn
      .call(move |conn| Ok(init_schema(conn, wal)))
      .await??;
    let readers = [
      open_reader(path).await?,
      open_reader(path).await?,
      open_reader(path).await?,
    ];
    Ok(Self { conn, readers })
  }

  /// Run `f` on the connection thread, flattening both error layers.
  pub(crate) async fn run<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }

  /// Run a read-only `f` on the reader dedicated to `lane`.
  pub(crate) async fn read<T, F>(&self, lane: Lane, f: F) -> Result<T>
  where
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self.readers[lane as usize]
      .call(move |conn| Ok(f(conn)))
      .await?
  }
}

fn init_schema(conn: &mut Connection, wal: bool) -> Result<()> {
  conn.busy_timeout(BUSY_TIMEOUT)?;
  if wal {
    let mode: String = conn.pragma_update_and_check(
      None,
      "journal_mode",
      "WAL",
      |row| row.get(0),
    )?;
    tracing::debug!(%mode, "journal mode set");
  }
  conn.execute_batch(SCHEMA)?;
  Ok(())
}

async fn open_reader(path: &Path) -> Result<tokio_rusqlite::Connection> {
  let reader = tokio_rusqlite::Connection::open(path).await?;
  reader.call(|conn| Ok(configure_reader(conn))).await??;
  Ok(reader)
}

fn configure_reader(conn: &mut Connection) -> Result<()> {
  conn.busy_timeout(BUSY_TIMEOUT)?;
  conn.pragma_update(None, "query_only", true)?;
  Ok(())
}

// ─── Row loaders ─────────────────────────────────────────────────────────────
//
// Plain functions over a connection so they can be shared by reads and by
// the read-back step inside write transactions.

fn load_member(conn: &Connection, member_id: Uuid) -> Result<Option<Member>> {
  conn
    .query_row(
      &format!("SELECT {MEMBER_COLUMNS} FROM members WHERE member_id = ?1"),
      params![encode_uuid(member_id)],
      RawMember::from_row,
    )
    .optional()?
    .map(RawMember::into_member)
    .transpose()
}

fn load_book(conn: &Connection, book_id: Uuid) -> Result<Option<Book>> {
  conn
    .query_row(
      &format!("SELECT {BOOK_COLUMNS} FROM books WHERE book_id = ?1"),
      params![encode_uuid(book_id)],
      RawBook::from_row,
    )
    .optional()?
    .map(RawBook::into_book)
    .transpose()
}

fn book_exists(conn: &Connection, book_id: Uuid) -> Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM books WHERE book_id = ?1",
        params![encode_uuid(book_id)],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

fn load_likes(conn: &Connection, review_id: &str) -> Result<Vec<String>> {
  let mut stmt = conn.prepare_cached(
    "SELECT member_id FROM review_likes WHERE review_id = ?1 ORDER BY member_id",
  )?;
  let likes = stmt
    .query_map(params![review_id], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(likes)
}

fn hydrate_review(conn: &Connection, raw: RawReview) -> Result<Review> {
  let likes = load_likes(conn, &raw.review_id)?;
  raw.into_review(likes)
}

fn load_review(conn: &Connection, review_id: Uuid) -> Result<Option<Review>> {
  let raw = conn
    .query_row(
      &format!("SELECT {REVIEW_COLUMNS} FROM reviews r WHERE r.review_id = ?1"),
      params![encode_uuid(review_id)],
      RawReview::from_row,
    )
    .optional()?;
  raw.map(|raw| hydrate_review(conn, raw)).transpose()
}

fn load_attendees(conn: &Connection, meeting_id: &str) -> Result<Vec<String>> {
  let mut stmt = conn.prepare_cached(
    "SELECT member_id FROM meeting_attendees WHERE meeting_id = ?1 ORDER BY rowid",
  )?;
  let attendees = stmt
    .query_map(params![meeting_id], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(attendees)
}

fn hydrate_meeting(conn: &Connection, raw: RawMeeting) -> Result<Meeting> {
  let attendees = load_attendees(conn, &raw.meeting_id)?;
  raw.into_meeting(attendees)
}

fn load_meeting(conn: &Connection, meeting_id: Uuid) -> Result<Option<Meeting>> {
  let raw = conn
    .query_row(
      &format!("SELECT {MEETING_COLUMNS} FROM meetings m WHERE m.meeting_id = ?1"),
      params![encode_uuid(meeting_id)],
      RawMeeting::from_row,
    )
    .optional()?;
  raw.map(|raw| hydrate_meeting(conn, raw)).transpose()
}

fn load_reading_status(
  conn: &Connection,
  member_id: Uuid,
  book_id: Uuid,
) -> Result<Option<ReadingStatus>> {
  conn
    .query_row(
      &format!(
        "SELECT {STATUS_COLUMNS} FROM reading_statuses s
         WHERE s.member_id = ?1 AND s.book_id = ?2"
      ),
      params![encode_uuid(member_id), encode_uuid(book_id)],
      RawReadingStatus::from_row,
    )
    .optional()?
    .map(RawReadingStatus::into_status)
    .transpose()
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _) if f.code == ErrorCode::ConstraintViolation
  )
}

// ─── ClubStore impl ──────────────────────────────────────────────────────────

impl ClubStore for SqliteStore {
  type Error = Error;

  // ── Members ───────────────────────────────────────────────────────────────

  async fn add_member(&self, input: NewMember) -> Result<Member> {
    let member_id = Uuid::new_v4();
    self
      .run(move |conn| {
        conn.execute(
          "INSERT INTO members (member_id, name, role, approved, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          params![
            encode_uuid(member_id),
            input.name,
            input.role.to_string(),
            input.approved,
            encode_dt(now()),
          ],
        )?;
        load_member(conn, member_id)?
          .ok_or(Error::Core(CoreError::MemberNotFound(member_id)))
      })
      .await
  }

  async fn get_member(&self, member_id: Uuid) -> Result<Option<Member>> {
    self.run(move |conn| load_member(conn, member_id)).await
  }

  async fn set_member_approved(
    &self,
    member_id: Uuid,
    approved: bool,
  ) -> Result<Member> {
    self
      .run(move |conn| {
        let changed = conn.execute(
          "UPDATE members SET approved = ?2 WHERE member_id = ?1",
          params![encode_uuid(member_id), approved],
        )?;
        if changed == 0 {
          return Err(CoreError::MemberNotFound(member_id).into());
        }
        load_member(conn, member_id)?
          .ok_or(Error::Core(CoreError::MemberNotFound(member_id)))
      })
      .await
  }

  // ── Books ─────────────────────────────────────────────────────────────────

  async fn add_book(&self, input: NewBook) -> Result<Book> {
    let book_id = Uuid::new_v4();
    self
      .run(move |conn| {
        conn.execute(
          "INSERT INTO books (book_id, title, author, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          params![
            encode_uuid(book_id),
            input.title.trim(),
            input.author.trim(),
            encode_dt(now()),
          ],
        )?;
        load_book(conn, book_id)?
          .ok_or(Error::Core(CoreError::BookNotFound(book_id)))
      })
      .await
  }

  async fn get_book(&self, book_id: Uuid) -> Result<Option<Book>> {
    self.run(move |conn| load_book(conn, book_id)).await
  }

  async fn list_books(&self) -> Result<Vec<Book>> {
    self
      .run(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {BOOK_COLUMNS} FROM books ORDER BY title, book_id"
        ))?;
        let raws = stmt
          .query_map([], RawBook::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        raws.into_iter().map(RawBook::into_book).collect()
      })
      .await
  }

  async fn delete_book(&self, book_id: Uuid) -> Result<bool> {
    self
      .run(move |conn| {
        let deleted = conn.execute(
          "DELETE FROM books WHERE book_id = ?1",
          params![encode_uuid(book_id)],
        )?;
        Ok(deleted > 0)
      })
      .await
  }

  async fn refresh_book_rating(&self, book_id: Uuid) -> Result<RatingSummary> {
    self
      .run(move |conn| {
        let id = encode_uuid(book_id);
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !book_exists(&tx, book_id)? {
          return Err(CoreError::BookNotFound(book_id).into());
        }

        let ratings = {
          let mut stmt = tx.prepare_cached("SELECT rating FROM reviews WHERE book_id = ?1")?;
          stmt
            .query_map(params![id], |row| row.get::<_, u8>(0))?
            .collect::<rusqlite::Result<Vec<u8>>>()?
        };
        let summary = RatingSummary::from_ratings(ratings);

        tx.execute(
          "UPDATE books SET average_rating = ?2, review_count = ?3 WHERE book_id = ?1",
          params![id, summary.average_rating, summary.review_count],
        )?;
        tx.commit()?;
        Ok(summary)
      })
      .await
  }

  // ── Reviews ───────────────────────────────────────────────────────────────

  async fn create_review(&self, input: NewReview) -> Result<Review> {
    let review_id = Uuid::new_v4();
    self
      .run(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !book_exists(&tx, input.book_id)? {
          return Err(CoreError::BookNotFound(input.book_id).into());
        }

        let at = encode_dt(now());
        let inserted = tx.execute(
          "INSERT INTO reviews (
             review_id, book_id, author_id, rating, title, content, spoilers,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
          params![
            encode_uuid(review_id),
            encode_uuid(input.book_id),
            encode_uuid(input.author_id),
            input.rating,
            input.title,
            input.content,
            input.spoilers,
            at,
          ],
        );
        match inserted {
          Ok(_) => {}
          Err(e) if is_unique_violation(&e) => {
            return Err(
              CoreError::DuplicateReview {
                book_id:   input.book_id,
                member_id: input.author_id,
              }
              .into(),
            );
          }
          Err(e) => return Err(e.into()),
        }

        let review = load_review(&tx, review_id)?
          .ok_or(Error::Core(CoreError::ReviewNotFound(review_id)))?;
        tx.commit()?;
        Ok(review)
      })
      .await
  }

  async fn get_review(&self, review_id: Uuid) -> Result<Option<Review>> {
    self.run(move |conn| load_review(conn, review_id)).await
  }

  async fn update_review(
    &self,
    review_id: Uuid,
    patch: ReviewPatch,
  ) -> Result<Review> {
    self
      .run(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut review = load_review(&tx, review_id)?
          .ok_or(Error::Core(CoreError::ReviewNotFound(review_id)))?;
        patch.apply(&mut review, now());

        tx.execute(
          "UPDATE reviews
           SET rating = ?2, title = ?3, content = ?4, spoilers = ?5, updated_at = ?6
           WHERE review_id = ?1",
          params![
            encode_uuid(review_id),
            review.rating,
            review.title,
            review.content,
            review.spoilers,
            encode_dt(review.updated_at),
          ],
        )?;
        tx.commit()?;
        Ok(review)
      })
      .await
  }

  async fn delete_review(&self, review_id: Uuid) -> Result<Option<Review>> {
    self
      .run(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(review) = load_review(&tx, review_id)? else {
          return Ok(None);
        };
        tx.execute(
          "DELETE FROM reviews WHERE review_id = ?1",
          params![encode_uuid(review_id)],
        )?;
        tx.commit()?;
        Ok(Some(review))
      })
      .await
  }

  async fn list_reviews_for_book(&self, book_id: Uuid) -> Result<Vec<Review>> {
    self
      .run(move |conn| {
        let conn = &*conn;
        let mut stmt = conn.prepare(&format!(
          "SELECT {REVIEW_COLUMNS} FROM reviews r
           WHERE r.book_id = ?1
           ORDER BY r.created_at DESC, r.review_id DESC"
        ))?;
        let raws = stmt
          .query_map(params![encode_uuid(book_id)], RawReview::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        raws.into_iter().map(|raw| hydrate_review(conn, raw)).collect()
      })
      .await
  }

  async fn toggle_like(
    &self,
    review_id: Uuid,
    member_id: Uuid,
  ) -> Result<LikeOutcome> {
    self
      .run(move |conn| {
        let review = encode_uuid(review_id);
        let member = encode_uuid(member_id);
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists = tx
          .query_row(
            "SELECT 1 FROM reviews WHERE review_id = ?1",
            params![review],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !exists {
          return Err(CoreError::ReviewNotFound(review_id).into());
        }

        // Remove if present, otherwise add.
        let removed = tx.execute(
          "DELETE FROM review_likes WHERE review_id = ?1 AND member_id = ?2",
          params![review, member],
        )?;
        if removed == 0 {
          tx.execute(
            "INSERT INTO review_likes (review_id, member_id, liked_at)
             VALUES (?1, ?2, ?3)",
            params![review, member, encode_dt(now())],
          )?;
        }

        // The count is re-derived from the set, never incremented.
        tx.execute(
          "UPDATE reviews
           SET like_count = (SELECT COUNT(*) FROM review_likes WHERE review_id = ?1)
           WHERE review_id = ?1",
          params![review],
        )?;
        let like_count: u32 = tx.query_row(
          "SELECT like_count FROM reviews WHERE review_id = ?1",
          params![review],
          |row| row.get(0),
        )?;

        tx.commit()?;
        Ok(LikeOutcome { like_count, liked: removed == 0 })
      })
      .await
  }

  // ── Meetings ──────────────────────────────────────────────────────────────

  async fn create_meeting(&self, input: NewMeeting) -> Result<Meeting> {
    let meeting_id = Uuid::new_v4();
    self
      .run(move |conn| {
        conn.execute(
          "INSERT INTO meetings (
             meeting_id, title, book_id, date, location, notes, status,
             max_attendees, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          params![
            encode_uuid(meeting_id),
            input.title.trim(),
            input.book_id.map(encode_uuid),
            encode_dt(input.date),
            input.location,
            input.notes,
            MeetingStatus::Upcoming.to_string(),
            input.max_attendees,
            encode_dt(now()),
          ],
        )?;
        load_meeting(conn, meeting_id)?
          .ok_or(Error::Core(CoreError::MeetingNotFound(meeting_id)))
      })
      .await
  }

  async fn get_meeting(&self, meeting_id: Uuid) -> Result<Option<Meeting>> {
    self.run(move |conn| load_meeting(conn, meeting_id)).await
  }

  async fn list_meetings(&self) -> Result<Vec<Meeting>> {
    self
      .run(|conn| {
        let conn = &*conn;
        let mut stmt = conn.prepare(&format!(
          "SELECT {MEETING_COLUMNS} FROM meetings m ORDER BY m.date, m.meeting_id"
        ))?;
        let raws = stmt
          .query_map([], RawMeeting::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        raws.into_iter().map(|raw| hydrate_meeting(conn, raw)).collect()
      })
      .await
  }

  async fn update_meeting_details(
    &self,
    meeting_id: Uuid,
    patch: MeetingPatch,
  ) -> Result<Meeting> {
    self
      .run(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
          "UPDATE meetings
           SET title    = COALESCE(?2, title),
               location = COALESCE(?3, location),
               notes    = COALESCE(?4, notes)
           WHERE meeting_id = ?1",
          params![
            encode_uuid(meeting_id),
            patch.title.as_deref().map(str::trim),
            patch.location,
            patch.notes,
          ],
        )?;
        if changed == 0 {
          return Err(CoreError::MeetingNotFound(meeting_id).into());
        }
        let meeting = load_meeting(&tx, meeting_id)?
          .ok_or(Error::Core(CoreError::MeetingNotFound(meeting_id)))?;
        tx.commit()?;
        Ok(meeting)
      })
      .await
  }

  async fn cancel_meeting(&self, meeting_id: Uuid) -> Result<Meeting> {
    self
      .run(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
          "UPDATE meetings SET status = 'cancelled'
           WHERE meeting_id = ?1 AND status = 'upcoming'",
          params![encode_uuid(meeting_id)],
        )?;
        let meeting = load_meeting(&tx, meeting_id)?
          .ok_or(Error::Core(CoreError::MeetingNotFound(meeting_id)))?;
        if changed == 0 {
          return Err(CoreError::MeetingClosed(meeting_id).into());
        }
        tx.commit()?;
        Ok(meeting)
      })
      .await
  }

  async fn delete_meeting(&self, meeting_id: Uuid) -> Result<bool> {
    self
      .run(move |conn| {
        let deleted = conn.execute(
          "DELETE FROM meetings WHERE meeting_id = ?1",
          params![encode_uuid(meeting_id)],
        )?;
        Ok(deleted > 0)
      })
      .await
  }

  async fn settle_meetings(
    &self,
    now: DateTime<Utc>,
    scope: Option<Uuid>,
  ) -> Result<u64> {
    self
      .run(move |conn| {
        let moved = conn.execute(
          "UPDATE meetings SET status = 'past'
           WHERE status = 'upcoming'
             AND date < ?1
             AND (?2 IS NULL OR meeting_id = ?2)",
          params![encode_dt(now), scope.map(encode_uuid)],
        )?;
        Ok(moved as u64)
      })
      .await
  }

  async fn toggle_attendance(
    &self,
    meeting_id: Uuid,
    member_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<(bool, Meeting)> {
    self
      .run(move |conn| {
        let meeting = encode_uuid(meeting_id);
        let member = encode_uuid(member_id);
        let at = encode_dt(now);
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        // Leave: only while the meeting is open.
        let left = tx.execute(
          "DELETE FROM meeting_attendees
           WHERE meeting_id = ?1 AND member_id = ?2
             AND EXISTS (
               SELECT 1 FROM meetings
               WHERE meeting_id = ?1 AND status = 'upcoming' AND date > ?3
             )",
          params![meeting, member, at],
        )?;

        let attending = if left == 1 {
          false
        } else {
          // Join: one conditional insert, judged against the live count.
          let joined = tx.execute(
            "INSERT OR IGNORE INTO meeting_attendees (meeting_id, member_id, joined_at)
             SELECT m.meeting_id, ?2, ?3 FROM meetings m
             WHERE m.meeting_id = ?1
               AND m.status = 'upcoming'
               AND m.date > ?3
               AND (
                 m.max_attendees = 0
                 OR (SELECT COUNT(*) FROM meeting_attendees a
                     WHERE a.meeting_id = m.meeting_id) < m.max_attendees
               )",
            params![meeting, member, at],
          )?;

          if joined == 0 {
            let current = load_meeting(&tx, meeting_id)?
              .ok_or(Error::Core(CoreError::MeetingNotFound(meeting_id)))?;
            let rejection = if !current.status.settle(current.date, now).accepts_attendance() {
              CoreError::MeetingClosed(meeting_id)
            } else if current.is_attending(member_id) {
              CoreError::AlreadyRegistered { meeting_id, member_id }
            } else {
              CoreError::MeetingFull(meeting_id)
            };
            return Err(rejection.into());
          }
          true
        };

        let updated = load_meeting(&tx, meeting_id)?
          .ok_or(Error::Core(CoreError::MeetingNotFound(meeting_id)))?;
        tx.commit()?;
        Ok((attending, updated))
      })
      .await
  }

  // ── Reading statuses ──────────────────────────────────────────────────────

  async fn set_reading_status(
    &self,
    member_id: Uuid,
    book_id: Uuid,
    update: ReadingStatusUpdate,
    now: DateTime<Utc>,
  ) -> Result<ReadingStatus> {
    self
      .run(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !book_exists(&tx, book_id)? {
          return Err(CoreError::BookNotFound(book_id).into());
        }

        let current = load_reading_status(&tx, member_id, book_id)?;
        let next = update.apply(current, member_id, book_id, now);

        tx.execute(
          "INSERT INTO reading_statuses (
             member_id, book_id, status, started_at, finished_at, notes, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT (member_id, book_id) DO UPDATE SET
             status      = excluded.status,
             started_at  = excluded.started_at,
             finished_at = excluded.finished_at,
             notes       = excluded.notes,
             updated_at  = excluded.updated_at",
          params![
            encode_uuid(member_id),
            encode_uuid(book_id),
            next.status.to_string(),
            next.started_at.map(encode_dt),
            next.finished_at.map(encode_dt),
            next.notes,
            encode_dt(next.updated_at),
          ],
        )?;

        let stored = load_reading_status(&tx, member_id, book_id)?
          .ok_or(Error::Core(CoreError::BookNotFound(book_id)))?;
        tx.commit()?;
        Ok(stored)
      })
      .await
  }

  async fn get_reading_status(
    &self,
    member_id: Uuid,
    book_id: Uuid,
  ) -> Result<Option<ReadingStatus>> {
    self
      .run(move |conn| load_reading_status(conn, member_id, book_id))
      .await
  }

  async fn list_reading_statuses(&self, member_id: Uuid) -> Result<Vec<ReadingStatus>> {
    self
      .run(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {STATUS_COLUMNS} FROM reading_statuses s
           WHERE s.member_id = ?1
           ORDER BY s.updated_at DESC, s.book_id"
        ))?;
        let raws = stmt
          .query_map(params![encode_uuid(member_id)], RawReadingStatus::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        raws.into_iter().map(RawReadingStatus::into_status).collect()
      })
      .await
  }

  // ── Activity sources ──────────────────────────────────────────────────────

  async fn recent_reviews(&self, limit: usize) -> Result<Vec<ReviewActivityRow>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    self
      .read(Lane::Reviews, move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REVIEW_COLUMNS}, b.book_id, b.title, m.member_id, m.name
           FROM reviews r
           LEFT JOIN books   b ON b.book_id   = r.book_id
           LEFT JOIN members m ON m.member_id = r.author_id
           ORDER BY r.created_at DESC, r.review_id DESC
           LIMIT ?1"
        ))?;
        let w = RawReview::WIDTH;
        let raws = stmt
          .query_map(params![limit], |row| {
            Ok((
              RawReview::from_row(row)?,
              row.get::<_, Option<String>>(w)?,
              row.get::<_, Option<String>>(w + 1)?,
              row.get::<_, Option<String>>(w + 2)?,
              row.get::<_, Option<String>>(w + 3)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        raws
          .into_iter()
          .map(|(raw, book_id, title, member_id, name)| {
            Ok(ReviewActivityRow {
              review: hydrate_review(conn, raw)?,
              book:   decode_book_ref(book_id, title)?,
              author: decode_member_ref(member_id, name)?,
            })
          })
          .collect()
      })
      .await
  }

  async fn recent_status_changes(
    &self,
    limit: usize,
  ) -> Result<Vec<StatusActivityRow>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    self
      .read(Lane::Statuses, move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {STATUS_COLUMNS}, m.member_id, m.name, b.book_id, b.title
           FROM reading_statuses s
           LEFT JOIN members m ON m.member_id = s.member_id
           LEFT JOIN books   b ON b.book_id   = s.book_id
           ORDER BY s.updated_at DESC, s.member_id, s.book_id
           LIMIT ?1"
        ))?;
        let w = RawReadingStatus::WIDTH;
        let raws = stmt
          .query_map(params![limit], |row| {
            Ok((
              RawReadingStatus::from_row(row)?,
              row.get::<_, Option<String>>(w)?,
              row.get::<_, Option<String>>(w + 1)?,
              row.get::<_, Option<String>>(w + 2)?,
              row.get::<_, Option<String>>(w + 3)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        raws
          .into_iter()
          .map(|(raw, member_id, name, book_id, title)| {
            Ok(StatusActivityRow {
              status: raw.into_status()?,
              member: decode_member_ref(member_id, name)?,
              book:   decode_book_ref(book_id, title)?,
            })
          })
          .collect()
      })
      .await
  }

  async fn meetings_between(
    &self,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
  ) -> Result<Vec<MeetingActivityRow>> {
    self
      .read(Lane::Meetings, move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MEETING_COLUMNS}, b.book_id, b.title
           FROM meetings m
           LEFT JOIN books b ON b.book_id = m.book_id
           WHERE m.date BETWEEN ?1 AND ?2
           ORDER BY m.date DESC, m.meeting_id DESC"
        ))?;
        let w = RawMeeting::WIDTH;
        let raws = stmt
          .query_map(params![encode_dt(from), encode_dt(to)], |row| {
            Ok((
              RawMeeting::from_row(row)?,
              row.get::<_, Option<String>>(w)?,
              row.get::<_, Option<String>>(w + 1)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        raws
          .into_iter()
          .map(|(raw, book_id, title)| {
            Ok(MeetingActivityRow {
              meeting: hydrate_meeting(conn, raw)?,
              book:    decode_book_ref(book_id, title)?,
            })
          })
          .collect()
      })
      .await
  }
}
