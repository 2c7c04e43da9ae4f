//! SQL schema for the book club SQLite store.
//!
//! Executed once at connection startup; `PRAGMA user_version` records the
//! revision for future migrations.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// References from reviews, statuses and meetings to books and members are
/// soft (no foreign keys), as in a document store: deleting a book leaves
/// them dangling and readers must cope. Only owned child rows (likes,
/// attendees) cascade with their parent.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS members (
    member_id   TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    role        TEXT NOT NULL,             -- 'member' | 'admin'
    approved    INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL
);

-- average_rating / review_count are a materialised view of `reviews`,
-- written only by the rating refresh.
CREATE TABLE IF NOT EXISTS books (
    book_id         TEXT PRIMARY KEY,
    title           TEXT NOT NULL,
    author          TEXT NOT NULL,
    average_rating  REAL NOT NULL DEFAULT 0,
    review_count    INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS reviews (
    review_id   TEXT PRIMARY KEY,
    book_id     TEXT NOT NULL,
    author_id   TEXT NOT NULL,
    rating      INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
    title       TEXT,
    content     TEXT NOT NULL,
    spoilers    INTEGER NOT NULL DEFAULT 0,
    like_count  INTEGER NOT NULL DEFAULT 0,   -- always COUNT(review_likes)
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    UNIQUE (book_id, author_id)
);

CREATE TABLE IF NOT EXISTS review_likes (
    review_id   TEXT NOT NULL REFERENCES reviews(review_id) ON DELETE CASCADE,
    member_id   TEXT NOT NULL,
    liked_at    TEXT NOT NULL,
    PRIMARY KEY (review_id, member_id)
);

CREATE TABLE IF NOT EXISTS meetings (
    meeting_id     TEXT PRIMARY KEY,
    title          TEXT NOT NULL,
    book_id        TEXT,
    date           TEXT NOT NULL,
    location       TEXT,
    notes          TEXT,
    status         TEXT NOT NULL DEFAULT 'upcoming'
                   CHECK (status IN ('upcoming', 'past', 'cancelled')),
    max_attendees  INTEGER NOT NULL DEFAULT 0 CHECK (max_attendees >= 0),
    created_at     TEXT NOT NULL
);

-- The primary key makes a duplicate attendee unrepresentable.
CREATE TABLE IF NOT EXISTS meeting_attendees (
    meeting_id  TEXT NOT NULL REFERENCES meetings(meeting_id) ON DELETE CASCADE,
    member_id   TEXT NOT NULL,
    joined_at   TEXT NOT NULL,
    PRIMARY KEY (meeting_id, member_id)
);

CREATE TABLE IF NOT EXISTS reading_statuses (
    member_id    TEXT NOT NULL,
    book_id      TEXT NOT NULL,
    status       TEXT NOT NULL,   -- 'to-read' | 'currently-reading' | 'read'
    started_at   TEXT,
    finished_at  TEXT,
    notes        TEXT,
    updated_at   TEXT NOT NULL,
    PRIMARY KEY (member_id, book_id)
);

CREATE INDEX IF NOT EXISTS reviews_book_idx       ON reviews(book_id);
CREATE INDEX IF NOT EXISTS reviews_created_idx    ON reviews(created_at);
CREATE INDEX IF NOT EXISTS meetings_date_idx      ON meetings(date);
CREATE INDEX IF NOT EXISTS statuses_updated_idx   ON reading_statuses(updated_at);

PRAGMA user_version = 1;
";
