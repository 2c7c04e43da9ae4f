//! Error type for `bookclub-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain failure detected by the store (not found, duplicate, full...).
  #[error(transparent)]
  Core(#[from] bookclub_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unexpected column value: {0}")]
  Decode(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for bookclub_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(core) => core,
      other => bookclub_core::Error::store(other),
    }
  }
}
