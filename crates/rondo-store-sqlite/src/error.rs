//! Error type for `rondo-store-sqlite`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] rondo_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// Attempted to reveal an assignment that was never drawn.
  #[error("no assignment for giver {giver} in round {round_id}")]
  AssignmentNotFound { round_id: Uuid, giver: Uuid },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
