//! Error types for `rondo-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
  #[error("a round needs at least 2 participants, got {0}")]
  TooFewParticipants(usize),

  #[error("duplicate participant: {0}")]
  DuplicateParticipant(Uuid),

  #[error("exclusion references a participant outside the pool: {0}")]
  UnknownParticipant(Uuid),

  #[error("a pair cannot map a participant to themselves: {0}")]
  SelfPair(Uuid),

  /// Every other participant is excluded for this giver.
  #[error("participant {0} has no eligible receivers")]
  NoEligibleReceivers(Uuid),

  /// Each giver has options, but no complete assignment exists jointly.
  #[error("exclusions leave no complete assignment for this round")]
  Infeasible,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
