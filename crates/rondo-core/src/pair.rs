//! Ordered giver→receiver pairs and their rotation history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// An ordered (giver, receiver) pair with `giver != receiver`.
///
/// The same type is used for exclusions and for history keys; direction
/// matters in both (blocking A→B says nothing about B→A).
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize,
)]
pub struct Pair {
  pub giver:    Uuid,
  pub receiver: Uuid,
}

impl Pair {
  /// Build a pair, rejecting self-pairs.
  pub fn new(giver: Uuid, receiver: Uuid) -> Result<Self> {
    if giver == receiver {
      return Err(Error::SelfPair(giver));
    }
    Ok(Self { giver, receiver })
  }
}

/// Rotation history for one ordered pair.
///
/// Rows are global across rounds — that is what makes the rotation
/// meaningful over time. They are created lazily the first time both
/// participants co-occur in a round's pool and are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairHistoryRecord {
  /// True once this pair has been assigned since the giver's last cycle
  /// reset.
  pub used_in_cycle:    bool,
  /// Lifetime number of times this pair has been assigned.
  pub total_count:      u64,
  pub last_assigned_at: Option<DateTime<Utc>>,
}

impl Default for PairHistoryRecord {
  fn default() -> Self {
    Self {
      used_in_cycle:    false,
      total_count:      0,
      last_assigned_at: None,
    }
  }
}
