//! Committed draw results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One giver's committed assignment within a round.
///
/// Keyed by (round, giver); the full set for a round is a derangement over
/// that round's participant pool. Once committed, the only mutation is the
/// reveal step — a re-draw replaces the round's set wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
  pub round_id:    Uuid,
  pub giver:       Uuid,
  pub receiver:    Uuid,
  /// Set once the giver has looked at who they drew.
  pub revealed:    bool,
  pub assigned_at: DateTime<Utc>,
}
