//! The `RoundStore` trait and the draw commit payload.
//!
//! The trait is implemented by storage backends (e.g.
//! `rondo-store-sqlite`). The engine depends on this abstraction, not on
//! any concrete backend.

use std::{collections::HashMap, future::Future};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  assignment::Assignment,
  pair::{Pair, PairHistoryRecord},
};

// ─── Write payload ───────────────────────────────────────────────────────────

/// Everything a successful draw persists, applied as one atomic unit.
///
/// `cleared` is applied before `chosen`, so a pair may appear in both (a
/// giver whose cycle restarts and who then re-draws a previous receiver).
#[derive(Debug, Clone)]
pub struct DrawCommit {
  pub round_id:    Uuid,
  /// Pairs whose `used_in_cycle` flag is cleared (cycle restarts).
  pub cleared:     Vec<Pair>,
  /// The drawn giver→receiver pairs: marked used-in-cycle, lifetime count
  /// incremented, timestamped.
  pub chosen:      Vec<Pair>,
  pub assigned_at: DateTime<Utc>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over Rondo's persistent state: the global pair history plus
/// per-round exclusions and assignments.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait RoundStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Pair history (global across rounds) ───────────────────────────────

  /// Lazily create a history row for every ordered pair over
  /// `participants`. Existing rows are left untouched.
  fn ensure_pairs<'a>(
    &'a self,
    participants: &'a [Uuid],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Snapshot the history rows for every ordered pair over `participants`.
  fn pair_history<'a>(
    &'a self,
    participants: &'a [Uuid],
  ) -> impl Future<Output = Result<HashMap<Pair, PairHistoryRecord>, Self::Error>>
  + Send
  + 'a;

  /// Apply a successful draw in one transaction: cycle clears, used marks
  /// and counter increments, and wholesale replacement of the round's
  /// assignments. Must be all-or-nothing.
  fn commit_draw(
    &self,
    commit: DrawCommit,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Assignments ───────────────────────────────────────────────────────

  /// The committed assignments for a round, if any, ordered by giver.
  fn assignments(
    &self,
    round_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Assignment>, Self::Error>> + Send + '_;

  /// Mark a giver's assignment as revealed — the only mutation an
  /// assignment sees after the draw that created it.
  fn set_revealed(
    &self,
    round_id: Uuid,
    giver: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Exclusions ────────────────────────────────────────────────────────

  /// Replace the round's stored exclusion set wholesale.
  fn replace_exclusions<'a>(
    &'a self,
    round_id: Uuid,
    pairs: &'a [Pair],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// The round's stored exclusion set.
  fn exclusions(
    &self,
    round_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Pair>, Self::Error>> + Send + '_;

  /// Delete stored exclusions that reference a participant no longer in
  /// the round.
  fn prune_participant(
    &self,
    round_id: Uuid,
    participant: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
