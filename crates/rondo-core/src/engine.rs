//! Draw orchestration: validate, build, solve, retry, commit.

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Error,
  candidates,
  feasibility::{structural_candidates, validate_exclusions},
  pair::Pair,
  solver,
  store::{DrawCommit, RoundStore},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// A draw either hits a constraint failure (pure, side-effect free) or a
/// storage fault from the backend.
#[derive(Debug, thiserror::Error)]
pub enum EngineError<E> {
  #[error(transparent)]
  Constraint(#[from] Error),

  #[error("store error: {0}")]
  Store(E),
}

pub type EngineResult<T, E> = Result<T, EngineError<E>>;

// ─── Engine ──────────────────────────────────────────────────────────────────

/// The assignment engine, generic over its storage backend.
///
/// The caller (the round-lifecycle layer) owns phase enforcement and
/// per-round serialization; the engine assumes each call runs as a single
/// logical operation.
pub struct Engine<S> {
  store:     S,
  /// Serializes each draw's history read-modify-write. Rotation state is
  /// global across rounds, so concurrent draws for different rounds that
  /// share participants must not interleave between the history snapshot
  /// and the commit.
  draw_lock: Mutex<()>,
}

impl<S: RoundStore> Engine<S> {
  pub fn new(store: S) -> Self {
    Self { store, draw_lock: Mutex::new(()) }
  }

  pub fn store(&self) -> &S { &self.store }

  /// Validate and persist a round's exclusion configuration, rejecting
  /// edits that would make the round unsolvable.
  pub async fn save_exclusions(
    &self,
    round_id: Uuid,
    participants: &[Uuid],
    exclusions: &[Pair],
  ) -> EngineResult<(), S::Error> {
    validate_exclusions(participants, exclusions)?;
    self
      .store
      .replace_exclusions(round_id, exclusions)
      .await
      .map_err(EngineError::Store)
  }

  /// Prune stored exclusions that reference a participant who left the
  /// round, keeping the configuration consistent with the current pool.
  pub async fn on_participant_removed(
    &self,
    round_id: Uuid,
    participant: Uuid,
  ) -> EngineResult<(), S::Error> {
    self
      .store
      .prune_participant(round_id, participant)
      .await
      .map_err(EngineError::Store)
  }

  /// Draw the round: produce and commit a full giver→receiver assignment.
  pub async fn draw(
    &self,
    round_id: Uuid,
    participants: &[Uuid],
    exclusions: &[Pair],
  ) -> EngineResult<BTreeMap<Uuid, Uuid>, S::Error> {
    self
      .draw_with_rng(round_id, participants, exclusions, &mut StdRng::from_entropy())
      .await
  }

  /// Like [`draw`](Self::draw), with a caller-supplied rng so tests can
  /// seed the shuffle.
  pub async fn draw_with_rng(
    &self,
    round_id: Uuid,
    participants: &[Uuid],
    exclusions: &[Pair],
    rng: &mut (impl Rng + Send),
  ) -> EngineResult<BTreeMap<Uuid, Uuid>, S::Error> {
    // Final feasibility guard; everything up to the commit is read-only.
    validate_exclusions(participants, exclusions)?;

    // Hold the lock from snapshot through commit: another draw must not
    // observe the pre-draw history and re-mark the same pairs.
    let _guard = self.draw_lock.lock().await;

    self
      .store
      .ensure_pairs(participants)
      .await
      .map_err(EngineError::Store)?;
    let history = self
      .store
      .pair_history(participants)
      .await
      .map_err(EngineError::Store)?;

    let exclusions: HashSet<Pair> = exclusions.iter().copied().collect();
    let structural = structural_candidates(participants, &exclusions);

    let plan = candidates::build(&structural, &history);
    debug!(
      %round_id,
      resets = plan.cleared.len(),
      "built history-aware candidates"
    );

    let (mapping, cleared) = match solver::solve(&plan.eligible, rng) {
      Some(mapping) => (mapping, plan.cleared),
      None => {
        // The per-giver filtered sets can deadlock jointly even though
        // each giver has options. Restart every rotation among this pool
        // and retry once against the purely structural map.
        warn!(%round_id, "history deadlock, resetting all cycles for pool");
        let cleared = full_reset(participants);
        match solver::solve(&structural, rng) {
          Some(mapping) => (mapping, cleared),
          // The upfront feasibility check makes this unreachable; surface
          // it as infeasible without touching any state.
          None => return Err(Error::Infeasible.into()),
        }
      }
    };

    let chosen: Vec<Pair> = mapping
      .iter()
      .map(|(&giver, &receiver)| Pair { giver, receiver })
      .collect();
    self
      .store
      .commit_draw(DrawCommit {
        round_id,
        cleared,
        chosen,
        assigned_at: Utc::now(),
      })
      .await
      .map_err(EngineError::Store)?;

    info!(%round_id, participants = participants.len(), "draw committed");
    Ok(mapping.into_iter().collect())
  }
}

/// Every ordered pair over the pool, for the full-reset fallback.
fn full_reset(participants: &[Uuid]) -> Vec<Pair> {
  participants
    .iter()
    .flat_map(|&giver| {
      participants
        .iter()
        .filter(move |&&r| r != giver)
        .map(move |&receiver| Pair { giver, receiver })
    })
    .collect()
}
