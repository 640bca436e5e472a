//! Structural feasibility of a round's exclusion configuration.
//!
//! Feasibility is history-independent: it asks whether *any* complete
//! assignment can exist for this pool and exclusion set at all. It gates
//! every exclusion edit and runs again as the final guard before a draw.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::{Error, Result, pair::Pair, solver};

/// Candidate receivers ignoring history: everyone but the giver, minus the
/// giver's excluded receivers. Receiver order follows `participants` so
/// verdicts are reproducible.
pub(crate) fn structural_candidates(
  participants: &[Uuid],
  exclusions: &HashSet<Pair>,
) -> HashMap<Uuid, Vec<Uuid>> {
  participants
    .iter()
    .map(|&giver| {
      let receivers = participants
        .iter()
        .copied()
        .filter(|&r| r != giver && !exclusions.contains(&Pair { giver, receiver: r }))
        .collect();
      (giver, receivers)
    })
    .collect()
}

/// Decide whether a complete valid assignment can exist for this pool and
/// exclusion set. Never mutates anything; the verdict for a given input is
/// stable across calls.
///
/// Failure pinpoints a giver with zero eligible receivers when there is
/// one, and reports joint infeasibility (mutually exclusive cliques and the
/// like) otherwise.
pub fn validate_exclusions(
  participants: &[Uuid],
  exclusions: &[Pair],
) -> Result<()> {
  if participants.len() < 2 {
    return Err(Error::TooFewParticipants(participants.len()));
  }

  let mut pool = HashSet::with_capacity(participants.len());
  for &id in participants {
    if !pool.insert(id) {
      return Err(Error::DuplicateParticipant(id));
    }
  }

  for pair in exclusions {
    if pair.giver == pair.receiver {
      return Err(Error::SelfPair(pair.giver));
    }
    for id in [pair.giver, pair.receiver] {
      if !pool.contains(&id) {
        return Err(Error::UnknownParticipant(id));
      }
    }
  }

  let exclusions: HashSet<Pair> = exclusions.iter().copied().collect();
  let candidates = structural_candidates(participants, &exclusions);

  // Report the specific giver when one is starved outright.
  for &giver in participants {
    if candidates[&giver].is_empty() {
      return Err(Error::NoEligibleReceivers(giver));
    }
  }

  match solver::solve(&candidates, &mut rand::thread_rng()) {
    Some(_) => Ok(()),
    None => Err(Error::Infeasible),
  }
}
