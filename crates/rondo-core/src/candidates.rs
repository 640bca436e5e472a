//! History-aware candidate lists and per-giver cycle resets.
//!
//! Works against an in-memory history snapshot and never mutates it: resets
//! are *returned* as a list of pairs to clear, and applied only when a draw
//! actually commits. A failed or abandoned draw therefore leaves the pair
//! history untouched.

use std::collections::HashMap;

use uuid::Uuid;

use crate::pair::{Pair, PairHistoryRecord};

/// The solver input for one draw attempt, plus the history clears it
/// implies.
#[derive(Debug, Clone)]
pub struct CandidatePlan {
  /// giver → receivers eligible for the next draw.
  pub eligible: HashMap<Uuid, Vec<Uuid>>,
  /// Pairs whose `used_in_cycle` flag must be cleared when the draw
  /// commits (cycle restarts).
  pub cleared:  Vec<Pair>,
}

/// Filter each giver's structural receivers down to those not yet used in
/// the giver's current cycle, restarting the cycle for any giver who has
/// exhausted every option.
///
/// Resets are per giver, not global: a giver who has been through everyone
/// starts over immediately while the others keep their accumulated
/// history, which maximises variety over time.
pub fn build(
  structural: &HashMap<Uuid, Vec<Uuid>>,
  history: &HashMap<Pair, PairHistoryRecord>,
) -> CandidatePlan {
  let mut eligible = HashMap::with_capacity(structural.len());
  let mut cleared = Vec::new();

  for (&giver, receivers) in structural {
    let mut open: Vec<Uuid> = receivers
      .iter()
      .copied()
      .filter(|&r| !used_in_cycle(history, giver, r))
      .collect();

    if open.is_empty() && !receivers.is_empty() {
      cleared
        .extend(receivers.iter().map(|&r| Pair { giver, receiver: r }));
      open = receivers.clone();
    }

    eligible.insert(giver, open);
  }

  CandidatePlan { eligible, cleared }
}

fn used_in_cycle(
  history: &HashMap<Pair, PairHistoryRecord>,
  giver: Uuid,
  receiver: Uuid,
) -> bool {
  history
    .get(&Pair { giver, receiver })
    .is_some_and(|rec| rec.used_in_cycle)
}
