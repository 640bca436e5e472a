//! Backtracking search for a constrained derangement.
//!
//! Givers are processed most-constrained-first (fewest candidates), the
//! standard fail-fast ordering for this kind of matching search. Candidate
//! order is shuffled through the injected rng so repeated draws over
//! identical inputs vary; which solution is returned is nondeterministic,
//! whether one is found is not.

use std::collections::{HashMap, HashSet};

use rand::{Rng, seq::SliceRandom};
use uuid::Uuid;

/// Find a bijective giver→receiver mapping using only the listed
/// candidates. Returns `None` when no complete mapping exists.
pub fn solve(
  candidates: &HashMap<Uuid, Vec<Uuid>>,
  rng: &mut impl Rng,
) -> Option<HashMap<Uuid, Uuid>> {
  let mut order: Vec<Uuid> = candidates.keys().copied().collect();
  order.sort_unstable_by_key(|g| (candidates[g].len(), *g));

  let mut claimed = HashSet::with_capacity(order.len());
  let mut chosen = HashMap::with_capacity(order.len());

  if assign(&order, candidates, &mut claimed, &mut chosen, rng) {
    Some(chosen)
  } else {
    None
  }
}

/// Try every unclaimed candidate for the next giver in `order`, rolling the
/// claimed set back on backtrack.
fn assign(
  order: &[Uuid],
  candidates: &HashMap<Uuid, Vec<Uuid>>,
  claimed: &mut HashSet<Uuid>,
  chosen: &mut HashMap<Uuid, Uuid>,
  rng: &mut impl Rng,
) -> bool {
  let Some((&giver, rest)) = order.split_first() else {
    return true;
  };

  let mut open: Vec<Uuid> = candidates[&giver]
    .iter()
    .copied()
    .filter(|r| !claimed.contains(r))
    .collect();
  open.shuffle(rng);

  for receiver in open {
    claimed.insert(receiver);
    chosen.insert(giver, receiver);
    if assign(rest, candidates, claimed, chosen, rng) {
      return true;
    }
    claimed.remove(&receiver);
    chosen.remove(&giver);
  }

  false
}
