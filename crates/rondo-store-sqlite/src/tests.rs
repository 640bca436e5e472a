//! Integration tests for `SqliteStore` against an in-memory database,
//! driving the full engine the way the round-lifecycle layer does.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Utc;
use rand::{SeedableRng, rngs::StdRng};
use rondo_core::{
  engine::{Engine, EngineError},
  pair::Pair,
  store::{DrawCommit, RoundStore},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn engine() -> Engine<SqliteStore> {
  Engine::new(SqliteStore::open_in_memory().await.expect("in-memory store"))
}

fn uid(n: u128) -> Uuid { Uuid::from_u128(n) }

fn pool(n: u128) -> Vec<Uuid> { (1..=n).map(uid).collect() }

fn pair(g: u128, r: u128) -> Pair {
  Pair { giver: uid(g), receiver: uid(r) }
}

fn assert_derangement(ids: &[Uuid], mapping: &BTreeMap<Uuid, Uuid>) {
  assert_eq!(mapping.len(), ids.len());
  let receivers: HashSet<Uuid> = mapping.values().copied().collect();
  assert_eq!(receivers.len(), ids.len());
  for (g, r) in mapping {
    assert_ne!(g, r);
    assert!(ids.contains(r));
  }
}

// ─── Pair history ────────────────────────────────────────────────────────────

#[tokio::test]
async fn ensure_pairs_creates_fresh_rows_once() {
  let e = engine().await;
  let ids = pool(3);

  e.store().ensure_pairs(&ids).await.unwrap();
  let history = e.store().pair_history(&ids).await.unwrap();
  assert_eq!(history.len(), 6);
  for record in history.values() {
    assert!(!record.used_in_cycle);
    assert_eq!(record.total_count, 0);
    assert!(record.last_assigned_at.is_none());
  }

  // Idempotent: a second call leaves existing rows untouched.
  e.store()
    .commit_draw(DrawCommit {
      round_id:    Uuid::new_v4(),
      cleared:     vec![],
      chosen:      vec![pair(1, 2)],
      assigned_at: Utc::now(),
    })
    .await
    .unwrap();
  e.store().ensure_pairs(&ids).await.unwrap();

  let history = e.store().pair_history(&ids).await.unwrap();
  assert_eq!(history.len(), 6);
  assert_eq!(history[&pair(1, 2)].total_count, 1);
  assert!(history[&pair(1, 2)].used_in_cycle);
}

#[tokio::test]
async fn empty_pool_reads_an_empty_history() {
  // The trait methods are callable outside the engine's validation path.
  let e = engine().await;
  e.store().ensure_pairs(&[]).await.unwrap();
  assert!(e.store().pair_history(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn commit_draw_marks_counts_and_timestamps() {
  let e = engine().await;
  let ids = pool(2);
  let round = Uuid::new_v4();

  let mut rng = StdRng::seed_from_u64(1);
  e.draw_with_rng(round, &ids, &[], &mut rng).await.unwrap();

  let history = e.store().pair_history(&ids).await.unwrap();
  // n = 2 forces the swap both ways.
  for p in [pair(1, 2), pair(2, 1)] {
    assert!(history[&p].used_in_cycle);
    assert_eq!(history[&p].total_count, 1);
    assert!(history[&p].last_assigned_at.is_some());
  }
}

#[tokio::test]
async fn two_participants_cycle_resets_every_draw() {
  // With one possible receiver each, every draw exhausts the cycle and
  // the next one restarts it; the lifetime counter keeps growing.
  let e = engine().await;
  let ids = pool(2);

  let mut rng = StdRng::seed_from_u64(2);
  for expected in 1..=3u64 {
    let round = Uuid::new_v4();
    let mapping = e.draw_with_rng(round, &ids, &[], &mut rng).await.unwrap();
    assert_eq!(mapping[&uid(1)], uid(2));
    assert_eq!(mapping[&uid(2)], uid(1));

    let history = e.store().pair_history(&ids).await.unwrap();
    assert_eq!(history[&pair(1, 2)].total_count, expected);
    assert!(history[&pair(1, 2)].used_in_cycle);
  }
}

// ─── Draw scenarios ──────────────────────────────────────────────────────────

#[tokio::test]
async fn three_participants_draw_a_valid_cycle() {
  // {1,2,3} with no exclusions — always one of the two 3-cycles.
  let e = engine().await;
  let ids = pool(3);

  let mut rng = StdRng::seed_from_u64(3);
  for _ in 0..10 {
    let round = Uuid::new_v4();
    let mapping = e.draw_with_rng(round, &ids, &[], &mut rng).await.unwrap();
    assert_derangement(&ids, &mapping);

    let a = mapping[&uid(1)];
    let expected_next = if a == uid(2) { uid(3) } else { uid(2) };
    assert_eq!(mapping[&a], expected_next);
  }
}

#[tokio::test]
async fn starved_giver_fails_validation() {
  // {1,2} with (1,2) excluded — giver 1 has nobody left.
  let e = engine().await;

  let err = e
    .draw(Uuid::new_v4(), &pool(2), &[pair(1, 2)])
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    EngineError::Constraint(rondo_core::Error::NoEligibleReceivers(g))
      if g == uid(1)
  ));
}

#[tokio::test]
async fn mutual_block_still_draws() {
  // {1,2,3,4} with 1 and 2 blocking each other stays solvable.
  let e = engine().await;
  let ids = pool(4);
  let exclusions = [pair(1, 2), pair(2, 1)];

  let mut rng = StdRng::seed_from_u64(4);
  let round = Uuid::new_v4();
  let mapping = e
    .draw_with_rng(round, &ids, &exclusions, &mut rng)
    .await
    .unwrap();

  assert_derangement(&ids, &mapping);
  assert_ne!(mapping[&uid(1)], uid(2));
  assert_ne!(mapping[&uid(2)], uid(1));
}

#[tokio::test]
async fn exhausted_pool_resets_per_giver_and_draws() {
  // Every ordered pair of {1,2,3} is already used in-cycle; the
  // draw must restart each giver's rotation and still produce a valid
  // derangement from the re-opened options.
  let e = engine().await;
  let ids = pool(3);

  // Seed both 3-cycles as separate valid draws so every ordered pair is
  // marked used without putting one giver twice in a single round.
  let cycles =
    [vec![pair(1, 2), pair(2, 3), pair(3, 1)], vec![pair(1, 3), pair(3, 2), pair(2, 1)]];
  for chosen in cycles {
    e.store()
      .commit_draw(DrawCommit {
        round_id: Uuid::new_v4(),
        cleared: vec![],
        chosen,
        assigned_at: Utc::now(),
      })
      .await
      .unwrap();
  }

  let mut rng = StdRng::seed_from_u64(5);
  let round = Uuid::new_v4();
  let mapping = e.draw_with_rng(round, &ids, &[], &mut rng).await.unwrap();
  assert_derangement(&ids, &mapping);

  // Only the freshly drawn pairs are marked in the new cycles.
  let history = e.store().pair_history(&ids).await.unwrap();
  for (p, record) in &history {
    assert_eq!(record.used_in_cycle, mapping[&p.giver] == p.receiver);
  }
}

#[tokio::test]
async fn concurrent_draws_for_two_rounds_share_history_safely() {
  // Two rounds over the same pool drawn concurrently, with identically
  // seeded rngs so an unserialized interleaving would pick the same
  // pairs twice. The draws must apply one after the other: the second
  // has to see the first's marks and avoid its pairs.
  let e = engine().await;
  let ids = pool(3);
  let round_a = Uuid::new_v4();
  let round_b = Uuid::new_v4();

  let mut rng_a = StdRng::seed_from_u64(42);
  let mut rng_b = StdRng::seed_from_u64(42);
  let (first, second) = tokio::join!(
    e.draw_with_rng(round_a, &ids, &[], &mut rng_a),
    e.draw_with_rng(round_b, &ids, &[], &mut rng_b),
  );
  let first = first.unwrap();
  let second = second.unwrap();
  assert_derangement(&ids, &first);
  assert_derangement(&ids, &second);

  // No pair repeats within the opening cycle.
  for &g in &ids {
    assert_ne!(first[&g], second[&g]);
  }
  let history = e.store().pair_history(&ids).await.unwrap();
  for record in history.values() {
    assert!(record.total_count <= 1);
  }
}

#[tokio::test]
async fn rotation_never_repeats_before_exhaustion() {
  // Draw repeatedly over a fixed pool and check, per giver, that no
  // receiver repeats until all n−1 receivers have been used once.
  let e = engine().await;
  let ids = pool(4);

  let mut sequences: HashMap<Uuid, Vec<Uuid>> =
    ids.iter().map(|&g| (g, vec![])).collect();

  let mut rng = StdRng::seed_from_u64(6);
  for _ in 0..12 {
    let round = Uuid::new_v4();
    let mapping = e.draw_with_rng(round, &ids, &[], &mut rng).await.unwrap();
    assert_derangement(&ids, &mapping);
    for (&g, &r) in &mapping {
      sequences.get_mut(&g).unwrap().push(r);
    }
  }

  for (giver, receivers) in &sequences {
    let mut used: HashSet<Uuid> = HashSet::new();
    for &r in receivers {
      if used.len() == ids.len() - 1 {
        used.clear();
      }
      assert!(
        used.insert(r),
        "giver {giver} repeated {r} before exhausting their options"
      );
    }
  }
}

// ─── Assignments ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn redraw_replaces_the_rounds_assignments() {
  let e = engine().await;
  let ids = pool(4);
  let round = Uuid::new_v4();

  let mut rng = StdRng::seed_from_u64(7);
  e.draw_with_rng(round, &ids, &[], &mut rng).await.unwrap();
  let second = e.draw_with_rng(round, &ids, &[], &mut rng).await.unwrap();

  let rows = e.store().assignments(round).await.unwrap();
  assert_eq!(rows.len(), 4);
  for row in &rows {
    assert_eq!(row.round_id, round);
    assert_eq!(second[&row.giver], row.receiver);
    assert!(!row.revealed);
  }
}

#[tokio::test]
async fn reveal_flips_only_the_named_giver() {
  let e = engine().await;
  let ids = pool(3);
  let round = Uuid::new_v4();

  let mut rng = StdRng::seed_from_u64(8);
  e.draw_with_rng(round, &ids, &[], &mut rng).await.unwrap();

  e.store().set_revealed(round, uid(2)).await.unwrap();

  let rows = e.store().assignments(round).await.unwrap();
  for row in &rows {
    assert_eq!(row.revealed, row.giver == uid(2));
  }
}

#[tokio::test]
async fn reveal_without_assignment_errors() {
  let e = engine().await;
  let round = Uuid::new_v4();

  let err = e.store().set_revealed(round, uid(1)).await.unwrap_err();
  assert!(matches!(
    err,
    crate::Error::AssignmentNotFound { round_id, giver }
      if round_id == round && giver == uid(1)
  ));
}

// ─── Exclusions ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn save_exclusions_roundtrips() {
  let e = engine().await;
  let round = Uuid::new_v4();
  let ids = pool(4);
  let pairs = [pair(1, 2), pair(2, 1), pair(3, 4)];

  e.save_exclusions(round, &ids, &pairs).await.unwrap();

  let stored = e.store().exclusions(round).await.unwrap();
  assert_eq!(stored.len(), 3);
  for p in &pairs {
    assert!(stored.contains(p));
  }

  // A later save replaces the set wholesale.
  e.save_exclusions(round, &ids, &[pair(1, 3)]).await.unwrap();
  assert_eq!(e.store().exclusions(round).await.unwrap(), vec![pair(1, 3)]);
}

#[tokio::test]
async fn unsolvable_edit_is_rejected_and_not_stored() {
  let e = engine().await;
  let round = Uuid::new_v4();

  let err = e
    .save_exclusions(round, &pool(2), &[pair(2, 1)])
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    EngineError::Constraint(rondo_core::Error::NoEligibleReceivers(_))
  ));
  assert!(e.store().exclusions(round).await.unwrap().is_empty());
}

#[tokio::test]
async fn removed_participant_prunes_their_exclusions() {
  let e = engine().await;
  let round = Uuid::new_v4();
  let ids = pool(4);

  e.save_exclusions(round, &ids, &[pair(1, 2), pair(3, 1), pair(3, 4)])
    .await
    .unwrap();
  e.on_participant_removed(round, uid(1)).await.unwrap();

  assert_eq!(e.store().exclusions(round).await.unwrap(), vec![pair(3, 4)]);
}

#[tokio::test]
async fn draw_respects_stored_exclusions_across_draws() {
  let e = engine().await;
  let ids = pool(4);
  let round = Uuid::new_v4();
  let exclusions = [pair(1, 2), pair(2, 1)];
  e.save_exclusions(round, &ids, &exclusions).await.unwrap();

  let mut rng = StdRng::seed_from_u64(9);
  for _ in 0..8 {
    let stored = e.store().exclusions(round).await.unwrap();
    let mapping =
      e.draw_with_rng(round, &ids, &stored, &mut rng).await.unwrap();
    assert_derangement(&ids, &mapping);
    assert_ne!(mapping[&uid(1)], uid(2));
    assert_ne!(mapping[&uid(2)], uid(1));
  }
}
