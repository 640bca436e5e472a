//! [`SqliteStore`] — the SQLite implementation of [`RoundStore`].

use std::{collections::HashMap, path::Path};

use uuid::Uuid;

use rondo_core::{
  assignment::Assignment,
  pair::{Pair, PairHistoryRecord},
  store::{DrawCommit, RoundStore},
};

use crate::{
  Error, Result,
  encode::{
    RawAssignment, RawExclusion, RawHistoryRow, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Rondo round store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All calls
/// funnel through one connection, so draws on different rounds cannot
/// interleave on shared history rows.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── RoundStore impl ─────────────────────────────────────────────────────────

impl RoundStore for SqliteStore {
  type Error = Error;

  // ── Pair history ──────────────────────────────────────────────────────────

  async fn ensure_pairs(&self, participants: &[Uuid]) -> Result<()> {
    if participants.is_empty() {
      return Ok(());
    }
    let ids: Vec<String> =
      participants.iter().copied().map(encode_uuid).collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO pair_history (giver, receiver)
             VALUES (?1, ?2)",
          )?;
          for giver in &ids {
            for receiver in &ids {
              if giver != receiver {
                stmt.execute(rusqlite::params![giver, receiver])?;
              }
            }
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn pair_history(
    &self,
    participants: &[Uuid],
  ) -> Result<HashMap<Pair, PairHistoryRecord>> {
    // An empty pool would otherwise format an invalid `IN ()` clause.
    if participants.is_empty() {
      return Ok(HashMap::new());
    }
    let ids: Vec<String> =
      participants.iter().copied().map(encode_uuid).collect();

    let raws: Vec<RawHistoryRow> = self
      .conn
      .call(move |conn| {
        let placeholders =
          ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!(
          "SELECT giver, receiver, used_in_cycle, total_count,
                  last_assigned_at
           FROM pair_history
           WHERE giver IN ({placeholders})
             AND receiver IN ({placeholders})"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params_from_iter(ids.iter().chain(ids.iter())),
            |row| {
              Ok(RawHistoryRow {
                giver:            row.get(0)?,
                receiver:         row.get(1)?,
                used_in_cycle:    row.get(2)?,
                total_count:      row.get(3)?,
                last_assigned_at: row.get(4)?,
              })
            },
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawHistoryRow::into_entry).collect()
  }

  async fn commit_draw(&self, commit: DrawCommit) -> Result<()> {
    let round_str = encode_uuid(commit.round_id);
    let at_str = encode_dt(commit.assigned_at);
    let cleared: Vec<(String, String)> = commit
      .cleared
      .iter()
      .map(|p| (encode_uuid(p.giver), encode_uuid(p.receiver)))
      .collect();
    let chosen: Vec<(String, String)> = commit
      .chosen
      .iter()
      .map(|p| (encode_uuid(p.giver), encode_uuid(p.receiver)))
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          // Cycle restarts first; a restarted giver may re-draw a pair.
          let mut clear = tx.prepare(
            "UPDATE pair_history SET used_in_cycle = 0
             WHERE giver = ?1 AND receiver = ?2",
          )?;
          for (giver, receiver) in &cleared {
            clear.execute(rusqlite::params![giver, receiver])?;
          }

          let mut mark = tx.prepare(
            "INSERT INTO pair_history
               (giver, receiver, used_in_cycle, total_count, last_assigned_at)
             VALUES (?1, ?2, 1, 1, ?3)
             ON CONFLICT (giver, receiver) DO UPDATE SET
               used_in_cycle    = 1,
               total_count      = total_count + 1,
               last_assigned_at = excluded.last_assigned_at",
          )?;
          for (giver, receiver) in &chosen {
            mark.execute(rusqlite::params![giver, receiver, at_str])?;
          }

          // A re-draw replaces the round's assignment set wholesale.
          tx.execute(
            "DELETE FROM assignments WHERE round_id = ?1",
            rusqlite::params![round_str],
          )?;
          let mut insert = tx.prepare(
            "INSERT INTO assignments
               (round_id, giver, receiver, revealed, assigned_at)
             VALUES (?1, ?2, ?3, 0, ?4)",
          )?;
          for (giver, receiver) in &chosen {
            insert
              .execute(rusqlite::params![round_str, giver, receiver, at_str])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Assignments ───────────────────────────────────────────────────────────

  async fn assignments(&self, round_id: Uuid) -> Result<Vec<Assignment>> {
    let round_str = encode_uuid(round_id);

    let raws: Vec<RawAssignment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT round_id, giver, receiver, revealed, assigned_at
           FROM assignments
           WHERE round_id = ?1
           ORDER BY giver",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![round_str], |row| {
            Ok(RawAssignment {
              round_id:    row.get(0)?,
              giver:       row.get(1)?,
              receiver:    row.get(2)?,
              revealed:    row.get(3)?,
              assigned_at: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAssignment::into_assignment).collect()
  }

  async fn set_revealed(&self, round_id: Uuid, giver: Uuid) -> Result<()> {
    let round_str = encode_uuid(round_id);
    let giver_str = encode_uuid(giver);

    let updated = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE assignments SET revealed = 1
           WHERE round_id = ?1 AND giver = ?2",
          rusqlite::params![round_str, giver_str],
        )?;
        Ok(n)
      })
      .await?;

    if updated == 0 {
      return Err(Error::AssignmentNotFound { round_id, giver });
    }
    Ok(())
  }

  // ── Exclusions ────────────────────────────────────────────────────────────

  async fn replace_exclusions(
    &self,
    round_id: Uuid,
    pairs: &[Pair],
  ) -> Result<()> {
    let round_str = encode_uuid(round_id);
    let encoded: Vec<(String, String)> = pairs
      .iter()
      .map(|p| (encode_uuid(p.giver), encode_uuid(p.receiver)))
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          tx.execute(
            "DELETE FROM exclusions WHERE round_id = ?1",
            rusqlite::params![round_str],
          )?;
          let mut insert = tx.prepare(
            "INSERT INTO exclusions (round_id, giver, receiver)
             VALUES (?1, ?2, ?3)",
          )?;
          for (giver, receiver) in &encoded {
            insert.execute(rusqlite::params![round_str, giver, receiver])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn exclusions(&self, round_id: Uuid) -> Result<Vec<Pair>> {
    let round_str = encode_uuid(round_id);

    let raws: Vec<RawExclusion> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT giver, receiver FROM exclusions
           WHERE round_id = ?1
           ORDER BY giver, receiver",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![round_str], |row| {
            Ok(RawExclusion { giver: row.get(0)?, receiver: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawExclusion::into_pair).collect()
  }

  async fn prune_participant(
    &self,
    round_id: Uuid,
    participant: Uuid,
  ) -> Result<()> {
    let round_str = encode_uuid(round_id);
    let id_str = encode_uuid(participant);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM exclusions
           WHERE round_id = ?1 AND (giver = ?2 OR receiver = ?2)",
          rusqlite::params![round_str, id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
