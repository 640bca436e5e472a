//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Booleans are SQLite integers.

use chrono::{DateTime, Utc};
use rondo_core::{
  assignment::Assignment,
  pair::{Pair, PairHistoryRecord},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc>
// ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `pair_history` row.
pub struct RawHistoryRow {
  pub giver:            String,
  pub receiver:         String,
  pub used_in_cycle:    bool,
  pub total_count:      i64,
  pub last_assigned_at: Option<String>,
}

impl RawHistoryRow {
  pub fn into_entry(self) -> Result<(Pair, PairHistoryRecord)> {
    let pair = Pair {
      giver:    decode_uuid(&self.giver)?,
      receiver: decode_uuid(&self.receiver)?,
    };
    let record = PairHistoryRecord {
      used_in_cycle:    self.used_in_cycle,
      total_count:      self.total_count as u64,
      last_assigned_at: self
        .last_assigned_at
        .as_deref()
        .map(decode_dt)
        .transpose()?,
    };
    Ok((pair, record))
  }
}

/// Raw strings read directly from an `assignments` row.
pub struct RawAssignment {
  pub round_id:    String,
  pub giver:       String,
  pub receiver:    String,
  pub revealed:    bool,
  pub assigned_at: String,
}

impl RawAssignment {
  pub fn into_assignment(self) -> Result<Assignment> {
    Ok(Assignment {
      round_id:    decode_uuid(&self.round_id)?,
      giver:       decode_uuid(&self.giver)?,
      receiver:    decode_uuid(&self.receiver)?,
      revealed:    self.revealed,
      assigned_at: decode_dt(&self.assigned_at)?,
    })
  }
}

/// Raw strings read directly from an `exclusions` row.
pub struct RawExclusion {
  pub giver:    String,
  pub receiver: String,
}

impl RawExclusion {
  pub fn into_pair(self) -> Result<Pair> {
    Ok(Pair {
      giver:    decode_uuid(&self.giver)?,
      receiver: decode_uuid(&self.receiver)?,
    })
  }
}
