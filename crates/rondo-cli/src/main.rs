//! `rondo` admin binary.
//!
//! Drives the assignment engine against a SQLite file: configure a round's
//! exclusions, draw it, inspect and reveal assignments. Output is JSON so
//! results can be piped into other tooling.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use rand::{SeedableRng, rngs::StdRng};
use rondo_core::{
  engine::Engine,
  feasibility::validate_exclusions,
  pair::Pair,
  store::RoundStore as _,
};
use rondo_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "Rondo assignment rotation admin")]
struct Cli {
  /// Path to the SQLite database file.
  #[arg(long, default_value = "rondo.db")]
  db: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Check that a participant pool and exclusion set can produce a draw.
  Validate {
    /// Participant id; repeat for each member of the pool.
    #[arg(long = "participant", required = true)]
    participants: Vec<Uuid>,

    /// Forbidden pair as `giver:receiver`; repeatable.
    #[arg(long = "exclude", value_parser = parse_pair)]
    exclusions: Vec<Pair>,
  },

  /// Validate and save a round's exclusion configuration.
  SetExclusions {
    round: Uuid,

    #[arg(long = "participant", required = true)]
    participants: Vec<Uuid>,

    #[arg(long = "exclude", value_parser = parse_pair)]
    exclusions: Vec<Pair>,
  },

  /// Draw the round using its stored exclusions and print the committed
  /// giver→receiver map.
  Draw {
    round: Uuid,

    #[arg(long = "participant", required = true)]
    participants: Vec<Uuid>,

    /// Seed the shuffle for a reproducible draw.
    #[arg(long)]
    seed: Option<u64>,
  },

  /// List a round's committed assignments.
  Assignments { round: Uuid },

  /// Mark a giver's assignment as revealed.
  Reveal { round: Uuid, giver: Uuid },

  /// Prune stored exclusions that reference a removed participant.
  RemoveParticipant { round: Uuid, participant: Uuid },
}

/// Parse `giver:receiver` into an ordered pair.
fn parse_pair(s: &str) -> Result<Pair, String> {
  let (giver, receiver) = s
    .split_once(':')
    .ok_or_else(|| format!("expected giver:receiver, got {s:?}"))?;
  let giver = Uuid::parse_str(giver.trim()).map_err(|e| e.to_string())?;
  let receiver = Uuid::parse_str(receiver.trim()).map_err(|e| e.to_string())?;
  Pair::new(giver, receiver).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let store = SqliteStore::open(&cli.db)
    .await
    .with_context(|| format!("failed to open store at {}", cli.db.display()))?;
  let engine = Engine::new(store);

  match cli.command {
    Command::Validate { participants, exclusions } => {
      validate_exclusions(&participants, &exclusions)?;
      println!("ok");
    }

    Command::SetExclusions { round, participants, exclusions } => {
      engine
        .save_exclusions(round, &participants, &exclusions)
        .await
        .context("exclusion configuration rejected")?;
      println!("saved {} exclusion(s)", exclusions.len());
    }

    Command::Draw { round, participants, seed } => {
      let exclusions = engine
        .store()
        .exclusions(round)
        .await
        .context("failed to load stored exclusions")?;

      let mapping = match seed {
        Some(seed) => {
          let mut rng = StdRng::seed_from_u64(seed);
          engine
            .draw_with_rng(round, &participants, &exclusions, &mut rng)
            .await
        }
        None => engine.draw(round, &participants, &exclusions).await,
      }
      .context("draw failed")?;

      print_json(&mapping)?;
    }

    Command::Assignments { round } => {
      let rows = engine
        .store()
        .assignments(round)
        .await
        .context("failed to load assignments")?;
      print_json(&rows)?;
    }

    Command::Reveal { round, giver } => {
      engine
        .store()
        .set_revealed(round, giver)
        .await
        .context("reveal failed")?;
      println!("revealed");
    }

    Command::RemoveParticipant { round, participant } => {
      engine
        .on_participant_removed(round, participant)
        .await
        .context("prune failed")?;
      println!("pruned exclusions for {participant}");
    }
  }

  Ok(())
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
