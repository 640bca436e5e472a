//! Core types and assignment engine for the Rondo rotation.
//!
//! Rondo runs recurring rounds in which every participant is secretly
//! assigned one other participant to send a recommendation to. This crate
//! holds the constraint engine — feasibility checking, history-aware
//! candidate construction, the backtracking derangement solver, and draw
//! orchestration — and is deliberately free of database and transport
//! dependencies. Storage backends implement [`store::RoundStore`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod assignment;
pub mod candidates;
pub mod engine;
pub mod error;
pub mod feasibility;
pub mod pair;
pub mod solver;
pub mod store;

pub use error::{Error, Result};
