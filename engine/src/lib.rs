//! Gambit maintenance engine.
//!
//! The periodic, idempotent batch operations that keep derived per-user and
//! per-game aggregates consistent while live gameplay events accumulate in
//! the store: session reaping, trailing-year activity tracking, reliability
//! rating recalculation, vote consensus detection, and order readiness.
//!
//! ## Determinism requirements
//! - No wall-clock access inside the engine; "now" is always a parameter.
//! - No randomness; a tick's output is a function of the store and `now`.
//! - Iteration is over ordered tables, so outputs are stable across runs.
//!
//! ## Transactional discipline
//! Every component wraps its effects in a store transaction: a tick is
//! all-or-nothing per component, and vote/readiness application is one
//! transaction per game so unrelated games never share a failure domain.
//! The entrypoint for a full pass is [`run_tick`].

pub mod activity;
pub mod notices;
pub mod readiness;
pub mod reaper;
pub mod reliability;
pub mod tick;
pub mod votes;

mod processor;
mod store;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

#[cfg(test)]
mod tests;

pub use processor::GameProcessor;
pub use store::{Store, Tables, Transaction};

pub use activity::{incremental_update, recalculate_all, ActivitySummary};
pub use notices::clear_stale;
pub use readiness::find_ready;
pub use reaper::{reap, ReapConfig, ReapSummary, DEFAULT_IDLE_SECS};
pub use reliability::{recalculate, ReliabilitySummary};
pub use tick::{run_tick, TickConfig, TickReport};
pub use votes::{detect, resolve_votes, VoteOutcome, VoteResolution};
