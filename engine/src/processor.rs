//! Seam to the game-processing collaborator.
//!
//! Rule adjudication (movement legality, combat resolution) is a separate
//! subsystem; the maintenance engine only tells it *that* a game reached
//! consensus or readiness. Implementations receive the transaction's working
//! tables so their effects commit or roll back with the per-game
//! transaction wrapping the call, and they are expected to be idempotent if
//! retried after a failed apply.

use crate::store::Tables;
use gambit_types::{GameId, ProcessError, Vote};

pub trait GameProcessor {
    /// Apply a unanimously agreed vote to a game.
    fn apply_vote(&mut self, tables: &mut Tables, game: GameId, vote: Vote)
        -> Result<(), ProcessError>;

    /// Advance a game whose members are all ready to the next phase.
    fn advance_phase(&mut self, tables: &mut Tables, game: GameId) -> Result<(), ProcessError>;
}
