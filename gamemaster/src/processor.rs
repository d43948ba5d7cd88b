//! A minimal game processor for the daemon.
//!
//! Real adjudication (movement legality, combat resolution) belongs to a
//! separate subsystem; this processor applies only the state changes the
//! maintenance engine is owed: terminal votes finish the game, pauses
//! consume the pause votes, and a phase advance rotates the season and
//! resets order state.

use gambit_engine::{GameProcessor, Tables};
use gambit_types::{GameId, GamePhase, OrderSet, ProcessError, Vote};
use tracing::info;

#[derive(Debug, Default)]
pub struct LoggingProcessor;

impl GameProcessor for LoggingProcessor {
    fn apply_vote(
        &mut self,
        tables: &mut Tables,
        game_id: GameId,
        vote: Vote,
    ) -> Result<(), ProcessError> {
        let game = tables
            .games
            .get_mut(&game_id)
            .ok_or_else(|| ProcessError::VoteRejected(game_id, "unknown game".into()))?;
        if game.phase.is_finished() {
            return Err(ProcessError::VoteRejected(game_id, "game already finished".into()));
        }

        match vote {
            Vote::Draw | Vote::Cancel | Vote::Concede => {
                game.phase = GamePhase::Finished;
                for member in tables.members_of_mut(game_id) {
                    member.votes.clear();
                }
            }
            Vote::Pause => {
                // The game stays live; the cast pause votes are consumed.
                for member in tables.members_of_mut(game_id) {
                    member.votes.remove(Vote::Pause);
                }
            }
        }
        info!(game = game_id.0, vote = %vote, "game processed unanimous vote");
        Ok(())
    }

    fn advance_phase(&mut self, tables: &mut Tables, game_id: GameId) -> Result<(), ProcessError> {
        let game = tables
            .games
            .get_mut(&game_id)
            .ok_or_else(|| ProcessError::AdvanceRejected(game_id, "unknown game".into()))?;
        game.phase = match game.phase {
            GamePhase::PreGame => GamePhase::Diplomacy,
            GamePhase::Diplomacy => GamePhase::Retreats,
            GamePhase::Retreats => GamePhase::Builds,
            GamePhase::Builds => GamePhase::Diplomacy,
            GamePhase::Finished => {
                return Err(ProcessError::AdvanceRejected(game_id, "game already finished".into()))
            }
        };
        let phase = game.phase;
        // Order state is wiped, not parked on the no-orders bit: every seat
        // owes orders for the new phase, so the game must not qualify as
        // all-ready again until members actually flag.
        for member in tables.members_of_mut(game_id) {
            member.orders = OrderSet::EMPTY;
        }
        info!(game = game_id.0, ?phase, "game advanced to next phase");
        Ok(())
    }
}
