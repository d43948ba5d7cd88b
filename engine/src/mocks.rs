//! Fixtures and a recording game processor for tests.

use crate::processor::GameProcessor;
use crate::store::{Store, Tables};
use gambit_types::{
    GameId, GamePhase, OrderSet, ProcessError, Session, UserId, UserKind, VariantId, Vote,
};
use std::collections::BTreeSet;

/// A plausible session record for a user.
pub fn session_for(user: UserId) -> Session {
    Session {
        user,
        last_request: 0,
        hits: 0,
        ip: "192.0.2.7".into(),
        user_agent: "Mozilla/5.0 (test)".into(),
        cookie_code: format!("cookie-{}", user.0),
        browser_fingerprint: format!("fp-{}", user.0),
    }
}

/// Seed one active game with the given number of human and bot members.
/// Returns the game and its users, humans first.
pub fn seed_game(store: &mut Store, humans: usize, bots: usize) -> (GameId, Vec<UserId>) {
    let mut txn = store.begin();
    let game = txn.add_game(VariantId(1), GamePhase::Diplomacy);
    let mut users = Vec::with_capacity(humans + bots);
    for _ in 0..humans {
        let user = txn.add_user(UserKind::Human);
        txn.add_member(game, user);
        users.push(user);
    }
    for _ in 0..bots {
        let user = txn.add_user(UserKind::Bot);
        txn.add_member(game, user);
        users.push(user);
    }
    txn.commit().expect("seed game");
    (game, users)
}

/// A [`GameProcessor`] that records what it was asked to do and applies the
/// minimal state changes a real adjudicator would: terminal votes finish the
/// game, vote state is consumed, and an advanced phase wipes order state so
/// every seat owes orders again.
///
/// Games listed in `fail_games` reject every request, to exercise the
/// per-game isolation paths.
#[derive(Debug, Default)]
pub struct RecordingProcessor {
    pub applied: Vec<(GameId, Vote)>,
    pub advanced: Vec<GameId>,
    pub fail_games: BTreeSet<GameId>,
}

impl GameProcessor for RecordingProcessor {
    fn apply_vote(
        &mut self,
        tables: &mut Tables,
        game: GameId,
        vote: Vote,
    ) -> Result<(), ProcessError> {
        if self.fail_games.contains(&game) {
            return Err(ProcessError::VoteRejected(game, "injected failure".into()));
        }
        for member in tables.members_of_mut(game) {
            member.votes.clear();
        }
        if vote != Vote::Pause {
            if let Some(game) = tables.games.get_mut(&game) {
                game.phase = GamePhase::Finished;
            }
        }
        self.applied.push((game, vote));
        Ok(())
    }

    fn advance_phase(&mut self, tables: &mut Tables, game: GameId) -> Result<(), ProcessError> {
        if self.fail_games.contains(&game) {
            return Err(ProcessError::AdvanceRejected(game, "injected failure".into()));
        }
        for member in tables.members_of_mut(game) {
            member.orders = OrderSet::EMPTY;
        }
        self.advanced.push(game);
        Ok(())
    }
}
