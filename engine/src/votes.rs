//! Vote consensus detector.
//!
//! Scans active games for unanimous votes among non-bot playing members.
//! Unanimity, not majority: every voter must carry the bit. Detection is a
//! pure read over the committed state; each resolution is then applied in
//! its own transaction, so one game's failure cannot poison another's.

use crate::processor::GameProcessor;
use crate::store::{Store, Tables};
use gambit_types::{EngineError, Game, GameId, VariantId, Vote};
use tracing::{info, warn};

/// A game whose members unanimously agreed on a vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoteResolution {
    pub game: GameId,
    pub variant: VariantId,
    pub vote: Vote,
}

/// What one resolution pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VoteOutcome {
    pub resolved: usize,
    pub failed: usize,
}

fn detect_for_game(tables: &Tables, game: &Game) -> Option<VoteResolution> {
    if game.phase.is_finished() {
        return None;
    }

    let mut voters = 0usize;
    let mut counts = [0usize; Vote::RESOLUTION_ORDER.len()];
    for member in tables.members_of(game.id) {
        if !member.is_playing() {
            continue;
        }
        let Some(user) = tables.users.get(&member.user) else {
            continue;
        };
        if user.kind.is_bot() {
            continue;
        }
        voters += 1;
        for (slot, vote) in Vote::RESOLUTION_ORDER.iter().enumerate() {
            if member.votes.has(*vote) {
                counts[slot] += 1;
            }
        }
    }
    if voters == 0 {
        return None;
    }

    // The first unanimous vote in resolution order wins; a degenerate
    // distribution can satisfy several simultaneously.
    Vote::RESOLUTION_ORDER
        .iter()
        .zip(counts)
        .find(|(_, count)| *count == voters)
        .map(|(vote, _)| VoteResolution {
            game: game.id,
            variant: game.variant,
            vote: *vote,
        })
}

/// Collect at most one resolution per active game.
#[cfg(not(feature = "parallel"))]
pub fn detect(tables: &Tables) -> Vec<VoteResolution> {
    tables
        .games
        .values()
        .filter_map(|game| detect_for_game(tables, game))
        .collect()
}

/// Collect at most one resolution per active game.
///
/// Games are independent, so the aggregation fans out across the pool; the
/// result is re-sorted to keep the apply order deterministic.
#[cfg(feature = "parallel")]
pub fn detect(tables: &Tables) -> Vec<VoteResolution> {
    use rayon::prelude::*;

    let games: Vec<&Game> = tables.games.values().collect();
    let mut resolutions: Vec<VoteResolution> = games
        .par_iter()
        .filter_map(|game| detect_for_game(tables, game))
        .collect();
    resolutions.sort_by_key(|resolution| resolution.game);
    resolutions
}

/// Find unanimous games and hand each to the game processor, one
/// transaction per game.
///
/// A processor rejection rolls back that game's transaction and is logged;
/// the vote state is untouched, so the game is retried next tick. A storage
/// failure aborts the pass as retryable.
pub fn resolve_votes<P: GameProcessor>(
    store: &mut Store,
    processor: &mut P,
) -> Result<VoteOutcome, EngineError> {
    let resolutions = detect(store.tables());

    let mut outcome = VoteOutcome::default();
    for resolution in resolutions {
        let mut txn = store.begin();
        match processor.apply_vote(&mut txn, resolution.game, resolution.vote) {
            Ok(()) => {
                txn.commit()?;
                info!(game = resolution.game.0, vote = %resolution.vote, "applied unanimous vote");
                outcome.resolved += 1;
            }
            Err(error) => {
                drop(txn);
                warn!(game = resolution.game.0, %error, "vote application rejected; will retry next tick");
                outcome.failed += 1;
            }
        }
    }
    Ok(outcome)
}
