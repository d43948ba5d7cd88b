//! Order-readiness detector.
//!
//! A game may advance early when every playing member who has orders to
//! submit has flagged ready; members with no orders at all are not required
//! to flag. Unlike vote consensus, bots count here: their seats have orders
//! like anyone else's.

use crate::store::Tables;
use gambit_types::{Game, GameId, OrderFlag};

fn ready_for_game(game: &Game, tables: &Tables) -> Option<GameId> {
    if game.phase.is_finished() {
        return None;
    }

    let mut players = 0usize;
    let mut no_orders = 0usize;
    let mut ready = 0usize;
    for member in tables.members_of(game.id) {
        if !member.is_playing() {
            continue;
        }
        players += 1;
        if member.orders.has(OrderFlag::NO_ORDERS) {
            no_orders += 1;
        }
        if member.orders.has(OrderFlag::READY) {
            ready += 1;
        }
    }
    if players == 0 {
        return None;
    }

    // Everyone is ready, or only people with no orders aren't.
    (players - no_orders <= ready).then_some(game.id)
}

/// The games whose every member with pending orders has flagged ready.
///
/// Returns identifiers only; advancing the phase is the game processor's
/// job.
#[cfg(not(feature = "parallel"))]
pub fn find_ready(tables: &Tables) -> Vec<GameId> {
    tables
        .games
        .values()
        .filter_map(|game| ready_for_game(game, tables))
        .collect()
}

/// The games whose every member with pending orders has flagged ready.
#[cfg(feature = "parallel")]
pub fn find_ready(tables: &Tables) -> Vec<GameId> {
    use rayon::prelude::*;

    let games: Vec<&Game> = tables.games.values().collect();
    let mut ready: Vec<GameId> = games
        .par_iter()
        .filter_map(|game| ready_for_game(game, tables))
        .collect();
    ready.sort();
    ready
}
