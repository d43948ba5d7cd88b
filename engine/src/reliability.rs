//! Reliability rating calculator.
//!
//! Derives a 0-100 score per user from recent missed-turn history. Ratings
//! are recomputed incrementally: every missed turn carries the age bucket it
//! was last rated under, and a record whose bucket disagrees with its actual
//! age marks its user's whole working set for recalculation. One stale
//! record invalidating the entire user trades precision for a scan the
//! store's indexes can answer cheaply.
//!
//! All three steps (invalidation, rating, restamping) run in one
//! transaction per tick, so a concurrent reader never observes a
//! half-rated user.

use crate::store::Store;
use gambit_types::{
    EngineError, PeriodState, ReliabilityPeriod, UnixTime, UserId, DAY_SECS, MONTH_DAYS, WEEK_DAYS,
    YEAR_SECS,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Penalty for a miss in the recent window (28 days for turn-based games,
/// 7 days for live ones).
const RECENT_PENALTY: f64 = 0.11;

/// Penalty for an older miss still inside its window.
const AGED_PENALTY: f64 = 0.05;

/// What one recalculation pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReliabilitySummary {
    pub users_rated: usize,
    pub events_restamped: usize,
}

/// Per-user aggregate over the invalidated working set.
#[derive(Clone, Copy, Debug, Default)]
struct MissedAggregate {
    penalty: f64,
    count: u32,
}

/// The penalty a single missed turn contributes at `now`.
///
/// Live games use a 7-day recent window, turn-based games 28 days; both drop
/// to the aged penalty past that, and live misses stop counting toward the
/// penalty entirely past 28 days. Exempt misses contribute nothing.
fn penalty_for(live_game: bool, penalized: bool, turn_date: UnixTime, now: UnixTime) -> f64 {
    if !penalized {
        return 0.0;
    }
    let week_ago = now.saturating_sub(WEEK_DAYS * DAY_SECS);
    let month_ago = now.saturating_sub(MONTH_DAYS * DAY_SECS);
    if live_game {
        if turn_date > week_ago {
            RECENT_PENALTY
        } else if turn_date > month_ago {
            AGED_PENALTY
        } else {
            0.0
        }
    } else if turn_date > month_ago {
        RECENT_PENALTY
    } else {
        AGED_PENALTY
    }
}

/// The rating formula: the miss ratio against the yearly phase count, minus
/// the accumulated penalty, clamped to [0, 100]. A user with no recorded
/// phases uses divisor 1, leaving the score penalty-dominated.
fn rating(aggregate: MissedAggregate, yearly_phase_count: u32) -> f64 {
    let divisor = yearly_phase_count.max(1) as f64;
    let ratio = 1.0 - f64::from(aggregate.count) / divisor;
    100.0 * (ratio - aggregate.penalty).max(0.0)
}

/// Recalculate ratings for every user with at least one missed turn whose
/// bucket no longer matches its age.
pub fn recalculate(store: &mut Store, now: UnixTime) -> Result<ReliabilitySummary, EngineError> {
    let mut txn = store.begin();

    // Step 1: coarse invalidation. Any single mismatched record pulls all of
    // its user's records (except those already parked over a year) into the
    // working set.
    let dirty: BTreeSet<UserId> = txn
        .missed_turns
        .values()
        .filter(|event| !event.period.matches(event.turn_date, now))
        .map(|event| event.user)
        .collect();
    for event in txn.missed_turns.values_mut() {
        if dirty.contains(&event.user)
            && event.period != PeriodState::Period(ReliabilityPeriod::OverYear)
        {
            event.period = PeriodState::PendingRecalc;
        }
    }

    // Step 2: rate every user in the working set. Only non-moderator-excused
    // misses inside the trailing year feed the aggregate; a user whose
    // pending records all aged out recomputes to a clean rating.
    let year_ago = now.saturating_sub(YEAR_SECS);
    let mut aggregates: BTreeMap<UserId, MissedAggregate> = BTreeMap::new();
    for event in txn.missed_turns.values() {
        if event.period != PeriodState::PendingRecalc {
            continue;
        }
        let aggregate = aggregates.entry(event.user).or_default();
        if event.mod_excused || event.turn_date <= year_ago {
            continue;
        }
        aggregate.penalty += penalty_for(event.live_game, event.penalized(), event.turn_date, now);
        aggregate.count += 1;
    }

    let mut users_rated = 0usize;
    for (user_id, aggregate) in &aggregates {
        let user = txn.users.get_mut(user_id).ok_or_else(|| {
            EngineError::InvariantViolation(format!(
                "missed turns reference unknown user {user_id:?}"
            ))
        })?;
        user.reliability_rating = rating(*aggregate, user.yearly_phase_count);
        users_rated += 1;
    }

    // Step 3: stamp the working set with its age-implied buckets, closing
    // the invalidation window until the records age across a boundary.
    let mut events_restamped = 0usize;
    for event in txn.missed_turns.values_mut() {
        if event.period == PeriodState::PendingRecalc {
            event.period =
                PeriodState::Period(ReliabilityPeriod::classify(event.turn_date, now));
            events_restamped += 1;
        }
    }

    let summary = ReliabilitySummary {
        users_rated,
        events_restamped,
    };
    txn.commit()?;
    if summary.users_rated > 0 {
        debug!(
            users = summary.users_rated,
            events = summary.events_restamped,
            "recalculated reliability ratings"
        );
    }
    Ok(summary)
}
