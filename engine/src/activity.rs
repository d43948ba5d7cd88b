//! Yearly activity tracker.
//!
//! Maintains, per user, the count of phases played within the trailing 365
//! days. [`recalculate_all`] is the cold-start/repair mode that rescans the
//! whole turn-date table; [`incremental_update`] is the steady-state mode
//! that touches only the boundary of the fresh region.
//!
//! The incremental pass commits its own transaction before returning rather
//! than sharing a tick-wide one, so the locks it takes are not held across
//! the rest of the maintenance cycle. The consistency gap this opens is
//! bounded by the tick interval and is deliberate.

use crate::store::Store;
use gambit_types::{EngineError, UnixTime, UserId, YearFlag, YEAR_SECS};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// What one incremental pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActivitySummary {
    /// Turn-date events that left the trailing-year window.
    pub phases_expired: usize,
    /// Users whose yearly count was decremented.
    pub users_touched: usize,
}

/// Full recompute: reflag every event by age and rebuild every user's count.
///
/// Scans everything; used only for cold start or repair.
pub fn recalculate_all(store: &mut Store, now: UnixTime) -> Result<(), EngineError> {
    let mut txn = store.begin();

    let mut fresh_counts: BTreeMap<UserId, u32> = BTreeMap::new();
    for event in txn.turn_dates.values_mut() {
        event.flag = YearFlag::implied(event.turn_date, now);
        if event.flag == YearFlag::Fresh {
            *fresh_counts.entry(event.user).or_default() += 1;
        }
    }
    for user in txn.users.values_mut() {
        user.yearly_phase_count = fresh_counts.get(&user.id).copied().unwrap_or(0);
    }

    txn.commit()?;
    info!("rebuilt yearly phase counts from scratch");
    Ok(())
}

/// Steady-state update: expire only the events that have just crossed the
/// trailing-year boundary.
///
/// The two boundary lookups are shaped like index scans:
/// the first still-fresh event by time, and the first event inside the
/// window by time. Everything between them (a closed id range) has either
/// just left the window or sits ambiguously at its edge; those events are
/// pulled into `PendingRecalc`, resolved, and the per-user counts of the
/// truly expired ones are decremented.
pub fn incremental_update(store: &mut Store, now: UnixTime) -> Result<ActivitySummary, EngineError> {
    let mut txn = store.begin();

    let cutoff = now.saturating_sub(YEAR_SECS);
    let lower = match txn.first_fresh_turn_date() {
        Some(lower) => lower,
        // No fresh events at all: nothing left to expire.
        None => {
            txn.commit()?;
            return Ok(ActivitySummary::default());
        }
    };
    // An empty window means every fresh event has expired; the region then
    // runs to the newest fresh event.
    let upper = txn
        .first_turn_date_after(cutoff)
        .or_else(|| txn.last_fresh_turn_date())
        .unwrap_or(lower);
    if lower > upper {
        // The oldest fresh event is already inside the window.
        txn.commit()?;
        return Ok(ActivitySummary::default());
    }

    // Pull the boundary range into the transitional state. Only fresh events
    // participate; stale ones in the range were already counted out.
    let pending: Vec<_> = txn
        .turn_dates
        .range(lower..=upper)
        .filter(|(_, event)| event.flag == YearFlag::Fresh)
        .map(|(id, _)| *id)
        .collect();
    for id in &pending {
        if let Some(event) = txn.turn_dates.get_mut(id) {
            event.flag = YearFlag::PendingRecalc;
        }
    }

    // Resolve: events still inside the window were only ambiguous and stay
    // fresh; the rest expired and their users lose a phase each.
    let mut expired_counts: BTreeMap<UserId, u32> = BTreeMap::new();
    for id in &pending {
        if let Some(event) = txn.turn_dates.get_mut(id) {
            event.flag = YearFlag::implied(event.turn_date, now);
            if event.flag == YearFlag::Stale {
                *expired_counts.entry(event.user).or_default() += 1;
            }
        }
    }

    let mut phases_expired = 0usize;
    for (user_id, expired) in &expired_counts {
        let user = txn.users.get_mut(user_id).ok_or_else(|| {
            EngineError::InvariantViolation(format!("turn dates reference unknown user {user_id:?}"))
        })?;
        user.yearly_phase_count = user.yearly_phase_count.checked_sub(*expired).ok_or_else(|| {
            EngineError::InvariantViolation(format!(
                "yearly phase count for {user_id:?} would go negative ({} - {expired})",
                user.yearly_phase_count
            ))
        })?;
        phases_expired += *expired as usize;
    }

    let summary = ActivitySummary {
        phases_expired,
        users_touched: expired_counts.len(),
    };
    // Commit here ends the lock scope; the reliability pass that depends on
    // these counts opens its own transaction.
    txn.commit()?;
    if summary.phases_expired > 0 {
        debug!(
            expired = summary.phases_expired,
            users = summary.users_touched,
            "expired phases out of the trailing year"
        );
    }
    Ok(summary)
}
