//! The maintenance tick: one pass over every component, in dependency
//! order.
//!
//! Sweeping and reaping run first, then the yearly activity update must
//! commit before the reliability recalculation begins (the rating divisor is
//! the yearly phase count), then consensus detection feeds game processing.
//! A component that cannot commit aborts the remainder of the tick; its
//! effects are rolled back and the whole tick is retried by the scheduler.

use crate::processor::GameProcessor;
use crate::reaper::{self, ReapConfig};
use crate::store::Store;
use crate::{activity, notices, readiness, reliability, votes};
use gambit_types::{EngineError, UnixTime};
use tracing::{info, warn};

/// Per-tick parameters.
#[derive(Clone, Copy, Debug)]
pub struct TickConfig {
    pub reap: ReapConfig,
    /// Retention for temporary notices, in seconds.
    pub notice_retention_secs: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            reap: ReapConfig::default(),
            notice_retention_secs: notices::DEFAULT_RETENTION_SECS,
        }
    }
}

/// What one full tick did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub notices_swept: usize,
    pub sessions_reaped: usize,
    pub hits_flushed: u64,
    pub phases_expired: usize,
    pub users_rated: usize,
    pub votes_resolved: usize,
    pub votes_failed: usize,
    pub games_advanced: usize,
    pub advances_failed: usize,
}

/// Run one maintenance tick at `now`.
pub fn run_tick<P: GameProcessor>(
    store: &mut Store,
    processor: &mut P,
    config: &TickConfig,
    now: UnixTime,
) -> Result<TickReport, EngineError> {
    let notices_swept = notices::clear_stale(store, config.notice_retention_secs, now)?;
    let reaped = reaper::reap(store, &config.reap, now)?;
    let activity = activity::incremental_update(store, now)?;
    let reliability = reliability::recalculate(store, now)?;
    let votes = votes::resolve_votes(store, processor)?;

    // Readiness runs against the post-vote state: a game that just finished
    // by unanimous vote must not also advance.
    let mut games_advanced = 0usize;
    let mut advances_failed = 0usize;
    for game in readiness::find_ready(store.tables()) {
        let mut txn = store.begin();
        match processor.advance_phase(&mut txn, game) {
            Ok(()) => {
                txn.commit()?;
                info!(game = game.0, "advanced phase for all-ready game");
                games_advanced += 1;
            }
            Err(error) => {
                drop(txn);
                warn!(game = game.0, %error, "phase advance rejected; will retry next tick");
                advances_failed += 1;
            }
        }
    }

    let report = TickReport {
        notices_swept,
        sessions_reaped: reaped.sessions_reaped,
        hits_flushed: reaped.hits_flushed,
        phases_expired: activity.phases_expired,
        users_rated: reliability.users_rated,
        votes_resolved: votes.resolved,
        votes_failed: votes.failed,
        games_advanced,
        advances_failed,
    };
    info!(
        sessions = report.sessions_reaped,
        expired = report.phases_expired,
        rated = report.users_rated,
        votes = report.votes_resolved,
        advanced = report.games_advanced,
        "maintenance tick complete"
    );
    Ok(report)
}
