//! Session reaper: expires idle sessions and preserves their data.
//!
//! A session that has not seen a request for the idle threshold is removed,
//! its hit counter is flushed into the store-wide counter, and its full
//! record is copied into the append-only access log (used downstream to
//! detect multi-accounting). The whole expired set is processed in one
//! transaction; a storage failure reaps nothing.

use crate::store::Store;
use gambit_types::{AccessLogEntry, EngineError, MessageId, UnixTime, UserId};
use tracing::debug;

/// Sessions idle for longer than this are expired (10 minutes).
pub const DEFAULT_IDLE_SECS: u64 = 10 * 60;

/// Reaper parameters for one tick.
#[derive(Clone, Copy, Debug)]
pub struct ReapConfig {
    /// Idle threshold in seconds.
    pub idle_secs: u64,
    /// Head message of the linked discussion service, when one is
    /// configured. Present, expired users also get their last-viewed-message
    /// marker advanced to it; absent, only the session-end time is set.
    pub forum_head: Option<MessageId>,
}

impl Default for ReapConfig {
    fn default() -> Self {
        Self {
            idle_secs: DEFAULT_IDLE_SECS,
            forum_head: None,
        }
    }
}

/// What one reap pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReapSummary {
    pub sessions_reaped: usize,
    pub hits_flushed: u64,
}

/// Expire all idle sessions in one transaction.
pub fn reap(store: &mut Store, config: &ReapConfig, now: UnixTime) -> Result<ReapSummary, EngineError> {
    let mut txn = store.begin();

    let cutoff = now.saturating_sub(config.idle_secs);
    let expired: Vec<UserId> = txn
        .sessions
        .values()
        .filter(|session| session.last_request < cutoff)
        .map(|session| session.user)
        .collect();

    if expired.is_empty() {
        txn.commit()?;
        return Ok(ReapSummary::default());
    }

    let mut hits_flushed = 0u64;
    for user_id in &expired {
        let session = txn
            .sessions
            .remove(user_id)
            .ok_or_else(|| EngineError::InvariantViolation(format!("expired session vanished for {user_id:?}")))?;
        hits_flushed += session.hits;
        txn.access_log.push(AccessLogEntry::from(&session));

        if let Some(user) = txn.users.get_mut(user_id) {
            user.time_last_session_ended = Some(now);
            if let Some(head) = config.forum_head {
                user.last_message_viewed = Some(head);
            }
        }
    }
    txn.hits += hits_flushed;

    let summary = ReapSummary {
        sessions_reaped: expired.len(),
        hits_flushed,
    };
    txn.commit()?;
    debug!(
        sessions = summary.sessions_reaped,
        hits = summary.hits_flushed,
        "reaped idle sessions"
    );
    Ok(summary)
}
