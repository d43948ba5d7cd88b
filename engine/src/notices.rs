//! Notice sweeper: deletes temporary notices past their retention window.

use crate::store::Store;
use gambit_types::{EngineError, UnixTime, DAY_SECS};
use tracing::debug;

/// Temporary notices older than this are swept (one week).
pub const DEFAULT_RETENTION_SECS: u64 = 7 * DAY_SECS;

/// Delete non-keep notices older than `retention_secs`, in one transaction.
/// Returns how many were swept.
pub fn clear_stale(
    store: &mut Store,
    retention_secs: u64,
    now: UnixTime,
) -> Result<usize, EngineError> {
    let mut txn = store.begin();
    let cutoff = now.saturating_sub(retention_secs);
    let before = txn.notices.len();
    txn.notices
        .retain(|_, notice| notice.keep || notice.time_sent >= cutoff);
    let swept = before - txn.notices.len();
    txn.commit()?;
    if swept > 0 {
        debug!(swept, "cleared stale notices");
    }
    Ok(swept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gambit_types::UserKind;

    const NOW: UnixTime = 1_000_000_000;

    #[test]
    fn sweeps_only_old_temporary_notices() {
        let mut store = Store::default();
        let mut txn = store.begin();
        let user = txn.add_user(UserKind::Human);
        let old_temp = txn.add_notice(user, false, NOW - 8 * DAY_SECS, "old temporary");
        let old_keep = txn.add_notice(user, true, NOW - 30 * DAY_SECS, "old but kept");
        let fresh = txn.add_notice(user, false, NOW - DAY_SECS, "fresh");
        txn.commit().expect("seed");

        let swept = clear_stale(&mut store, DEFAULT_RETENTION_SECS, NOW).expect("sweep");
        assert_eq!(swept, 1);

        let tables = store.tables();
        assert!(!tables.notices.contains_key(&old_temp));
        assert!(tables.notices.contains_key(&old_keep));
        assert!(tables.notices.contains_key(&fresh));
    }

    #[test]
    fn sweep_is_idempotent() {
        let mut store = Store::default();
        let mut txn = store.begin();
        let user = txn.add_user(UserKind::Human);
        txn.add_notice(user, false, NOW - 10 * DAY_SECS, "stale");
        txn.commit().expect("seed");

        assert_eq!(clear_stale(&mut store, DEFAULT_RETENTION_SECS, NOW).expect("first"), 1);
        assert_eq!(clear_stale(&mut store, DEFAULT_RETENTION_SECS, NOW).expect("second"), 0);
    }
}
