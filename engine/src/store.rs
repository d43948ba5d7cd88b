//! The event store: the sole source of truth for the maintenance engine.
//!
//! An in-memory, indexed rendition of the platform's tables with explicit
//! transaction control. [`Store::begin`] yields a [`Transaction`] working
//! copy; [`Transaction::commit`] publishes it atomically, and dropping the
//! transaction rolls everything back. Concurrent readers of the committed
//! state never observe a transaction mid-application.
//!
//! Record ids are allocated monotonically with insertion. The activity
//! tracker's boundary scan relies on insertion order being monotonic with
//! event time, so the id counters live here rather than with the callers.

use gambit_types::{
    AccessLogEntry, EventId, Game, GameId, GamePhase, Member, MissedTurnEvent, Notice, NoticeId,
    PeriodState, Session, StoreError, TurnDateEvent, UnixTime, User, UserId, UserKind, VariantId,
    YearFlag,
};
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

/// All tables of the platform store.
///
/// Mutable access outside a [`Transaction`] is deliberately impossible;
/// components read the committed state through [`Store::tables`] and write
/// through a transaction they commit themselves.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tables {
    pub users: BTreeMap<UserId, User>,
    /// At most one live session per user.
    pub sessions: BTreeMap<UserId, Session>,
    /// Append-only; written by the session reaper.
    pub access_log: Vec<AccessLogEntry>,
    pub turn_dates: BTreeMap<EventId, TurnDateEvent>,
    pub missed_turns: BTreeMap<EventId, MissedTurnEvent>,
    pub games: BTreeMap<GameId, Game>,
    /// Keyed by (game, user) so one game's seats form a contiguous range.
    pub members: BTreeMap<(GameId, UserId), Member>,
    pub notices: BTreeMap<NoticeId, Notice>,
    /// Store-wide request counter, flushed into by the session reaper.
    pub hits: u64,

    next_user: u64,
    next_event: u64,
    next_game: u64,
    next_notice: u64,
}

impl Tables {
    /// Create a user and return its id.
    pub fn add_user(&mut self, kind: UserKind) -> UserId {
        self.next_user += 1;
        let id = UserId(self.next_user);
        self.users.insert(id, User::new(id, kind));
        id
    }

    /// Record a phase completion for a user, as live gameplay does: the
    /// event enters the trailing-year window immediately and the user's
    /// yearly phase count is incremented in the same write.
    pub fn record_turn_date(&mut self, user: UserId, turn_date: UnixTime) -> EventId {
        self.next_event += 1;
        let id = EventId(self.next_event);
        self.turn_dates.insert(
            id,
            TurnDateEvent {
                id,
                user,
                turn_date,
                flag: YearFlag::Fresh,
            },
        );
        if let Some(user) = self.users.get_mut(&user) {
            user.yearly_phase_count += 1;
        }
        id
    }

    /// Record a missed phase for a user. The reliability bucket starts
    /// unassigned, which guarantees the next recalculation picks it up.
    #[allow(clippy::too_many_arguments)]
    pub fn record_missed_turn(
        &mut self,
        user: UserId,
        turn_date: UnixTime,
        live_game: bool,
        mod_excused: bool,
        same_period_excused: bool,
        system_excused: bool,
    ) -> EventId {
        self.next_event += 1;
        let id = EventId(self.next_event);
        self.missed_turns.insert(
            id,
            MissedTurnEvent {
                id,
                user,
                turn_date,
                live_game,
                mod_excused,
                same_period_excused,
                system_excused,
                period: PeriodState::Unassigned,
            },
        );
        id
    }

    /// Create a game and return its id.
    pub fn add_game(&mut self, variant: VariantId, phase: GamePhase) -> GameId {
        self.next_game += 1;
        let id = GameId(self.next_game);
        self.games.insert(
            id,
            Game {
                id,
                variant,
                phase,
            },
        );
        id
    }

    /// Seat a user in a game.
    pub fn add_member(&mut self, game: GameId, user: UserId) {
        self.members.insert((game, user), Member::new(game, user));
    }

    /// Create a notice and return its id.
    pub fn add_notice(&mut self, user: UserId, keep: bool, time_sent: UnixTime, text: &str) -> NoticeId {
        self.next_notice += 1;
        let id = NoticeId(self.next_notice);
        self.notices.insert(
            id,
            Notice {
                id,
                user,
                keep,
                time_sent,
                text: text.to_string(),
            },
        );
        id
    }

    /// The seats of one game, in user-id order.
    pub fn members_of(&self, game: GameId) -> impl Iterator<Item = &Member> {
        self.members
            .range((game, UserId(u64::MIN))..=(game, UserId(u64::MAX)))
            .map(|(_, member)| member)
    }

    /// Mutable seats of one game.
    pub fn members_of_mut(&mut self, game: GameId) -> impl Iterator<Item = &mut Member> {
        self.members
            .range_mut((game, UserId(u64::MIN))..=(game, UserId(u64::MAX)))
            .map(|(_, member)| member)
    }

    /// The earliest still-fresh turn-date event, by event time.
    ///
    /// Equivalent of the (flag, turn_date) index scan: the lower boundary of
    /// the fresh region for the incremental activity update.
    pub fn first_fresh_turn_date(&self) -> Option<EventId> {
        self.turn_dates
            .values()
            .filter(|event| event.flag == YearFlag::Fresh)
            .min_by_key(|event| (event.turn_date, event.id))
            .map(|event| event.id)
    }

    /// The newest still-fresh turn-date event, by event time. The upper
    /// boundary of the incremental activity update when nothing remains
    /// inside the trailing year.
    pub fn last_fresh_turn_date(&self) -> Option<EventId> {
        self.turn_dates
            .values()
            .filter(|event| event.flag == YearFlag::Fresh)
            .max_by_key(|event| (event.turn_date, event.id))
            .map(|event| event.id)
    }

    /// The earliest turn-date event strictly newer than `cutoff`, by event
    /// time. The upper boundary of the incremental activity update.
    pub fn first_turn_date_after(&self, cutoff: UnixTime) -> Option<EventId> {
        self.turn_dates
            .values()
            .filter(|event| event.turn_date > cutoff)
            .min_by_key(|event| (event.turn_date, event.id))
            .map(|event| event.id)
    }
}

/// The transactional store.
#[derive(Debug, Default)]
pub struct Store {
    tables: Tables,
    #[cfg(any(test, feature = "mocks"))]
    fail_next_commit: bool,
}

impl Store {
    pub fn new(tables: Tables) -> Self {
        Self {
            tables,
            #[cfg(any(test, feature = "mocks"))]
            fail_next_commit: false,
        }
    }

    /// Read-only view of the committed state.
    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    /// Begin a transaction. The returned working copy must be committed for
    /// any of its writes to become visible; dropping it rolls back.
    pub fn begin(&mut self) -> Transaction<'_> {
        let work = self.tables.clone();
        Transaction { store: self, work }
    }

    /// Make the next commit fail, to exercise the rollback/retry path.
    #[cfg(any(test, feature = "mocks"))]
    pub fn fail_next_commit(&mut self) {
        self.fail_next_commit = true;
    }
}

/// A private working copy of the store.
///
/// Dereferences to [`Tables`], so reads and writes inside a transaction look
/// exactly like reads of the committed state.
pub struct Transaction<'a> {
    store: &'a mut Store,
    work: Tables,
}

impl Transaction<'_> {
    /// Publish the working copy atomically.
    pub fn commit(self) -> Result<(), StoreError> {
        #[cfg(any(test, feature = "mocks"))]
        if self.store.fail_next_commit {
            self.store.fail_next_commit = false;
            return Err(StoreError::CommitFailed);
        }
        self.store.tables = self.work;
        Ok(())
    }
}

impl Deref for Transaction<'_> {
    type Target = Tables;

    fn deref(&self) -> &Tables {
        &self.work
    }
}

impl DerefMut for Transaction<'_> {
    fn deref_mut(&mut self) -> &mut Tables {
        &mut self.work
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_publishes_writes() {
        let mut store = Store::default();
        let mut txn = store.begin();
        let user = txn.add_user(UserKind::Human);
        txn.commit().expect("commit");
        assert!(store.tables().users.contains_key(&user));
    }

    #[test]
    fn drop_rolls_back() {
        let mut store = Store::default();
        {
            let mut txn = store.begin();
            txn.add_user(UserKind::Human);
            // dropped without commit
        }
        assert!(store.tables().users.is_empty());
    }

    #[test]
    fn failed_commit_leaves_committed_state_untouched() {
        let mut store = Store::default();
        store.fail_next_commit();
        let mut txn = store.begin();
        txn.add_user(UserKind::Human);
        assert_eq!(txn.commit(), Err(StoreError::CommitFailed));
        assert!(store.tables().users.is_empty());

        // The failure is one-shot; the retry succeeds.
        let mut txn = store.begin();
        txn.add_user(UserKind::Human);
        txn.commit().expect("retry commits");
        assert_eq!(store.tables().users.len(), 1);
    }

    #[test]
    fn recording_a_turn_increments_the_yearly_count() {
        let mut store = Store::default();
        let mut txn = store.begin();
        let user = txn.add_user(UserKind::Human);
        txn.record_turn_date(user, 1_000);
        txn.record_turn_date(user, 2_000);
        assert_eq!(txn.users[&user].yearly_phase_count, 2);
        txn.commit().expect("commit");
    }

    #[test]
    fn event_ids_are_monotonic() {
        let mut store = Store::default();
        let mut txn = store.begin();
        let user = txn.add_user(UserKind::Human);
        let a = txn.record_turn_date(user, 10);
        let b = txn.record_missed_turn(user, 20, false, false, false, false);
        let c = txn.record_turn_date(user, 30);
        assert!(a < b && b < c);
    }

    #[test]
    fn members_range_is_scoped_to_one_game() {
        let mut store = Store::default();
        let mut txn = store.begin();
        let u1 = txn.add_user(UserKind::Human);
        let u2 = txn.add_user(UserKind::Human);
        let g1 = txn.add_game(VariantId(1), GamePhase::Diplomacy);
        let g2 = txn.add_game(VariantId(1), GamePhase::Diplomacy);
        txn.add_member(g1, u1);
        txn.add_member(g1, u2);
        txn.add_member(g2, u1);
        assert_eq!(txn.members_of(g1).count(), 2);
        assert_eq!(txn.members_of(g2).count(), 1);
    }

    #[test]
    fn boundary_scans_order_by_time_not_id() {
        let mut store = Store::default();
        let mut txn = store.begin();
        let user = txn.add_user(UserKind::Human);
        txn.record_turn_date(user, 500);
        let oldest = txn.record_turn_date(user, 100);
        txn.record_turn_date(user, 300);
        assert_eq!(txn.first_fresh_turn_date(), Some(oldest));
        assert_eq!(txn.last_fresh_turn_date(), Some(EventId(1)));
        assert_eq!(txn.first_turn_date_after(400), Some(EventId(1)));
        assert_eq!(txn.first_turn_date_after(1_000), None);
    }
}
