use crate::time::{UnixTime, DAY_SECS, MONTH_DAYS, WEEK_DAYS, YEAR_SECS};
use crate::user::UserId;
use serde::{Deserialize, Serialize};

/// Identifier of an append-only event record.
///
/// Ids are allocated monotonically with insertion, and insertion order is
/// monotonic with event time. The yearly activity tracker's incremental
/// boundary scan depends on this.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct EventId(pub u64);

/// Whether a turn-date event still falls within the trailing year.
///
/// Replaces the -1/NULL/1/0 sentinel encoding of the source schema with
/// explicit states: `PendingRecalc` marks records the tracker has pulled out
/// of the fresh set but not yet resolved, and is only ever observable inside
/// a maintenance transaction or the documented gap between two of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum YearFlag {
    #[default]
    Unassigned,
    PendingRecalc,
    Fresh,
    Stale,
}

impl YearFlag {
    /// The flag implied by an event's age.
    pub fn implied(turn_date: UnixTime, now: UnixTime) -> Self {
        if turn_date > now.saturating_sub(YEAR_SECS) {
            YearFlag::Fresh
        } else {
            YearFlag::Stale
        }
    }
}

/// One record per non-bot phase completion for a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnDateEvent {
    pub id: EventId,
    pub user: UserId,
    pub turn_date: UnixTime,
    pub flag: YearFlag,
}

/// Coarse age bucket for a missed turn.
///
/// The bucket decides whether a miss is still counted against the user and
/// how heavily it is penalized. Numbering follows the source schema:
/// 0 over a year, 1 within a year, 2 within 28 days, 3 within 7 days.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReliabilityPeriod {
    OverYear,
    WithinYear,
    WithinMonth,
    WithinWeek,
}

impl ReliabilityPeriod {
    /// The bucket implied by an event's age at `now`.
    pub fn classify(turn_date: UnixTime, now: UnixTime) -> Self {
        if turn_date > now.saturating_sub(WEEK_DAYS * DAY_SECS) {
            ReliabilityPeriod::WithinWeek
        } else if turn_date > now.saturating_sub(MONTH_DAYS * DAY_SECS) {
            ReliabilityPeriod::WithinMonth
        } else if turn_date > now.saturating_sub(YEAR_SECS) {
            ReliabilityPeriod::WithinYear
        } else {
            ReliabilityPeriod::OverYear
        }
    }
}

/// Assignment state of a missed turn's reliability bucket.
///
/// `Unassigned` is the state of a freshly inserted record, `PendingRecalc`
/// marks the working set of the current recalculation, and `Period` is a
/// stamped bucket. A stamped bucket that disagrees with the bucket implied
/// by the record's age is what triggers the next recalculation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PeriodState {
    #[default]
    Unassigned,
    PendingRecalc,
    Period(ReliabilityPeriod),
}

impl PeriodState {
    /// Whether the stamped state matches the bucket implied by the record's
    /// age. `Unassigned` and `PendingRecalc` never match.
    pub fn matches(&self, turn_date: UnixTime, now: UnixTime) -> bool {
        match self {
            PeriodState::Period(period) => *period == ReliabilityPeriod::classify(turn_date, now),
            PeriodState::Unassigned | PeriodState::PendingRecalc => false,
        }
    }
}

/// One record per user per missed phase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissedTurnEvent {
    pub id: EventId,
    pub user: UserId,
    pub turn_date: UnixTime,
    /// Live games have tighter penalty windows than turn-based ones.
    pub live_game: bool,
    /// Excused by a moderator; the event is invisible to the rating.
    pub mod_excused: bool,
    /// Excused because another miss in the same period already counted.
    pub same_period_excused: bool,
    /// Excused by the system (e.g. an outage).
    pub system_excused: bool,
    pub period: PeriodState,
}

impl MissedTurnEvent {
    /// Whether the miss carries a penalty at all, as opposed to only being
    /// counted.
    pub fn penalized(&self) -> bool {
        !self.system_excused && !self.same_period_excused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: UnixTime = 100 * YEAR_SECS;

    #[test]
    fn year_flag_boundary() {
        assert_eq!(YearFlag::implied(NOW, NOW), YearFlag::Fresh);
        assert_eq!(YearFlag::implied(NOW - YEAR_SECS + 1, NOW), YearFlag::Fresh);
        assert_eq!(YearFlag::implied(NOW - YEAR_SECS, NOW), YearFlag::Stale);
        assert_eq!(YearFlag::implied(0, NOW), YearFlag::Stale);
    }

    #[test]
    fn classify_buckets() {
        let day = DAY_SECS;
        assert_eq!(
            ReliabilityPeriod::classify(NOW, NOW),
            ReliabilityPeriod::WithinWeek
        );
        assert_eq!(
            ReliabilityPeriod::classify(NOW - 6 * day, NOW),
            ReliabilityPeriod::WithinWeek
        );
        assert_eq!(
            ReliabilityPeriod::classify(NOW - 7 * day, NOW),
            ReliabilityPeriod::WithinMonth
        );
        assert_eq!(
            ReliabilityPeriod::classify(NOW - 27 * day, NOW),
            ReliabilityPeriod::WithinMonth
        );
        assert_eq!(
            ReliabilityPeriod::classify(NOW - 28 * day, NOW),
            ReliabilityPeriod::WithinYear
        );
        assert_eq!(
            ReliabilityPeriod::classify(NOW - 364 * day, NOW),
            ReliabilityPeriod::WithinYear
        );
        assert_eq!(
            ReliabilityPeriod::classify(NOW - 365 * day, NOW),
            ReliabilityPeriod::OverYear
        );
    }

    #[test]
    fn pending_and_unassigned_never_match() {
        assert!(!PeriodState::Unassigned.matches(NOW, NOW));
        assert!(!PeriodState::PendingRecalc.matches(NOW, NOW));
        assert!(PeriodState::Period(ReliabilityPeriod::WithinWeek).matches(NOW, NOW));
        assert!(!PeriodState::Period(ReliabilityPeriod::OverYear).matches(NOW, NOW));
    }

    #[test]
    fn exemptions_suppress_penalty_not_count() {
        let mut event = MissedTurnEvent {
            id: EventId(1),
            user: UserId(1),
            turn_date: NOW,
            live_game: false,
            mod_excused: false,
            same_period_excused: false,
            system_excused: false,
            period: PeriodState::Unassigned,
        };
        assert!(event.penalized());
        event.system_excused = true;
        assert!(!event.penalized());
        event.system_excused = false;
        event.same_period_excused = true;
        assert!(!event.penalized());
    }
}
