//! Common types for the gambit maintenance engine.
//!
//! This crate holds the shared data model for a turn-based strategy-game
//! platform: users and their live sessions, the append-only gameplay event
//! records (phase completions and missed turns), games and their members,
//! and the error taxonomy shared by the engine and the scheduler.
//!
//! Everything here is plain data. The rules that keep the derived aggregates
//! (`yearly_phase_count`, `reliability_rating`, vote resolutions) consistent
//! live in `gambit-engine`.

mod error;
mod events;
mod game;
mod notice;
mod session;
mod time;
mod user;

pub use error::{EngineError, ProcessError, StoreError};
pub use events::{
    EventId, MissedTurnEvent, PeriodState, ReliabilityPeriod, TurnDateEvent, YearFlag,
};
pub use game::{
    Game, GameId, GamePhase, Member, MemberStatus, OrderFlag, OrderSet, VariantId, Vote, VoteSet,
};
pub use notice::{Notice, NoticeId};
pub use session::{AccessLogEntry, Session};
pub use time::{UnixTime, DAY_SECS, MONTH_DAYS, WEEK_DAYS, YEAR_DAYS, YEAR_SECS};
pub use user::{MessageId, User, UserId, UserKind};
