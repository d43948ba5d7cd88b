use crate::time::UnixTime;
use serde::{Deserialize, Serialize};

/// Identifier of a platform user.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct UserId(pub u64);

/// Identifier of a message on the linked discussion service.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct MessageId(pub u64);

/// What kind of account a user is.
///
/// Bots play games like anyone else but are excluded from vote consensus:
/// a game is unanimous when every non-bot playing member agrees.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserKind {
    Human,
    Moderator,
    Bot,
}

impl UserKind {
    pub fn is_bot(&self) -> bool {
        matches!(self, UserKind::Bot)
    }
}

/// A platform user together with the derived aggregates maintained by the
/// engine.
///
/// `yearly_phase_count` and `reliability_rating` are never written by live
/// gameplay; only the yearly activity tracker and the reliability rating
/// calculator mutate them, inside their own transactions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub kind: UserKind,
    /// Count of phases played within the trailing 365 days. Always equals
    /// the number of this user's turn-date events flagged fresh after a
    /// completed maintenance tick.
    pub yearly_phase_count: u32,
    /// Score in [0, 100] derived from recent missed-turn history.
    pub reliability_rating: f64,
    /// Set when the session reaper expires this user's session.
    pub time_last_session_ended: Option<UnixTime>,
    /// Marker for the linked discussion service, advanced at session end
    /// when such a service is configured.
    pub last_message_viewed: Option<MessageId>,
}

impl User {
    /// A new user starts with a clean rating and no recorded activity.
    pub fn new(id: UserId, kind: UserKind) -> Self {
        Self {
            id,
            kind,
            yearly_phase_count: 0,
            reliability_rating: 100.0,
            time_last_session_ended: None,
            last_message_viewed: None,
        }
    }
}
