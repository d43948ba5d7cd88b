use crate::user::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a game.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct GameId(pub u64);

/// Identifier of a map variant.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct VariantId(pub u64);

/// Phase a game is currently in. `Finished` is terminal: finished games are
/// invisible to vote consensus and order readiness.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    PreGame,
    Diplomacy,
    Retreats,
    Builds,
    Finished,
}

impl GamePhase {
    pub fn is_finished(&self) -> bool {
        matches!(self, GamePhase::Finished)
    }
}

/// A game on the platform.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub variant: VariantId,
    pub phase: GamePhase,
}

/// Whether a member is still playing. Only `Playing` members participate in
/// vote consensus and order readiness.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberStatus {
    Playing,
    Defeated,
    Left,
    Drawn,
    Won,
}

/// A vote a member can cast. The discriminants are the wire bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Vote {
    Draw = 1,
    Pause = 2,
    Cancel = 4,
    Concede = 8,
}

impl Vote {
    /// All vote kinds, in unanimity tie-break order: when a degenerate
    /// distribution makes several votes simultaneously unanimous, the first
    /// match here wins.
    pub const RESOLUTION_ORDER: [Vote; 4] = [Vote::Draw, Vote::Cancel, Vote::Concede, Vote::Pause];

    fn bit(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Vote::Draw => "Draw",
            Vote::Pause => "Pause",
            Vote::Cancel => "Cancel",
            Vote::Concede => "Concede",
        };
        f.write_str(name)
    }
}

/// The set of votes a member has cast.
///
/// A named-bit set rather than a raw integer so call sites state which vote
/// they mean; the underlying byte matches the source schema's bitmask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VoteSet(u8);

impl VoteSet {
    pub const EMPTY: VoteSet = VoteSet(0);

    pub fn has(&self, vote: Vote) -> bool {
        self.0 & vote.bit() != 0
    }

    pub fn insert(&mut self, vote: Vote) {
        self.0 |= vote.bit();
    }

    pub fn remove(&mut self, vote: Vote) {
        self.0 &= !vote.bit();
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<Vote> for VoteSet {
    fn from_iter<I: IntoIterator<Item = Vote>>(iter: I) -> Self {
        let mut set = VoteSet::EMPTY;
        for vote in iter {
            set.insert(vote);
        }
        set
    }
}

/// A named order-status bit.
///
/// `SAVED` and `COMPLETED` share bit 2: the source schema maps both to the
/// same value, making them indistinguishable in the readiness aggregate.
/// That collapsed semantics is preserved deliberately.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFlag(u8);

impl OrderFlag {
    /// The member has no orders to submit this phase.
    pub const NO_ORDERS: OrderFlag = OrderFlag(1);
    /// The member has saved a draft of their orders.
    pub const SAVED: OrderFlag = OrderFlag(2);
    /// The member has filled in all their orders.
    pub const COMPLETED: OrderFlag = OrderFlag(2);
    /// The member has flagged ready; the phase may advance without them.
    pub const READY: OrderFlag = OrderFlag(8);
}

/// The order-status bits of a member, mirroring [`VoteSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OrderSet(u8);

impl OrderSet {
    pub const EMPTY: OrderSet = OrderSet(0);

    pub fn only(flag: OrderFlag) -> Self {
        OrderSet(flag.0)
    }

    pub fn has(&self, flag: OrderFlag) -> bool {
        self.0 & flag.0 != 0
    }

    pub fn insert(&mut self, flag: OrderFlag) {
        self.0 |= flag.0;
    }

    pub fn remove(&mut self, flag: OrderFlag) {
        self.0 &= !flag.0;
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }
}

/// A user's seat in one game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub game: GameId,
    pub user: UserId,
    pub status: MemberStatus,
    pub votes: VoteSet,
    pub orders: OrderSet,
}

impl Member {
    pub fn new(game: GameId, user: UserId) -> Self {
        Self {
            game,
            user,
            status: MemberStatus::Playing,
            votes: VoteSet::EMPTY,
            orders: OrderSet::only(OrderFlag::NO_ORDERS),
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.status, MemberStatus::Playing)
    }
}
