use crate::time::UnixTime;
use crate::user::UserId;
use serde::{Deserialize, Serialize};

/// Identifier of a notice.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct NoticeId(pub u64);

/// A notification shown to a user.
///
/// Notices marked `keep` survive indefinitely; temporary ones are deleted by
/// the notice sweeper once they are older than the retention window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub id: NoticeId,
    pub user: UserId,
    pub keep: bool,
    pub time_sent: UnixTime,
    pub text: String,
}
