use crate::time::UnixTime;
use crate::user::UserId;
use serde::{Deserialize, Serialize};

/// A live connection record for a user.
///
/// Created on user activity, destroyed by the session reaper once
/// `last_request` is older than the idle threshold. The fingerprinting
/// fields exist to detect multi-accounting and are copied verbatim into the
/// access log when the session expires.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: UserId,
    pub last_request: UnixTime,
    /// Requests served during this session; flushed into the store-wide hit
    /// counter at reap time.
    pub hits: u64,
    pub ip: String,
    pub user_agent: String,
    pub cookie_code: String,
    pub browser_fingerprint: String,
}

/// Append-only copy of an expired session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLogEntry {
    pub user: UserId,
    pub last_request: UnixTime,
    pub hits: u64,
    pub ip: String,
    pub user_agent: String,
    pub cookie_code: String,
    pub browser_fingerprint: String,
}

impl From<&Session> for AccessLogEntry {
    fn from(session: &Session) -> Self {
        Self {
            user: session.user,
            last_request: session.last_request,
            hits: session.hits,
            ip: session.ip.clone(),
            user_agent: session.user_agent.clone(),
            cookie_code: session.cookie_code.clone(),
            browser_fingerprint: session.browser_fingerprint.clone(),
        }
    }
}
