use crate::game::GameId;
use thiserror::Error;

/// Failure inside the event store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The transaction could not be committed. Effects are rolled back and
    /// the operation may be retried on the next tick.
    #[error("transaction commit failed")]
    CommitFailed,
}

/// Failure of a maintenance component.
///
/// Storage failures are local to the current tick and retryable; an
/// invariant violation indicates a tracking bug upstream and is fatal.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl EngineError {
    /// Whether the scheduler may simply retry on the next tick.
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Store(_) => true,
            EngineError::InvariantViolation(_) => false,
        }
    }
}

/// Rejection from the game-processing collaborator.
///
/// Isolated per game: the underlying vote/order state is unchanged, so a
/// rejected game is simply retried on the next tick.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProcessError {
    #[error("game {0:?} rejected vote application: {1}")]
    VoteRejected(GameId, String),
    #[error("game {0:?} rejected phase advance: {1}")]
    AdvanceRejected(GameId, String),
}
