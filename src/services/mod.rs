// Service exports
pub mod cache;
pub mod conversations;
pub mod credits;
pub mod matching;
pub mod postgres;
pub mod stores;

pub use cache::{CacheError, CacheKey, CacheManager};
pub use conversations::ConversationService;
pub use credits::CreditService;
pub use matching::{MatchOutcome, MatchService};
pub use postgres::PostgresClient;
pub use stores::{ConversationStore, CreditStore, MatchStore, ProfileStore, StoreError};

use thiserror::Error;

/// Errors surfaced by the orchestration layer.
///
/// The first three variants are expected terminal outcomes, not faults;
/// the HTTP layer turns them into structured responses a client can
/// distinguish from a retryable failure. Precondition violations mean
/// the caller must not blindly retry. Store failures propagate only
/// after any reservation taken in the current flow has been rolled back.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no match found")]
    NoMatchFound,

    #[error("already in conversation")]
    AlreadyInConversation,

    #[error("not enough credits")]
    NoCredits,

    #[error("a pending transaction already exists for this user")]
    PendingExists,

    #[error("transaction is not in a state that allows this transition")]
    InvalidTransition,

    #[error("user is not a participant of this conversation or match")]
    NotParticipant,

    #[error("match is no longer active")]
    MatchClosed,

    #[error("conversation is no longer active")]
    ConversationClosed,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Expected terminal outcomes are part of the normal protocol, not
    /// failures worth an error log line.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            EngineError::NoMatchFound | EngineError::AlreadyInConversation | EngineError::NoCredits
        )
    }
}
