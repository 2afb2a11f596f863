use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ChatMessage, Conversation, CreditTransaction, Match, Profile, TransactionStatus};

/// Errors surfaced by the external stores
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

/// Profile store: the engine reads profiles and writes only the
/// `in_conversation` reservation flag.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, id: Uuid) -> Result<Profile, StoreError>;

    /// The candidate pool query: every matchmaking-eligible counterpart
    /// for the requester. Symmetric gender pairing, not reserved, not
    /// blocked, no block in either direction between the pair, within the
    /// requester's age bounds, requester excluded. Unordered.
    async fn find_candidates(&self, requester: &Profile) -> Result<Vec<Profile>, StoreError>;

    /// Atomic conditional reservation: set `in_conversation = true` only
    /// where it is currently false. Returns whether a row changed, so a
    /// lost race is observable instead of silently overwriting.
    async fn try_reserve(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Unconditionally clear the reservation flag.
    async fn release(&self, id: Uuid) -> Result<(), StoreError>;

    /// Free every profile flagged `in_conversation` that has neither an
    /// active match nor an active conversation. Idempotent; returns the
    /// ids freed so stranded pending transactions can be cleaned up too.
    async fn free_orphaned(&self) -> Result<Vec<Uuid>, StoreError>;
}

#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn insert_match(&self, m: &Match) -> Result<(), StoreError>;

    async fn get_match(&self, id: Uuid) -> Result<Option<Match>, StoreError>;

    async fn get_active_match_for_user(&self, user_id: Uuid) -> Result<Option<Match>, StoreError>;

    async fn deactivate_match(&self, id: Uuid) -> Result<(), StoreError>;
}

#[async_trait]
pub trait CreditStore: Send + Sync {
    async fn insert_transaction(&self, tx: &CreditTransaction) -> Result<(), StoreError>;

    /// Guarded transition from `pending` to the given terminal status.
    /// Returns whether a row actually transitioned; a transaction already
    /// in a terminal state never transitions again.
    async fn transition_status(
        &self,
        tx_id: Uuid,
        user_id: Uuid,
        to: TransactionStatus,
        description: Option<&str>,
    ) -> Result<bool, StoreError>;

    async fn get_transaction(
        &self,
        tx_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<CreditTransaction>, StoreError>;

    async fn find_pending_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<CreditTransaction>, StoreError>;

    /// The one credit debit. Only the ledger's confirm path calls this,
    /// and only after a successful pending->confirmed transition.
    async fn debit_credit(&self, user_id: Uuid, amount: u32) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn insert_conversation(&self, conversation: &Conversation) -> Result<(), StoreError>;

    async fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>, StoreError>;

    /// Atomically bump `messages_count`, advance `reveal_progress` by one
    /// (clamped to 100) and refresh `last_activity`. Returns the updated
    /// conversation.
    async fn advance_progress(&self, id: Uuid) -> Result<Conversation, StoreError>;

    async fn deactivate_conversation(&self, id: Uuid) -> Result<(), StoreError>;

    async fn insert_message(&self, message: &ChatMessage) -> Result<(), StoreError>;
}
