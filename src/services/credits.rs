use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    CreditGate, CreditGateReason, CreditTransaction, TransactionStatus, TransactionType,
};
use crate::services::stores::{CreditStore, ProfileStore};
use crate::services::EngineError;

/// Cost of starting one conversation
pub const CONVERSATION_COST: u32 = 1;

/// The credit ledger: a pending/confirmed/cancelled state machine around
/// conversation starts, plus the subscription bypass.
///
/// A transaction reaches exactly one terminal state. The debit happens
/// once, inside `confirm`, and only on the transition that actually moved
/// the row out of `pending` - so a doubled confirm can never double-debit.
pub struct CreditService {
    profiles: Arc<dyn ProfileStore>,
    credits: Arc<dyn CreditStore>,
}

impl CreditService {
    pub fn new(profiles: Arc<dyn ProfileStore>, credits: Arc<dyn CreditStore>) -> Self {
        Self { profiles, credits }
    }

    /// Whether the user may start a conversation. Subscribed users always
    /// pass; everyone else needs at least one credit.
    pub async fn can_start(&self, user_id: Uuid) -> Result<CreditGate, EngineError> {
        let profile = self.profiles.get_profile(user_id).await?;

        if profile.is_subscribed {
            return Ok(CreditGate {
                allowed: true,
                reason: CreditGateReason::Subscribed,
            });
        }

        if profile.credits >= CONVERSATION_COST as i32 {
            return Ok(CreditGate {
                allowed: true,
                reason: CreditGateReason::HasCredits,
            });
        }

        Ok(CreditGate {
            allowed: false,
            reason: CreditGateReason::NoCredits,
        })
    }

    /// Create the pending usage transaction for a freshly persisted match.
    /// No credit moves yet. At most one pending transaction may exist per
    /// user; the ledger enforces that here rather than trusting callers.
    pub async fn create_pending(
        &self,
        user_id: Uuid,
        match_id: Uuid,
    ) -> Result<CreditTransaction, EngineError> {
        if self.credits.find_pending_for_user(user_id).await?.is_some() {
            return Err(EngineError::PendingExists);
        }

        let now = chrono::Utc::now();
        let tx = CreditTransaction {
            id: Uuid::new_v4(),
            user_id,
            amount: -(CONVERSATION_COST as i32),
            tx_type: TransactionType::Usage,
            status: TransactionStatus::Pending,
            description: format!("Match found (awaiting chat) - match {}", match_id),
            created_at: now,
            updated_at: now,
        };

        self.credits.insert_transaction(&tx).await?;

        tracing::info!("Pending transaction created: user={} match={}", user_id, match_id);

        Ok(tx)
    }

    /// Transition `pending -> confirmed` and perform the single debit.
    ///
    /// Idempotent against double invocation: confirming an
    /// already-confirmed transaction is a no-op; confirming a cancelled
    /// one is a precondition violation.
    pub async fn confirm(&self, tx_id: Uuid, user_id: Uuid) -> Result<(), EngineError> {
        let transitioned = self
            .credits
            .transition_status(tx_id, user_id, TransactionStatus::Confirmed, None)
            .await?;

        if transitioned {
            self.credits.debit_credit(user_id, CONVERSATION_COST).await?;
            tracing::info!(
                "Transaction confirmed: {} - {} credit debited for user {}",
                tx_id,
                CONVERSATION_COST,
                user_id
            );
            return Ok(());
        }

        // The row did not move; find out why before deciding
        match self.credits.get_transaction(tx_id, user_id).await? {
            Some(tx) if tx.status == TransactionStatus::Confirmed => Ok(()),
            Some(_) => Err(EngineError::InvalidTransition),
            None => Err(crate::services::StoreError::NotFound(format!("transaction {}", tx_id)).into()),
        }
    }

    /// Transition `pending -> cancelled`; the credit is preserved.
    /// Cancelling an already-cancelled transaction is a no-op; cancelling
    /// a confirmed one is a precondition violation.
    pub async fn cancel(
        &self,
        tx_id: Uuid,
        user_id: Uuid,
        reason: &str,
    ) -> Result<(), EngineError> {
        let transitioned = self
            .credits
            .transition_status(tx_id, user_id, TransactionStatus::Cancelled, Some(reason))
            .await?;

        if transitioned {
            tracing::info!(
                "Transaction cancelled: {} - credit preserved for user {} ({})",
                tx_id,
                user_id,
                reason
            );
            return Ok(());
        }

        match self.credits.get_transaction(tx_id, user_id).await? {
            Some(tx) if tx.status == TransactionStatus::Cancelled => Ok(()),
            Some(_) => Err(EngineError::InvalidTransition),
            None => Err(crate::services::StoreError::NotFound(format!("transaction {}", tx_id)).into()),
        }
    }

    /// The user's open pending transaction, if any.
    pub async fn get_pending(
        &self,
        user_id: Uuid,
    ) -> Result<Option<CreditTransaction>, EngineError> {
        Ok(self.credits.find_pending_for_user(user_id).await?)
    }
}
