use std::sync::Arc;
use uuid::Uuid;

use crate::models::{ChatMessage, Conversation};
use crate::services::cache::{CacheKey, CacheManager};
use crate::services::credits::CreditService;
use crate::services::stores::{ConversationStore, MatchStore, ProfileStore};
use crate::services::EngineError;

/// Default system welcome message (message #0, excluded from progress)
pub const DEFAULT_WELCOME_MESSAGE: &str =
    "Bienvenue dans votre conversation Gradly ! Soyez authentique, respectueux et amusez-vous bien !";

/// Conversation lifecycle: start, per-message reveal progress, end, and
/// the orphan-reservation reconciliation sweep.
pub struct ConversationService {
    profiles: Arc<dyn ProfileStore>,
    matches: Arc<dyn MatchStore>,
    conversations: Arc<dyn ConversationStore>,
    credits: Arc<CreditService>,
    cache: Option<Arc<CacheManager>>,
    welcome_message: String,
}

impl ConversationService {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        matches: Arc<dyn MatchStore>,
        conversations: Arc<dyn ConversationStore>,
        credits: Arc<CreditService>,
        cache: Option<Arc<CacheManager>>,
        welcome_message: Option<String>,
    ) -> Self {
        Self {
            profiles,
            matches,
            conversations,
            credits,
            cache,
            welcome_message: welcome_message
                .unwrap_or_else(|| DEFAULT_WELCOME_MESSAGE.to_string()),
        }
    }

    /// Start the conversation for a match the caller participates in.
    ///
    /// Gated on the credit ledger; the pending transaction opened at
    /// match time stays pending until the first message confirms it.
    pub async fn start(&self, match_id: Uuid, user_id: Uuid) -> Result<Conversation, EngineError> {
        let m = self
            .matches
            .get_match(match_id)
            .await?
            .ok_or_else(|| crate::services::StoreError::NotFound(format!("match {}", match_id)))?;

        if !m.involves(user_id) {
            return Err(EngineError::NotParticipant);
        }
        if !m.is_active {
            return Err(EngineError::MatchClosed);
        }

        let gate = self.credits.can_start(user_id).await?;
        if !gate.allowed {
            return Err(EngineError::NoCredits);
        }

        let conversation = Conversation {
            id: Uuid::new_v4(),
            match_id,
            user1_id: m.user1_id,
            user2_id: m.user2_id,
            messages_count: 0,
            reveal_progress: 0,
            last_activity: chrono::Utc::now(),
            is_active: true,
        };

        self.conversations.insert_conversation(&conversation).await?;

        // System welcome is message #0: not counted, no progress
        let welcome = ChatMessage {
            id: Uuid::new_v4(),
            conversation_id: conversation.id,
            sender_id: None,
            content: self.welcome_message.clone(),
            is_system: true,
            created_at: chrono::Utc::now(),
        };
        self.conversations.insert_message(&welcome).await?;

        tracing::info!(
            "Conversation started: {} (match {}, gate: {:?})",
            conversation.id,
            match_id,
            gate.reason
        );

        Ok(conversation)
    }

    /// Persist a user message and advance the reveal progress by one step
    /// (clamped at 100). The very first user message confirms the pending
    /// credit transaction - progress is recorded first, so a crash in
    /// between leaves the transaction pending rather than double-debited.
    pub async fn send_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: String,
    ) -> Result<(ChatMessage, Conversation), EngineError> {
        let conversation = self.get_active(conversation_id).await?;

        if !conversation.involves(sender_id) {
            return Err(EngineError::NotParticipant);
        }

        let message = ChatMessage {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id: Some(sender_id),
            content,
            is_system: false,
            created_at: chrono::Utc::now(),
        };
        self.conversations.insert_message(&message).await?;

        let updated = self.conversations.advance_progress(conversation_id).await?;

        if updated.messages_count == 1 {
            self.confirm_pending(&updated).await?;
        }

        tracing::debug!(
            "Message recorded: conversation={} progress={}%",
            conversation_id,
            updated.reveal_progress
        );

        Ok((message, updated))
    }

    /// End the conversation: deactivate it and its match, free both
    /// participants, and cancel any still-pending transaction of either
    /// participant. This is the one non-sweep path that releases a
    /// long-held reservation.
    pub async fn end(&self, conversation_id: Uuid, ended_by: Uuid) -> Result<(), EngineError> {
        let conversation = self
            .conversations
            .get_conversation(conversation_id)
            .await?
            .ok_or_else(|| {
                crate::services::StoreError::NotFound(format!("conversation {}", conversation_id))
            })?;

        if !conversation.involves(ended_by) {
            return Err(EngineError::NotParticipant);
        }
        if !conversation.is_active {
            // Ending twice is harmless
            return Ok(());
        }

        self.conversations
            .deactivate_conversation(conversation_id)
            .await?;
        self.matches.deactivate_match(conversation.match_id).await?;

        for user_id in [conversation.user1_id, conversation.user2_id] {
            self.profiles.release(user_id).await?;
            self.cancel_pending_for(user_id, "Conversation ended").await;
            self.invalidate_match_cache(user_id).await;
        }

        tracing::info!(
            "Conversation ended: {} by user {}",
            conversation_id,
            ended_by
        );

        Ok(())
    }

    /// Reconciliation sweep: free every user flagged `in_conversation`
    /// without an active match or conversation, and cancel their stranded
    /// pending transactions. Idempotent; returns the number freed.
    pub async fn reconcile(&self) -> Result<usize, EngineError> {
        let freed = self.profiles.free_orphaned().await?;

        for user_id in &freed {
            self.cancel_pending_for(*user_id, "Reconciliation sweep").await;
            self.invalidate_match_cache(*user_id).await;
        }

        tracing::info!("Reconcile sweep freed {} users", freed.len());

        Ok(freed.len())
    }

    async fn get_active(&self, conversation_id: Uuid) -> Result<Conversation, EngineError> {
        let conversation = self
            .conversations
            .get_conversation(conversation_id)
            .await?
            .ok_or_else(|| {
                crate::services::StoreError::NotFound(format!("conversation {}", conversation_id))
            })?;

        if !conversation.is_active {
            return Err(EngineError::ConversationClosed);
        }

        Ok(conversation)
    }

    /// Confirm the pending transaction backing this conversation. The
    /// pending belongs to the match requester (user1); a subscribed user
    /// may legitimately have none if the sweep already cleaned it up.
    async fn confirm_pending(&self, conversation: &Conversation) -> Result<(), EngineError> {
        match self.credits.get_pending(conversation.user1_id).await? {
            Some(tx) => self.credits.confirm(tx.id, conversation.user1_id).await,
            None => {
                tracing::warn!(
                    "First message in {} but no pending transaction for {}",
                    conversation.id,
                    conversation.user1_id
                );
                Ok(())
            }
        }
    }

    /// Best-effort pending cancellation on teardown paths; a failure here
    /// must not mask the teardown itself.
    async fn cancel_pending_for(&self, user_id: Uuid, reason: &str) {
        match self.credits.get_pending(user_id).await {
            Ok(Some(tx)) => {
                if let Err(e) = self.credits.cancel(tx.id, user_id, reason).await {
                    tracing::warn!("Failed to cancel pending tx {} for {}: {}", tx.id, user_id, e);
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Failed to look up pending tx for {}: {}", user_id, e);
            }
        }
    }

    async fn invalidate_match_cache(&self, user_id: Uuid) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.delete(&CacheKey::active_match(user_id)).await {
                tracing::warn!("Failed to invalidate match cache for {}: {}", user_id, e);
            }
        }
    }
}
