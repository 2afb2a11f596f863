use std::sync::Arc;
use uuid::Uuid;

use crate::core::{SelectedCandidate, TieredSelector};
use crate::models::{CreditTransaction, Match, Profile};
use crate::services::cache::{CacheKey, CacheManager};
use crate::services::credits::CreditService;
use crate::services::stores::{MatchStore, ProfileStore};
use crate::services::EngineError;

/// The full result of a successful match request.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub match_record: Match,
    pub candidate: Profile,
    pub transaction: CreditTransaction,
}

/// The match reservation coordinator.
///
/// Per request: reserve the requester, run the tiered selection, reserve
/// the counterpart, persist the match, open the pending credit
/// transaction. Every exit except full success puts the reservation
/// flags back to false before the outcome surfaces.
pub struct MatchService {
    profiles: Arc<dyn ProfileStore>,
    matches: Arc<dyn MatchStore>,
    credits: Arc<CreditService>,
    selector: TieredSelector,
    cache: Option<Arc<CacheManager>>,
}

impl MatchService {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        matches: Arc<dyn MatchStore>,
        credits: Arc<CreditService>,
        selector: TieredSelector,
        cache: Option<Arc<CacheManager>>,
    ) -> Self {
        Self {
            profiles,
            matches,
            credits,
            selector,
            cache,
        }
    }

    /// Find and reserve a match for the requester.
    ///
    /// `NoMatchFound` and `AlreadyInConversation` are expected outcomes;
    /// anything else means a store failed after rollback completed.
    pub async fn find_match(&self, user_id: Uuid) -> Result<MatchOutcome, EngineError> {
        let requester = self.profiles.get_profile(user_id).await?;

        if requester.in_conversation {
            return Err(EngineError::AlreadyInConversation);
        }

        // Atomic conditional reservation; losing the race here means a
        // concurrent request got the requester first.
        if !self.profiles.try_reserve(user_id).await? {
            return Err(EngineError::AlreadyInConversation);
        }

        match self.select_and_persist(&requester).await {
            Ok(outcome) => {
                self.invalidate_match_cache(outcome.match_record.user1_id).await;
                self.invalidate_match_cache(outcome.match_record.user2_id).await;

                tracing::info!(
                    "Match created: user1={} user2={} score={} distance={} tier={}",
                    outcome.match_record.user1_id,
                    outcome.match_record.user2_id,
                    outcome.match_record.compatibility_score,
                    outcome
                        .match_record
                        .distance_km
                        .map(|d| format!("{}km", d))
                        .unwrap_or_else(|| "N/A".to_string()),
                    outcome.match_record.tier
                );

                Ok(outcome)
            }
            Err(err) => {
                // The requester must never stay reserved past a failed flow
                self.release_quietly(user_id).await;
                Err(err)
            }
        }
    }

    /// The user's current active match, cache-first.
    pub async fn current_match(&self, user_id: Uuid) -> Result<Option<Match>, EngineError> {
        let key = CacheKey::active_match(user_id);

        if let Some(cache) = &self.cache {
            if let Ok(found) = cache.get::<Option<Match>>(&key).await {
                return Ok(found);
            }
        }

        let found = self.matches.get_active_match_for_user(user_id).await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(&key, &found).await {
                tracing::warn!("Failed to cache active match for {}: {}", user_id, e);
            }
        }

        Ok(found)
    }

    async fn select_and_persist(&self, requester: &Profile) -> Result<MatchOutcome, EngineError> {
        let pool = self.profiles.find_candidates(requester).await?;

        let selected = self
            .selector
            .select(requester, &pool)
            .ok_or(EngineError::NoMatchFound)?;

        tracing::debug!(
            "Selected candidate {} for {} (tier {}, score {})",
            selected.profile.id,
            requester.id,
            selected.tier,
            selected.score
        );

        // The pool snapshot predates this reservation, so the candidate
        // may have been taken in the meantime; a lost race reads as no
        // available match for this request.
        if !self.profiles.try_reserve(selected.profile.id).await? {
            return Err(EngineError::NoMatchFound);
        }

        match self.persist(requester, &selected).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.release_quietly(selected.profile.id).await;
                Err(err)
            }
        }
    }

    async fn persist(
        &self,
        requester: &Profile,
        selected: &SelectedCandidate,
    ) -> Result<MatchOutcome, EngineError> {
        let match_record = Match {
            id: Uuid::new_v4(),
            user1_id: requester.id,
            user2_id: selected.profile.id,
            compatibility_score: selected.score,
            distance_km: selected.distance_km,
            tier: selected.tier,
            is_active: true,
            created_at: chrono::Utc::now(),
        };

        self.matches.insert_match(&match_record).await?;

        let transaction = match self
            .credits
            .create_pending(requester.id, match_record.id)
            .await
        {
            Ok(tx) => tx,
            Err(err) => {
                // The match exists but its flow is aborting; deactivate so
                // the reconciliation invariant (reserved => active match)
                // stays clean after both flags reset.
                if let Err(e) = self.matches.deactivate_match(match_record.id).await {
                    tracing::warn!("Failed to deactivate match {}: {}", match_record.id, e);
                }
                return Err(err);
            }
        };

        Ok(MatchOutcome {
            match_record,
            candidate: selected.profile.clone(),
            transaction,
        })
    }

    async fn release_quietly(&self, user_id: Uuid) {
        if let Err(e) = self.profiles.release(user_id).await {
            tracing::error!("Failed to release reservation for {}: {}", user_id, e);
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
