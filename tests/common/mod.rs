//! Shared in-memory store for service-level tests.
//!
//! Implements the store traits over plain mutex-guarded maps so the
//! matching, credit and conversation services can be exercised without
//! PostgreSQL.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use gradly_engine::models::{
    ChatMessage, CompatibilityAnswers, Conversation, CreditTransaction, Gender, Match, Profile,
    TransactionStatus,
};
use gradly_engine::services::{
    ConversationStore, CreditStore, MatchStore, ProfileStore, StoreError,
};

#[derive(Default)]
pub struct InMemoryStore {
    pub profiles: Mutex<HashMap<Uuid, Profile>>,
    pub blocks: Mutex<HashSet<(Uuid, Uuid)>>,
    pub matches: Mutex<Vec<Match>>,
    pub transactions: Mutex<Vec<CreditTransaction>>,
    pub conversations: Mutex<HashMap<Uuid, Conversation>>,
    pub messages: Mutex<Vec<ChatMessage>>,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_profile(&self, profile: Profile) {
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.id, profile);
    }

    pub fn add_block(&self, blocker: Uuid, blocked: Uuid) {
        self.blocks.lock().unwrap().insert((blocker, blocked));
    }

    pub fn profile(&self, id: Uuid) -> Profile {
        self.profiles.lock().unwrap().get(&id).cloned().unwrap()
    }

    pub fn transactions_for(&self, user_id: Uuid) -> Vec<CreditTransaction> {
        self.transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|tx| tx.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn messages_in(&self, conversation_id: Uuid) -> Vec<ChatMessage> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn get_profile(&self, id: Uuid) -> Result<Profile, StoreError> {
        self.profiles
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("profile {}", id)))
    }

    async fn find_candidates(&self, requester: &Profile) -> Result<Vec<Profile>, StoreError> {
        let blocks = self.blocks.lock().unwrap();
        let (age_min, age_max) = requester.age_bounds();

        let candidates = self
            .profiles
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.id != requester.id)
            .filter(|p| p.gender == requester.looking_for && p.looking_for == requester.gender)
            .filter(|p| !p.in_conversation && !p.is_blocked)
            .filter(|p| p.age >= age_min && p.age <= age_max)
            .filter(|p| {
                !blocks.contains(&(requester.id, p.id)) && !blocks.contains(&(p.id, requester.id))
            })
            .cloned()
            .collect();

        Ok(candidates)
    }

    async fn try_reserve(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("profile {}", id)))?;

        if profile.in_conversation {
            return Ok(false);
        }
        profile.in_conversation = true;
        Ok(true)
    }

    async fn release(&self, id: Uuid) -> Result<(), StoreError> {
        if let Some(profile) = self.profiles.lock().unwrap().get_mut(&id) {
            profile.in_conversation = false;
        }
        Ok(())
    }

    async fn free_orphaned(&self) -> Result<Vec<Uuid>, StoreError> {
        let matches = self.matches.lock().unwrap();
        let conversations = self.conversations.lock().unwrap();
        let mut profiles = self.profiles.lock().unwrap();

        let mut freed = Vec::new();
        for profile in profiles.values_mut() {
            if !profile.in_conversation {
                continue;
            }
            let has_match = matches.iter().any(|m| m.is_active && m.involves(profile.id));
            let has_conversation = conversations
                .values()
                .any(|c| c.is_active && c.involves(profile.id));

            if !has_match && !has_conversation {
                profile.in_conversation = false;
                freed.push(profile.id);
            }
        }
        Ok(freed)
    }
}

#[async_trait]
impl MatchStore for InMemoryStore {
    async fn insert_match(&self, m: &Match) -> Result<(), StoreError> {
        self.matches.lock().unwrap().push(m.clone());
        Ok(())
    }

    async fn get_match(&self, id: Uuid) -> Result<Option<Match>, StoreError> {
        Ok(self
            .matches
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id == id)
            .cloned())
    }

    async fn get_active_match_for_user(&self, user_id: Uuid) -> Result<Option<Match>, StoreError> {
        Ok(self
            .matches
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.is_active && m.involves(user_id))
            .cloned())
    }

    async fn deactivate_match(&self, id: Uuid) -> Result<(), StoreError> {
        for m in self.matches.lock().unwrap().iter_mut() {
            if m.id == id {
                m.is_active = false;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CreditStore for InMemoryStore {
    async fn insert_transaction(&self, tx: &CreditTransaction) -> Result<(), StoreError> {
        self.transactions.lock().unwrap().push(tx.clone());
        Ok(())
    }

    async fn transition_status(
        &self,
        tx_id: Uuid,
        user_id: Uuid,
        to: TransactionStatus,
        description: Option<&str>,
    ) -> Result<bool, StoreError> {
        let mut transactions = self.transactions.lock().unwrap();
        for tx in transactions.iter_mut() {
            if tx.id == tx_id && tx.user_id == user_id {
                if tx.status != TransactionStatus::Pending {
                    return Ok(false);
                }
                tx.status = to;
                if let Some(desc) = description {
                    tx.description = desc.to_string();
                }
                tx.updated_at = chrono::Utc::now();
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn get_transaction(
        &self,
        tx_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<CreditTransaction>, StoreError> {
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .find(|tx| tx.id == tx_id && tx.user_id == user_id)
            .cloned())
    }

    async fn find_pending_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<CreditTransaction>, StoreError> {
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .find(|tx| tx.user_id == user_id && tx.status == TransactionStatus::Pending)
            .cloned())
    }

    async fn debit_credit(&self, user_id: Uuid, amount: u32) -> Result<(), StoreError> {
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::NotFound(format!("profile {}", user_id)))?;
        profile.credits -= amount as i32;
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    async fn insert_conversation(&self, conversation: &Conversation) -> Result<(), StoreError> {
        self.conversations
            .lock()
            .unwrap()
            .insert(conversation.id, conversation.clone());
        Ok(())
    }

    async fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>, StoreError> {
        Ok(self.conversations.lock().unwrap().get(&id).cloned())
    }

    async fn advance_progress(&self, id: Uuid) -> Result<Conversation, StoreError> {
        let mut conversations = self.conversations.lock().unwrap();
        let conversation = conversations
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("conversation {}", id)))?;

        conversation.messages_count += 1;
        conversation.reveal_progress = (conversation.reveal_progress + 1).min(100);
        conversation.last_activity = chrono::Utc::now();

        Ok(conversation.clone())
    }

    async fn deactivate_conversation(&self, id: Uuid) -> Result<(), StoreError> {
        if let Some(conversation) = self.conversations.lock().unwrap().get_mut(&id) {
            conversation.is_active = false;
        }
        Ok(())
    }

    async fn insert_message(&self, message: &ChatMessage) -> Result<(), StoreError> {
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Baseline female profile at the Paris coordinates
pub fn profile(first_name: &str) -> Profile {
    Profile {
        id: Uuid::new_v4(),
        first_name: first_name.to_string(),
        gender: Gender::Female,
        looking_for: Gender::Male,
        lat: Some(48.8566),
        lon: Some(2.3522),
        city: Some("Paris".to_string()),
        distance_max: None,
        age: 27,
        age_min: None,
        age_max: None,
        answers: CompatibilityAnswers::all(true),
        in_conversation: false,
        is_blocked: false,
        credits: 7,
        is_subscribed: false,
    }
}

/// Male counterpart of `profile`, same coordinates
pub fn male_profile(first_name: &str) -> Profile {
    let mut p = profile(first_name);
    p.gender = Gender::Male;
    p.looking_for = Gender::Female;
    p
}
