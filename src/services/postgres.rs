use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use uuid::Uuid;

use crate::models::{
    ChatMessage, CompatibilityAnswers, Conversation, CreditTransaction, Gender, Match, MatchTier,
    Profile, TransactionStatus, TransactionType,
};
use crate::services::stores::{
    ConversationStore, CreditStore, MatchStore, ProfileStore, StoreError,
};

/// PostgreSQL client backing all of the engine's stores.
///
/// One pool serves the profile, match, credit and conversation stores;
/// the engine only ever touches the columns its contracts name.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(sqlx::Error::from)?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
        )
        .await
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn gender_from_str(value: &str) -> Result<Gender, StoreError> {
    match value {
        "male" => Ok(Gender::Male),
        "female" => Ok(Gender::Female),
        other => Err(StoreError::Constraint(format!("unknown gender: {}", other))),
    }
}

fn gender_as_str(gender: Gender) -> &'static str {
    match gender {
        Gender::Male => "male",
        Gender::Female => "female",
    }
}

fn tier_from_str(value: &str) -> Result<MatchTier, StoreError> {
    match value {
        "proximity" => Ok(MatchTier::Proximity),
        "locality" => Ok(MatchTier::Locality),
        "global" => Ok(MatchTier::Global),
        other => Err(StoreError::Constraint(format!("unknown tier: {}", other))),
    }
}

fn status_from_str(value: &str) -> Result<TransactionStatus, StoreError> {
    match value {
        "pending" => Ok(TransactionStatus::Pending),
        "confirmed" => Ok(TransactionStatus::Confirmed),
        "cancelled" => Ok(TransactionStatus::Cancelled),
        other => Err(StoreError::Constraint(format!("unknown status: {}", other))),
    }
}

fn status_as_str(status: TransactionStatus) -> &'static str {
    match status {
        TransactionStatus::Pending => "pending",
        TransactionStatus::Confirmed => "confirmed",
        TransactionStatus::Cancelled => "cancelled",
    }
}

fn profile_from_row(row: &PgRow) -> Result<Profile, StoreError> {
    Ok(Profile {
        id: row.try_get("id")?,
        first_name: row.try_get("first_name")?,
        gender: gender_from_str(row.try_get::<&str, _>("gender")?)?,
        looking_for: gender_from_str(row.try_get::<&str, _>("looking_for")?)?,
        lat: row.try_get("lat")?,
        lon: row.try_get("lon")?,
        city: row.try_get("city")?,
        distance_max: row.try_get("distance_max")?,
        age: row.try_get::<i32, _>("age")? as u8,
        age_min: row.try_get::<Option<i32>, _>("age_min")?.map(|v| v as u8),
        age_max: row.try_get::<Option<i32>, _>("age_max")?.map(|v| v as u8),
        answers: CompatibilityAnswers {
            q1_smoke: row.try_get("q1_smoke")?,
            q2_serious: row.try_get("q2_serious")?,
            q3_morning: row.try_get("q3_morning")?,
            q4_city: row.try_get("q4_city")?,
        },
        in_conversation: row.try_get("in_conversation")?,
        is_blocked: row.try_get("is_blocked")?,
        credits: row.try_get("credits")?,
        is_subscribed: row.try_get("is_subscribed")?,
    })
}

fn match_from_row(row: &PgRow) -> Result<Match, StoreError> {
    Ok(Match {
        id: row.try_get("id")?,
        user1_id: row.try_get("user1_id")?,
        user2_id: row.try_get("user2_id")?,
        compatibility_score: row.try_get::<i32, _>("compatibility_score")? as u8,
        distance_km: row.try_get("distance_km")?,
        tier: tier_from_str(row.try_get::<&str, _>("tier")?)?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
    })
}

fn transaction_from_row(row: &PgRow) -> Result<CreditTransaction, StoreError> {
    let tx_type = match row.try_get::<&str, _>("tx_type")? {
        "purchase" => TransactionType::Purchase,
        "usage" => TransactionType::Usage,
        other => return Err(StoreError::Constraint(format!("unknown tx type: {}", other))),
    };

    Ok(CreditTransaction {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        amount: row.try_get("amount")?,
        tx_type,
        status: status_from_str(row.try_get::<&str, _>("status")?)?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn conversation_from_row(row: &PgRow) -> Result<Conversation, StoreError> {
    Ok(Conversation {
        id: row.try_get("id")?,
        match_id: row.try_get("match_id")?,
        user1_id: row.try_get("user1_id")?,
        user2_id: row.try_get("user2_id")?,
        messages_count: row.try_get::<i32, _>("messages_count")? as u32,
        reveal_progress: row.try_get::<i32, _>("reveal_progress")? as u8,
        last_activity: row.try_get("last_activity")?,
        is_active: row.try_get("is_active")?,
    })
}

#[async_trait]
impl ProfileStore for PostgresClient {
    async fn get_profile(&self, id: Uuid) -> Result<Profile, StoreError> {
        let row = sqlx::query("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("profile {}", id)))?;

        profile_from_row(&row)
    }

    async fn find_candidates(&self, requester: &Profile) -> Result<Vec<Profile>, StoreError> {
        let (age_min, age_max) = requester.age_bounds();

        // Symmetric gender pairing plus the block check in both
        // directions; the requester row itself never qualifies.
        let query = r#"
            SELECT p.* FROM profiles p
            WHERE p.id <> $1
              AND p.gender = $2
              AND p.looking_for = $3
              AND p.in_conversation = FALSE
              AND p.is_blocked = FALSE
              AND p.age BETWEEN $4 AND $5
              AND NOT EXISTS (
                  SELECT 1 FROM blocks b
                  WHERE (b.blocker_id = $1 AND b.blocked_id = p.id)
                     OR (b.blocker_id = p.id AND b.blocked_id = $1)
              )
        "#;

        let rows = sqlx::query(query)
            .bind(requester.id)
            .bind(gender_as_str(requester.looking_for))
            .bind(gender_as_str(requester.gender))
            .bind(age_min as i32)
            .bind(age_max as i32)
            .fetch_all(&self.pool)
            .await?;

        let candidates = rows
            .iter()
            .map(profile_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            "Candidate pool for {}: {} profiles",
            requester.id,
            candidates.len()
        );

        Ok(candidates)
    }

    async fn try_reserve(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE profiles SET in_conversation = TRUE WHERE id = $1 AND in_conversation = FALSE",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn release(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE profiles SET in_conversation = FALSE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn free_orphaned(&self) -> Result<Vec<Uuid>, StoreError> {
        let query = r#"
            UPDATE profiles p SET in_conversation = FALSE
            WHERE p.in_conversation = TRUE
              AND NOT EXISTS (
                  SELECT 1 FROM matches m
                  WHERE m.is_active AND (m.user1_id = p.id OR m.user2_id = p.id)
              )
              AND NOT EXISTS (
                  SELECT 1 FROM conversations c
                  WHERE c.is_active AND (c.user1_id = p.id OR c.user2_id = p.id)
              )
            RETURNING p.id
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| row.try_get("id").map_err(Into::into))
            .collect()
    }
}

#[async_trait]
impl MatchStore for PostgresClient {
    async fn insert_match(&self, m: &Match) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO matches
                (id, user1_id, user2_id, compatibility_score, distance_km, tier, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#;

        sqlx::query(query)
            .bind(m.id)
            .bind(m.user1_id)
            .bind(m.user2_id)
            .bind(m.compatibility_score as i32)
            .bind(m.distance_km)
            .bind(m.tier.to_string())
            .bind(m.is_active)
            .bind(m.created_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_match(&self, id: Uuid) -> Result<Option<Match>, StoreError> {
        let row = sqlx::query("SELECT * FROM matches WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn get_active_match_for_user(&self, user_id: Uuid) -> Result<Option<Match>, StoreError> {
        let query = r#"
            SELECT * FROM matches
            WHERE is_active = TRUE AND (user1_id = $1 OR user2_id = $1)
            ORDER BY created_at DESC
            LIMIT 1
        "#;

        let row = sqlx::query(query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn deactivate_match(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE matches SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl CreditStore for PostgresClient {
    async fn insert_transaction(&self, tx: &CreditTransaction) -> Result<(), StoreError> {
        let tx_type = match tx.tx_type {
            TransactionType::Purchase => "purchase",
            TransactionType::Usage => "usage",
        };

        let query = r#"
            INSERT INTO credit_transactions
                (id, user_id, amount, tx_type, status, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#;

        sqlx::query(query)
            .bind(tx.id)
            .bind(tx.user_id)
            .bind(tx.amount)
            .bind(tx_type)
            .bind(status_as_str(tx.status))
            .bind(&tx.description)
            .bind(tx.created_at)
            .bind(tx.updated_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn transition_status(
        &self,
        tx_id: Uuid,
        user_id: Uuid,
        to: TransactionStatus,
        description: Option<&str>,
    ) -> Result<bool, StoreError> {
        // Guarded on status='pending' so terminal states never transition
        let query = r#"
            UPDATE credit_transactions
            SET status = $3,
                description = COALESCE($4, description),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND status = 'pending'
        "#;

        let result = sqlx::query(query)
            .bind(tx_id)
            .bind(user_id)
            .bind(status_as_str(to))
            .bind(description)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn get_transaction(
        &self,
        tx_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<CreditTransaction>, StoreError> {
        let row = sqlx::query("SELECT * FROM credit_transactions WHERE id = $1 AND user_id = $2")
            .bind(tx_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(transaction_from_row).transpose()
    }

    async fn find_pending_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<CreditTransaction>, StoreError> {
        let query = r#"
            SELECT * FROM credit_transactions
            WHERE user_id = $1 AND status = 'pending'
            ORDER BY created_at DESC
            LIMIT 1
        "#;

        let row = sqlx::query(query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(transaction_from_row).transpose()
    }

    async fn debit_credit(&self, user_id: Uuid, amount: u32) -> Result<(), StoreError> {
        sqlx::query("UPDATE profiles SET credits = credits - $2 WHERE id = $1")
            .bind(user_id)
            .bind(amount as i32)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl ConversationStore for PostgresClient {
    async fn insert_conversation(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO conversations
                (id, match_id, user1_id, user2_id, messages_count, reveal_progress, last_activity, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#;

        sqlx::query(query)
            .bind(conversation.id)
            .bind(conversation.match_id)
            .bind(conversation.user1_id)
            .bind(conversation.user2_id)
            .bind(conversation.messages_count as i32)
            .bind(conversation.reveal_progress as i32)
            .bind(conversation.last_activity)
            .bind(conversation.is_active)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>, StoreError> {
        let row = sqlx::query("SELECT * FROM conversations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(conversation_from_row).transpose()
    }

    async fn advance_progress(&self, id: Uuid) -> Result<Conversation, StoreError> {
        // Single statement keeps the read-modify-write atomic; LEAST
        // enforces the 100% reveal cap in the store itself.
        let query = r#"
            UPDATE conversations
            SET messages_count = messages_count + 1,
                reveal_progress = LEAST(reveal_progress + 1, 100),
                last_activity = NOW()
            WHERE id = $1
            RETURNING *
        "#;

        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("conversation {}", id)))?;

        conversation_from_row(&row)
    }

    async fn deactivate_conversation(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE conversations SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn insert_message(&self, message: &ChatMessage) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO messages (id, conversation_id, sender_id, content, is_system, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
        "#;

        sqlx::query(query)
            .bind(message.id)
            .bind(message.conversation_id)
            .bind(message.sender_id)
            .bind(&message.content)
            .bind(message.is_system)
            .bind(message.created_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
