use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default search radius when a profile has none configured (km)
pub const DEFAULT_RADIUS_KM: f64 = 50.0;
/// Configurable radius bounds (km)
pub const MIN_RADIUS_KM: f64 = 10.0;
pub const MAX_RADIUS_KM: f64 = 200.0;
/// Default age preference bounds
pub const DEFAULT_AGE_MIN: u8 = 18;
pub const DEFAULT_AGE_MAX: u8 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// The four onboarding answers the compatibility score is computed from.
///
/// Each field is `None` when the user never answered (or the stored value
/// was malformed); an unanswered question never matches, so it contributes
/// nothing to the score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityAnswers {
    #[serde(default)]
    pub q1_smoke: Option<bool>,
    #[serde(default)]
    pub q2_serious: Option<bool>,
    #[serde(default)]
    pub q3_morning: Option<bool>,
    #[serde(default)]
    pub q4_city: Option<bool>,
}

impl CompatibilityAnswers {
    pub fn all(value: bool) -> Self {
        Self {
            q1_smoke: Some(value),
            q2_serious: Some(value),
            q3_morning: Some(value),
            q4_city: Some(value),
        }
    }
}

/// A user's matchmaking-relevant attributes.
///
/// Owned by the profile store; the engine reads it and writes only the
/// `in_conversation` reservation flag (plus the credit debit, which goes
/// through the dedicated store operation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub first_name: String,
    pub gender: Gender,
    pub looking_for: Gender,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub city: Option<String>,
    /// Preferred maximum search radius in km, if configured
    #[serde(default)]
    pub distance_max: Option<f64>,
    pub age: u8,
    #[serde(default)]
    pub age_min: Option<u8>,
    #[serde(default)]
    pub age_max: Option<u8>,
    #[serde(default)]
    pub answers: CompatibilityAnswers,
    #[serde(default)]
    pub in_conversation: bool,
    #[serde(default)]
    pub is_blocked: bool,
    #[serde(default)]
    pub credits: i32,
    #[serde(default)]
    pub is_subscribed: bool,
}

impl Profile {
    /// Search radius in km, clamped to the configurable bounds.
    pub fn search_radius_km(&self) -> f64 {
        self.distance_max
            .unwrap_or(DEFAULT_RADIUS_KM)
            .clamp(MIN_RADIUS_KM, MAX_RADIUS_KM)
    }

    pub fn age_bounds(&self) -> (u8, u8) {
        (
            self.age_min.unwrap_or(DEFAULT_AGE_MIN),
            self.age_max.unwrap_or(DEFAULT_AGE_MAX),
        )
    }

    pub fn coordinate(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// The tier a match was found at, in fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    Proximity,
    Locality,
    Global,
}

impl std::fmt::Display for MatchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchTier::Proximity => write!(f, "proximity"),
            MatchTier::Locality => write!(f, "locality"),
            MatchTier::Global => write!(f, "global"),
        }
    }
}

/// An immutable-once-created pairing between two users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: Uuid,
    pub user1_id: Uuid,
    pub user2_id: Uuid,
    pub compatibility_score: u8,
    /// Present only for proximity-tier matches
    pub distance_km: Option<f64>,
    pub tier: MatchTier,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Match {
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.user1_id == user_id || self.user2_id == user_id
    }

    pub fn counterpart_of(&self, user_id: Uuid) -> Option<Uuid> {
        if self.user1_id == user_id {
            Some(self.user2_id)
        } else if self.user2_id == user_id {
            Some(self.user1_id)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Purchase,
    Usage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Cancelled,
}

/// One credit-affecting event. Negative amount = usage.
///
/// Lifecycle: created `pending` when a match is persisted, `confirmed`
/// (the one debit) when the first message of the resulting conversation
/// is sent, `cancelled` when the flow is abandoned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i32,
    pub tx_type: TransactionType,
    pub status: TransactionStatus,
    pub description: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Tracks how far a conversation has progressed.
///
/// `reveal_progress` is monotonic, +1 per user message, capped at 100.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub match_id: Uuid,
    pub user1_id: Uuid,
    pub user2_id: Uuid,
    pub messages_count: u32,
    pub reveal_progress: u8,
    pub last_activity: chrono::DateTime<chrono::Utc>,
    pub is_active: bool,
}

impl Conversation {
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.user1_id == user_id || self.user2_id == user_id
    }
}

/// A chat entry. `sender_id` is `None` for system messages, which never
/// count toward reveal progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub content: String,
    pub is_system: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Outcome of the credit gate check before a conversation may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditGate {
    pub allowed: bool,
    pub reason: CreditGateReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditGateReason {
    Subscribed,
    HasCredits,
    NoCredits,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_profile() -> Profile {
        Profile {
            id: Uuid::new_v4(),
            first_name: "Test".to_string(),
            gender: Gender::Female,
            looking_for: Gender::Male,
            lat: Some(48.8566),
            lon: Some(2.3522),
            city: Some("Paris".to_string()),
            distance_max: None,
            age: 25,
            age_min: None,
            age_max: None,
            answers: CompatibilityAnswers::all(true),
            in_conversation: false,
            is_blocked: false,
            credits: 7,
            is_subscribed: false,
        }
    }

    #[test]
    fn test_search_radius_defaults_and_clamps() {
        let mut profile = test_profile();
        assert_eq!(profile.search_radius_km(), DEFAULT_RADIUS_KM);

        profile.distance_max = Some(500.0);
        assert_eq!(profile.search_radius_km(), MAX_RADIUS_KM);

        profile.distance_max = Some(1.0);
        assert_eq!(profile.search_radius_km(), MIN_RADIUS_KM);
    }

    #[test]
    fn test_match_counterpart() {
        let m = Match {
            id: Uuid::new_v4(),
            user1_id: Uuid::new_v4(),
            user2_id: Uuid::new_v4(),
            compatibility_score: 75,
            distance_km: Some(3.2),
            tier: MatchTier::Proximity,
            is_active: true,
            created_at: chrono::Utc::now(),
        };

        assert_eq!(m.counterpart_of(m.user1_id), Some(m.user2_id));
        assert_eq!(m.counterpart_of(m.user2_id), Some(m.user1_id));
        assert_eq!(m.counterpart_of(Uuid::new_v4()), None);
    }
}
