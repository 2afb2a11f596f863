use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::{ChatMessage, Match, MatchTier, Profile};

/// The candidate fields exposed to the requester when a match is found
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub id: Uuid,
    pub first_name: String,
    pub age: u8,
    pub city: Option<String>,
}

impl From<&Profile> for CandidateSummary {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id,
            first_name: profile.first_name.clone(),
            age: profile.age,
            city: profile.city.clone(),
        }
    }
}

/// Response for a successful match request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchFoundResponse {
    pub match_id: Uuid,
    pub compatibility_score: u8,
    pub distance_km: Option<f64>,
    pub tier: MatchTier,
    pub candidate: CandidateSummary,
}

/// Response for the current-match endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentMatchResponse {
    #[serde(rename = "match")]
    pub current: Option<Match>,
}

/// Response after starting a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartConversationResponse {
    pub conversation_id: Uuid,
    pub reveal_progress: u8,
}

/// Response after sending a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub data: ChatMessage,
    pub reveal_progress: u8,
    pub messages_count: u32,
}

/// Response for the reconciliation sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileResponse {
    pub success: bool,
    pub users_freed: usize,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
