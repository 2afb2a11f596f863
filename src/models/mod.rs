// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    ChatMessage, CompatibilityAnswers, Conversation, CreditGate, CreditGateReason,
    CreditTransaction, Gender, Match, MatchTier, Profile, TransactionStatus, TransactionType,
    DEFAULT_AGE_MAX, DEFAULT_AGE_MIN, DEFAULT_RADIUS_KM, MAX_RADIUS_KM, MIN_RADIUS_KM,
};
pub use requests::{
    EndConversationRequest, FindMatchRequest, SendMessageRequest, StartConversationRequest,
};
pub use responses::{
    CandidateSummary, CurrentMatchResponse, ErrorResponse, HealthResponse, MatchFoundResponse,
    ReconcileResponse, SendMessageResponse, StartConversationResponse,
};
