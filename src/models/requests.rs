use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Longest accepted chat message
pub const MESSAGE_MAX_LENGTH: u64 = 2000;

/// Request to find a match
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FindMatchRequest {
    pub user_id: Uuid,
}

/// Request to start the conversation for an active match
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StartConversationRequest {
    pub user_id: Uuid,
    pub match_id: Uuid,
}

/// Request to send a chat message
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendMessageRequest {
    pub user_id: Uuid,
    #[validate(length(min = 1, max = MESSAGE_MAX_LENGTH))]
    pub content: String,
}

/// Request to end a conversation
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EndConversationRequest {
    pub user_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_length_bounds() {
        let mut req = SendMessageRequest {
            user_id: Uuid::new_v4(),
            content: "a".repeat(MESSAGE_MAX_LENGTH as usize),
        };
        assert!(req.validate().is_ok());

        req.content.push('a');
        assert!(req.validate().is_err());

        req.content = String::new();
        assert!(req.validate().is_err());
    }
}
