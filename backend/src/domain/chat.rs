//! Chat scaffolding.
//!
//! Chats exist in the data model but carry no messaging features yet beyond
//! listing rooms and their participants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ids::{ChatId, UserId};

/// Scope of a chat room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatKind {
    /// Platform-wide room.
    Global,
    /// Room attached to a club.
    Club,
    /// Room attached to an event.
    Event,
    /// Direct conversation between two users.
    Private,
}

/// Role a participant holds inside a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatRole {
    /// May manage participants.
    Moderator,
    /// Regular participant.
    Participant,
}

/// Participant entry on a chat document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatParticipant {
    #[schema(value_type = String)]
    pub user_id: UserId,
    pub role: ChatRole,
}

/// Chat room document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    #[schema(value_type = String)]
    pub id: ChatId,
    pub kind: ChatKind,
    #[serde(default)]
    pub participants: Vec<ChatParticipant>,
}

/// Single message inside a chat room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[schema(value_type = String)]
    pub sender_id: UserId,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_kinds_serialise_upper_case() {
        let chat = Chat {
            id: ChatId::random(),
            kind: ChatKind::Private,
            participants: vec![ChatParticipant {
                user_id: UserId::random(),
                role: ChatRole::Participant,
            }],
        };
        let value = serde_json::to_value(&chat).expect("chat should serialise");
        assert_eq!(value["kind"], "PRIVATE");
        assert_eq!(value["participants"][0]["role"], "PARTICIPANT");
    }
}
