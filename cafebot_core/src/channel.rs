use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Addresses one conversation on one channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationRef {
    pub conversation_id: String,
    pub user_id: String,
}

impl ConversationRef {
    #[must_use]
    pub fn new(conversation_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// Outbound side of a messaging channel.
#[async_trait]
pub trait Channel: Send + Sync {
    async fn send(&self, conversation: &ConversationRef, text: &str) -> anyhow::Result<()>;

    /// Send a message offering quick replies the user can tap instead of typing.
    async fn send_with_suggestions(
        &self,
        conversation: &ConversationRef,
        text: &str,
        suggestions: &[String],
    ) -> anyhow::Result<()>;
}
