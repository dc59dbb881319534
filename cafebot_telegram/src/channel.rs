use async_trait::async_trait;
use cafebot_core::{Channel, ConversationRef};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::warn;

use crate::Error;

/// Telegram refuses callback data longer than this.
const MAX_CALLBACK_DATA: usize = 64;

/// Delivers bot replies to Telegram chats.
///
/// Conversation ids are chat ids. Suggestions become inline buttons whose
/// callback data is a `{"text": ...}` card payload.
#[derive(Clone)]
pub struct TelegramChannel {
    bot: Bot,
}

impl TelegramChannel {
    #[must_use]
    pub fn new(token: String) -> Self {
        Self {
            bot: Bot::new(token),
        }
    }

    #[must_use]
    pub const fn bot(&self) -> &Bot {
        &self.bot
    }

    fn chat_id(conversation: &ConversationRef) -> Result<ChatId, Error> {
        conversation
            .conversation_id
            .parse::<i64>()
            .map(ChatId)
            .map_err(|_| Error::InvalidChat(conversation.conversation_id.clone()))
    }
}

/// One button per suggestion, one per row.
#[must_use]
pub fn suggestion_keyboard(suggestions: &[String]) -> InlineKeyboardMarkup {
    let rows = suggestions
        .iter()
        .filter_map(|suggestion| {
            let data = serde_json::json!({ "text": suggestion }).to_string();
            if data.len() > MAX_CALLBACK_DATA {
                warn!("Suggestion too long for a button: {suggestion}");
                return None;
            }
            Some(vec![InlineKeyboardButton::callback(suggestion.clone(), data)])
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

#[async_trait]
impl Channel for TelegramChannel {
    async fn send(&self, conversation: &ConversationRef, text: &str) -> anyhow::Result<()> {
        let chat_id = Self::chat_id(conversation)?;
        self.bot.send_message(chat_id, text).await?;
        Ok(())
    }

    async fn send_with_suggestions(
        &self,
        conversation: &ConversationRef,
        text: &str,
        suggestions: &[String],
    ) -> anyhow::Result<()> {
        let chat_id = Self::chat_id(conversation)?;
        self.bot
            .send_message(chat_id, text)
            .reply_markup(suggestion_keyboard(suggestions))
            .await?;
        Ok(())
    }
}
