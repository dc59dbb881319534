use crate::{Error, Result, TelegramChannel};
use cafebot_core::{ConversationRef, Recognizer, TurnHandler, TurnResult};
use std::{collections::HashMap, sync::Arc, time::Duration};
use teloxide::prelude::*;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Turn locks keyed by chat.
///
/// Once `capacity` entries exist, locks nobody holds are dropped before a
/// new one is added.
#[derive(Clone)]
struct ChatLocks {
    locks: Arc<Mutex<HashMap<i64, Arc<Mutex<()>>>>>,
    capacity: usize,
}

impl ChatLocks {
    const DEFAULT_CAPACITY: usize = 1024;

    fn with_capacity(capacity: usize) -> Self {
        Self {
            locks: Arc::new(Mutex::new(HashMap::new())),
            capacity,
        }
    }

    async fn for_chat(&self, chat_id: i64) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        if locks.len() >= self.capacity && !locks.contains_key(&chat_id) {
            let before = locks.len();
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            debug!("Pruned {} idle chat lock(s)", before - locks.len());
        }
        Arc::clone(locks.entry(chat_id).or_default())
    }
}

/// Telegram front end for the turn handler.
#[derive(Clone)]
pub struct TelegramBot {
    /// Teloxide bot instance
    pub bot: Bot,
    handler: Arc<TurnHandler>,
    recognizer: Arc<dyn Recognizer>,
    /// One lock per chat so turns of a conversation never overlap.
    chat_locks: ChatLocks,
    /// Allowed chat IDs
    allowed_chats: Vec<i64>,
}

impl TelegramBot {
    /// `handler` must deliver its replies through `channel`.
    #[must_use]
    pub fn new(
        channel: &TelegramChannel,
        handler: Arc<TurnHandler>,
        recognizer: Arc<dyn Recognizer>,
        allowed_chats: &[String],
    ) -> Self {
        // Parse allowed chat IDs
        let allowed_chats = allowed_chats
            .iter()
            .filter_map(|s| s.parse::<i64>().ok())
            .collect();

        Self {
            bot: channel.bot().clone(),
            handler,
            recognizer,
            chat_locks: ChatLocks::with_capacity(ChatLocks::DEFAULT_CAPACITY),
            allowed_chats,
        }
    }

    /// Check if a chat is allowed
    #[must_use]
    pub fn is_allowed(&self, chat_id: i64) -> bool {
        self.allowed_chats.is_empty() || self.allowed_chats.contains(&chat_id)
    }

    fn conversation(chat_id: i64, user_id: u64) -> ConversationRef {
        ConversationRef::new(chat_id.to_string(), user_id.to_string())
    }

    /// Recognize `text` and run it as the chat's next turn.
    ///
    /// Replies go out through the channel while the turn runs.
    pub async fn process_turn(&self, chat_id: i64, user_id: u64, text: &str) -> Result<TurnResult> {
        if !self.is_allowed(chat_id) {
            return Err(Error::Unauthorized(chat_id));
        }

        let lock = self.chat_locks.for_chat(chat_id).await;
        let _turn = lock.lock().await;

        let input = self
            .recognizer
            .recognize(text)
            .await
            .map_err(Error::Recognizer)?;
        debug!("Chat {chat_id}: intent '{}'", input.intent);

        let conversation = Self::conversation(chat_id, user_id);
        Ok(self.handler.handle_turn(&conversation, input).await?)
    }

    /// Forget the dialog stack of a chat.
    pub async fn reset_conversation(&self, chat_id: i64, user_id: u64) -> Result<()> {
        if !self.is_allowed(chat_id) {
            return Err(Error::Unauthorized(chat_id));
        }

        let lock = self.chat_locks.for_chat(chat_id).await;
        let _turn = lock.lock().await;

        self.handler
            .end_conversation(&Self::conversation(chat_id, user_id))
            .await?;
        Ok(())
    }

    /// Test connection to Telegram API with exponential backoff retry.
    /// Starts at 2s, increases by 2s each attempt, max 10s delay.
    /// Retries indefinitely until connection succeeds.
    async fn test_connection(&self) -> Result<()> {
        const INITIAL_DELAY_SECS: u64 = 2;
        const MAX_DELAY_SECS: u64 = 10;

        let mut attempt = 1u64;
        loop {
            match self.bot.get_me().await {
                Ok(bot_user) => {
                    info!(
                        "Connected to Telegram API: @{} (id: {})",
                        bot_user
                            .user
                            .username
                            .unwrap_or_else(|| "no username".to_string()),
                        bot_user.user.id
                    );
                    return Ok(());
                }
                Err(e) => {
                    let delay_secs = (INITIAL_DELAY_SECS * attempt).min(MAX_DELAY_SECS);
                    let delay = Duration::from_secs(delay_secs);

                    warn!("Connection attempt {attempt} failed: {e}. Retrying in {delay_secs}s...");

                    // Only show detailed help on first failure
                    if attempt == 1 {
                        warn!("This may be due to:");
                        warn!("  - Network connectivity issues");
                        warn!("  - Firewall blocking api.telegram.org");
                        warn!("  - Invalid bot token");
                        warn!("  - Proxy or VPN configuration required");
                    }

                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Run the bot
    pub async fn run(self) -> Result<()> {
        use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
        use teloxide::dptree;
        use teloxide::types::{CallbackQuery, Message, Update};

        self.test_connection().await?;
        self.bot
            .set_my_commands(crate::Command::bot_commands())
            .await?;

        let bot = self.bot.clone();

        let schema = dptree::entry()
            .branch(Update::filter_message().endpoint({
                let cafe = self.clone();
                move |msg: Message| {
                    let cafe = cafe.clone();
                    async move { crate::handler::handle_message(cafe, msg).await }
                }
            }))
            .branch(Update::filter_callback_query().endpoint({
                let cafe = self.clone();
                move |query: CallbackQuery| {
                    let cafe = cafe.clone();
                    async move { crate::handler::handle_callback(cafe, query).await }
                }
            }));

        Dispatcher::builder(bot, schema)
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_chat_shares_one_lock() {
        let locks = ChatLocks::with_capacity(8);
        let first = locks.for_chat(1).await;
        let second = locks.for_chat(1).await;
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn idle_locks_are_pruned_at_capacity() {
        let locks = ChatLocks::with_capacity(2);
        let held = locks.for_chat(1).await;
        let _guard = held.lock().await;
        drop(locks.for_chat(2).await);

        locks.for_chat(3).await;

        let map = locks.locks.lock().await;
        assert_eq!(map.len(), 2);
        assert!(map.contains_key(&1));
        assert!(map.contains_key(&3));
        assert!(!map.contains_key(&2));
    }
}
