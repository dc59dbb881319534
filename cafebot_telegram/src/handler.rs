use crate::{Command, Error, Result, TelegramBot};
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, ChatAction, Message};
use tracing::{info, warn};

fn username(user: Option<&teloxide::types::User>) -> &str {
    user.and_then(|u| u.username.as_deref()).unwrap_or("unknown")
}

/// Handle bot commands
pub async fn handle_command(bot: TelegramBot, msg: Message, cmd: Command) -> Result<()> {
    let chat_id = msg.chat.id.0;
    let user_id = msg.from.as_ref().map_or(0, |u| u.id.0);
    let username = username(msg.from.as_ref());

    match cmd {
        Command::Start => {
            info!("[@{username}] Command: /start");
            bot.bot
                .send_message(msg.chat.id, Command::welcome_text())
                .await?;
        }
        Command::Reset => {
            info!("[@{username}] Command: /reset");
            bot.reset_conversation(chat_id, user_id).await?;
            bot.bot
                .send_message(msg.chat.id, "Conversation reset. What can I do for you?")
                .await?;
        }
        Command::Help => {
            info!("[@{username}] Command: /help");
            bot.bot
                .send_message(msg.chat.id, Command::help_text())
                .await?;
        }
    }

    Ok(())
}

/// Handle any message (commands or regular text)
pub async fn handle_message(bot: TelegramBot, msg: Message) -> Result<()> {
    let text = msg.text().ok_or(Error::Unsupported("message without text"))?;
    let username = username(msg.from.as_ref());

    if let Some(cmd) = Command::parse_from_text(text) {
        return handle_command(bot, msg.clone(), cmd).await;
    }

    info!("[@{username}] Message: {text}");

    bot.bot
        .send_chat_action(msg.chat.id, ChatAction::Typing)
        .await?;

    let user_id = msg.from.as_ref().map_or(0, |u| u.id.0);
    let result = bot.process_turn(msg.chat.id.0, user_id, text).await?;

    info!("[@{username}] Turn ended: {}", result.status);
    Ok(())
}

/// Handle a tap on a suggestion button; its data is a card payload.
pub async fn handle_callback(bot: TelegramBot, query: CallbackQuery) -> Result<()> {
    // Stop the client-side spinner whatever happens next.
    bot.bot.answer_callback_query(query.id.clone()).await?;

    let Some(chat_id) = query.message.as_ref().map(|m| m.chat().id) else {
        warn!("Callback without a message, ignoring");
        return Ok(());
    };
    let Some(data) = query.data.as_deref() else {
        warn!("Callback without data, ignoring");
        return Ok(());
    };

    let username = username(Some(&query.from));
    info!("[@{username}] Tapped: {data}");

    let result = bot.process_turn(chat_id.0, query.from.id.0, data).await?;

    info!("[@{username}] Turn ended: {}", result.status);
    Ok(())
}
