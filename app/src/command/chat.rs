//! Terminal conversation with the bot.
//!
//! The conversation id keys all persisted state, so passing the same id again
//! resumes where a previous run stopped (when the database store is enabled).

use cafebot_config::Config;
use cafebot_core::{ConversationRef, Recognizer, TurnHandler};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use uuid::Uuid;

use super::{build_recognizer, build_turn_handler, open_store};
use crate::console::ConsoleChannel;

/// Input parameters for the Chat command strategy.
#[derive(Debug, Clone)]
pub struct ChatInput {
    /// Optional single message to send (non-interactive mode)
    pub message: Option<String>,
    /// Conversation to resume (creates new if not provided)
    pub conversation: Option<String>,
    /// User id the conversation belongs to
    pub user: String,
}

/// Strategy for executing the Chat command.
#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

struct Session {
    handler: TurnHandler,
    recognizer: Arc<dyn Recognizer>,
    console: Arc<ConsoleChannel>,
    conversation: ConversationRef,
}

impl Session {
    async fn turn(&self, line: &str) -> anyhow::Result<()> {
        let text = self.console.resolve_input(line);
        let input = self.recognizer.recognize(&text).await?;
        debug!("Recognized intent '{}'", input.intent);

        let result = self.handler.handle_turn(&self.conversation, input).await?;
        debug!("Turn ended: {}", result.status);
        Ok(())
    }

    async fn run_interactive(&self) -> anyhow::Result<()> {
        println!(
            "=== Conversation: {} ===",
            self.conversation.conversation_id
        );
        println!("Type '/reset' to start over, '/quit' or Ctrl+C to leave.\n");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let line = line.trim();

            match line {
                "" => {}
                "/quit" | "/exit" => break,
                "/reset" => {
                    self.handler.end_conversation(&self.conversation).await?;
                    println!("bot> Conversation reset. What can I do for you?");
                }
                _ => {
                    if let Err(e) = self.turn(line).await {
                        eprintln!("Error: {e}");
                    }
                }
            }
        }

        info!(
            "Conversation {} ended",
            self.conversation.conversation_id
        );
        Ok(())
    }
}

impl super::CommandStrategy for ChatStrategy {
    type Input = ChatInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load_or_default()?;

        let conversation_id = input
            .conversation
            .unwrap_or_else(|| Uuid::now_v7().to_string());
        info!("Starting conversation {conversation_id} for user {}", input.user);

        let console = Arc::new(ConsoleChannel::new());
        let store = open_store(&config, false).await?;
        let session = Session {
            handler: build_turn_handler(&config, store, console.clone())?,
            recognizer: build_recognizer(&config)?,
            console,
            conversation: ConversationRef::new(conversation_id, input.user),
        };

        if let Some(message) = input.message {
            session.turn(&message).await
        } else {
            session.run_interactive().await
        }
    }
}
