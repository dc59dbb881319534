use teloxide::types::BotCommand;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Reset,
    Help,
}

impl Command {
    fn all() -> Vec<BotCommand> {
        vec![
            BotCommand {
                command: "start".to_string(),
                description: "Start talking to the cafe bot".to_string(),
            },
            BotCommand {
                command: "reset".to_string(),
                description: "Forget the current conversation".to_string(),
            },
            BotCommand {
                command: "help".to_string(),
                description: "Show the list of commands".to_string(),
            },
        ]
    }

    #[must_use]
    pub fn bot_commands() -> Vec<BotCommand> {
        Self::all()
    }

    #[must_use]
    pub fn parse_from_text(text: &str) -> Option<Self> {
        let text = text.trim().to_lowercase();

        // Remove bot mention if present (e.g., "/start@my_bot")
        let text = text.split('@').next().unwrap_or(&text).to_string();

        match text.as_str() {
            "/start" => Some(Self::Start),
            "/reset" => Some(Self::Reset),
            "/help" => Some(Self::Help),
            _ => None,
        }
    }

    #[must_use]
    pub const fn help_text() -> &'static str {
        r"
☕ Cafe Bot

Commands:
/start - Start talking to the cafe bot
/reset - Forget the current conversation
/help  - Show this help

Ask me what I can do, book a table, or ask about our hours!
"
    }

    #[must_use]
    pub const fn welcome_text() -> &'static str {
        r"
👋 Welcome to the cafe bot!

I can:
• Book a table at one of our cafes
• Answer questions about hours, locations and parking
• Remember your name for next time

Send /help to see the commands.
"
    }
}
