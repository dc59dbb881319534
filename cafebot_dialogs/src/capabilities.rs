use async_trait::async_trait;
use cafebot_core::{Dialog, DialogContext, SHOW_CAPABILITIES, TurnResult};
use serde_json::Value;

const INTRO: &str = "Here's what I can do. I can book a table at one of our cafes, \
answer questions about hours, locations and parking, or get to know you.";

/// Lists what the bot can do and stays open until the user's next message.
pub struct ShowCapabilities {
    suggestions: Vec<String>,
}

impl ShowCapabilities {
    #[must_use]
    pub fn new() -> Self {
        Self {
            suggestions: vec![
                "Book a table".to_string(),
                "What are your hours?".to_string(),
                "Who are you?".to_string(),
            ],
        }
    }
}

impl Default for ShowCapabilities {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Dialog for ShowCapabilities {
    fn id(&self) -> &str {
        SHOW_CAPABILITIES
    }

    async fn begin(
        &self,
        ctx: &mut DialogContext<'_>,
        _state: &mut Value,
        _options: &Value,
    ) -> anyhow::Result<TurnResult> {
        ctx.send_with_suggestions(INTRO, &self.suggestions).await?;
        Ok(TurnResult::waiting())
    }

    /// Ends on any follow-up without answering it, so the dialog underneath
    /// or the chosen option handles the turn instead.
    async fn resume(
        &self,
        ctx: &mut DialogContext<'_>,
        _state: &mut Value,
    ) -> anyhow::Result<TurnResult> {
        ctx.end_dialog();
        Ok(TurnResult::empty())
    }
}
