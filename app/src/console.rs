//! Terminal channel for the `chat` command.

use async_trait::async_trait;
use cafebot_core::{Channel, ConversationRef};
use std::sync::Mutex;

/// Prints bot replies to stdout and numbers any suggestions so the user can
/// pick one by typing its number.
#[derive(Debug, Default)]
pub struct ConsoleChannel {
    last_suggestions: Mutex<Vec<String>>,
}

impl ConsoleChannel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn a typed line into turn text.
    ///
    /// A number naming one of the last offered suggestions becomes the same
    /// card payload a tapped button would send; anything else passes through.
    pub fn resolve_input(&self, line: &str) -> String {
        let line = line.trim();
        let picked = line
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| {
                self.last_suggestions
                    .lock()
                    .ok()
                    .and_then(|suggestions| suggestions.get(index).cloned())
            });

        picked.map_or_else(
            || line.to_string(),
            |text| serde_json::json!({ "text": text }).to_string(),
        )
    }

    fn remember(&self, suggestions: &[String]) {
        if let Ok(mut last) = self.last_suggestions.lock() {
            *last = suggestions.to_vec();
        }
    }
}

#[async_trait]
impl Channel for ConsoleChannel {
    async fn send(&self, conversation: &ConversationRef, text: &str) -> anyhow::Result<()> {
        self.send_with_suggestions(conversation, text, &[]).await
    }

    async fn send_with_suggestions(
        &self,
        _conversation: &ConversationRef,
        text: &str,
        suggestions: &[String],
    ) -> anyhow::Result<()> {
        println!("bot> {text}");
        for (i, suggestion) in suggestions.iter().enumerate() {
            println!("  [{}] {suggestion}", i + 1);
        }
        // Numbers only pick from the options of the latest message.
        self.remember(suggestions);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_picks_a_suggestion() {
        let console = ConsoleChannel::new();
        console.remember(&["Seattle".to_string(), "Renton".to_string()]);

        assert_eq!(console.resolve_input(" 2 "), r#"{"text":"Renton"}"#);
    }

    #[test]
    fn other_input_passes_through() {
        let console = ConsoleChannel::new();
        console.remember(&["Seattle".to_string()]);

        assert_eq!(console.resolve_input("0"), "0");
        assert_eq!(console.resolve_input("5"), "5");
        assert_eq!(console.resolve_input("for 2 people"), "for 2 people");
    }

    #[tokio::test]
    async fn plain_message_clears_previous_suggestions() {
        let console = ConsoleChannel::new();
        let conversation = ConversationRef::new("c", "u");
        console
            .send_with_suggestions(
                &conversation,
                "Which location?",
                &["Seattle".to_string(), "Bellevue".to_string()],
            )
            .await
            .ok();
        assert_eq!(console.resolve_input("2"), r#"{"text":"Bellevue"}"#);

        console
            .send(&conversation, "How many guests will there be?")
            .await
            .ok();
        assert_eq!(console.resolve_input("2"), "2");
    }
}
