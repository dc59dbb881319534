use async_trait::async_trait;
use cafebot_config::FaqEntry;
use cafebot_core::{Dialog, DialogContext, TurnResult};
use serde_json::{Value, json};
use tracing::debug;

use crate::QNA;

const NO_ANSWER: &str =
    "Sorry, I don't have an answer for that. You can ask me about our hours, locations, parking or wifi.";

/// Single-turn answers from the configured FAQ.
pub struct Qna {
    faq: Vec<FaqEntry>,
}

impl Qna {
    #[must_use]
    pub const fn new(faq: Vec<FaqEntry>) -> Self {
        Self { faq }
    }

    /// First entry with a keyword among the question's words.
    #[must_use]
    pub fn answer(&self, question: &str) -> Option<&str> {
        let words: Vec<String> = question
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect();

        self.faq
            .iter()
            .find(|entry| {
                entry
                    .keywords
                    .iter()
                    .any(|k| words.iter().any(|w| w == &k.to_lowercase()))
            })
            .map(|entry| entry.answer.as_str())
    }
}

#[async_trait]
impl Dialog for Qna {
    fn id(&self) -> &str {
        QNA
    }

    async fn begin(
        &self,
        ctx: &mut DialogContext<'_>,
        _state: &mut Value,
        _options: &Value,
    ) -> anyhow::Result<TurnResult> {
        let question = ctx.input().raw_text.clone();
        let answer = self.answer(&question);
        debug!("FAQ lookup for '{question}': {}", answer.is_some());

        ctx.send(answer.unwrap_or(NO_ANSWER)).await?;
        Ok(TurnResult::complete().with_value(json!({ "answered": answer.is_some() })))
    }

    async fn resume(
        &self,
        _ctx: &mut DialogContext<'_>,
        _state: &mut Value,
    ) -> anyhow::Result<TurnResult> {
        Ok(TurnResult::complete())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qna() -> Qna {
        Qna::new(vec![
            FaqEntry::new(&["hours", "open"], "8 to 8"),
            FaqEntry::new(&["parking"], "Free parking"),
        ])
    }

    #[test]
    fn matches_whole_words_case_insensitively() {
        let qna = qna();
        assert_eq!(qna.answer("What are your HOURS?"), Some("8 to 8"));
        assert_eq!(qna.answer("Is there parking nearby"), Some("Free parking"));
    }

    #[test]
    fn partial_words_do_not_match() {
        assert_eq!(qna().answer("I opened the door"), None);
    }
}
