use async_trait::async_trait;
use cafebot_core::store::{self, StateKey};
use cafebot_core::{Dialog, DialogContext, NONE_INTENT, TurnResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::WHO_ARE_YOU;

const NAME_PREFIXES: [&str; 5] = ["my name is", "call me", "i'm", "i am", "this is"];
const GREETINGS: [&str; 3] = ["hi", "hello", "hey"];
const MAX_NAME_WORDS: usize = 3;

/// What the bot remembers about a user across conversations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Introduces the bot and asks for the user's name if it is not known yet.
pub struct WhoAreYou {
    cafe_name: String,
}

impl WhoAreYou {
    #[must_use]
    pub fn new(cafe_name: &str) -> Self {
        Self {
            cafe_name: cafe_name.to_string(),
        }
    }

    /// Name given in `text`, either after a lead-in such as "my name is" or,
    /// when `bare` is set, as a short answer on its own.
    ///
    /// Lead-ins only count at the start of the message, after an optional
    /// greeting.
    #[must_use]
    pub fn parse_name(text: &str, bare: bool) -> Option<String> {
        let words: Vec<&str> = text
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| matches!(c, '.' | '!' | ',')))
            .filter(|w| !w.is_empty())
            .collect();

        let greeting = words
            .iter()
            .take_while(|w| GREETINGS.iter().any(|g| w.eq_ignore_ascii_case(g)))
            .count();
        let rest = &words[greeting..];

        let candidate = NAME_PREFIXES
            .iter()
            .find_map(|prefix| {
                let prefix: Vec<&str> = prefix.split_whitespace().collect();
                let leads = rest.len() >= prefix.len()
                    && rest.iter().zip(&prefix).all(|(w, p)| w.eq_ignore_ascii_case(p));
                leads.then(|| &rest[prefix.len()..])
            })
            .or_else(|| bare.then_some(rest))?;

        if candidate.is_empty() || candidate.len() > MAX_NAME_WORDS {
            return None;
        }
        Some(candidate.join(" "))
    }

    async fn greet(
        &self,
        ctx: &mut DialogContext<'_>,
        name: &str,
        known: bool,
    ) -> anyhow::Result<TurnResult> {
        let text = if known {
            format!("Hi {name}, welcome back to {}!", self.cafe_name)
        } else {
            format!("Nice to meet you, {name}! I'm the {} bot.", self.cafe_name)
        };
        ctx.send(&text).await?;
        Ok(TurnResult::complete().with_value(json!({ "name": name })))
    }

    async fn remember(ctx: &DialogContext<'_>, name: &str) -> anyhow::Result<()> {
        let key = StateKey::UserProfile(&ctx.conversation().user_id).to_string();
        let profile = UserProfile {
            name: Some(name.to_string()),
            updated_at: Some(Utc::now()),
        };
        store::save(ctx.store(), &key, &profile).await?;
        info!("Saved profile for user {}", ctx.conversation().user_id);
        Ok(())
    }
}

#[async_trait]
impl Dialog for WhoAreYou {
    fn id(&self) -> &str {
        WHO_ARE_YOU
    }

    async fn begin(
        &self,
        ctx: &mut DialogContext<'_>,
        state: &mut Value,
        _options: &Value,
    ) -> anyhow::Result<TurnResult> {
        let key = StateKey::UserProfile(&ctx.conversation().user_id).to_string();
        let profile: UserProfile = store::load(ctx.store(), &key).await?.unwrap_or_default();

        if let Some(name) = profile.name {
            return self.greet(ctx, &name, true).await;
        }

        if let Some(name) = Self::parse_name(&ctx.input().raw_text, false) {
            Self::remember(ctx, &name).await?;
            return self.greet(ctx, &name, false).await;
        }

        ctx.send(&format!(
            "Hi, I'm the {} bot. What's your name?",
            self.cafe_name
        ))
        .await?;
        *state = json!({ "asked": true });
        Ok(TurnResult::waiting())
    }

    async fn resume(
        &self,
        ctx: &mut DialogContext<'_>,
        _state: &mut Value,
    ) -> anyhow::Result<TurnResult> {
        // Anything that looks like a request of its own is left to the
        // dispatcher.
        let intent = ctx.input().intent.as_str();
        let answering = intent == NONE_INTENT || intent == WHO_ARE_YOU;
        let name = Self::parse_name(&ctx.input().raw_text, answering);

        match name {
            Some(name) => {
                Self::remember(ctx, &name).await?;
                self.greet(ctx, &name, false).await
            }
            None if answering => {
                ctx.send("Sorry, I didn't catch that. What's your name?")
                    .await?;
                Ok(TurnResult::waiting())
            }
            None => Ok(TurnResult::empty()),
        }
    }
}
