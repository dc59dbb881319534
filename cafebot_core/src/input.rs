//! Resolved input for a single turn.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Entity name reserved for structured card payloads.
pub const CARD_ENTITY: &str = "query";

/// Intent reported when nothing was recognized.
pub const NONE_INTENT: &str = "None";

/// A named value extracted from the user's message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub value: String,
}

impl Entity {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The `{intent, entities, raw_text}` triple produced by the NLU step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnTurnInput {
    pub intent: String,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub raw_text: String,
}

impl OnTurnInput {
    #[must_use]
    pub fn new(intent: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            intent: intent.into(),
            entities: Vec::new(),
            raw_text: raw_text.into(),
        }
    }

    /// Append an entity, keeping recognition order.
    #[must_use]
    pub fn with_entity(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.entities.push(Entity::new(name, value));
        self
    }

    /// First entity with the given name.
    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Raw structured payload, if the user picked an option from a card.
    #[must_use]
    pub fn card_payload(&self) -> Option<&str> {
        self.entity(CARD_ENTITY).map(|e| e.value.as_str())
    }

    /// Entities as a JSON object handed to a dialog's `begin`.
    ///
    /// When a name repeats, the first occurrence wins.
    #[must_use]
    pub fn entity_options(&self) -> Value {
        let mut map = Map::new();
        for entity in &self.entities {
            map.entry(entity.name.clone())
                .or_insert_with(|| Value::String(entity.value.clone()));
        }
        Value::Object(map)
    }
}

/// Resolves raw user text into an [`OnTurnInput`].
///
/// Channels call this before handing a turn to the core; the dispatcher
/// itself never does.
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self, raw_text: &str) -> anyhow::Result<OnTurnInput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_lookup_returns_first_match() {
        let input = OnTurnInput::new("BookTable", "table for 4 at 7pm")
            .with_entity("partySize", "4")
            .with_entity("time", "7pm")
            .with_entity("partySize", "6");

        assert_eq!(input.entity("partySize").map(|e| e.value.as_str()), Some("4"));
        assert!(input.entity("location").is_none());
    }

    #[test]
    fn entity_options_keep_first_value() {
        let input = OnTurnInput::new("BookTable", "")
            .with_entity("time", "7pm")
            .with_entity("time", "8pm");

        assert_eq!(input.entity_options(), serde_json::json!({ "time": "7pm" }));
    }

    #[test]
    fn card_payload_reads_query_entity() {
        let input = OnTurnInput::new(NONE_INTENT, "").with_entity(CARD_ENTITY, r#"{"text":"hi"}"#);
        assert_eq!(input.card_payload(), Some(r#"{"text":"hi"}"#));
        assert!(OnTurnInput::default().card_payload().is_none());
    }
}
