//! Structured card input.
//!
//! When the user taps an option on a previously rendered card, the channel
//! forwards the option's payload as a `query` entity instead of free text.
//! Payloads are flat string maps such as `{"text": "Book a table"}`.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::input::{Entity, OnTurnInput};

/// Sent when a card payload cannot be decoded.
pub const CHOOSE_AN_OPTION: &str = "Please choose one of the options before continuing.";

const TEXT_FIELD: &str = "text";
const INTENT_FIELD: &str = "intent";

/// Result of looking for a card payload in a turn.
#[derive(Debug)]
pub enum CardInput {
    /// The turn carries no card payload.
    Absent,
    /// A payload is present but is not a map of strings.
    Malformed(serde_json::Error),
    Decoded(CardPayload),
}

impl CardInput {
    /// Inspect the first `query` entity of a turn.
    #[must_use]
    pub fn inspect(input: &OnTurnInput) -> Self {
        match input.card_payload() {
            None => Self::Absent,
            Some(raw) => match CardPayload::parse(raw) {
                Ok(payload) => Self::Decoded(payload),
                Err(err) => Self::Malformed(err),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardPayload {
    fields: BTreeMap<String, String>,
}

impl CardPayload {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        let fields: BTreeMap<String, String> = serde_json::from_str(raw)?;
        Ok(Self { fields })
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.fields.get(TEXT_FIELD).map(String::as_str)
    }

    #[must_use]
    pub fn intent(&self) -> Option<&str> {
        self.fields.get(INTENT_FIELD).map(String::as_str)
    }

    /// Build the turn input this payload stands for.
    ///
    /// The payload's `intent` overrides the recognized one and its `text`
    /// replaces the raw text; every other field becomes an entity.
    #[must_use]
    pub fn to_turn_input(&self, original: &OnTurnInput) -> OnTurnInput {
        OnTurnInput {
            intent: self.intent().unwrap_or(original.intent.as_str()).to_string(),
            entities: self
                .fields
                .iter()
                .filter(|(name, _)| !matches!(name.as_str(), TEXT_FIELD | INTENT_FIELD))
                .map(|(name, value)| Entity::new(name.clone(), value.clone()))
                .collect(),
            raw_text: self.text().unwrap_or(original.raw_text.as_str()).to_string(),
        }
    }

    /// The payload as dialog `begin` options.
    #[must_use]
    pub fn to_options(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }
}
