use async_trait::async_trait;
use cafebot_core::{CARD_ENTITY, OnTurnInput, Recognizer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::entity::EntityExtractor;
use crate::error::NluError;
use crate::intent::{IntentDetector, IntentPattern, default_patterns, intents};

/// Offline [`Recognizer`] built from regex rules.
///
/// Text that looks like a JSON object is treated as a card payload: it is
/// passed through whole as the `query` entity and left for the dispatcher to
/// decode.
pub struct PatternRecognizer {
    detector: IntentDetector,
    extractor: EntityExtractor,
}

impl PatternRecognizer {
    pub fn new(patterns: Vec<IntentPattern>, locations: &[String]) -> Result<Self, NluError> {
        Ok(Self {
            detector: IntentDetector::new(patterns)?,
            extractor: EntityExtractor::new(locations)?,
        })
    }

    /// Default intent patterns with the given cafe locations.
    pub fn with_locations(locations: &[String]) -> Result<Self, NluError> {
        Self::new(default_patterns(), locations)
    }

    #[must_use]
    pub fn recognize_text(&self, raw_text: &str) -> OnTurnInput {
        let trimmed = raw_text.trim();

        if trimmed.starts_with('{') {
            let intent = self.card_intent(trimmed);
            debug!("Card payload recognized as '{intent}'");
            return OnTurnInput::new(intent, raw_text).with_entity(CARD_ENTITY, trimmed);
        }

        let intent = self.detector.detect(trimmed);
        debug!("Recognized '{trimmed}' as '{intent}'");

        let mut input = OnTurnInput::new(intent, raw_text);
        input.entities = self.extractor.extract(trimmed);
        input
    }

    /// A card's own `intent` wins; otherwise its `text` is classified.
    /// Undecodable payloads get no intent.
    fn card_intent(&self, payload: &str) -> String {
        let Ok(fields) = serde_json::from_str::<Map<String, Value>>(payload) else {
            return intents::NONE.to_string();
        };

        if let Some(intent) = fields.get("intent").and_then(Value::as_str) {
            return intent.to_string();
        }

        fields
            .get("text")
            .and_then(Value::as_str)
            .map_or(intents::NONE, |text| self.detector.detect(text))
            .to_string()
    }
}

#[async_trait]
impl Recognizer for PatternRecognizer {
    async fn recognize(&self, raw_text: &str) -> anyhow::Result<OnTurnInput> {
        Ok(self.recognize_text(raw_text))
    }
}
