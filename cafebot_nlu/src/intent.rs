//! Intent detection.
//!
//! Patterns are checked in descending priority; the first match names the
//! intent. Text that matches nothing is reported as [`intents::NONE`].

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::NluError;

/// Intent names produced by the default patterns.
pub mod intents {
    pub use cafebot_core::NONE_INTENT as NONE;
    pub use cafebot_core::{CANCEL, SHOW_CAPABILITIES};

    pub const BOOK_TABLE: &str = "BookTable";
    pub const WHO_ARE_YOU: &str = "WhoAreYou";
    pub const GREETING: &str = "Greeting";
    pub const QNA: &str = "Qna";
}

/// A regex rule mapping matching text to an intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentPattern {
    pub intent: String,

    /// Matched against the lowercased text.
    pub pattern: String,

    /// Higher priorities are checked first.
    #[serde(default)]
    pub priority: i32,
}

impl IntentPattern {
    #[must_use]
    pub fn new(intent: impl Into<String>, pattern: impl Into<String>, priority: i32) -> Self {
        Self {
            intent: intent.into(),
            pattern: pattern.into(),
            priority,
        }
    }
}

/// Default patterns for the cafe intents.
#[must_use]
pub fn default_patterns() -> Vec<IntentPattern> {
    vec![
        // Cancel - highest priority so it always interrupts
        IntentPattern::new(
            intents::CANCEL,
            r"^\s*(cancel|stop|quit|never ?mind|forget (it|about it))\b",
            100,
        ),
        IntentPattern::new(
            intents::SHOW_CAPABILITIES,
            r"(what can you do|what do you do|what are my options|capabilit|^\s*help\b)",
            90,
        ),
        IntentPattern::new(
            intents::BOOK_TABLE,
            r"\b(book|reserve|reservation|table for)\b",
            80,
        ),
        IntentPattern::new(
            intents::WHO_ARE_YOU,
            r"(who are you|what'?s your name|my name is|call me)",
            70,
        ),
        IntentPattern::new(
            intents::GREETING,
            r"^\s*(hi|hello|hey|howdy|good (morning|afternoon|evening))\b",
            60,
        ),
        IntentPattern::new(
            intents::QNA,
            r"\b(hours|open|opening|close|closing|parking|park|wifi|internet|address|located|locations?|where are you)\b",
            50,
        ),
    ]
}

/// Compiled, priority-ordered intent rules.
pub struct IntentDetector {
    rules: Vec<(IntentPattern, Regex)>,
}

impl IntentDetector {
    pub fn new(mut patterns: Vec<IntentPattern>) -> Result<Self, NluError> {
        patterns.sort_by_key(|p| std::cmp::Reverse(p.priority));

        let rules = patterns
            .into_iter()
            .map(|p| {
                Regex::new(&p.pattern)
                    .map(|re| (p.clone(), re))
                    .map_err(|source| NluError::InvalidPattern {
                        intent: p.intent.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rules })
    }

    pub fn with_defaults() -> Result<Self, NluError> {
        Self::new(default_patterns())
    }

    #[must_use]
    pub fn detect(&self, text: &str) -> &str {
        let lower = text.to_lowercase();
        self.rules
            .iter()
            .find(|(_, re)| re.is_match(&lower))
            .map_or(intents::NONE, |(p, _)| p.intent.as_str())
    }

    #[must_use]
    pub fn patterns(&self) -> Vec<&IntentPattern> {
        self.rules.iter().map(|(p, _)| p).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn detector() -> IntentDetector {
        IntentDetector::with_defaults().expect("default patterns should compile")
    }

    #[test]
    fn detects_cafe_intents() {
        let detector = detector();
        assert_eq!(detector.detect("Book a table"), intents::BOOK_TABLE);
        assert_eq!(detector.detect("I'd like a reservation"), intents::BOOK_TABLE);
        assert_eq!(detector.detect("What can you do?"), intents::SHOW_CAPABILITIES);
        assert_eq!(detector.detect("help"), intents::SHOW_CAPABILITIES);
        assert_eq!(detector.detect("Who are you?"), intents::WHO_ARE_YOU);
        assert_eq!(detector.detect("Hello there"), intents::GREETING);
        assert_eq!(detector.detect("When do you open?"), intents::QNA);
        assert_eq!(detector.detect("cancel"), intents::CANCEL);
        assert_eq!(detector.detect("Never mind"), intents::CANCEL);
    }

    #[test]
    fn unmatched_text_is_none() {
        let detector = detector();
        assert_eq!(detector.detect("Seattle"), intents::NONE);
        assert_eq!(detector.detect("tomorrow at 7pm"), intents::NONE);
    }

    #[test]
    fn higher_priority_wins() {
        let detector = detector();
        // Matches both cancel and booking.
        assert_eq!(detector.detect("cancel my reservation"), intents::CANCEL);
        // Matches both booking and the FAQ keywords.
        assert_eq!(detector.detect("book a table in a location with parking"), intents::BOOK_TABLE);
    }

    #[test]
    fn invalid_pattern_names_the_intent() {
        let result = IntentDetector::new(vec![IntentPattern::new("Broken", "(unclosed", 1)]);
        assert!(matches!(
            result,
            Err(NluError::InvalidPattern { ref intent, .. }) if intent == "Broken"
        ));
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn custom_patterns_are_sorted() {
        let detector = IntentDetector::new(vec![
            IntentPattern::new("Low", "coffee", 1),
            IntentPattern::new("High", "coffee", 10),
        ])
        .expect("patterns should compile");

        assert_eq!(detector.detect("coffee please"), "High");
        assert_eq!(detector.patterns()[0].intent, "High");
    }
}
