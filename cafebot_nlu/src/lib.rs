#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Pattern-based intent and entity recognition for the cafe bot.
//!
//! This is a small offline stand-in for a hosted language-understanding
//! service: ordered regex rules pick the intent, and a handful of extractors
//! pull out the booking details the dialogs ask for.

pub mod entity;
pub mod error;
pub mod intent;
mod recognizer;

pub use entity::{DATE, EntityExtractor, LOCATION, PARTY_SIZE, TIME};
pub use error::NluError;
pub use intent::{IntentDetector, IntentPattern, default_patterns, intents};
pub use recognizer::PatternRecognizer;
