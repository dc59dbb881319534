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

//! Turn dispatch for a multi-dialog conversational bot.
//!
//! A conversation holds a stack of active dialogs. Each user turn is checked
//! against an interruption policy, handed to the active dialog, and, if that
//! dialog did not answer, used to begin a new dialog chosen by intent.

pub mod card;
pub mod channel;
pub mod dialog;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod input;
pub mod policy;
pub mod stack;
pub mod store;
pub mod turn;

pub use card::{CHOOSE_AN_OPTION, CardInput, CardPayload};
pub use channel::{Channel, ConversationRef};
pub use dialog::{Dialog, DialogContext, DialogRegistry};
pub use dispatcher::{Dispatcher, DispatcherBuilder, DispatcherConfig};
pub use error::{BuildError, DispatchError};
pub use handler::{TurnHandler, TurnHandlerBuilder};
pub use input::{CARD_ENTITY, Entity, NONE_INTENT, OnTurnInput, Recognizer};
pub use policy::{
    ALREADY_SHOWING_CAPABILITIES, CANCEL, InterruptionPolicy, NOTHING_TO_CANCEL, PolicyDecision,
    PolicyError, PolicyRule, SHOW_CAPABILITIES,
};
pub use stack::{DialogFrame, DialogStack};
pub use store::{StateKey, StateStore};
pub use turn::{TurnResult, TurnStatus};
