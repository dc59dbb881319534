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

//! The cafe bot's dialogs.

mod book_table;
mod cancel;
mod capabilities;
mod profile;
mod qna;

use std::sync::Arc;

use cafebot_config::CafeConfig;
use cafebot_core::{BuildError, DialogRegistry};

pub use book_table::{BookTable, ReservationState};
pub use cancel::CancelDialog;
pub use capabilities::ShowCapabilities;
pub use profile::{UserProfile, WhoAreYou};
pub use qna::Qna;

pub const BOOK_TABLE: &str = "BookTable";
pub const WHO_ARE_YOU: &str = "WhoAreYou";
pub const QNA: &str = "Qna";
pub use cafebot_core::{CANCEL, SHOW_CAPABILITIES};

/// Registry holding every dialog the cafe bot ships with.
pub fn registry(cafe: &CafeConfig) -> Result<DialogRegistry, BuildError> {
    let mut registry = DialogRegistry::new();
    registry.register(Arc::new(ShowCapabilities::new()))?;
    registry.register(Arc::new(CancelDialog::new()))?;
    registry.register(Arc::new(WhoAreYou::new(&cafe.name)))?;
    registry.register(Arc::new(Qna::new(cafe.faq.clone())))?;
    registry.register(Arc::new(BookTable::new(
        cafe.locations.clone(),
        cafe.max_party_size,
    )))?;
    Ok(registry)
}

/// String value of a `begin` option.
pub(crate) fn option_str<'a>(options: &'a serde_json::Value, name: &str) -> Option<&'a str> {
    options
        .get(name)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
