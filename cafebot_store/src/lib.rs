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

//! `StateStore` implementations: an in-process map and a sea-orm table.

mod database;
pub mod entity;
mod memory;

pub use database::{DatabaseStateStore, mask_database_url};
pub use memory::MemoryStateStore;
