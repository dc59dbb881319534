//! Keyed state storage.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Single-key persistent storage.
///
/// Implementations give no guarantee beyond atomic reads and writes of one
/// key. Callers serialize turns for the same conversation.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> anyhow::Result<()>;
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
}

/// Namespaced keys for everything the bot persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKey<'a> {
    /// Dialog stack of a conversation.
    DialogStack(&'a str),
    /// Last resolved turn input of a conversation.
    OnTurn(&'a str),
    /// Profile collected for a user.
    UserProfile(&'a str),
    /// Reservation a user is building or has booked.
    Reservation(&'a str),
}

impl fmt::Display for StateKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DialogStack(id) => write!(f, "conversation/{id}/dialog_stack"),
            Self::OnTurn(id) => write!(f, "conversation/{id}/on_turn"),
            Self::UserProfile(id) => write!(f, "user/{id}/profile"),
            Self::Reservation(id) => write!(f, "user/{id}/reservation"),
        }
    }
}

/// Read and decode a typed value.
pub async fn load<T>(store: &dyn StateStore, key: &str) -> anyhow::Result<Option<T>>
where
    T: DeserializeOwned,
{
    match store.get(key).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Encode and write a typed value.
pub async fn save<T>(store: &dyn StateStore, key: &str, value: &T) -> anyhow::Result<()>
where
    T: Serialize + Sync + ?Sized,
{
    store.set(key, serde_json::to_value(value)?).await
}
