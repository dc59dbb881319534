//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy type with its own input, dispatched
//! statically from `main`.

use cafebot_config::Config;
use cafebot_core::{Channel, Dispatcher, Recognizer, StateStore, TurnHandler};
use cafebot_nlu::PatternRecognizer;
use cafebot_store::{DatabaseStateStore, MemoryStateStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

mod chat;
mod info;
mod init;
mod telegram;
mod version;

pub use chat::{ChatInput, ChatStrategy};
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use telegram::{TelegramInput, TelegramStrategy};
pub use version::VersionStrategy;

/// Core trait defining the contract for all command strategies.
///
/// Each strategy defines its own input type via the associated type, so
/// parameters are passed without runtime casting or boxing.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Connect to the state database with backoff retry.
///
/// # Retry Behavior
/// - First retry: 1s
/// - Second retry: 2s
/// - Third and beyond: 3s (capped)
/// - Retries indefinitely until connection succeeds
async fn connect_database_with_retry(database_url: &str) -> anyhow::Result<DatabaseStateStore> {
    const MAX_DELAY: Duration = Duration::from_secs(3);
    const INITIAL_DELAY: Duration = Duration::from_secs(1);

    let mut attempt = 0u32;
    let mut delay = INITIAL_DELAY;

    loop {
        attempt += 1;
        match DatabaseStateStore::connect(database_url).await {
            Ok(store) => {
                info!("State database connected on attempt {attempt}");
                return Ok(store);
            }
            Err(e) => {
                warn!(
                    "Failed to connect to database (attempt {attempt}): {e}. Retrying in {}s...",
                    delay.as_secs()
                );
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

/// State store selected by config: the database when enabled, memory otherwise.
///
/// Long-running commands pass `retry` to wait for the database to come up.
async fn open_store(config: &Config, retry: bool) -> anyhow::Result<Arc<dyn StateStore>> {
    if !config.database.enabled {
        info!("Keeping conversation state in memory");
        return Ok(Arc::new(MemoryStateStore::new()));
    }

    let store = if retry {
        connect_database_with_retry(&config.database.url).await?
    } else {
        DatabaseStateStore::connect(&config.database.url).await?
    };
    Ok(Arc::new(store))
}

fn build_recognizer(config: &Config) -> anyhow::Result<Arc<dyn Recognizer>> {
    Ok(Arc::new(PatternRecognizer::with_locations(
        &config.cafe.locations,
    )?))
}

/// Wire dialogs, routes and the store into a turn handler replying on `channel`.
fn build_turn_handler(
    config: &Config,
    store: Arc<dyn StateStore>,
    channel: Arc<dyn Channel>,
) -> anyhow::Result<TurnHandler> {
    let dispatcher = Dispatcher::builder()
        .registry(cafebot_dialogs::registry(&config.cafe)?)
        .routes(config.routes.clone())
        .config(config.bot.clone())
        .build()?;

    Ok(TurnHandler::builder()
        .dispatcher(Arc::new(dispatcher))
        .store(store)
        .channel(channel)
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_wires_up() {
        let config = Config::default();
        let handler = build_turn_handler(
            &config,
            Arc::new(MemoryStateStore::new()),
            Arc::new(crate::console::ConsoleChannel::new()),
        );
        assert!(handler.is_ok());
    }

    #[test]
    fn route_to_missing_dialog_is_rejected() {
        let mut config = Config::default();
        config
            .routes
            .insert("Order".to_string(), "OrderCoffee".to_string());

        let handler = build_turn_handler(
            &config,
            Arc::new(MemoryStateStore::new()),
            Arc::new(crate::console::ConsoleChannel::new()),
        );
        assert!(handler.is_err());
    }

    #[tokio::test]
    async fn memory_store_when_database_disabled() {
        let config = Config::default();
        assert!(open_store(&config, false).await.is_ok());
    }
}
