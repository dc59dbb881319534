use cafebot_config::Config;
use cafebot_store::{DatabaseStateStore, mask_database_url};
use tracing::info;

/// Strategy for displaying configuration information.
///
/// This strategy outputs:
/// - Intent routes and dispatcher prompts
/// - Database URL and connection status
/// - Telegram configuration (token masked)
/// - Cafe locations and FAQ size
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        println!("=== cafebot Configuration ===\n");

        println!("Routes:");
        for (intent, dialog) in &config.routes {
            println!("  {intent} -> {dialog}");
        }
        println!();

        println!("Dispatcher:");
        println!("  Anything Else: {}", config.bot.anything_else_prompt);
        println!("  Suggestions: {}", config.bot.suggestions.join(" | "));
        match &config.bot.fallback_reply {
            Some(reply) => println!("  Fallback: {}", truncate(reply, 60)),
            None => println!("  Fallback: (silent)"),
        }
        println!();

        println!("Database:");
        let db_url = &config.database.url;
        println!("  URL: {}", mask_database_url(db_url));
        if config.database.enabled {
            info!("Testing database connection");
            match DatabaseStateStore::connect(db_url).await {
                Ok(store) => {
                    println!("  Status: Connected");
                    println!("  Stored Keys: {}", store.keys().await?.len());
                }
                Err(e) => {
                    println!("  Status: Connection failed");
                    println!("  Error: {e}");
                }
            }
        } else {
            println!("  Status: Disabled (state is kept in memory)");
        }
        println!();

        println!("Telegram:");
        println!("  Enabled: {}", config.telegram.enabled);
        println!("  Token: {}", mask_token(&config.telegram.token));
        if config.telegram.allow_from.is_empty() {
            println!("  Allow From: (empty - all users allowed)");
        } else {
            println!("  Allow From: {}", config.telegram.allow_from.join(", "));
        }
        println!();

        println!("Cafe:");
        println!("  Name: {}", config.cafe.name);
        println!("  Locations: {}", config.cafe.locations.join(", "));
        println!("  Max Party Size: {}", config.cafe.max_party_size);
        println!("  FAQ Entries: {}", config.cafe.faq.len());

        Ok(())
    }
}

fn mask_token(token: &str) -> String {
    if token.is_empty() {
        return "(not set)".to_string();
    }
    token
        .get(..8)
        .filter(|_| token.len() > 8)
        .map_or_else(|| "***".to_string(), |prefix| format!("{prefix}...***"))
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_keeps_only_a_prefix() {
        assert_eq!(mask_token(""), "(not set)");
        assert_eq!(mask_token("short"), "***");
        assert_eq!(mask_token("123456789:ABCDEF"), "12345678...***");
    }

    #[test]
    fn long_text_is_truncated() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
    }
}
