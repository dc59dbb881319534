use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// The dispatcher owns the shape of its user-facing text; reuse it as the `bot` section.
use cafebot_core::DispatcherConfig;

const APP_DIR: &str = "cafebot";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub bot: DispatcherConfig,
    /// Intent name -> dialog id.
    #[serde(default = "default_routes")]
    pub routes: BTreeMap<String, String>,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub cafe: CafeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: DispatcherConfig::default(),
            routes: default_routes(),
            database: DatabaseConfig::default(),
            telegram: TelegramConfig::default(),
            cafe: CafeConfig::default(),
        }
    }
}

/// Routes for the dialogs shipped with the bot.
#[must_use]
pub fn default_routes() -> BTreeMap<String, String> {
    [
        ("ShowCapabilities", "ShowCapabilities"),
        ("Cancel", "Cancel"),
        ("BookTable", "BookTable"),
        ("WhoAreYou", "WhoAreYou"),
        ("Greeting", "WhoAreYou"),
        ("Qna", "Qna"),
    ]
    .into_iter()
    .map(|(intent, dialog)| (intent.to_string(), dialog.to_string()))
    .collect()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    /// Keep conversation state in the database instead of in memory.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "DatabaseConfig::default_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: Self::default_url(),
        }
    }
}

impl DatabaseConfig {
    fn default_url() -> String {
        "sqlite://cafebot.db?mode=rwc".to_string()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub token: String,
    /// Chat ids allowed to talk to the bot. Empty allows everyone.
    #[serde(default)]
    pub allow_from: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct FaqEntry {
    pub keywords: Vec<String>,
    pub answer: String,
}

impl FaqEntry {
    #[must_use]
    pub fn new(keywords: &[&str], answer: impl Into<String>) -> Self {
        Self {
            keywords: keywords.iter().map(ToString::to_string).collect(),
            answer: answer.into(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CafeConfig {
    #[serde(default = "CafeConfig::default_name")]
    pub name: String,
    #[serde(default = "CafeConfig::default_locations")]
    pub locations: Vec<String>,
    #[serde(default = "CafeConfig::default_faq")]
    pub faq: Vec<FaqEntry>,
    #[serde(default = "CafeConfig::default_max_party_size")]
    pub max_party_size: u32,
}

impl Default for CafeConfig {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            locations: Self::default_locations(),
            faq: Self::default_faq(),
            max_party_size: Self::default_max_party_size(),
        }
    }
}

impl CafeConfig {
    fn default_name() -> String {
        "Contoso Cafe".to_string()
    }

    fn default_locations() -> Vec<String> {
        vec![
            "Seattle".to_string(),
            "Bellevue".to_string(),
            "Renton".to_string(),
        ]
    }

    fn default_faq() -> Vec<FaqEntry> {
        vec![
            FaqEntry::new(
                &["hours", "open", "close"],
                "We are open Monday through Friday 8am to 8pm and weekends 9am to 6pm.",
            ),
            FaqEntry::new(
                &["where", "location", "address"],
                "We have cafes in Seattle, Bellevue and Renton.",
            ),
            FaqEntry::new(
                &["parking", "park"],
                "All of our locations have free parking for customers.",
            ),
            FaqEntry::new(
                &["wifi", "internet"],
                "Yes, free wifi is available at every location.",
            ),
        ]
    }

    const fn default_max_party_size() -> u32 {
        12
    }
}

impl Config {
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join(APP_DIR))
    }

    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'cafebot init' to create config.",
                config_path.display()
            );
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load the config file if there is one, otherwise fall back to defaults.
    pub fn load_or_default() -> anyhow::Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            Ok(Self::default())
        }
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<PathBuf> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        Self::write_template(&config_path)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Adjust the cafe locations and FAQ answers");
        println!("   2. Add a Telegram bot token if you want to run 'cafebot telegram'");
        println!("   3. Run 'cafebot chat' to talk to the bot in the terminal");
        println!();
        println!("🔧 Configuration options:");
        println!("   - routes: which dialog each recognized intent starts");
        println!("   - bot.fallback_reply: reply for intents with no route (null for silence)");
        println!("   - database.enabled: keep conversation state in the database");
        println!();
        Ok(config_path)
    }

    pub fn write_template(path: &Path) -> anyhow::Result<()> {
        let config_template = r#"{
  "bot": {
    "anything_else_prompt": "Is there anything else I can help you with?",
    "suggestions": ["What can you do?", "Book a table", "Who are you?"],
    "fallback_reply": "I'm still learning. Sorry, I don't know how to help you with that yet."
  },
  "routes": {
    "ShowCapabilities": "ShowCapabilities",
    "Cancel": "Cancel",
    "BookTable": "BookTable",
    "WhoAreYou": "WhoAreYou",
    "Greeting": "WhoAreYou",
    "Qna": "Qna"
  },
  "database": {
    "enabled": false,
    "url": "sqlite://cafebot.db?mode=rwc"
  },
  "telegram": {
    "enabled": false,
    "token": "your-telegram-bot-token-here",
    "allow_from": []
  },
  "cafe": {
    "name": "Contoso Cafe",
    "locations": ["Seattle", "Bellevue", "Renton"],
    "max_party_size": 12,
    "faq": [
      {
        "keywords": ["hours", "open", "close"],
        "answer": "We are open Monday through Friday 8am to 8pm and weekends 9am to 6pm."
      },
      {
        "keywords": ["where", "location", "address"],
        "answer": "We have cafes in Seattle, Bellevue and Renton."
      },
      {
        "keywords": ["parking", "park"],
        "answer": "All of our locations have free parking for customers."
      },
      {
        "keywords": ["wifi", "internet"],
        "answer": "Yes, free wifi is available at every location."
      }
    ]
  }
}"#;

        std::fs::write(path, config_template)?;
        Ok(())
    }
}
