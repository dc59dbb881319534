use async_trait::async_trait;
use cafebot_core::StateStore;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
    Set,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::entity::state_entries;

/// `url` with any password replaced by `***`, for logs and diagnostics.
#[must_use]
pub fn mask_database_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };

    let Some((credentials, after_at)) = rest.rsplit_once('@') else {
        return url.to_string();
    };

    let Some((username, _password)) = credentials.split_once(':') else {
        return url.to_string();
    };

    format!("{scheme}://{username}:***@{after_at}")
}

fn is_table_already_exists_error(err: &DbErr) -> bool {
    err.to_string().contains("table") && err.to_string().contains("already exists")
}

/// Conversation state kept in a `state_entries` table, one row per key.
pub struct DatabaseStateStore {
    db: DatabaseConnection,
}

impl DatabaseStateStore {
    /// Connect and create the table if it is missing.
    pub async fn connect(db_url: &str) -> anyhow::Result<Self> {
        info!("Connecting to database: {}", mask_database_url(db_url));

        let db = Database::connect(db_url).await?;

        let backend = db.get_database_backend();
        let schema = Schema::new(backend);
        let stmt = schema.create_table_from_entity(state_entries::Entity);
        match db
            .execute_unprepared(&backend.build(&stmt).to_string())
            .await
        {
            Ok(_) => {}
            Err(e) if is_table_already_exists_error(&e) => {
                info!("Table already exists, skipping creation");
            }
            Err(e) => return Err(e.into()),
        }

        info!("DatabaseStateStore initialized");
        Ok(Self { db })
    }

    /// Every stored key, sorted.
    pub async fn keys(&self) -> anyhow::Result<Vec<String>> {
        let mut keys: Vec<String> = state_entries::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|row| row.key)
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[async_trait]
impl StateStore for DatabaseStateStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Value>> {
        let row = state_entries::Entity::find_by_id(key.to_owned())
            .one(&self.db)
            .await?;

        match row {
            Some(model) => Ok(Some(serde_json::from_str(&model.value)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value) -> anyhow::Result<()> {
        let value_json = serde_json::to_string(&value)?;
        let now = chrono::Utc::now().naive_utc();

        let exists = state_entries::Entity::find_by_id(key.to_owned())
            .one(&self.db)
            .await?
            .is_some();

        if exists {
            state_entries::Entity::update(state_entries::ActiveModel {
                key: Set(key.to_owned()),
                value: Set(value_json),
                updated_at: Set(now),
            })
            .exec(&self.db)
            .await?;
        } else {
            state_entries::ActiveModel {
                key: Set(key.to_owned()),
                value: Set(value_json),
                updated_at: Set(now),
            }
            .insert(&self.db)
            .await?;
        }

        debug!("Stored state: {}", key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        state_entries::Entity::delete_by_id(key.to_owned())
            .exec(&self.db)
            .await?;

        debug!("Deleted state: {}", key);
        Ok(())
    }
}
