use crate::{
    conversation::Conversation,
    entity::{EntityKind, EntityRef},
};
use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    ConnectOptions, Row, SqlitePool,
};
use std::{path::Path, str::FromStr};

/// SQLite-backed conversation store.
///
/// Append-only from this crate's point of view: rows are inserted on first
/// contact and never updated or deleted here. Message activity and bulk
/// cleanup belong to other services sharing the same table.
#[derive(Clone, Debug)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Create a new Store instance.
    /// This will automatically create the database file if it doesn't exist.
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();

        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).context("Failed to create database directory")?;
            }
        }

        let db_url = format!("sqlite://{}", db_path.to_string_lossy());

        let options = SqliteConnectOptions::from_str(&db_url)?
            .create_if_missing(true)
            .log_statements(tracing::log::LevelFilter::Trace);

        let pool = SqlitePool::connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        Ok(Self { pool })
    }

    /// Create an in-memory store. A single pooled connection, so every handle
    /// sees the same database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("Failed to open in-memory SQLite database")?;

        Ok(Self { pool })
    }

    /// Initialize the database schema.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                participant_a TEXT NOT NULL,
                participant_b TEXT NOT NULL,
                entity_kind TEXT NOT NULL,
                entity_id TEXT NOT NULL,
                created_at DATETIME NOT NULL,
                last_message_at DATETIME NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_conversations_entity ON conversations(entity_kind, entity_id);
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to initialize database schema")?;

        Ok(())
    }

    /// Find every conversation for the given entity whose participant pair
    /// matches {user_a, user_b} in either stored order.
    /// Returns rows oldest first.
    pub async fn find_conversations(
        &self,
        entity: &EntityRef,
        user_a: &str,
        user_b: &str,
    ) -> Result<Vec<Conversation>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, participant_a, participant_b, entity_kind, entity_id, created_at, last_message_at
            FROM conversations
            WHERE entity_kind = ? AND entity_id = ?
              AND ((participant_a = ? AND participant_b = ?)
                OR (participant_a = ? AND participant_b = ?))
            ORDER BY created_at ASC
            "#,
        )
        .bind(entity.kind.as_str())
        .bind(&entity.id)
        .bind(user_a)
        .bind(user_b)
        .bind(user_b)
        .bind(user_a)
        .fetch_all(&self.pool)
        .await?;

        let mut conversations = Vec::with_capacity(rows.len());

        for row in rows {
            let kind_str: String = row.try_get("entity_kind")?;
            let kind = EntityKind::from_str(&kind_str)
                .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

            conversations.push(Conversation {
                id: row.try_get("id")?,
                participant_a: row.try_get("participant_a")?,
                participant_b: row.try_get("participant_b")?,
                entity: EntityRef {
                    kind,
                    id: row.try_get("entity_id")?,
                },
                created_at: row.try_get("created_at")?,
                last_message_at: row.try_get("last_message_at")?,
            });
        }

        Ok(conversations)
    }

    /// Insert a new conversation row.
    pub async fn insert_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO conversations (id, participant_a, participant_b, entity_kind, entity_id, created_at, last_message_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&conversation.id)
        .bind(&conversation.participant_a)
        .bind(&conversation.participant_b)
        .bind(conversation.entity.kind.as_str())
        .bind(&conversation.entity.id)
        .bind(conversation.created_at)
        .bind(conversation.last_message_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
