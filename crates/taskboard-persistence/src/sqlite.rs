use crate::gateway::{PersistenceGateway, StoredBoard};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use taskboard_core::{TaskboardError, TaskboardResult};
use taskboard_domain::{CardId, ListId, TaskCard, TaskList};

const SCHEMA: &str = include_str!("../schema.sql");

fn db_error(e: sqlx::Error) -> TaskboardError {
    TaskboardError::Database(e.to_string())
}

enum Location {
    File(PathBuf),
    Memory,
}

/// SQLite-backed gateway. The pool is opened lazily and the schema is
/// created on first use.
pub struct SqliteGateway {
    location: Location,
    pool: tokio::sync::OnceCell<Pool<Sqlite>>,
}

impl SqliteGateway {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            location: Location::File(path.as_ref().to_path_buf()),
            pool: tokio::sync::OnceCell::new(),
        }
    }

    /// A private in-memory database that lives as long as this gateway.
    pub fn in_memory() -> Self {
        Self {
            location: Location::Memory,
            pool: tokio::sync::OnceCell::new(),
        }
    }

    async fn get_pool(&self) -> TaskboardResult<&Pool<Sqlite>> {
        self.pool
            .get_or_try_init(|| async {
                let (options, max_connections) = match &self.location {
                    Location::File(path) => {
                        if let Some(parent) = path.parent() {
                            if !parent.as_os_str().is_empty() {
                                tokio::fs::create_dir_all(parent).await?;
                            }
                        }
                        let options =
                            SqliteConnectOptions::from_str(&format!("sqlite://{}", path.display()))
                                .map_err(db_error)?
                                .create_if_missing(true);
                        (options, 5)
                    }
                    // Every connection to :memory: is its own database, so keep one.
                    Location::Memory => (
                        SqliteConnectOptions::from_str("sqlite::memory:").map_err(db_error)?,
                        1,
                    ),
                };

                let pool = SqlitePoolOptions::new()
                    .max_connections(max_connections)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect_with(options.foreign_keys(true))
                    .await
                    .map_err(db_error)?;

                sqlx::raw_sql(SCHEMA).execute(&pool).await.map_err(db_error)?;

                Ok(pool)
            })
            .await
    }

    fn row_to_list(row: &SqliteRow) -> TaskboardResult<TaskList> {
        let mut list = TaskList::new(row.try_get("title").map_err(db_error)?);
        list.assign_id(ListId(row.try_get("id").map_err(db_error)?));
        Ok(list)
    }

    fn row_to_card(row: &SqliteRow) -> TaskboardResult<TaskCard> {
        let priority: String = row.try_get("priority").map_err(db_error)?;
        let position: i64 = row.try_get("position").map_err(db_error)?;
        let group: Option<String> = row.try_get("groupLabel").map_err(db_error)?;

        let mut card = TaskCard::new(
            ListId(row.try_get("listId").map_err(db_error)?),
            row.try_get("title").map_err(db_error)?,
        )
        .with_description(row.try_get("description").map_err(db_error)?);
        card.id = CardId(row.try_get("id").map_err(db_error)?);
        card.priority = priority.parse().unwrap_or_else(|_| {
            tracing::warn!(card_id = %card.id, %priority, "Unknown stored priority");
            Default::default()
        });
        card.set_group(group.as_deref());
        card.position = u32::try_from(position).unwrap_or(0);
        Ok(card)
    }
}

#[async_trait]
impl PersistenceGateway for SqliteGateway {
    async fn list_all(&self) -> TaskboardResult<StoredBoard> {
        let pool = self.get_pool().await?;

        let lists = sqlx::query("SELECT id, title FROM TaskList ORDER BY id")
            .fetch_all(pool)
            .await
            .map_err(db_error)?
            .iter()
            .map(Self::row_to_list)
            .collect::<TaskboardResult<Vec<_>>>()?;

        let cards = sqlx::query(
            "SELECT id, title, description, priority, groupLabel, listId, position
             FROM TaskCard ORDER BY listId, position, id",
        )
        .fetch_all(pool)
        .await
        .map_err(db_error)?
        .iter()
        .map(Self::row_to_card)
        .collect::<TaskboardResult<Vec<_>>>()?;

        Ok(StoredBoard { lists, cards })
    }

    async fn upsert_list(&self, list: &TaskList) -> TaskboardResult<ListId> {
        let pool = self.get_pool().await?;

        if !list.id.is_persisted() {
            let result = sqlx::query("INSERT INTO TaskList (title) VALUES (?)")
                .bind(&list.title)
                .execute(pool)
                .await
                .map_err(db_error)?;
            return Ok(ListId(result.last_insert_rowid()));
        }

        let result = sqlx::query("UPDATE TaskList SET title = ? WHERE id = ?")
            .bind(&list.title)
            .bind(list.id.0)
            .execute(pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            tracing::debug!(list_id = %list.id, "Update matched no stored list");
        }
        Ok(list.id)
    }

    async fn upsert_card(&self, card: &TaskCard) -> TaskboardResult<CardId> {
        let pool = self.get_pool().await?;

        if !card.id.is_persisted() {
            let result = sqlx::query(
                "INSERT INTO TaskCard (title, description, priority, groupLabel, listId, position)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&card.title)
            .bind(&card.description)
            .bind(card.priority.as_str())
            .bind(&card.group)
            .bind(card.list_id.0)
            .bind(i64::from(card.position))
            .execute(pool)
            .await
            .map_err(db_error)?;
            return Ok(CardId(result.last_insert_rowid()));
        }

        let result = sqlx::query(
            "UPDATE TaskCard
             SET title = ?, description = ?, priority = ?, groupLabel = ?, listId = ?, position = ?
             WHERE id = ?",
        )
        .bind(&card.title)
        .bind(&card.description)
        .bind(card.priority.as_str())
        .bind(&card.group)
        .bind(card.list_id.0)
        .bind(i64::from(card.position))
        .bind(card.id.0)
        .execute(pool)
        .await
        .map_err(db_error)?;
        if result.rows_affected() == 0 {
            tracing::debug!(card_id = %card.id, "Update matched no stored card");
        }
        Ok(card.id)
    }

    async fn delete_list(&self, list_id: ListId) -> TaskboardResult<()> {
        let pool = self.get_pool().await?;
        let mut tx = pool.begin().await.map_err(db_error)?;

        sqlx::query("DELETE FROM TaskCard WHERE listId = ?")
            .bind(list_id.0)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        sqlx::query("DELETE FROM TaskList WHERE id = ?")
            .bind(list_id.0)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    async fn delete_card(&self, card_id: CardId) -> TaskboardResult<()> {
        let pool = self.get_pool().await?;
        sqlx::query("DELETE FROM TaskCard WHERE id = ?")
            .bind(card_id.0)
            .execute(pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }
}
