use async_trait::async_trait;
use taskboard_core::TaskboardResult;
use taskboard_domain::{CardId, ListId, Priority, TaskCard, TaskList};

/// Everything in storage: lists without their cards, and all cards ordered
/// by list then stored position.
#[derive(Debug, Clone, Default)]
pub struct StoredBoard {
    pub lists: Vec<TaskList>,
    pub cards: Vec<TaskCard>,
}

/// Durable save/delete of lists and cards, keyed by identity.
///
/// Implementations know nothing about ordering; `position` is just another
/// column. Records with an unset id are inserted and get their id assigned,
/// records with an id are updated in place. Updating an id that no longer
/// exists changes nothing.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn list_all(&self) -> TaskboardResult<StoredBoard>;

    /// Insert or update a list's own fields. Returns its id.
    async fn upsert_list(&self, list: &TaskList) -> TaskboardResult<ListId>;

    /// Insert or update a card. Returns its id.
    async fn upsert_card(&self, card: &TaskCard) -> TaskboardResult<CardId>;

    /// Delete a list and every card that belongs to it.
    async fn delete_list(&self, list_id: ListId) -> TaskboardResult<()>;

    async fn delete_card(&self, card_id: CardId) -> TaskboardResult<()>;

    /// Populate an empty store with the starter lists and a sample card.
    /// Returns whether anything was created.
    async fn seed_if_empty(&self) -> TaskboardResult<bool> {
        if !self.list_all().await?.lists.is_empty() {
            return Ok(false);
        }

        let mut first_list = None;
        for title in ["TODO", "DOING", "DONE"] {
            let id = self.upsert_list(&TaskList::new(title.to_string())).await?;
            first_list.get_or_insert(id);
        }

        if let Some(todo) = first_list {
            let mut sample = TaskCard::new(todo, "UI improvements".to_string())
                .with_description(Some("Improve the user interface design".to_string()));
            sample.priority = Priority::High;
            self.upsert_card(&sample).await?;
        }

        tracing::info!("Seeded empty store with starter lists");
        Ok(true)
    }
}
