use crate::gateway::{PersistenceGateway, StoredBoard};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use taskboard_core::{TaskboardError, TaskboardResult};
use taskboard_domain::{CardId, ListId, TaskCard, TaskList};

#[derive(Default)]
struct MemoryState {
    lists: BTreeMap<ListId, TaskList>,
    cards: BTreeMap<CardId, TaskCard>,
    last_list_id: i64,
    last_card_id: i64,
    card_writes: Vec<CardId>,
}

/// In-process gateway with the same identity rules as [`crate::SqliteGateway`].
///
/// Records every card write so callers can assert on write traffic, and can
/// be switched into a mode where every write fails.
#[derive(Default)]
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
    fail_writes: AtomicBool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Ids of every card update or insert accepted so far, in order.
    pub fn card_writes(&self) -> Vec<CardId> {
        self.state.lock().card_writes.clone()
    }

    pub fn stored_card(&self, card_id: CardId) -> Option<TaskCard> {
        self.state.lock().cards.get(&card_id).cloned()
    }

    fn check_writable(&self) -> TaskboardResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(TaskboardError::Database("writes are disabled".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn list_all(&self) -> TaskboardResult<StoredBoard> {
        let state = self.state.lock();
        let mut cards: Vec<TaskCard> = state.cards.values().cloned().collect();
        cards.sort_by_key(|c| (c.list_id, c.position, c.id));
        Ok(StoredBoard {
            lists: state.lists.values().cloned().collect(),
            cards,
        })
    }

    async fn upsert_list(&self, list: &TaskList) -> TaskboardResult<ListId> {
        self.check_writable()?;
        let mut state = self.state.lock();

        let id = if list.id.is_persisted() {
            if !state.lists.contains_key(&list.id) {
                return Ok(list.id);
            }
            list.id
        } else {
            state.last_list_id += 1;
            ListId(state.last_list_id)
        };

        let mut stored = TaskList::new(list.title.clone());
        stored.assign_id(id);
        state.lists.insert(id, stored);
        Ok(id)
    }

    async fn upsert_card(&self, card: &TaskCard) -> TaskboardResult<CardId> {
        self.check_writable()?;
        let mut state = self.state.lock();

        let id = if card.id.is_persisted() {
            if !state.cards.contains_key(&card.id) {
                return Ok(card.id);
            }
            card.id
        } else {
            if !state.lists.contains_key(&card.list_id) {
                return Err(TaskboardError::Database(format!(
                    "list {} does not exist",
                    card.list_id
                )));
            }
            state.last_card_id += 1;
            CardId(state.last_card_id)
        };

        let mut stored = card.clone();
        stored.id = id;
        state.cards.insert(id, stored);
        state.card_writes.push(id);
        Ok(id)
    }

    async fn delete_list(&self, list_id: ListId) -> TaskboardResult<()> {
        self.check_writable()?;
        let mut state = self.state.lock();
        state.cards.retain(|_, c| c.list_id != list_id);
        state.lists.remove(&list_id);
        Ok(())
    }

    async fn delete_card(&self, card_id: CardId) -> TaskboardResult<()> {
        self.check_writable()?;
        self.state.lock().cards.remove(&card_id);
        Ok(())
    }
}
