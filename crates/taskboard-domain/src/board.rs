use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::card::TaskCard;
use crate::id::{CardId, ListId};
use crate::list::TaskList;

/// The ordered collection of lists. Lists keep the order they were added in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    lists: Vec<TaskList>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a board from stored rows. Lists are ordered by identity,
    /// cards by stored position, and positions are renumbered. Cards whose
    /// list no longer exists are dropped.
    pub fn from_parts(mut lists: Vec<TaskList>, cards: Vec<TaskCard>) -> Self {
        lists.sort_by_key(|l| l.id);

        let mut by_list: HashMap<ListId, Vec<TaskCard>> = HashMap::new();
        for card in cards {
            by_list.entry(card.list_id).or_default().push(card);
        }

        let lists = lists
            .into_iter()
            .map(|list| {
                let cards = by_list.remove(&list.id).unwrap_or_default();
                list.with_cards(cards)
            })
            .collect();

        for (list_id, orphans) in by_list {
            tracing::warn!(
                list_id = %list_id,
                count = orphans.len(),
                "Dropping cards that reference a missing list"
            );
        }

        Self { lists }
    }

    pub fn lists(&self) -> &[TaskList] {
        &self.lists
    }

    pub fn add_list(&mut self, list: TaskList) {
        self.lists.push(list);
    }

    pub fn remove_list(&mut self, list_id: ListId) -> Option<TaskList> {
        let index = self.lists.iter().position(|l| l.id == list_id)?;
        Some(self.lists.remove(index))
    }

    pub fn list(&self, list_id: ListId) -> Option<&TaskList> {
        self.lists.iter().find(|l| l.id == list_id)
    }

    pub fn list_mut(&mut self, list_id: ListId) -> Option<&mut TaskList> {
        self.lists.iter_mut().find(|l| l.id == list_id)
    }

    /// The list currently holding `card_id`.
    pub fn list_of(&self, card_id: CardId) -> Option<ListId> {
        self.lists
            .iter()
            .find(|l| l.contains(card_id))
            .map(|l| l.id)
    }

    pub fn find_card(&self, card_id: CardId) -> Option<&TaskCard> {
        self.lists.iter().find_map(|l| l.get(card_id))
    }

    pub fn find_card_mut(&mut self, card_id: CardId) -> Option<&mut TaskCard> {
        self.lists.iter_mut().find_map(|l| l.get_mut(card_id))
    }

    pub fn card_count(&self) -> usize {
        self.lists.iter().map(TaskList::len).sum()
    }

    /// Where every card of the given lists currently sits.
    pub(crate) fn placements(&self, list_ids: &[ListId]) -> HashMap<CardId, (ListId, u32)> {
        self.lists
            .iter()
            .filter(|l| list_ids.contains(&l.id))
            .flat_map(|l| l.cards().iter())
            .map(|c| (c.id, (c.list_id, c.position)))
            .collect()
    }

    /// Cards of the given lists whose list or position differs from `before`.
    pub(crate) fn changed_since(
        &self,
        before: &HashMap<CardId, (ListId, u32)>,
        list_ids: &[ListId],
    ) -> Vec<TaskCard> {
        self.lists
            .iter()
            .filter(|l| list_ids.contains(&l.id))
            .flat_map(|l| l.cards().iter())
            .filter(|c| before.get(&c.id) != Some(&(c.list_id, c.position)))
            .cloned()
            .collect()
    }
}
