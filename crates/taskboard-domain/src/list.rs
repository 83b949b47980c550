use serde::{Deserialize, Serialize};

use crate::card::TaskCard;
use crate::id::{CardId, ListId};

/// A column of cards. `cards` is kept in position order.
///
/// The structural primitives (`append`, `insert_at`, `remove_at`, `remove`)
/// never write positions. Callers follow every structural change with
/// [`TaskList::renumber_positions`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    pub id: ListId,
    pub title: String,
    #[serde(default)]
    cards: Vec<TaskCard>,
}

impl TaskList {
    pub fn new(title: String) -> Self {
        Self {
            id: ListId::UNSET,
            title,
            cards: Vec::new(),
        }
    }

    /// Assigns the storage identity and re-points every owned card at it.
    pub fn assign_id(&mut self, id: ListId) {
        self.id = id;
        for card in &mut self.cards {
            card.list_id = id;
        }
    }

    pub fn update_title(&mut self, title: String) {
        self.title = title;
    }

    pub fn cards(&self) -> &[TaskCard] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn index_of(&self, card_id: CardId) -> Option<usize> {
        self.cards.iter().position(|c| c.id == card_id)
    }

    pub fn contains(&self, card_id: CardId) -> bool {
        self.index_of(card_id).is_some()
    }

    pub fn get(&self, card_id: CardId) -> Option<&TaskCard> {
        self.cards.iter().find(|c| c.id == card_id)
    }

    pub fn get_mut(&mut self, card_id: CardId) -> Option<&mut TaskCard> {
        self.cards.iter_mut().find(|c| c.id == card_id)
    }

    pub fn append(&mut self, mut card: TaskCard) {
        card.list_id = self.id;
        self.cards.push(card);
    }

    /// Inserts at `index`, clamped to `[0, len]`. Returns the index used.
    pub fn insert_at(&mut self, index: usize, mut card: TaskCard) -> usize {
        let index = index.min(self.cards.len());
        card.list_id = self.id;
        self.cards.insert(index, card);
        index
    }

    pub fn remove_at(&mut self, index: usize) -> Option<TaskCard> {
        if index < self.cards.len() {
            Some(self.cards.remove(index))
        } else {
            None
        }
    }

    pub fn remove(&mut self, card_id: CardId) -> Option<TaskCard> {
        self.index_of(card_id).and_then(|index| self.remove_at(index))
    }

    /// Sets `position = index` for every card. Returns the cards whose
    /// position changed.
    pub fn renumber_positions(&mut self) -> Vec<CardId> {
        let mut changed = Vec::new();
        for (index, card) in self.cards.iter_mut().enumerate() {
            let position = index as u32;
            if card.position != position {
                card.position = position;
                changed.push(card.id);
            }
        }
        changed
    }

    pub fn is_contiguous(&self) -> bool {
        self.cards
            .iter()
            .enumerate()
            .all(|(index, card)| card.position == index as u32 && card.list_id == self.id)
    }

    /// Rebuilds a list from stored cards, sorting by stored position and
    /// closing any gaps.
    pub(crate) fn with_cards(mut self, mut cards: Vec<TaskCard>) -> Self {
        cards.sort_by_key(|c| (c.position, c.id));
        for card in cards {
            self.append(card);
        }
        self.renumber_positions();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_with(titles: &[&str]) -> TaskList {
        let mut list = TaskList::new("Todo".to_string());
        list.assign_id(ListId(1));
        for (i, title) in titles.iter().enumerate() {
            let mut card = TaskCard::new(list.id, title.to_string());
            card.id = CardId(i as i64 + 1);
            list.append(card);
        }
        list.renumber_positions();
        list
    }

    fn titles(list: &TaskList) -> Vec<&str> {
        list.cards().iter().map(|c| c.title.as_str()).collect()
    }

    #[test]
    fn test_append_then_renumber_is_contiguous() {
        let list = list_with(&["a", "b", "c"]);
        assert!(list.is_contiguous());
        let positions: Vec<u32> = list.cards().iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_insert_at_clamps_past_end() {
        let mut list = list_with(&["a", "b"]);
        let mut card = TaskCard::new(ListId(99), "z".to_string());
        card.id = CardId(10);
        let used = list.insert_at(50, card);
        assert_eq!(used, 2);
        list.renumber_positions();
        assert_eq!(titles(&list), vec!["a", "b", "z"]);
        assert_eq!(list.cards()[2].list_id, ListId(1));
        assert!(list.is_contiguous());
    }

    #[test]
    fn test_remove_then_renumber_closes_gap() {
        let mut list = list_with(&["a", "b", "c", "d"]);
        let removed = list.remove(CardId(2)).unwrap();
        assert_eq!(removed.title, "b");
        assert!(!list.is_contiguous());

        let changed = list.renumber_positions();
        assert_eq!(changed, vec![CardId(3), CardId(4)]);
        assert!(list.is_contiguous());
    }

    #[test]
    fn test_remove_at_out_of_range_is_none() {
        let mut list = list_with(&["a"]);
        assert!(list.remove_at(3).is_none());
        assert!(list.remove(CardId(42)).is_none());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_mixed_operations_stay_contiguous() {
        let mut list = list_with(&["a", "b", "c"]);
        for n in 0..20i64 {
            let mut card = TaskCard::new(list.id, format!("n{}", n));
            card.id = CardId(100 + n);
            match n % 4 {
                0 => list.append(card),
                1 => {
                    list.insert_at((n as usize * 7) % (list.len() + 3), card);
                }
                2 => {
                    list.remove_at((n as usize * 5) % (list.len() + 1));
                }
                _ => {
                    list.insert_at(0, card);
                }
            }
            list.renumber_positions();
            assert!(list.is_contiguous());
        }
    }

    #[test]
    fn test_with_cards_sorts_by_stored_position() {
        let list = TaskList {
            id: ListId(5),
            title: "Doing".to_string(),
            cards: Vec::new(),
        };
        let mut first = TaskCard::new(ListId(5), "first".to_string());
        first.id = CardId(2);
        first.position = 4;
        let mut second = TaskCard::new(ListId(5), "second".to_string());
        second.id = CardId(1);
        second.position = 9;

        let list = list.with_cards(vec![second, first]);
        assert_eq!(titles(&list), vec!["first", "second"]);
        assert!(list.is_contiguous());
    }

    #[test]
    fn test_assign_id_repoints_cards() {
        let mut list = list_with(&["a", "b"]);
        list.assign_id(ListId(8));
        assert!(list.cards().iter().all(|c| c.list_id == ListId(8)));
    }
}
