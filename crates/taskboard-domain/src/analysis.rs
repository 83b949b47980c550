use serde::{Deserialize, Serialize};

use crate::card::{truncate_group, Priority, TaskCard};
use crate::id::CardId;
use crate::list::TaskList;

/// Suggested priority and group for one card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub priority: Priority,
    pub group: Option<String>,
}

impl Analysis {
    pub fn new(priority: Priority, group: Option<&str>) -> Self {
        Self {
            priority,
            group: group.and_then(truncate_group),
        }
    }

    fn matches(&self, card: &TaskCard) -> bool {
        self.priority == card.priority && self.group == card.group
    }

    /// Writes this analysis onto `card`. Returns whether the card changed and
    /// needs to be persisted.
    ///
    /// Results for a freshly created card always overwrite. Results for an
    /// edited card are skipped when they match the card's current values.
    pub fn merge_into(&self, card: &mut TaskCard, trigger: EnrichmentTrigger) -> bool {
        if trigger == EnrichmentTrigger::Edited && self.matches(card) {
            return false;
        }
        card.priority = self.priority;
        card.group = self.group.clone();
        true
    }
}

/// Why a card is being analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnrichmentTrigger {
    Created,
    Edited,
}

/// A group name proposed for a set of cards of one list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSuggestion {
    pub name: String,
    pub card_ids: Vec<CardId>,
}

/// The parts of a card a classifier gets to see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDigest {
    pub id: CardId,
    pub title: String,
    pub description: Option<String>,
}

impl From<&TaskCard> for CardDigest {
    fn from(card: &TaskCard) -> Self {
        Self {
            id: card.id,
            title: card.title.clone(),
            description: card.description.clone(),
        }
    }
}

/// Assigns suggested group names to cards of `list` that have no group yet.
/// Cards that already carry a group are left alone, as are ids that are not
/// in the list. Returns the cards that changed.
pub fn apply_group_suggestions(list: &mut TaskList, suggestions: &[GroupSuggestion]) -> Vec<TaskCard> {
    let mut changed = Vec::new();
    for suggestion in suggestions {
        let Some(name) = truncate_group(&suggestion.name) else {
            continue;
        };
        for card_id in &suggestion.card_ids {
            if let Some(card) = list.get_mut(*card_id) {
                if !card.has_group() {
                    card.group = Some(name.clone());
                    changed.push(card.clone());
                }
            }
        }
    }
    changed
}
