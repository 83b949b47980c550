use super::{Changes, Command, CommandContext};
use crate::analysis::apply_group_suggestions;
use crate::moves::{move_card, MoveOutcome, MoveRequest};
use crate::{
    Analysis, CardId, EnrichmentTrigger, FieldUpdate, GroupSuggestion, ListId, Priority, TaskCard,
};
use taskboard_core::{TaskboardError, TaskboardResult};

/// Append a card to the end of its list
pub struct AddCard {
    pub card: TaskCard,
}

impl Command for AddCard {
    type Output = Changes;

    fn execute(&self, context: &mut CommandContext) -> TaskboardResult<Changes> {
        let list_id = self.card.list_id;
        if context.board.find_card(self.card.id).is_some() {
            return Err(TaskboardError::Validation(format!(
                "card {} is already on the board",
                self.card.id
            )));
        }

        let mut before = context.board.placements(&[list_id]);
        before.insert(self.card.id, (self.card.list_id, self.card.position));

        let list = context
            .board
            .list_mut(list_id)
            .ok_or_else(|| TaskboardError::not_found(format!("List {}", list_id)))?;
        list.append(self.card.clone());
        list.renumber_positions();

        Ok(Changes {
            cards: context.board.changed_since(&before, &[list_id]),
            ..Changes::default()
        })
    }

    fn description(&self) -> String {
        format!("Add card: '{}'", self.card.title)
    }
}

/// Remove a card from whichever list holds it
pub struct RemoveCard {
    pub card_id: CardId,
}

impl Command for RemoveCard {
    type Output = Changes;

    fn execute(&self, context: &mut CommandContext) -> TaskboardResult<Changes> {
        let list_id = context
            .board
            .list_of(self.card_id)
            .ok_or_else(|| TaskboardError::not_found(format!("Card {}", self.card_id)))?;

        let before = context.board.placements(&[list_id]);
        if let Some(list) = context.board.list_mut(list_id) {
            list.remove(self.card_id);
            list.renumber_positions();
        }

        Ok(Changes {
            cards: context.board.changed_since(&before, &[list_id]),
            deleted_cards: vec![self.card_id],
            deleted_lists: Vec::new(),
        })
    }

    fn description(&self) -> String {
        format!("Remove card {}", self.card_id)
    }
}

/// Move a card within or across lists
pub struct MoveCard {
    pub request: MoveRequest,
}

impl Command for MoveCard {
    type Output = MoveOutcome;

    fn execute(&self, context: &mut CommandContext) -> TaskboardResult<MoveOutcome> {
        Ok(move_card(context.board, self.request))
    }

    fn description(&self) -> String {
        format!(
            "Move card {} to list {} at {}",
            self.request.card_id, self.request.target_list, self.request.target_index
        )
    }
}

/// Partial update of a card's user-editable fields
#[derive(Debug, Clone, Default)]
pub struct CardUpdate {
    pub title: Option<String>,
    pub description: FieldUpdate<String>,
    pub priority: Option<Priority>,
    pub group: FieldUpdate<String>,
}

/// Result of [`UpdateCard`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardEdit {
    pub card: TaskCard,
    /// Title or description changed, so the card should be re-analyzed.
    pub content_changed: bool,
}

pub struct UpdateCard {
    pub card_id: CardId,
    pub updates: CardUpdate,
}

impl Command for UpdateCard {
    type Output = CardEdit;

    fn execute(&self, context: &mut CommandContext) -> TaskboardResult<CardEdit> {
        let card = context
            .board
            .find_card_mut(self.card_id)
            .ok_or_else(|| TaskboardError::not_found(format!("Card {}", self.card_id)))?;

        let title_before = card.title.clone();
        let description_before = card.description.clone();

        if let Some(title) = &self.updates.title {
            card.update_title(title.clone());
        }
        if self.updates.description.is_change() {
            let mut description = card.description.clone();
            self.updates.description.clone().apply_to(&mut description);
            card.update_description(description);
        }
        if let Some(priority) = self.updates.priority {
            card.update_priority(priority);
        }
        match &self.updates.group {
            FieldUpdate::NoChange => {}
            FieldUpdate::Set(group) => card.set_group(Some(group)),
            FieldUpdate::Clear => card.set_group(None),
        }

        let content_changed =
            card.title != title_before || card.description != description_before;
        Ok(CardEdit {
            card: card.clone(),
            content_changed,
        })
    }

    fn description(&self) -> String {
        format!("Update card {}", self.card_id)
    }
}

/// Merge a classifier result into a card
pub struct MergeAnalysis {
    pub card_id: CardId,
    pub analysis: Analysis,
    pub trigger: EnrichmentTrigger,
}

impl Command for MergeAnalysis {
    /// The updated card, or `None` when the card is gone or nothing changed.
    type Output = Option<TaskCard>;

    fn execute(&self, context: &mut CommandContext) -> TaskboardResult<Option<TaskCard>> {
        let Some(card) = context.board.find_card_mut(self.card_id) else {
            tracing::debug!(card_id = %self.card_id, "Dropping analysis for a card no longer on the board");
            return Ok(None);
        };

        if self.analysis.merge_into(card, self.trigger) {
            Ok(Some(card.clone()))
        } else {
            tracing::debug!(card_id = %self.card_id, "Analysis unchanged, skipping write");
            Ok(None)
        }
    }

    fn description(&self) -> String {
        format!("Merge analysis into card {}", self.card_id)
    }
}

/// Apply batch group suggestions to the ungrouped cards of a list
pub struct ApplyGroupSuggestions {
    pub list_id: ListId,
    pub suggestions: Vec<GroupSuggestion>,
}

impl Command for ApplyGroupSuggestions {
    type Output = Vec<TaskCard>;

    fn execute(&self, context: &mut CommandContext) -> TaskboardResult<Vec<TaskCard>> {
        match context.board.list_mut(self.list_id) {
            Some(list) => Ok(apply_group_suggestions(list, &self.suggestions)),
            None => {
                tracing::debug!(list_id = %self.list_id, "Dropping group suggestions for a deleted list");
                Ok(Vec::new())
            }
        }
    }

    fn description(&self) -> String {
        format!("Apply group suggestions to list {}", self.list_id)
    }
}
