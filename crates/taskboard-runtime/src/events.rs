use serde::Serialize;
use taskboard_domain::{CardId, ListId, TaskCard, TaskList};

/// Notification sent to observers after a change has been applied to the
/// in-memory board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BoardEvent {
    ListCreated(TaskList),
    ListRenamed(TaskList),
    ListDeleted {
        list_id: ListId,
    },
    CardCreated(TaskCard),
    CardUpdated(TaskCard),
    CardDeleted {
        card_id: CardId,
    },
    CardMoved {
        card_id: CardId,
        from: ListId,
        to: ListId,
        index: usize,
    },
    /// Priority or group changed by the classifier.
    CardEnriched(TaskCard),
    GroupsApplied {
        list_id: ListId,
        cards: Vec<TaskCard>,
    },
}
