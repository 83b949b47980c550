use taskboard_core::TaskboardResult;

use crate::{Board, CardId, ListId, TaskCard};

pub mod card_commands;
pub mod list_commands;

pub use card_commands::*;
pub use list_commands::*;

/// Trait for domain commands that mutate the board.
/// Commands represent intent; each one reports what it changed so the caller
/// can write exactly that to storage.
pub trait Command: Send + Sync {
    type Output;

    /// Execute this command, mutating the board
    fn execute(&self, context: &mut CommandContext) -> TaskboardResult<Self::Output>;

    /// Human-readable description of what this command does
    fn description(&self) -> String;
}

/// Context passed to commands for mutation
pub struct CommandContext<'a> {
    pub board: &'a mut Board,
}

impl<'a> CommandContext<'a> {
    pub fn new(board: &'a mut Board) -> Self {
        Self { board }
    }
}

/// Records touched by a structural command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changes {
    /// Cards whose stored fields (list or position included) are stale.
    pub cards: Vec<TaskCard>,
    pub deleted_cards: Vec<CardId>,
    pub deleted_lists: Vec<ListId>,
}

impl Changes {
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty() && self.deleted_cards.is_empty() && self.deleted_lists.is_empty()
    }
}
