use super::{Changes, Command, CommandContext};
use crate::{ListId, TaskList};
use taskboard_core::{TaskboardError, TaskboardResult};

/// Add an already persisted list to the end of the board
pub struct CreateList {
    pub list: TaskList,
}

impl Command for CreateList {
    type Output = ();

    fn execute(&self, context: &mut CommandContext) -> TaskboardResult<()> {
        if context.board.list(self.list.id).is_some() {
            return Err(TaskboardError::Validation(format!(
                "list {} already exists",
                self.list.id
            )));
        }
        context.board.add_list(self.list.clone());
        Ok(())
    }

    fn description(&self) -> String {
        format!("Create list: '{}'", self.list.title)
    }
}

/// Rename a list
pub struct RenameList {
    pub list_id: ListId,
    pub title: String,
}

impl Command for RenameList {
    type Output = TaskList;

    fn execute(&self, context: &mut CommandContext) -> TaskboardResult<TaskList> {
        let list = context
            .board
            .list_mut(self.list_id)
            .ok_or_else(|| TaskboardError::not_found(format!("List {}", self.list_id)))?;
        list.update_title(self.title.clone());
        Ok(list.clone())
    }

    fn description(&self) -> String {
        format!("Rename list {} to '{}'", self.list_id, self.title)
    }
}

/// Delete a list together with its cards
pub struct DeleteList {
    pub list_id: ListId,
}

impl Command for DeleteList {
    type Output = Changes;

    fn execute(&self, context: &mut CommandContext) -> TaskboardResult<Changes> {
        let list = context
            .board
            .remove_list(self.list_id)
            .ok_or_else(|| TaskboardError::not_found(format!("List {}", self.list_id)))?;
        Ok(Changes {
            cards: Vec::new(),
            deleted_cards: list.cards().iter().map(|c| c.id).collect(),
            deleted_lists: vec![list.id],
        })
    }

    fn description(&self) -> String {
        format!("Delete list {}", self.list_id)
    }
}
