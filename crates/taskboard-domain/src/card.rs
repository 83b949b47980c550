use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use taskboard_core::TaskboardError;

use crate::id::{CardId, ListId};

const MAX_GROUP_WORDS: usize = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TaskboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(TaskboardError::Validation(format!(
                "unknown priority '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCard {
    pub id: CardId,
    pub list_id: ListId,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub group: Option<String>,
    pub position: u32,
}

impl TaskCard {
    pub fn new(list_id: ListId, title: String) -> Self {
        Self {
            id: CardId::UNSET,
            list_id,
            title,
            description: None,
            priority: Priority::Medium,
            group: None,
            position: 0,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    pub fn update_title(&mut self, title: String) {
        self.title = title;
    }

    pub fn update_description(&mut self, description: Option<String>) {
        self.description = description.filter(|d| !d.trim().is_empty());
    }

    pub fn update_priority(&mut self, priority: Priority) {
        self.priority = priority;
    }

    /// Sets the group label, normalized to at most two words.
    pub fn set_group(&mut self, group: Option<&str>) {
        self.group = group.and_then(truncate_group);
    }

    pub fn has_group(&self) -> bool {
        self.group.as_deref().is_some_and(|g| !g.trim().is_empty())
    }
}

/// Keeps the first two whitespace-separated words of a group label.
/// Blank labels normalize to `None`.
pub fn truncate_group(label: &str) -> Option<String> {
    let words: Vec<&str> = label.split_whitespace().take(MAX_GROUP_WORDS).collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}
