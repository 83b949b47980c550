pub mod analysis;
pub mod board;
pub mod card;
pub mod commands;
pub mod field_update;
pub mod id;
pub mod list;
pub mod moves;

pub use analysis::{Analysis, CardDigest, EnrichmentTrigger, GroupSuggestion};
pub use board::Board;
pub use card::{truncate_group, Priority, TaskCard};
pub use field_update::FieldUpdate;
pub use id::{CardId, ListId};
pub use list::TaskList;
pub use moves::{move_card, MoveOutcome, MoveRejection, MoveRequest};
