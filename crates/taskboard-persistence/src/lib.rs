pub mod gateway;
pub mod memory;
pub mod sqlite;

pub use gateway::{PersistenceGateway, StoredBoard};
pub use memory::MemoryGateway;
pub use sqlite::SqliteGateway;
