pub mod events;
pub mod session;
pub mod writer;

pub use events::BoardEvent;
pub use session::BoardSession;
pub use writer::{WriteOp, WriteQueue};
