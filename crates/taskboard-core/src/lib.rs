pub mod config;
pub mod error;
pub mod result;

pub use config::{AppConfig, ClassifierConfig, EnrichmentConfig};
pub use error::TaskboardError;
pub use result::TaskboardResult;
