pub mod classifier;
pub mod enricher;
pub mod heuristic;
pub mod openrouter;
pub mod pool;

pub use classifier::Classifier;
pub use enricher::Enricher;
pub use heuristic::{local_analysis, local_priority};
pub use openrouter::OpenRouterClassifier;
pub use pool::{EnrichmentJob, EnrichmentOutcome, EnrichmentPool};
