use std::sync::Arc;
use taskboard_core::ClassifierConfig;
use taskboard_domain::{Analysis, CardDigest, GroupSuggestion};

use crate::classifier::Classifier;
use crate::heuristic::local_analysis;
use crate::openrouter::OpenRouterClassifier;

const MIN_CARDS_FOR_GROUPING: usize = 2;

/// The failure boundary around a [`Classifier`]: every call produces a
/// result, falling back to the local heuristic (or to no suggestions) when
/// the classifier is missing or fails.
#[derive(Clone, Default)]
pub struct Enricher {
    classifier: Option<Arc<dyn Classifier>>,
}

impl Enricher {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            classifier: Some(classifier),
        }
    }

    /// An enricher that never leaves the process.
    pub fn local_only() -> Self {
        Self { classifier: None }
    }

    /// Uses the remote classifier when an API key is configured.
    pub fn from_config(config: &ClassifierConfig) -> Self {
        if config.effective_api_key().is_none() {
            tracing::info!("No classifier API key configured, using local heuristic");
            return Self::local_only();
        }
        match OpenRouterClassifier::from_config(config) {
            Ok(classifier) => Self::new(Arc::new(classifier)),
            Err(e) => {
                tracing::warn!(error = %e, "Classifier unavailable, using local heuristic");
                Self::local_only()
            }
        }
    }

    pub fn is_remote(&self) -> bool {
        self.classifier.is_some()
    }

    pub async fn analyze(&self, title: &str, description: Option<&str>) -> Analysis {
        let Some(classifier) = &self.classifier else {
            return local_analysis(title);
        };
        match classifier.analyze(title, description).await {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!(error = %e, "Task analysis failed, using local heuristic");
                local_analysis(title)
            }
        }
    }

    pub async fn suggest_groups(&self, cards: &[CardDigest]) -> Vec<GroupSuggestion> {
        let Some(classifier) = &self.classifier else {
            return Vec::new();
        };
        if cards.len() < MIN_CARDS_FOR_GROUPING {
            return Vec::new();
        }
        match classifier.suggest_groups(cards).await {
            Ok(suggestions) => suggestions,
            Err(e) => {
                tracing::warn!(error = %e, "Group suggestion failed");
                Vec::new()
            }
        }
    }
}
