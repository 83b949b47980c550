use async_trait::async_trait;
use taskboard_core::TaskboardResult;
use taskboard_domain::{Analysis, CardDigest, GroupSuggestion};

/// An external service that suggests priorities and groups for cards.
///
/// Implementations report every failure as an error; deciding what to do
/// instead is left to [`crate::Enricher`].
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn analyze(&self, title: &str, description: Option<&str>) -> TaskboardResult<Analysis>;

    async fn suggest_groups(&self, cards: &[CardDigest]) -> TaskboardResult<Vec<GroupSuggestion>>;
}
