use std::sync::Arc;
use taskboard_core::{AppConfig, TaskboardError};
use taskboard_domain::{CardId, TaskCard};
use taskboard_enrichment::Enricher;
use taskboard_persistence::{MemoryGateway, PersistenceGateway, SqliteGateway};
use taskboard_runtime::BoardSession;

use crate::cli::Cli;
use crate::output::OutputFormat;

pub struct CliContext {
    pub session: BoardSession,
    pub format: OutputFormat,
}

impl CliContext {
    pub async fn open(cli: &Cli, config: &AppConfig) -> anyhow::Result<Self> {
        let gateway: Arc<dyn PersistenceGateway> = if cli.memory {
            Arc::new(MemoryGateway::new())
        } else {
            let path = cli
                .db
                .clone()
                .or_else(|| config.effective_database_path())
                .ok_or_else(|| anyhow::anyhow!("no database path; pass --db or --memory"))?;
            tracing::debug!(path = %path.display(), "Opening database");
            Arc::new(SqliteGateway::new(path))
        };
        gateway.seed_if_empty().await?;

        let enricher = if cli.offline {
            Enricher::local_only()
        } else {
            Enricher::from_config(&config.classifier)
        };

        let session =
            BoardSession::open(gateway, Arc::new(enricher), &config.enrichment).await?;
        let format = if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        };

        Ok(Self { session, format })
    }

    /// Waits for background enrichment and writes, then returns the card as
    /// it stands.
    pub async fn settled_card(&self, card_id: CardId) -> anyhow::Result<TaskCard> {
        self.session.settle().await?;
        self.session
            .snapshot()
            .await
            .find_card(card_id)
            .cloned()
            .ok_or_else(|| anyhow::Error::from(TaskboardError::not_found(format!("Card {}", card_id))))
    }
}
