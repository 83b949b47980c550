//! Bounded background worker pool for enrichment jobs.
//!
//! Jobs go onto a bounded queue shared by a fixed number of workers. Each
//! finished job produces exactly one [`EnrichmentOutcome`] on an unbounded
//! channel; the receiver of that channel is the only place where results are
//! applied to the board.

use std::sync::Arc;
use taskboard_core::{TaskboardError, TaskboardResult};
use taskboard_domain::{Analysis, CardDigest, CardId, EnrichmentTrigger, GroupSuggestion, ListId};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::enricher::Enricher;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentJob {
    Analyze {
        card_id: CardId,
        title: String,
        description: Option<String>,
        trigger: EnrichmentTrigger,
    },
    GroupList {
        list_id: ListId,
        cards: Vec<CardDigest>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentOutcome {
    Analyzed {
        card_id: CardId,
        trigger: EnrichmentTrigger,
        analysis: Analysis,
    },
    Grouped {
        list_id: ListId,
        suggestions: Vec<GroupSuggestion>,
    },
}

pub struct EnrichmentPool {
    jobs: mpsc::Sender<EnrichmentJob>,
    workers: Vec<JoinHandle<()>>,
}

impl EnrichmentPool {
    /// Starts `workers` workers (at least one) reading from a queue of
    /// `capacity` jobs (at least one).
    pub fn spawn(
        enricher: Arc<Enricher>,
        workers: usize,
        capacity: usize,
    ) -> (Self, mpsc::UnboundedReceiver<EnrichmentOutcome>) {
        let (jobs, job_rx) = mpsc::channel(capacity.max(1));
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let job_rx = Arc::new(Mutex::new(job_rx));

        let workers = (0..workers.max(1))
            .map(|worker| {
                let enricher = enricher.clone();
                let job_rx = job_rx.clone();
                let outcome_tx = outcome_tx.clone();
                tokio::spawn(run_worker(worker, enricher, job_rx, outcome_tx))
            })
            .collect();

        tracing::debug!(capacity, "Enrichment pool started");
        (Self { jobs, workers }, outcome_rx)
    }

    /// Queues a job without waiting for a worker. When the queue is full the
    /// job is handed to a task that waits for room.
    pub fn submit(&self, job: EnrichmentJob) -> TaskboardResult<()> {
        match self.jobs.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(job)) => {
                tracing::debug!("Enrichment queue full, deferring job");
                let jobs = self.jobs.clone();
                tokio::spawn(async move {
                    if jobs.send(job).await.is_err() {
                        tracing::warn!("Enrichment pool stopped before a deferred job was queued");
                    }
                });
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(TaskboardError::Internal(
                "enrichment pool is shut down".to_string(),
            )),
        }
    }

    /// Stops accepting jobs and waits for the workers to drain the queue.
    pub async fn shutdown(self) {
        drop(self.jobs);
        for worker in self.workers {
            if let Err(e) = worker.await {
                tracing::warn!(error = %e, "Enrichment worker ended abnormally");
            }
        }
    }
}

async fn run_worker(
    worker: usize,
    enricher: Arc<Enricher>,
    jobs: Arc<Mutex<mpsc::Receiver<EnrichmentJob>>>,
    outcomes: mpsc::UnboundedSender<EnrichmentOutcome>,
) {
    loop {
        let job = { jobs.lock().await.recv().await };
        let Some(job) = job else {
            break;
        };

        let outcome = match job {
            EnrichmentJob::Analyze {
                card_id,
                title,
                description,
                trigger,
            } => {
                tracing::debug!(worker, %card_id, ?trigger, "Analyzing card");
                EnrichmentOutcome::Analyzed {
                    card_id,
                    trigger,
                    analysis: enricher.analyze(&title, description.as_deref()).await,
                }
            }
            EnrichmentJob::GroupList { list_id, cards } => {
                tracing::debug!(worker, %list_id, cards = cards.len(), "Grouping list");
                EnrichmentOutcome::Grouped {
                    list_id,
                    suggestions: enricher.suggest_groups(&cards).await,
                }
            }
        };

        if outcomes.send(outcome).is_err() {
            break;
        }
    }
    tracing::debug!(worker, "Enrichment worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classifier;
    use async_trait::async_trait;
    use std::time::Duration;
    use taskboard_domain::Priority;

    struct SlowClassifier;

    #[async_trait]
    impl Classifier for SlowClassifier {
        async fn analyze(&self, title: &str, _: Option<&str>) -> TaskboardResult<Analysis> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok(Analysis::new(Priority::High, Some(title)))
        }

        async fn suggest_groups(&self, cards: &[CardDigest]) -> TaskboardResult<Vec<GroupSuggestion>> {
            Ok(vec![GroupSuggestion {
                name: "Everything".to_string(),
                card_ids: cards.iter().map(|c| c.id).collect(),
            }])
        }
    }

    fn analyze_job(id: i64) -> EnrichmentJob {
        EnrichmentJob::Analyze {
            card_id: CardId(id),
            title: format!("task {}", id),
            description: None,
            trigger: EnrichmentTrigger::Created,
        }
    }

    #[tokio::test]
    async fn test_every_job_yields_one_outcome_even_when_queue_overflows() {
        let enricher = Arc::new(Enricher::new(Arc::new(SlowClassifier)));
        let (pool, mut outcomes) = EnrichmentPool::spawn(enricher, 2, 1);

        for id in 1..=10 {
            pool.submit(analyze_job(id)).unwrap();
        }

        let mut seen = Vec::new();
        for _ in 0..10 {
            match outcomes.recv().await.unwrap() {
                EnrichmentOutcome::Analyzed {
                    card_id, analysis, ..
                } => {
                    assert_eq!(analysis.priority, Priority::High);
                    seen.push(card_id.0);
                }
                other => panic!("unexpected outcome: {:?}", other),
            }
        }
        seen.sort();
        assert_eq!(seen, (1..=10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_group_job() {
        let enricher = Arc::new(Enricher::new(Arc::new(SlowClassifier)));
        let (pool, mut outcomes) = EnrichmentPool::spawn(enricher, 1, 4);

        let cards = vec![
            CardDigest {
                id: CardId(1),
                title: "a".to_string(),
                description: None,
            },
            CardDigest {
                id: CardId(2),
                title: "b".to_string(),
                description: None,
            },
        ];
        pool.submit(EnrichmentJob::GroupList {
            list_id: ListId(7),
            cards,
        })
        .unwrap();

        let outcome = outcomes.recv().await.unwrap();
        assert_eq!(
            outcome,
            EnrichmentOutcome::Grouped {
                list_id: ListId(7),
                suggestions: vec![GroupSuggestion {
                    name: "Everything".to_string(),
                    card_ids: vec![CardId(1), CardId(2)],
                }],
            }
        );
    }

    #[tokio::test]
    async fn test_shutdown_drains_queue() {
        let (pool, mut outcomes) = EnrichmentPool::spawn(Arc::new(Enricher::local_only()), 1, 8);
        pool.submit(analyze_job(1)).unwrap();
        pool.submit(analyze_job(2)).unwrap();
        pool.shutdown().await;

        assert!(outcomes.recv().await.is_some());
        assert!(outcomes.recv().await.is_some());
        assert!(outcomes.recv().await.is_none());
    }
}
