//! Durable write queue: linearized gateway writes through a single consumer.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use taskboard_core::{TaskboardError, TaskboardResult};
use taskboard_domain::{CardId, ListId, TaskCard, TaskList};
use taskboard_persistence::PersistenceGateway;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// One durable write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    UpsertList(TaskList),
    UpsertCard(TaskCard),
    DeleteList(ListId),
    DeleteCard(CardId),
}

impl WriteOp {
    fn describe(&self) -> String {
        match self {
            WriteOp::UpsertList(list) => format!("upsert list {}", list.id),
            WriteOp::UpsertCard(card) => format!("upsert card {}", card.id),
            WriteOp::DeleteList(id) => format!("delete list {}", id),
            WriteOp::DeleteCard(id) => format!("delete card {}", id),
        }
    }
}

enum WriteRequest {
    Write(WriteOp),
    InsertList(TaskList, oneshot::Sender<TaskboardResult<ListId>>),
    InsertCard(TaskCard, oneshot::Sender<TaskboardResult<CardId>>),
    Flush(oneshot::Sender<()>),
}

/// FIFO queue in front of a [`PersistenceGateway`].
///
/// Every request is applied by one background task in the order it was
/// queued, so the writes produced by one mutation are never interleaved with
/// another's. Fire-and-forget writes that fail are logged and counted, never
/// retried.
pub struct WriteQueue {
    tx: mpsc::UnboundedSender<WriteRequest>,
    failures: Arc<AtomicUsize>,
    worker_handle: JoinHandle<()>,
}

impl WriteQueue {
    pub fn spawn(gateway: Arc<dyn PersistenceGateway>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let failures = Arc::new(AtomicUsize::new(0));
        let worker_handle = tokio::spawn(write_worker(rx, gateway, failures.clone()));
        Self {
            tx,
            failures,
            worker_handle,
        }
    }

    /// Queue a write without waiting for it.
    pub fn enqueue(&self, op: WriteOp) {
        if let WriteOp::UpsertCard(card) = &op {
            if !card.id.is_persisted() {
                tracing::debug!(title = %card.title, "Skipping write of a card without identity");
                return;
            }
        }
        if self.tx.send(WriteRequest::Write(op)).is_err() {
            tracing::error!("Write queue closed, dropping write");
        }
    }

    pub fn enqueue_cards(&self, cards: impl IntoIterator<Item = TaskCard>) {
        for card in cards {
            self.enqueue(WriteOp::UpsertCard(card));
        }
    }

    /// Insert a new list after every write queued before it and wait for the
    /// id storage assigns.
    pub async fn upsert_list_now(&self, list: TaskList) -> TaskboardResult<ListId> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(WriteRequest::InsertList(list, reply_tx))?;
        reply_rx
            .await
            .map_err(|_| TaskboardError::Internal("write reply dropped".to_string()))?
    }

    /// Insert a new card after every write queued before it and wait for the
    /// id storage assigns.
    pub async fn upsert_card_now(&self, card: TaskCard) -> TaskboardResult<CardId> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(WriteRequest::InsertCard(card, reply_tx))?;
        reply_rx
            .await
            .map_err(|_| TaskboardError::Internal("write reply dropped".to_string()))?
    }

    /// Wait until every write queued so far has been applied.
    pub async fn flush(&self) -> TaskboardResult<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(WriteRequest::Flush(reply_tx))?;
        reply_rx
            .await
            .map_err(|_| TaskboardError::Internal("flush reply dropped".to_string()))
    }

    /// Number of queued writes that failed so far.
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    /// Drain the queue and stop the writer.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            tracing::error!(error = %e, "Write worker ended abnormally");
        }
    }

    fn send(&self, request: WriteRequest) -> TaskboardResult<()> {
        self.tx.send(request).map_err(|_| {
            if self.worker_handle.is_finished() {
                TaskboardError::Internal("write worker exited".to_string())
            } else {
                TaskboardError::Internal("write queue closed".to_string())
            }
        })
    }
}

async fn write_worker(
    mut rx: mpsc::UnboundedReceiver<WriteRequest>,
    gateway: Arc<dyn PersistenceGateway>,
    failures: Arc<AtomicUsize>,
) {
    while let Some(request) = rx.recv().await {
        match request {
            WriteRequest::Write(op) => {
                let description = op.describe();
                let result = match op {
                    WriteOp::UpsertList(list) => gateway.upsert_list(&list).await.map(|_| ()),
                    WriteOp::UpsertCard(card) => gateway.upsert_card(&card).await.map(|_| ()),
                    WriteOp::DeleteList(id) => gateway.delete_list(id).await,
                    WriteOp::DeleteCard(id) => gateway.delete_card(id).await,
                };
                match result {
                    Ok(()) => tracing::debug!(write = %description, "Write applied"),
                    Err(e) => {
                        failures.fetch_add(1, Ordering::SeqCst);
                        tracing::error!(write = %description, error = %e, "Durable write failed");
                    }
                }
            }
            WriteRequest::InsertList(list, reply) => {
                let _ = reply.send(gateway.upsert_list(&list).await);
            }
            WriteRequest::InsertCard(card, reply) => {
                let _ = reply.send(gateway.upsert_card(&card).await);
            }
            WriteRequest::Flush(reply) => {
                let _ = reply.send(());
            }
        }
    }
}
