//! The process-wide owner of the board.
//!
//! Every user intent and every enrichment result goes through the same
//! `tokio::sync::Mutex<Board>`, so there is one structural mutation at a time.
//! A mutation updates the in-memory board first and then queues the durable
//! writes it produced; only identity-assigning inserts are awaited.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use taskboard_core::{EnrichmentConfig, TaskboardError, TaskboardResult};
use taskboard_domain::commands::{
    AddCard, ApplyGroupSuggestions, CardUpdate, Command, CommandContext, CreateList, DeleteList,
    MergeAnalysis, MoveCard, RemoveCard, RenameList, UpdateCard,
};
use taskboard_domain::{
    Board, CardDigest, CardId, EnrichmentTrigger, FieldUpdate, ListId, MoveOutcome, MoveRequest,
    Priority, TaskCard, TaskList,
};
use taskboard_enrichment::{EnrichmentJob, EnrichmentOutcome, EnrichmentPool, Enricher};
use taskboard_persistence::PersistenceGateway;
use tokio::sync::{broadcast, mpsc, Mutex, Notify};
use tokio::task::JoinHandle;

use crate::events::BoardEvent;
use crate::writer::{WriteOp, WriteQueue};

const EVENT_CAPACITY: usize = 256;

struct Shared {
    board: Mutex<Board>,
    writer: WriteQueue,
    pool: EnrichmentPool,
    events: broadcast::Sender<BoardEvent>,
    /// Jobs submitted to the pool whose outcome has not been merged yet.
    pending: AtomicUsize,
    idle: Notify,
    group_threshold: usize,
}

impl Shared {
    fn emit(&self, event: BoardEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn submit(&self, job: EnrichmentJob) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = self.pool.submit(job) {
            tracing::warn!(error = %e, "Could not queue enrichment job");
            self.finish_job();
        }
    }

    fn finish_job(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    fn submit_analysis(&self, card: &TaskCard, trigger: EnrichmentTrigger) {
        self.submit(EnrichmentJob::Analyze {
            card_id: card.id,
            title: card.title.clone(),
            description: card.description.clone(),
            trigger,
        });
    }

    async fn merge(&self, outcome: EnrichmentOutcome) {
        let mut board = self.board.lock().await;
        match outcome {
            EnrichmentOutcome::Analyzed {
                card_id,
                trigger,
                analysis,
            } => {
                let merged = execute(
                    &mut board,
                    MergeAnalysis {
                        card_id,
                        analysis,
                        trigger,
                    },
                );

                let card = match merged {
                    Ok(Some(card)) => card,
                    Ok(None) => return,
                    Err(e) => {
                        tracing::warn!(%card_id, error = %e, "Could not merge analysis");
                        return;
                    }
                };

                self.writer.enqueue(WriteOp::UpsertCard(card.clone()));
                tracing::debug!(%card_id, priority = %card.priority, group = ?card.group, "Card enriched");

                if trigger == EnrichmentTrigger::Created {
                    if let Some(list) = board.list(card.list_id) {
                        if list.len() > self.group_threshold {
                            self.submit(EnrichmentJob::GroupList {
                                list_id: list.id,
                                cards: list.cards().iter().map(CardDigest::from).collect(),
                            });
                        }
                    }
                }
                self.emit(BoardEvent::CardEnriched(card));
            }
            EnrichmentOutcome::Grouped {
                list_id,
                suggestions,
            } => {
                let applied = execute(
                    &mut board,
                    ApplyGroupSuggestions {
                        list_id,
                        suggestions,
                    },
                );

                match applied {
                    Ok(cards) if !cards.is_empty() => {
                        tracing::debug!(%list_id, cards = cards.len(), "Group suggestions applied");
                        self.writer.enqueue_cards(cards.clone());
                        self.emit(BoardEvent::GroupsApplied { list_id, cards });
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(%list_id, error = %e, "Could not apply group suggestions"),
                }
            }
        }
    }
}

async fn merge_loop(shared: Arc<Shared>, mut outcomes: mpsc::UnboundedReceiver<EnrichmentOutcome>) {
    while let Some(outcome) = outcomes.recv().await {
        shared.merge(outcome).await;
        shared.finish_job();
    }
}

/// Aborts the merge loop when dropped. The loop holds the shared state, so
/// it would otherwise keep the workers and the write queue alive.
struct MergeTask(JoinHandle<()>);

impl Drop for MergeTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// A loaded board together with its write queue and enrichment workers.
pub struct BoardSession {
    shared: Arc<Shared>,
    merger: MergeTask,
}

impl BoardSession {
    /// Loads the board from `gateway` and starts the background tasks.
    pub async fn open(
        gateway: Arc<dyn PersistenceGateway>,
        enricher: Arc<Enricher>,
        config: &EnrichmentConfig,
    ) -> TaskboardResult<Self> {
        let stored = gateway.list_all().await?;
        let board = Board::from_parts(stored.lists, stored.cards);
        tracing::info!(
            lists = board.lists().len(),
            cards = board.card_count(),
            "Board loaded"
        );

        let (pool, outcomes) =
            EnrichmentPool::spawn(enricher, config.workers, config.queue_capacity);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let shared = Arc::new(Shared {
            board: Mutex::new(board),
            writer: WriteQueue::spawn(gateway),
            pool,
            events,
            pending: AtomicUsize::new(0),
            idle: Notify::new(),
            group_threshold: config.group_threshold,
        });
        let merger = MergeTask(tokio::spawn(merge_loop(shared.clone(), outcomes)));

        Ok(Self { shared, merger })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.shared.events.subscribe()
    }

    /// A copy of the current in-memory board.
    pub async fn snapshot(&self) -> Board {
        self.shared.board.lock().await.clone()
    }

    /// Number of queued durable writes that failed.
    pub fn write_failures(&self) -> usize {
        self.shared.writer.failures()
    }

    pub async fn create_list(&self, title: &str) -> TaskboardResult<TaskList> {
        let title = required_title(title)?;
        let mut board = self.shared.board.lock().await;

        let mut list = TaskList::new(title);
        let id = self.shared.writer.upsert_list_now(list.clone()).await?;
        list.assign_id(id);

        execute(&mut board, CreateList { list: list.clone() })?;
        tracing::info!(list_id = %id, title = %list.title, "List created");
        self.shared.emit(BoardEvent::ListCreated(list.clone()));
        Ok(list)
    }

    pub async fn rename_list(&self, list_id: ListId, title: &str) -> TaskboardResult<TaskList> {
        let title = required_title(title)?;
        let mut board = self.shared.board.lock().await;

        let list = execute(&mut board, RenameList { list_id, title })?;
        self.shared.writer.enqueue(WriteOp::UpsertList(list.clone()));
        self.shared.emit(BoardEvent::ListRenamed(list.clone()));
        Ok(list)
    }

    /// Deletes a list and its cards.
    pub async fn delete_list(&self, list_id: ListId) -> TaskboardResult<()> {
        let mut board = self.shared.board.lock().await;

        let changes = execute(&mut board, DeleteList { list_id })?;
        for id in changes.deleted_lists {
            self.shared.writer.enqueue(WriteOp::DeleteList(id));
        }
        tracing::info!(%list_id, cards = changes.deleted_cards.len(), "List deleted");
        self.shared.emit(BoardEvent::ListDeleted { list_id });
        Ok(())
    }

    /// Appends a new card to `list_id` and queues its analysis. Returns the
    /// card as created, before enrichment.
    pub async fn create_card(
        &self,
        list_id: ListId,
        title: &str,
        description: Option<String>,
    ) -> TaskboardResult<TaskCard> {
        let title = required_title(title)?;
        let mut board = self.shared.board.lock().await;

        let list = board
            .list(list_id)
            .ok_or_else(|| TaskboardError::not_found(format!("List {}", list_id)))?;
        let mut card = TaskCard::new(list_id, title).with_description(description);
        card.position = u32::try_from(list.len())
            .map_err(|_| TaskboardError::Validation("list is full".to_string()))?;

        card.id = self.shared.writer.upsert_card_now(card.clone()).await?;

        let changes = execute(&mut board, AddCard { card: card.clone() })?;
        self.shared.writer.enqueue_cards(changes.cards);

        tracing::info!(card_id = %card.id, %list_id, "Card created");
        self.shared.emit(BoardEvent::CardCreated(card.clone()));
        self.shared.submit_analysis(&card, EnrichmentTrigger::Created);
        Ok(card)
    }

    /// Applies a partial update. A changed title or description queues a
    /// fresh analysis.
    pub async fn update_card(
        &self,
        card_id: CardId,
        mut updates: CardUpdate,
    ) -> TaskboardResult<TaskCard> {
        if let Some(title) = updates.title.take() {
            updates.title = Some(required_title(&title)?);
        }
        let mut board = self.shared.board.lock().await;

        let edit = execute(&mut board, UpdateCard { card_id, updates })?;
        self.shared.writer.enqueue(WriteOp::UpsertCard(edit.card.clone()));
        self.shared.emit(BoardEvent::CardUpdated(edit.card.clone()));

        if edit.content_changed {
            self.shared.submit_analysis(&edit.card, EnrichmentTrigger::Edited);
        }
        Ok(edit.card)
    }

    pub async fn edit_card(
        &self,
        card_id: CardId,
        title: Option<String>,
        description: FieldUpdate<String>,
    ) -> TaskboardResult<TaskCard> {
        self.update_card(
            card_id,
            CardUpdate {
                title,
                description,
                ..CardUpdate::default()
            },
        )
        .await
    }

    pub async fn set_priority(&self, card_id: CardId, priority: Priority) -> TaskboardResult<TaskCard> {
        self.update_card(
            card_id,
            CardUpdate {
                priority: Some(priority),
                ..CardUpdate::default()
            },
        )
        .await
    }

    /// Sets or clears a card's group label by hand.
    pub async fn set_group(&self, card_id: CardId, group: Option<&str>) -> TaskboardResult<TaskCard> {
        let group = match group {
            Some(label) => FieldUpdate::Set(label.to_string()),
            None => FieldUpdate::Clear,
        };
        self.update_card(
            card_id,
            CardUpdate {
                group,
                ..CardUpdate::default()
            },
        )
        .await
    }

    pub async fn delete_card(&self, card_id: CardId) -> TaskboardResult<()> {
        let mut board = self.shared.board.lock().await;

        let changes = execute(&mut board, RemoveCard { card_id })?;
        for id in changes.deleted_cards {
            self.shared.writer.enqueue(WriteOp::DeleteCard(id));
        }
        self.shared.writer.enqueue_cards(changes.cards);

        tracing::info!(%card_id, "Card deleted");
        self.shared.emit(BoardEvent::CardDeleted { card_id });
        Ok(())
    }

    /// Runs the move protocol. A rejected move changes nothing and is not an
    /// error.
    pub async fn move_card(&self, request: MoveRequest) -> TaskboardResult<MoveOutcome> {
        let mut board = self.shared.board.lock().await;

        let outcome = execute(&mut board, MoveCard { request })?;
        if let MoveOutcome::Moved { index, touched } = &outcome {
            self.shared.writer.enqueue_cards(touched.iter().cloned());
            self.shared.emit(BoardEvent::CardMoved {
                card_id: request.card_id,
                from: request.source_list,
                to: request.target_list,
                index: *index,
            });
        }
        Ok(outcome)
    }

    /// Moves a card from wherever it currently is.
    pub async fn move_card_to(
        &self,
        card_id: CardId,
        target_list: ListId,
        target_index: usize,
    ) -> TaskboardResult<MoveOutcome> {
        let source_list = self
            .shared
            .board
            .lock()
            .await
            .list_of(card_id)
            .ok_or_else(|| TaskboardError::not_found(format!("Card {}", card_id)))?;

        self.move_card(MoveRequest {
            card_id,
            source_list,
            target_list,
            target_index,
        })
        .await
    }

    /// Waits until every queued enrichment job has been merged and every
    /// queued write has been applied.
    pub async fn settle(&self) -> TaskboardResult<()> {
        loop {
            let notified = self.shared.idle.notified();
            if self.shared.pending.load(Ordering::SeqCst) == 0 {
                break;
            }
            notified.await;
        }
        self.shared.writer.flush().await
    }

    /// Settles, then stops the enrichment workers, the write queue and the
    /// merge loop.
    pub async fn shutdown(self) -> TaskboardResult<()> {
        self.settle().await?;

        let Self { shared, mut merger } = self;
        merger.0.abort();
        if let Err(e) = (&mut merger.0).await {
            if !e.is_cancelled() {
                tracing::warn!(error = %e, "Merge loop ended abnormally");
            }
        }

        match Arc::try_unwrap(shared) {
            Ok(shared) => {
                shared.pool.shutdown().await;
                shared.writer.shutdown().await;
                tracing::debug!("Board session stopped");
            }
            Err(_) => tracing::warn!("Board state still referenced at shutdown"),
        }
        Ok(())
    }
}

fn execute<C: Command>(board: &mut Board, command: C) -> TaskboardResult<C::Output> {
    tracing::debug!("Executing: {}", command.description());
    command.execute(&mut CommandContext::new(board))
}

fn required_title(title: &str) -> TaskboardResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TaskboardError::Validation("title must not be empty".to_string()));
    }
    Ok(title.to_string())
}
