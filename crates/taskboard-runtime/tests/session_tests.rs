use async_trait::async_trait;
use std::sync::Arc;
use taskboard_core::{EnrichmentConfig, TaskboardError, TaskboardResult};
use taskboard_domain::{
    Analysis, Board, CardDigest, FieldUpdate, GroupSuggestion, MoveOutcome, MoveRejection,
    MoveRequest, Priority,
};
use taskboard_enrichment::{Classifier, Enricher};
use taskboard_persistence::{MemoryGateway, PersistenceGateway, SqliteGateway};
use taskboard_runtime::{BoardEvent, BoardSession};
use tempfile::tempdir;
use tokio::sync::{broadcast, Semaphore};

/// Answers every analysis with the same result and groups every card it is
/// shown under one name. Each call waits for a permit from `gate`.
struct ScriptedClassifier {
    analysis: Analysis,
    group_name: String,
    gate: Arc<Semaphore>,
}

impl ScriptedClassifier {
    fn open(analysis: Analysis, group_name: &str) -> Self {
        Self {
            analysis,
            group_name: group_name.to_string(),
            gate: Arc::new(Semaphore::new(Semaphore::MAX_PERMITS)),
        }
    }

    fn gated(analysis: Analysis, gate: Arc<Semaphore>) -> Self {
        Self {
            analysis,
            group_name: String::new(),
            gate,
        }
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn analyze(&self, _: &str, _: Option<&str>) -> TaskboardResult<Analysis> {
        let _permit = self.gate.acquire().await.unwrap();
        Ok(self.analysis.clone())
    }

    async fn suggest_groups(&self, cards: &[CardDigest]) -> TaskboardResult<Vec<GroupSuggestion>> {
        let _permit = self.gate.acquire().await.unwrap();
        Ok(vec![GroupSuggestion {
            name: self.group_name.clone(),
            card_ids: cards.iter().map(|c| c.id).collect(),
        }])
    }
}

async fn open(gateway: Arc<dyn PersistenceGateway>, classifier: Option<ScriptedClassifier>) -> BoardSession {
    let enricher = match classifier {
        Some(classifier) => Enricher::new(Arc::new(classifier)),
        None => Enricher::local_only(),
    };
    BoardSession::open(gateway, Arc::new(enricher), &EnrichmentConfig::default())
        .await
        .unwrap()
}

/// Next event that is not an enrichment result, which may arrive at any time.
async fn next_user_event(events: &mut broadcast::Receiver<BoardEvent>) -> BoardEvent {
    loop {
        match events.recv().await.unwrap() {
            BoardEvent::CardEnriched(_) | BoardEvent::GroupsApplied { .. } => continue,
            event => return event,
        }
    }
}

fn titles(board: &Board, list_index: usize) -> Vec<String> {
    board.lists()[list_index]
        .cards()
        .iter()
        .map(|c| c.title.clone())
        .collect()
}

#[tokio::test]
async fn test_cross_list_move_is_persisted_in_order() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("tasks.db");

    let session = open(Arc::new(SqliteGateway::new(&db_path)), None).await;
    let a = session.create_list("A").await.unwrap();
    let b = session.create_list("B").await.unwrap();
    let mut cards = Vec::new();
    for title in ["P0", "P1", "P2"] {
        cards.push(session.create_card(a.id, title, None).await.unwrap());
    }

    let outcome = session
        .move_card(MoveRequest {
            card_id: cards[1].id,
            source_list: a.id,
            target_list: b.id,
            target_index: 0,
        })
        .await
        .unwrap();
    assert!(!outcome.is_rejected());
    session.settle().await.unwrap();

    let in_memory = session.snapshot().await;
    assert_eq!(titles(&in_memory, 0), vec!["P0", "P2"]);
    assert_eq!(titles(&in_memory, 1), vec!["P1"]);
    let positions: Vec<u32> = in_memory.lists()[0].cards().iter().map(|c| c.position).collect();
    assert_eq!(positions, vec![0, 1]);
    assert_eq!(in_memory.find_card(cards[1].id).unwrap().list_id, b.id);

    drop(session);
    let stored = SqliteGateway::new(&db_path).list_all().await.unwrap();
    let reloaded = Board::from_parts(stored.lists, stored.cards);
    assert_eq!(reloaded, in_memory);
}

#[tokio::test]
async fn test_unchanged_analysis_after_edit_writes_nothing() {
    let gateway = Arc::new(MemoryGateway::new());
    let classifier = ScriptedClassifier::open(Analysis::new(Priority::High, Some("Errands")), "");
    let session = open(gateway.clone(), Some(classifier)).await;

    let list = session.create_list("TODO").await.unwrap();
    let card = session.create_card(list.id, "Buy milk", None).await.unwrap();
    session.settle().await.unwrap();
    // Insert plus the merge of the first analysis.
    assert_eq!(gateway.card_writes().len(), 2);

    session
        .edit_card(card.id, Some("Buy oat milk".to_string()), FieldUpdate::NoChange)
        .await
        .unwrap();
    session.settle().await.unwrap();

    // Only the edit itself was written.
    assert_eq!(gateway.card_writes().len(), 3);
    let stored = gateway.stored_card(card.id).unwrap();
    assert_eq!(stored.title, "Buy oat milk");
    assert_eq!(stored.group.as_deref(), Some("Errands"));
}

#[tokio::test]
async fn test_analysis_for_deleted_card_is_dropped() {
    let gateway = Arc::new(MemoryGateway::new());
    let gate = Arc::new(Semaphore::new(0));
    let classifier = ScriptedClassifier::gated(Analysis::new(Priority::High, Some("Work")), gate.clone());
    let session = open(gateway.clone(), Some(classifier)).await;
    let mut events = session.subscribe();

    let list = session.create_list("TODO").await.unwrap();
    let card = session.create_card(list.id, "Short lived", None).await.unwrap();
    session.delete_card(card.id).await.unwrap();

    gate.add_permits(1);
    session.settle().await.unwrap();

    assert!(session.snapshot().await.find_card(card.id).is_none());
    assert!(gateway.stored_card(card.id).is_none());
    assert_eq!(gateway.card_writes(), vec![card.id]);

    while let Ok(event) = events.try_recv() {
        assert!(!matches!(event, BoardEvent::CardEnriched(_)));
    }
}

#[tokio::test]
async fn test_batch_grouping_never_overwrites_a_group() {
    let gateway = Arc::new(MemoryGateway::new());
    let classifier = ScriptedClassifier::open(Analysis::new(Priority::Low, None), "Weekend Chores List");
    let session = open(gateway.clone(), Some(classifier)).await;

    let list = session.create_list("TODO").await.unwrap();
    let mut cards = Vec::new();
    for title in ["Mow lawn", "Wash car", "Clean gutters"] {
        cards.push(session.create_card(list.id, title, None).await.unwrap());
    }
    session.settle().await.unwrap();
    session.set_group(cards[0].id, Some("Personal")).await.unwrap();

    // The fourth card pushes the list over the grouping threshold.
    cards.push(session.create_card(list.id, "Paint fence", None).await.unwrap());
    session.settle().await.unwrap();

    let board = session.snapshot().await;
    let groups: Vec<Option<String>> = cards
        .iter()
        .map(|c| board.find_card(c.id).unwrap().group.clone())
        .collect();
    assert_eq!(groups[0].as_deref(), Some("Personal"));
    for group in &groups[1..] {
        assert_eq!(group.as_deref(), Some("Weekend Chores"));
    }
    assert_eq!(
        gateway.stored_card(cards[0].id).unwrap().group.as_deref(),
        Some("Personal")
    );
    assert_eq!(
        gateway.stored_card(cards[3].id).unwrap().group.as_deref(),
        Some("Weekend Chores")
    );
}

#[tokio::test]
async fn test_observers_see_changes_in_order() {
    let session = open(Arc::new(MemoryGateway::new()), None).await;
    let mut events = session.subscribe();

    let todo = session.create_list("TODO").await.unwrap();
    let done = session.create_list("DONE").await.unwrap();
    let card = session.create_card(todo.id, "Ship it", None).await.unwrap();
    session.move_card_to(card.id, done.id, 5).await.unwrap();

    assert_eq!(
        next_user_event(&mut events).await,
        BoardEvent::ListCreated(todo.clone())
    );
    assert_eq!(
        next_user_event(&mut events).await,
        BoardEvent::ListCreated(done.clone())
    );
    assert!(matches!(
        next_user_event(&mut events).await,
        BoardEvent::CardCreated(c) if c.id == card.id
    ));
    assert_eq!(
        next_user_event(&mut events).await,
        BoardEvent::CardMoved {
            card_id: card.id,
            from: todo.id,
            to: done.id,
            index: 0,
        }
    );
}

#[tokio::test]
async fn test_rejected_move_changes_nothing() {
    let gateway = Arc::new(MemoryGateway::new());
    let session = open(gateway.clone(), None).await;
    let todo = session.create_list("TODO").await.unwrap();
    let done = session.create_list("DONE").await.unwrap();
    let card = session.create_card(todo.id, "Stay put", None).await.unwrap();
    session.settle().await.unwrap();
    let writes_before = gateway.card_writes().len();
    let before = session.snapshot().await;

    let outcome = session
        .move_card(MoveRequest {
            card_id: card.id,
            source_list: done.id,
            target_list: todo.id,
            target_index: 0,
        })
        .await
        .unwrap();
    session.settle().await.unwrap();

    assert_eq!(outcome, MoveOutcome::Rejected(MoveRejection::NotInSourceList));
    assert_eq!(session.snapshot().await, before);
    assert_eq!(gateway.card_writes().len(), writes_before);
}

#[tokio::test]
async fn test_write_failures_leave_memory_intact() {
    let gateway = Arc::new(MemoryGateway::new());
    let session = open(gateway.clone(), None).await;
    let todo = session.create_list("TODO").await.unwrap();
    let done = session.create_list("DONE").await.unwrap();
    let card = session.create_card(todo.id, "Offline move", None).await.unwrap();
    session.settle().await.unwrap();

    gateway.set_fail_writes(true);
    session.move_card_to(card.id, done.id, 0).await.unwrap();
    session.settle().await.unwrap();

    assert!(session.write_failures() > 0);
    let board = session.snapshot().await;
    assert_eq!(board.find_card(card.id).unwrap().list_id, done.id);
    assert_eq!(gateway.stored_card(card.id).unwrap().list_id, todo.id);

    let result = session.create_card(todo.id, "Never stored", None).await;
    assert!(matches!(result, Err(TaskboardError::Database(_))));
    assert_eq!(session.snapshot().await.card_count(), 1);
}

#[tokio::test]
async fn test_delete_list_removes_its_cards() {
    let gateway = Arc::new(MemoryGateway::new());
    let session = open(gateway.clone(), None).await;
    let todo = session.create_list("TODO").await.unwrap();
    let card = session.create_card(todo.id, "Gone soon", None).await.unwrap();
    session.delete_list(todo.id).await.unwrap();
    session.settle().await.unwrap();

    assert!(session.snapshot().await.lists().is_empty());
    assert!(gateway.stored_card(card.id).is_none());
    assert!(gateway.list_all().await.unwrap().lists.is_empty());
}

#[tokio::test]
async fn test_edited_title_is_trimmed() {
    let gateway = Arc::new(MemoryGateway::new());
    let session = open(gateway.clone(), None).await;
    let todo = session.create_list("TODO").await.unwrap();
    let card = session.create_card(todo.id, "  created  ", None).await.unwrap();
    assert_eq!(card.title, "created");

    let edited = session
        .edit_card(card.id, Some("  edited  ".to_string()), FieldUpdate::NoChange)
        .await
        .unwrap();
    assert_eq!(edited.title, "edited");

    session.settle().await.unwrap();
    assert_eq!(gateway.stored_card(card.id).unwrap().title, "edited");
}

#[tokio::test]
async fn test_shutdown_applies_pending_enrichment_and_writes() {
    let gateway = Arc::new(MemoryGateway::new());
    let session = open(gateway.clone(), None).await;
    let todo = session.create_list("TODO").await.unwrap();
    let done = session.create_list("DONE").await.unwrap();
    let card = session
        .create_card(todo.id, "urgent: page on-call", None)
        .await
        .unwrap();
    session.move_card_to(card.id, done.id, 0).await.unwrap();

    session.shutdown().await.unwrap();

    let stored = gateway.stored_card(card.id).unwrap();
    assert_eq!(stored.list_id, done.id);
    assert_eq!(stored.position, 0);
    assert_eq!(stored.priority, Priority::High);
}
