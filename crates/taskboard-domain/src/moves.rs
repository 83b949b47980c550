//! Relocation of a card within a list or across lists.
//!
//! A move detaches the card from its source list, inserts it into the target
//! list at the requested index (clamped to the target's length), re-points the
//! card at the target and renumbers both lists. The outcome names every card
//! whose list or position changed so the caller can write exactly those.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::board::Board;
use crate::card::TaskCard;
use crate::id::{CardId, ListId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub card_id: CardId,
    pub source_list: ListId,
    pub target_list: ListId,
    pub target_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveRejection {
    UnknownSourceList,
    UnknownTargetList,
    NotInSourceList,
}

impl fmt::Display for MoveRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSourceList => f.write_str("source list does not exist"),
            Self::UnknownTargetList => f.write_str("target list does not exist"),
            Self::NotInSourceList => f.write_str("card is not in the source list"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The card was relocated; `touched` holds every card whose list or
    /// position changed, in list order.
    Moved {
        index: usize,
        touched: Vec<TaskCard>,
    },
    /// The request was ignored; nothing changed.
    Rejected(MoveRejection),
}

impl MoveOutcome {
    pub fn touched(&self) -> &[TaskCard] {
        match self {
            Self::Moved { touched, .. } => touched,
            Self::Rejected(_) => &[],
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

pub fn move_card(board: &mut Board, request: MoveRequest) -> MoveOutcome {
    let MoveRequest {
        card_id,
        source_list,
        target_list,
        target_index,
    } = request;

    let rejection = match (board.list(source_list), board.list(target_list)) {
        (None, _) => Some(MoveRejection::UnknownSourceList),
        (_, None) => Some(MoveRejection::UnknownTargetList),
        (Some(source), _) if !source.contains(card_id) => Some(MoveRejection::NotInSourceList),
        _ => None,
    };
    if let Some(reason) = rejection {
        tracing::warn!(
            card_id = %card_id,
            source_list = %source_list,
            target_list = %target_list,
            %reason,
            "Ignoring card move"
        );
        return MoveOutcome::Rejected(reason);
    }

    let affected = [source_list, target_list];
    let before = board.placements(&affected);

    let Some(card) = board.list_mut(source_list).and_then(|l| l.remove(card_id)) else {
        return MoveOutcome::Rejected(MoveRejection::NotInSourceList);
    };
    let Some(target) = board.list_mut(target_list) else {
        return MoveOutcome::Rejected(MoveRejection::UnknownTargetList);
    };

    let index = target.insert_at(target_index, card);
    target.renumber_positions();
    if source_list != target_list {
        if let Some(source) = board.list_mut(source_list) {
            source.renumber_positions();
        }
    }

    let touched = board.changed_since(&before, &affected);
    tracing::debug!(
        card_id = %card_id,
        target_list = %target_list,
        index,
        touched = touched.len(),
        "Moved card"
    );

    MoveOutcome::Moved { index, touched }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::TaskList;

    fn board_with(lists: &[(i64, &[&str])]) -> Board {
        let mut board = Board::new();
        let mut next_card = 1;
        for (list_id, titles) in lists {
            let mut list = TaskList::new(format!("list {}", list_id));
            list.assign_id(ListId(*list_id));
            for title in *titles {
                let mut card = TaskCard::new(list.id, title.to_string());
                card.id = CardId(next_card);
                next_card += 1;
                list.append(card);
            }
            list.renumber_positions();
            board.add_list(list);
        }
        board
    }

    fn titles(board: &Board, list_id: i64) -> Vec<String> {
        board
            .list(ListId(list_id))
            .unwrap()
            .cards()
            .iter()
            .map(|c| c.title.clone())
            .collect()
    }

    #[test]
    fn test_cross_list_move_scenario() {
        let mut board = board_with(&[(1, &["P0", "P1", "P2"]), (2, &[])]);

        let outcome = move_card(
            &mut board,
            MoveRequest {
                card_id: CardId(2),
                source_list: ListId(1),
                target_list: ListId(2),
                target_index: 0,
            },
        );

        assert_eq!(titles(&board, 1), vec!["P0", "P2"]);
        assert_eq!(titles(&board, 2), vec!["P1"]);
        let a = board.list(ListId(1)).unwrap();
        assert_eq!(
            a.cards().iter().map(|c| c.position).collect::<Vec<_>>(),
            vec![0, 1]
        );
        let p1 = board.find_card(CardId(2)).unwrap();
        assert_eq!(p1.list_id, ListId(2));
        assert_eq!(p1.position, 0);

        let mut touched: Vec<CardId> = outcome.touched().iter().map(|c| c.id).collect();
        touched.sort();
        assert_eq!(touched, vec![CardId(2), CardId(3)]);
    }

    #[test]
    fn test_same_list_reorder() {
        let mut board = board_with(&[(1, &["a", "b", "c", "d"])]);
        let outcome = move_card(
            &mut board,
            MoveRequest {
                card_id: CardId(4),
                source_list: ListId(1),
                target_list: ListId(1),
                target_index: 1,
            },
        );
        assert_eq!(titles(&board, 1), vec!["a", "d", "b", "c"]);
        assert!(board.list(ListId(1)).unwrap().is_contiguous());
        assert_eq!(outcome.touched().len(), 3);
    }

    #[test]
    fn test_move_to_current_index_is_noop() {
        let mut board = board_with(&[(1, &["a", "b", "c"])]);
        let before = board.clone();
        let outcome = move_card(
            &mut board,
            MoveRequest {
                card_id: CardId(2),
                source_list: ListId(1),
                target_list: ListId(1),
                target_index: 1,
            },
        );
        assert_eq!(board, before);
        assert!(outcome.touched().is_empty());
        assert!(!outcome.is_rejected());
    }

    #[test]
    fn test_index_past_end_appends() {
        let mut board = board_with(&[(1, &["a"]), (2, &["x", "y"])]);
        let outcome = move_card(
            &mut board,
            MoveRequest {
                card_id: CardId(1),
                source_list: ListId(1),
                target_list: ListId(2),
                target_index: 99,
            },
        );
        assert_eq!(titles(&board, 2), vec!["x", "y", "a"]);
        assert!(matches!(outcome, MoveOutcome::Moved { index: 2, .. }));
        assert!(board.list(ListId(1)).unwrap().is_empty());
    }

    #[test]
    fn test_card_not_in_source_is_rejected() {
        let mut board = board_with(&[(1, &["a"]), (2, &["b"])]);
        let before = board.clone();
        let outcome = move_card(
            &mut board,
            MoveRequest {
                card_id: CardId(2),
                source_list: ListId(1),
                target_list: ListId(2),
                target_index: 0,
            },
        );
        assert_eq!(outcome, MoveOutcome::Rejected(MoveRejection::NotInSourceList));
        assert_eq!(board, before);
    }

    #[test]
    fn test_unknown_lists_are_rejected() {
        let mut board = board_with(&[(1, &["a"])]);
        let unknown_target = move_card(
            &mut board,
            MoveRequest {
                card_id: CardId(1),
                source_list: ListId(1),
                target_list: ListId(7),
                target_index: 0,
            },
        );
        assert_eq!(
            unknown_target,
            MoveOutcome::Rejected(MoveRejection::UnknownTargetList)
        );
        assert!(board.list(ListId(1)).unwrap().contains(CardId(1)));

        let unknown_source = move_card(
            &mut board,
            MoveRequest {
                card_id: CardId(1),
                source_list: ListId(7),
                target_list: ListId(1),
                target_index: 0,
            },
        );
        assert_eq!(
            unknown_source,
            MoveOutcome::Rejected(MoveRejection::UnknownSourceList)
        );
    }
}
