//! Kanban grouping: one column per stage, always all six, in lifecycle order.

use serde::{Deserialize, Serialize};

use crate::stage::CaseStage;

/// One Kanban column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardColumn<T> {
    /// Column stage.
    pub stage: CaseStage,
    /// Cards in this column, in input order.
    pub items: Vec<T>,
}

impl<T> BoardColumn<T> {
    /// Number of cards.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the column has no cards.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Group items into six columns by stage. Empty columns are kept.
pub fn group_by_stage<T, F>(items: impl IntoIterator<Item = T>, stage_of: F) -> Vec<BoardColumn<T>>
where
    F: Fn(&T) -> CaseStage,
{
    let mut columns: Vec<BoardColumn<T>> = CaseStage::ALL
        .into_iter()
        .map(|stage| BoardColumn {
            stage,
            items: Vec::new(),
        })
        .collect();
    for item in items {
        let idx = stage_of(&item).index();
        columns[idx].items.push(item);
    }
    columns
}
