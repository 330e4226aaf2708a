//! Row selection and the dismissal protocol for list-backed plugins.
//!
//! Rows are rebuilt wholesale from every successful fetch, so marks and focus
//! are local UI state that never outlive a rebuild (focus is clamped, marks
//! are dropped).

use std::collections::BTreeSet;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::DisposalError;

/// Opaque row identifier supplied by the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(pub u64);

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub id: RowId,
    pub marked: bool,
    pub text: String,
}

impl DisplayRow {
    pub fn new(id: RowId, text: impl Into<String>) -> Self {
        Self {
            id,
            marked: false,
            text: text.into(),
        }
    }
}

/// How the dismiss key was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissTrigger {
    /// Enter while a row has focus.
    EnterOnFocused,
    /// Enter while no row has focus.
    EnterWithNoFocus,
}

/// Disposes of one item by id (e.g. removes a notification).
#[async_trait]
pub trait Disposer: Send + Sync {
    async fn dispose_item(&self, id: RowId) -> Result<(), DisposalError>;
}

/// Outcome of a dismissal batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DismissReport {
    pub dismissed: usize,
    pub failed: usize,
}

/// Rows plus local mark/focus state.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    rows: Vec<DisplayRow>,
    marked: BTreeSet<RowId>,
    focused: Option<usize>,
}

impl SelectionState {
    pub fn rows(&self) -> &[DisplayRow] {
        &self.rows
    }

    pub fn focused(&self) -> Option<usize> {
        self.focused
    }

    pub fn marked(&self) -> &BTreeSet<RowId> {
        &self.marked
    }

    /// Replaces every row. Marks are cleared and focus is clamped.
    pub fn replace_rows(&mut self, rows: Vec<DisplayRow>) {
        self.rows = rows;
        for row in &mut self.rows {
            row.marked = false;
        }
        self.marked.clear();
        self.focused = match self.focused {
            Some(_) if self.rows.is_empty() => None,
            Some(i) => Some(i.min(self.rows.len() - 1)),
            None => None,
        };
    }

    pub fn focus(&mut self, index: Option<usize>) {
        self.focused = index.filter(|i| *i < self.rows.len());
    }

    pub fn clear_focus(&mut self) {
        self.focused = None;
    }

    /// Moves focus down, starting at the first row when nothing is focused.
    pub fn focus_next(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        self.focused = Some(match self.focused {
            Some(i) => (i + 1).min(self.rows.len() - 1),
            None => 0,
        });
    }

    /// Moves focus up, starting at the last row when nothing is focused.
    pub fn focus_previous(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        self.focused = Some(match self.focused {
            Some(i) => i.saturating_sub(1),
            None => self.rows.len() - 1,
        });
    }

    /// Toggles the mark on a row. Unknown ids are ignored.
    pub fn toggle_mark(&mut self, id: RowId) {
        let Some(row) = self.rows.iter_mut().find(|row| row.id == id) else {
            return;
        };
        row.marked = !row.marked;
        if row.marked {
            self.marked.insert(id);
        } else {
            self.marked.remove(&id);
        }
    }

    /// Toggles the mark on the focused row, if any.
    pub fn toggle_focused_mark(&mut self) {
        if let Some(id) = self.focused.and_then(|i| self.rows.get(i)).map(|row| row.id) {
            self.toggle_mark(id);
        }
    }

    /// Picks the rows a dismiss action applies to.
    ///
    /// Marked rows always win. Otherwise Enter on a focused row targets that
    /// row, and Enter with no focus targets every row.
    pub fn resolve_dismiss_targets(&self, trigger: DismissTrigger) -> Vec<RowId> {
        if !self.marked.is_empty() {
            return self.marked.iter().copied().collect();
        }

        match trigger {
            DismissTrigger::EnterOnFocused => self
                .focused
                .and_then(|i| self.rows.get(i))
                .map(|row| vec![row.id])
                .unwrap_or_default(),
            DismissTrigger::EnterWithNoFocus => self.rows.iter().map(|row| row.id).collect(),
        }
    }
}

/// Disposes every target, one call per id.
///
/// Individual failures are logged and counted; they never stop the rest of
/// the batch.
pub async fn dispose_targets(disposer: &dyn Disposer, targets: &[RowId]) -> DismissReport {
    let mut report = DismissReport::default();
    for &id in targets {
        match disposer.dispose_item(id).await {
            Ok(()) => {
                debug!(%id, "item dismissed");
                report.dismissed += 1;
            }
            Err(err) => {
                warn!(%id, error = %err, "dismiss failed");
                report.failed += 1;
            }
        }
    }
    report
}
