//! Linear undo/redo log of image versions.

use crate::image_state::ImageState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Undo,
    Redo,
}

impl HistoryAction {
    pub const fn applied_message(self) -> &'static str {
        match self {
            Self::Undo => "undo applied",
            Self::Redo => "redo applied",
        }
    }

    pub const fn empty_message(self) -> &'static str {
        match self {
            Self::Undo => "nothing to undo",
            Self::Redo => "nothing to redo",
        }
    }
}

/// Ordered image versions plus a cursor into them.
///
/// Never empty, and the cursor always points at a stored state. Committing
/// after an undo prunes the redo branch; there is no history tree.
#[derive(Debug, Clone)]
pub struct SessionHistory {
    states: Vec<ImageState>,
    cursor: usize,
}

impl SessionHistory {
    pub fn new(initial: ImageState) -> Self {
        Self {
            states: vec![initial],
            cursor: 0,
        }
    }

    pub fn commit(&mut self, state: ImageState) {
        let pruned = self.states.len() - (self.cursor + 1);
        self.states.truncate(self.cursor + 1);
        self.states.push(state);
        self.cursor = self.states.len() - 1;
        if pruned > 0 {
            tracing::debug!(pruned, "commit discarded redo branch");
        }
    }

    pub fn undo(&mut self) -> bool {
        self.step(HistoryAction::Undo)
    }

    pub fn redo(&mut self) -> bool {
        self.step(HistoryAction::Redo)
    }

    pub fn step(&mut self, action: HistoryAction) -> bool {
        let target = match action {
            HistoryAction::Undo => self.cursor.checked_sub(1),
            HistoryAction::Redo => Some(self.cursor + 1).filter(|next| *next < self.states.len()),
        };
        match target {
            Some(cursor) => {
                self.cursor = cursor;
                true
            }
            None => false,
        }
    }

    pub fn current(&self) -> &ImageState {
        &self.states[self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Always false; kept for the `len`/`is_empty` pairing.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.states.len()
    }

    pub fn states(&self) -> &[ImageState] {
        &self.states
    }
}
