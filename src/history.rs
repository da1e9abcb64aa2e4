//! Volatile record of the elements labeled during the current session.

use crate::element::ElementId;
use crate::error::SessionError;

/// Chronological, append-only log with single-step undo.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionHistory {
    entries: Vec<ElementId>,
}

impl SessionHistory {
    /// Record a labeled element. Blank identifiers are rejected untouched.
    pub fn append(&mut self, id: ElementId) -> Result<(), SessionError> {
        if id.is_blank() {
            return Err(SessionError::InvalidState(
                "Cannot record an element without identifier".into(),
            ));
        }
        self.entries.push(id);
        Ok(())
    }

    /// Drop the most recent entry; empty history stays empty.
    pub fn undo_last(&mut self) -> Option<ElementId> {
        self.entries.pop()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&ElementId> {
        self.entries.last()
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.entries.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElementId> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[ElementId] {
        &self.entries
    }
}
