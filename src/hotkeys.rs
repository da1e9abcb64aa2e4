//! Digit shortcuts for the active label set.

use std::fmt;

use crate::element::LabelSet;

/// Largest label set that still gets digit shortcuts.
pub const MAX_BOUND_LABELS: usize = 9;

/// Physical key reported by the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// Numeric row digit.
    Digit(u8),
    /// Numeric keypad digit.
    Numpad(u8),
    Other,
}

impl KeyCode {
    /// Parse `KeyboardEvent.code` style names such as `Digit3` or `Numpad3`.
    pub fn from_code(code: &str) -> Self {
        let parse_digit = |rest: &str| rest.parse::<u8>().ok().filter(|d| *d <= 9);
        if let Some(digit) = code.strip_prefix("Digit").and_then(parse_digit) {
            KeyCode::Digit(digit)
        } else if let Some(digit) = code.strip_prefix("Numpad").and_then(parse_digit) {
            KeyCode::Numpad(digit)
        } else {
            KeyCode::Other
        }
    }

    fn ordinal(self) -> Option<usize> {
        match self {
            KeyCode::Digit(d) | KeyCode::Numpad(d) if d > 0 => Some(d as usize),
            _ => None,
        }
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyCode::Digit(d) => write!(f, "{d}"),
            KeyCode::Numpad(d) => write!(f, "Num {d}"),
            KeyCode::Other => f.write_str("Key"),
        }
    }
}

/// One installed set of digit bindings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveBinding {
    id: u64,
    labels: LabelSet,
}

impl ActiveBinding {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Label bound to `key`, if any.
    pub fn resolve(&self, key: KeyCode) -> Option<&str> {
        key.ordinal().and_then(|ordinal| self.labels.at_ordinal(ordinal))
    }

    /// Every bound key with its label, row digits before keypad digits.
    pub fn keys(&self) -> Vec<(KeyCode, &str)> {
        let row = self
            .labels
            .iter()
            .enumerate()
            .map(|(index, label)| (KeyCode::Digit(index as u8 + 1), label));
        let pad = self
            .labels
            .iter()
            .enumerate()
            .map(|(index, label)| (KeyCode::Numpad(index as u8 + 1), label));
        row.chain(pad).collect()
    }
}

/// Holds at most one active binding, replaced whenever the labels change.
#[derive(Debug, Default)]
pub struct KeyboardLabelBinder {
    active: Option<ActiveBinding>,
    next_id: u64,
}

impl KeyboardLabelBinder {
    /// Replace the current binding with one for `labels`.
    ///
    /// The previous binding is always removed first. Nothing is installed
    /// for an empty set or one larger than [`MAX_BOUND_LABELS`].
    pub fn bind(&mut self, labels: &LabelSet) -> Option<&ActiveBinding> {
        self.unbind();
        if labels.is_empty() || labels.len() > MAX_BOUND_LABELS {
            tracing::debug!("No digit shortcuts for {} labels", labels.len());
            return None;
        }
        self.next_id = self.next_id.wrapping_add(1).max(1);
        tracing::debug!("Digit shortcuts bound for {} labels", labels.len());
        self.active = Some(ActiveBinding {
            id: self.next_id,
            labels: labels.clone(),
        });
        self.active.as_ref()
    }

    /// Remove the active binding, returning it.
    pub fn unbind(&mut self) -> Option<ActiveBinding> {
        let removed = self.active.take();
        if let Some(binding) = &removed {
            tracing::debug!("Digit shortcuts {} removed", binding.id);
        }
        removed
    }

    pub fn active(&self) -> Option<&ActiveBinding> {
        self.active.as_ref()
    }

    pub fn resolve(&self, key: KeyCode) -> Option<&str> {
        self.active.as_ref().and_then(|binding| binding.resolve(key))
    }
}
