//! Data carried between the annotation store and the session controller.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::selection::SelectionMode;

/// Opaque identifier of a dataset element.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Blank identifiers never name a real element.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ElementId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Classifier output attached to an element when a model exists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub proba: f64,
}

/// Rectangle drawn over the 2D projection view.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl Frame {
    /// Build a frame from two corners in any order.
    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> Self {
        Self {
            x_min: a.0.min(b.0),
            y_min: a.1.min(b.1),
            x_max: a.0.max(b.0),
            y_max: a.1.max(b.1),
        }
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: (f64, f64)) -> bool {
        let (x, y) = point;
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }
}

/// Element as fetched for display. Replaced wholesale on every navigation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationElement {
    pub element_id: ElementId,
    pub text: String,
    /// Number of characters shown as in-scope text; the rest is trailing context.
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub predict: Option<Prediction>,
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    #[serde(default)]
    pub frame: Option<Frame>,
    /// Session history as it stood when the element was fetched.
    #[serde(default)]
    pub history: Vec<ElementId>,
    /// Strategy that surfaced the element, when known.
    #[serde(default)]
    pub selection: Option<SelectionMode>,
}

impl AnnotationElement {
    /// Text shown as the part to annotate.
    pub fn in_scope(&self) -> &str {
        &self.text[..self.split_offset()]
    }

    /// Text shown after the limit as surrounding context.
    pub fn trailing_context(&self) -> &str {
        &self.text[self.split_offset()..]
    }

    fn split_offset(&self) -> usize {
        let Some(limit) = self.limit else {
            return self.text.len();
        };
        self.text
            .char_indices()
            .nth(limit)
            .map_or(self.text.len(), |(offset, _)| offset)
    }
}

/// Ordered, duplicate-free labels of the active scheme.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    /// Keeps the first occurrence of every label and drops blank entries.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for label in labels {
            let label = label.into();
            let label = label.trim();
            if label.is_empty() || out.iter().any(|existing| existing == label) {
                continue;
            }
            out.push(label.to_string());
        }
        Self { labels: out }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|existing| existing == label)
    }

    /// Label at a 1-based ordinal position.
    pub fn at_ordinal(&self, ordinal: usize) -> Option<&str> {
        ordinal
            .checked_sub(1)
            .and_then(|index| self.labels.get(index))
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn first(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }
}

impl From<Vec<String>> for LabelSet {
    fn from(value: Vec<String>) -> Self {
        Self::new(value)
    }
}

impl From<LabelSet> for Vec<String> {
    fn from(value: LabelSet) -> Self {
        value.labels
    }
}

/// Counters shown next to the annotation panel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub annotated_n: usize,
    pub trainset_n: usize,
}

/// Reference to the lightweight classifier trained for a scheme/user pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelRef {
    pub model: String,
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub features: Vec<String>,
}

impl ModelRef {
    pub fn named(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            params: BTreeMap::new(),
            features: Vec::new(),
        }
    }
}

/// One labeling action submitted to the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub element_id: ElementId,
    pub label: String,
    pub scheme: String,
    pub user: String,
    pub selection: SelectionMode,
    pub session_id: Uuid,
}
