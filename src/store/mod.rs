//! Contract of the external annotation/data store.

mod memory;

use thiserror::Error;

use crate::element::{AnnotationElement, Annotation, ElementId, Frame, LabelSet, ModelRef, Statistics};
use crate::selection::{SamplePool, SelectionConfig};

pub use memory::MemoryStore;

/// Store-side failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Element {0} not found")]
    NotFound(ElementId),
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Everything the store needs to pick the next element.
#[derive(Clone, Copy, Debug)]
pub struct NextRequest<'a> {
    pub scheme: &'a str,
    pub user: &'a str,
    pub config: &'a SelectionConfig,
    pub history: &'a [ElementId],
    pub frame: Option<Frame>,
}

/// Project state relevant to an annotation session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectSnapshot {
    /// Labels of the requested scheme.
    pub labels: LabelSet,
    /// Classifier trained for the scheme/user pair, if any.
    pub model: Option<ModelRef>,
    pub samples: Vec<SamplePool>,
}

/// Transport-agnostic store operations consumed by the session.
pub trait AnnotationStore {
    fn project(&mut self, scheme: &str, user: &str) -> Result<ProjectSnapshot, StoreError>;

    fn next_element_id(&mut self, request: &NextRequest<'_>) -> Result<Option<ElementId>, StoreError>;

    /// Element details; predictions come from the scheme/user classifier.
    fn element(
        &mut self,
        id: &ElementId,
        scheme: &str,
        user: &str,
    ) -> Result<AnnotationElement, StoreError>;

    fn add_annotation(&mut self, annotation: &Annotation) -> Result<(), StoreError>;

    /// Create or refresh the classifier for the scheme/user pair.
    fn update_simple_model(&mut self, scheme: &str, user: &str, model: &ModelRef) -> Result<(), StoreError>;

    fn statistics(&mut self, scheme: &str, user: &str) -> Result<Statistics, StoreError>;
}
