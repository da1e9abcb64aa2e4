use tagloop::element::{Annotation, AnnotationElement, ElementId, ModelRef, Statistics};
use tagloop::store::{AnnotationStore, MemoryStore, NextRequest, ProjectSnapshot, StoreError};

/// Store calls observed by [`ScriptedStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Project,
    NextElementId,
    Element(String),
    AddAnnotation(String, String),
    UpdateSimpleModel(String),
    Statistics,
}

/// Wraps a [`MemoryStore`], logging every call and failing on request.
pub struct ScriptedStore {
    pub inner: MemoryStore,
    pub calls: Vec<Call>,
    pub fail_annotations: bool,
    pub fail_model_updates: bool,
    pub fail_fetches: bool,
}

impl ScriptedStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            calls: Vec::new(),
            fail_annotations: false,
            fail_model_updates: false,
            fail_fetches: false,
        }
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn model_updates(&self) -> usize {
        self.count(|call| matches!(call, Call::UpdateSimpleModel(_)))
    }
}

fn unavailable() -> StoreError {
    StoreError::Unavailable("scripted failure".into())
}

impl AnnotationStore for ScriptedStore {
    fn project(&mut self, scheme: &str, user: &str) -> Result<ProjectSnapshot, StoreError> {
        self.calls.push(Call::Project);
        self.inner.project(scheme, user)
    }

    fn next_element_id(
        &mut self,
        request: &NextRequest<'_>,
    ) -> Result<Option<ElementId>, StoreError> {
        self.calls.push(Call::NextElementId);
        if self.fail_fetches {
            return Err(unavailable());
        }
        self.inner.next_element_id(request)
    }

    fn element(
        &mut self,
        id: &ElementId,
        scheme: &str,
        user: &str,
    ) -> Result<AnnotationElement, StoreError> {
        self.calls.push(Call::Element(id.to_string()));
        if self.fail_fetches {
            return Err(unavailable());
        }
        self.inner.element(id, scheme, user)
    }

    fn add_annotation(&mut self, annotation: &Annotation) -> Result<(), StoreError> {
        self.calls.push(Call::AddAnnotation(
            annotation.element_id.to_string(),
            annotation.label.clone(),
        ));
        if self.fail_annotations {
            return Err(unavailable());
        }
        self.inner.add_annotation(annotation)
    }

    fn update_simple_model(
        &mut self,
        scheme: &str,
        user: &str,
        model: &ModelRef,
    ) -> Result<(), StoreError> {
        self.calls.push(Call::UpdateSimpleModel(model.model.clone()));
        if self.fail_model_updates {
            return Err(unavailable());
        }
        self.inner.update_simple_model(scheme, user, model)
    }

    fn statistics(&mut self, scheme: &str, user: &str) -> Result<Statistics, StoreError> {
        self.calls.push(Call::Statistics);
        self.inner.statistics(scheme, user)
    }
}
