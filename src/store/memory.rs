//! In-memory store backing the terminal front end and tests.

use std::collections::{BTreeMap, HashMap, HashSet};

use ordered_float::OrderedFloat;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::{AnnotationStore, NextRequest, ProjectSnapshot, StoreError};
use crate::dataset::DatasetRecord;
use crate::element::{
    Annotation, AnnotationElement, ElementId, LabelSet, ModelRef, Prediction, Statistics,
};
use crate::selection::{Candidate, ResolveContext, SamplePool, Split, resolve_next};

/// Keeps the dataset, schemes, annotations and classifier registry in memory.
pub struct MemoryStore {
    candidates: Vec<Candidate>,
    index: HashMap<ElementId, usize>,
    limits: HashMap<ElementId, usize>,
    schemes: BTreeMap<String, LabelSet>,
    annotations: Vec<Annotation>,
    models: HashMap<(String, String), ModelRef>,
    model_updates: usize,
    rng: StdRng,
}

impl MemoryStore {
    pub fn new(records: Vec<DatasetRecord>) -> Self {
        let mut candidates = Vec::with_capacity(records.len());
        let mut index = HashMap::with_capacity(records.len());
        let mut limits = HashMap::new();
        for record in records {
            if index.contains_key(&record.id) {
                tracing::warn!("Duplicate element id {} ignored", record.id);
                continue;
            }
            if let Some(limit) = record.limit {
                limits.insert(record.id.clone(), limit);
            }
            index.insert(record.id.clone(), candidates.len());
            candidates.push(record.into_candidate());
        }
        Self {
            candidates,
            index,
            limits,
            schemes: BTreeMap::new(),
            annotations: Vec::new(),
            models: HashMap::new(),
            model_updates: 0,
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>, labels: LabelSet) -> Self {
        self.schemes.insert(scheme.into(), labels);
        self
    }

    pub fn with_model(mut self, scheme: &str, user: &str, model: ModelRef) -> Self {
        self.models
            .insert((scheme.to_string(), user.to_string()), model);
        self
    }

    /// Fix the random selection sequence.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Number of classifier create/refresh requests received.
    pub fn model_updates(&self) -> usize {
        self.model_updates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    fn labels(&self, scheme: &str) -> Result<&LabelSet, StoreError> {
        self.schemes
            .get(scheme)
            .ok_or_else(|| StoreError::Rejected(format!("Unknown scheme {scheme}")))
    }

    fn model(&self, scheme: &str, user: &str) -> Option<&ModelRef> {
        self.models.get(&(scheme.to_string(), user.to_string()))
    }

    fn annotated_ids(&self, scheme: &str) -> HashSet<&ElementId> {
        self.annotations
            .iter()
            .filter(|annotation| annotation.scheme == scheme)
            .map(|annotation| &annotation.element_id)
            .collect()
    }

    fn mark_annotated(&mut self, scheme: &str) {
        let annotated: HashSet<ElementId> =
            self.annotated_ids(scheme).into_iter().cloned().collect();
        for candidate in &mut self.candidates {
            candidate.annotated = annotated.contains(&candidate.id);
        }
    }
}

impl AnnotationStore for MemoryStore {
    fn project(&mut self, scheme: &str, user: &str) -> Result<ProjectSnapshot, StoreError> {
        Ok(ProjectSnapshot {
            labels: self.labels(scheme)?.clone(),
            model: self.model(scheme, user).cloned(),
            samples: SamplePool::ALL.to_vec(),
        })
    }

    fn next_element_id(&mut self, request: &NextRequest<'_>) -> Result<Option<ElementId>, StoreError> {
        self.labels(request.scheme)?;
        self.mark_annotated(request.scheme);
        let context = ResolveContext {
            frame: request.frame,
            has_model: self.model(request.scheme, request.user).is_some(),
        };
        Ok(resolve_next(
            request.config,
            request.history,
            &self.candidates,
            context,
            &mut self.rng,
        ))
    }

    fn element(
        &mut self,
        id: &ElementId,
        scheme: &str,
        user: &str,
    ) -> Result<AnnotationElement, StoreError> {
        let candidate = self
            .index
            .get(id)
            .and_then(|index| self.candidates.get(*index))
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let has_model = self.model(scheme, user).is_some();
        let predict = has_model
            .then(|| {
                candidate
                    .proba
                    .iter()
                    .max_by_key(|(_, proba)| OrderedFloat(**proba))
                    .map(|(label, proba)| Prediction {
                        label: label.clone(),
                        proba: *proba,
                    })
            })
            .flatten();
        Ok(AnnotationElement {
            element_id: candidate.id.clone(),
            text: candidate.text.clone(),
            limit: self.limits.get(id).copied(),
            predict,
            context: candidate.context.clone(),
            frame: None,
            history: Vec::new(),
            selection: None,
        })
    }

    fn add_annotation(&mut self, annotation: &Annotation) -> Result<(), StoreError> {
        if !self.index.contains_key(&annotation.element_id) {
            return Err(StoreError::NotFound(annotation.element_id.clone()));
        }
        if !self.labels(&annotation.scheme)?.contains(&annotation.label) {
            return Err(StoreError::Rejected(format!(
                "Label {} is not part of scheme {}",
                annotation.label, annotation.scheme
            )));
        }
        self.annotations.push(annotation.clone());
        Ok(())
    }

    fn update_simple_model(&mut self, scheme: &str, user: &str, model: &ModelRef) -> Result<(), StoreError> {
        self.labels(scheme)?;
        self.models
            .insert((scheme.to_string(), user.to_string()), model.clone());
        self.model_updates += 1;
        tracing::info!("Classifier {} refreshed for {scheme}/{user}", model.model);
        Ok(())
    }

    fn statistics(&mut self, scheme: &str, _user: &str) -> Result<Statistics, StoreError> {
        self.labels(scheme)?;
        Ok(Statistics {
            annotated_n: self.annotated_ids(scheme).len(),
            trainset_n: self
                .candidates
                .iter()
                .filter(|candidate| candidate.split == Split::Train)
                .count(),
        })
    }
}
