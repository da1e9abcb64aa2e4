//! Orchestrates labeling actions: persist, record, move on, maybe retrain.

use crate::element::{Annotation, AnnotationElement, ElementId, Frame, ModelRef};
use crate::error::SessionError;
use crate::hotkeys::{ActiveBinding, KeyCode, KeyboardLabelBinder};
use crate::retrain::RetrainScheduler;
use crate::selection::SelectionConfig;
use crate::session::{FetchTicket, SessionState, StatusTone};
use crate::store::{AnnotationStore, NextRequest, ProjectSnapshot, StoreError};

/// Result of a navigation attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Navigation {
    /// The element is now displayed.
    Loaded(ElementId),
    /// Nothing left to annotate under the current selection.
    Exhausted,
    /// A newer navigation superseded this one; its result was dropped.
    Stale,
}

/// Single entry point for every state change of an annotation session.
pub struct AnnotationDispatcher<S> {
    store: S,
    state: SessionState,
    scheduler: RetrainScheduler,
    binder: KeyboardLabelBinder,
    keyboard_enabled: bool,
}

impl<S: AnnotationStore> AnnotationDispatcher<S> {
    pub fn new(store: S, state: SessionState) -> Self {
        Self {
            store,
            state,
            scheduler: RetrainScheduler::default(),
            binder: KeyboardLabelBinder::default(),
            keyboard_enabled: true,
        }
    }

    /// Enable or disable digit shortcuts; disabling removes the active binding.
    pub fn with_keyboard_shortcuts(mut self, enabled: bool) -> Self {
        self.keyboard_enabled = enabled;
        if enabled {
            self.binder.bind(&self.state.labels);
        } else {
            self.binder.unbind();
        }
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn key_binding(&self) -> Option<&ActiveBinding> {
        self.binder.active()
    }

    /// Pull labels, classifier and pools for the current scheme.
    pub fn refresh_project(&mut self) -> Result<(), SessionError> {
        let snapshot = self
            .store
            .project(&self.state.scheme, &self.state.user)
            .map_err(|err| self.fetch_failed(err))?;
        self.apply_snapshot(snapshot);
        Ok(())
    }

    /// Switch to another scheme and load its first element.
    ///
    /// Nothing changes when the scheme's project cannot be fetched.
    pub fn switch_scheme(&mut self, scheme: impl Into<String>) -> Result<Navigation, SessionError> {
        let scheme = scheme.into();
        let snapshot = self
            .store
            .project(&scheme, &self.state.user)
            .map_err(|err| self.fetch_failed(err))?;
        tracing::info!("Switching from scheme {} to {scheme}", self.state.scheme);
        self.state.scheme = scheme;
        self.apply_snapshot(snapshot);
        self.refresh_statistics();
        self.load_next()
    }

    /// Change the selection settings and reload the next element.
    pub fn configure(
        &mut self,
        update: impl FnOnce(&mut SelectionConfig),
    ) -> Result<Navigation, SessionError> {
        update(&mut self.state.config);
        self.sync_ranking_label();
        tracing::debug!("Selection config now {:?}", self.state.config);
        self.load_next()
    }

    /// Record the frame drawn on the projection view.
    pub fn set_frame(&mut self, frame: Option<Frame>) {
        self.state.frame = frame;
    }

    pub fn set_retrain_frequency(&mut self, frequency: usize) {
        self.state.retrain_frequency = frequency.max(1);
    }

    /// Ask the store for the next element under the current selection.
    pub fn load_next(&mut self) -> Result<Navigation, SessionError> {
        let ticket = self.begin_fetch();
        let result = self.fetch_next_element();
        self.finish_fetch(ticket, result)
    }

    /// Display a specific element.
    pub fn navigate_to(&mut self, id: &ElementId) -> Result<Navigation, SessionError> {
        let ticket = self.begin_fetch();
        let result = self.store
            .element(id, &self.state.scheme, &self.state.user)
            .map(Some);
        self.finish_fetch(ticket, result)
    }

    /// Start an element fetch issued outside the dispatcher. Clears the
    /// displayed element until [`Self::finish_fetch`] delivers a result.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.state.begin_fetch()
    }

    /// Deliver a fetch result; results for superseded tickets are discarded.
    pub fn finish_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Option<AnnotationElement>, StoreError>,
    ) -> Result<Navigation, SessionError> {
        if !self.state.complete_fetch(ticket) {
            tracing::debug!("Discarding superseded element fetch");
            return Ok(Navigation::Stale);
        }
        match result {
            Ok(Some(mut element)) => {
                element.history = self.state.history.as_slice().to_vec();
                let id = element.element_id.clone();
                tracing::debug!("Showing element {id}");
                self.state.element = Some(element);
                Ok(Navigation::Loaded(id))
            }
            Ok(None) => {
                tracing::info!("Selection exhausted after {} labels", self.state.history.len());
                self.state
                    .set_status("Nothing left to annotate", StatusTone::Info);
                Ok(Navigation::Exhausted)
            }
            Err(err) => Err(self.fetch_failed(err)),
        }
    }

    /// Label the displayed element and move on.
    ///
    /// The annotation is persisted before it enters the history. When the
    /// store refuses it, the element stays displayed and nothing is recorded.
    pub fn apply_label(
        &mut self,
        label: &str,
        element_id: Option<&ElementId>,
    ) -> Result<Navigation, SessionError> {
        let annotation = self.validate(label, element_id).inspect_err(|err| {
            tracing::debug!("Label action rejected: {err}");
            self.state.set_status(err.to_string(), StatusTone::Warning);
        })?;

        if let Err(err) = self.store.add_annotation(&annotation) {
            tracing::warn!("Annotation of {} failed: {err}", annotation.element_id);
            let err = SessionError::Persistence(err);
            self.state.set_status(err.to_string(), StatusTone::Error);
            return Err(err);
        }
        self.state.history.append(annotation.element_id.clone())?;
        tracing::info!(
            "Labeled {} as {} ({} this session)",
            annotation.element_id,
            annotation.label,
            self.state.history.len()
        );
        self.state.set_status(
            format!("Labeled {} as {}", annotation.element_id, annotation.label),
            StatusTone::Info,
        );

        let navigation = self.load_next();
        self.maybe_retrain();
        self.refresh_statistics();
        navigation
    }

    /// Apply the label bound to `key`. Returns `None` when the key is unbound.
    pub fn handle_key(&mut self, key: KeyCode) -> Option<Result<Navigation, SessionError>> {
        if !self.keyboard_enabled {
            return None;
        }
        let label = self.binder.resolve(key)?.to_string();
        let element_id = self.state.element_id().cloned();
        Some(self.apply_label(&label, element_id.as_ref()))
    }

    /// Step back to the last labeled element.
    ///
    /// Only the session history shrinks; the stored annotation is kept and
    /// is superseded if the element is labeled again.
    pub fn undo(&mut self) -> Result<Option<Navigation>, SessionError> {
        let Some(previous) = self.state.history.undo_last() else {
            self.state
                .set_status("No element in history", StatusTone::Info);
            return Ok(None);
        };
        tracing::info!("Back to {previous}");
        self.scheduler
            .on_history_shrunk(self.state.history.len(), self.state.retrain_frequency);
        self.navigate_to(&previous).map(Some)
    }

    /// Train the first classifier for the scheme/user pair.
    ///
    /// Automatic refreshes only start once a classifier exists.
    pub fn train_model(&mut self, model: ModelRef) -> Result<(), SessionError> {
        self.store
            .update_simple_model(&self.state.scheme, &self.state.user, &model)
            .map_err(|err| {
                let err = SessionError::Persistence(err);
                self.state.set_status(err.to_string(), StatusTone::Error);
                err
            })?;
        tracing::info!("Classifier {} trained for {}", model.model, self.state.scheme);
        self.state.model = Some(model);
        self.sync_ranking_label();
        Ok(())
    }

    /// Reload the annotated/trainset counters; failures keep the old figures.
    pub fn refresh_statistics(&mut self) {
        match self.store.statistics(&self.state.scheme, &self.state.user) {
            Ok(statistics) => self.state.statistics = Some(statistics),
            Err(err) => tracing::warn!("Statistics unavailable: {err}"),
        }
    }

    fn apply_snapshot(&mut self, snapshot: ProjectSnapshot) {
        if snapshot.labels != self.state.labels {
            tracing::info!(
                "Scheme {} has {} labels",
                self.state.scheme,
                snapshot.labels.len()
            );
            self.state.labels = snapshot.labels;
            if self.keyboard_enabled {
                self.binder.bind(&self.state.labels);
            }
        }
        self.state.model = snapshot.model;
        self.state.samples = snapshot.samples;
        self.sync_ranking_label();
    }

    fn validate(
        &self,
        label: &str,
        element_id: Option<&ElementId>,
    ) -> Result<Annotation, SessionError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(SessionError::InvalidState("Choose a label first".into()));
        }
        let Some(element_id) = element_id.filter(|id| !id.is_blank()) else {
            return Err(SessionError::InvalidState("No element to label".into()));
        };
        let Some(element) = self.state.element.as_ref() else {
            return Err(SessionError::InvalidState(format!(
                "Element {element_id} is no longer displayed"
            )));
        };
        if &element.element_id != element_id {
            return Err(SessionError::InvalidState(format!(
                "Element {element_id} is no longer displayed"
            )));
        }
        if !self.state.labels.contains(label) {
            return Err(SessionError::InvalidState(format!(
                "Label {label} is not part of scheme {}",
                self.state.scheme
            )));
        }
        Ok(Annotation {
            element_id: element_id.clone(),
            label: label.to_string(),
            scheme: self.state.scheme.clone(),
            user: self.state.user.clone(),
            selection: element
                .selection
                .unwrap_or_else(|| self.state.config.mode()),
            session_id: self.state.session_id,
        })
    }

    fn fetch_next_element(&mut self) -> Result<Option<AnnotationElement>, StoreError> {
        let mode = self.state.config.effective_mode(self.state.has_model());
        let request = NextRequest {
            scheme: &self.state.scheme,
            user: &self.state.user,
            config: &self.state.config,
            history: self.state.history.as_slice(),
            frame: self.state.frame,
        };
        let Some(id) = self.store.next_element_id(&request)? else {
            return Ok(None);
        };
        let mut element = self.store
            .element(&id, &self.state.scheme, &self.state.user)?;
        element.selection = Some(mode);
        Ok(Some(element))
    }

    fn maybe_retrain(&mut self) {
        let due = self.scheduler.on_history_changed(
            self.state.history.len(),
            self.state.retrain_frequency,
            self.state.has_model(),
        );
        if !due {
            return;
        }
        let Some(model) = self.state.model.clone() else {
            return;
        };
        tracing::info!(
            "Refreshing classifier {} after {} labels",
            model.model,
            self.state.history.len()
        );
        if let Err(err) =
            self.store
                .update_simple_model(&self.state.scheme, &self.state.user, &model)
        {
            tracing::warn!("Classifier refresh failed: {err}");
            self.state.set_status(
                format!("Classifier refresh failed: {err}"),
                StatusTone::Warning,
            );
        }
    }

    /// Keep the ranking label pointing at a label of the current scheme.
    fn sync_ranking_label(&mut self) {
        if !self.state.config.mode().requires_model() {
            return;
        }
        let current = self.state.config.label().map(str::to_string);
        let valid = current
            .as_deref()
            .is_some_and(|label| self.state.labels.contains(label));
        if !valid {
            let fallback = self.state.labels.first().map(str::to_string);
            self.state.config.set_label(fallback);
        }
    }

    fn fetch_failed(&mut self, err: StoreError) -> SessionError {
        tracing::warn!("Store fetch failed: {err}");
        let err = SessionError::Fetch(err);
        self.state.set_status(err.to_string(), StatusTone::Error);
        err
    }
}
