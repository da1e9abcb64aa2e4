//! Session state shared by the controller components.
//!
//! Reads are open to the presentation layer; every write goes through
//! [`crate::dispatcher::AnnotationDispatcher`].

use uuid::Uuid;

use crate::config::AppConfig;
use crate::element::{AnnotationElement, ElementId, Frame, LabelSet, ModelRef, Statistics};
use crate::history::SessionHistory;
use crate::selection::{SamplePool, SelectionConfig, SelectionMode};

/// Severity of the status line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusTone {
    Info,
    Warning,
    Error,
}

/// Last message surfaced to the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub tone: StatusTone,
}

/// Identifies one element fetch; results carrying an older ticket are dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchTicket(u64);

/// Everything one annotation session knows about.
#[derive(Debug)]
pub struct SessionState {
    pub(crate) session_id: Uuid,
    pub(crate) scheme: String,
    pub(crate) user: String,
    pub(crate) config: SelectionConfig,
    pub(crate) history: SessionHistory,
    pub(crate) labels: LabelSet,
    pub(crate) model: Option<ModelRef>,
    pub(crate) samples: Vec<SamplePool>,
    pub(crate) element: Option<AnnotationElement>,
    pub(crate) statistics: Option<Statistics>,
    pub(crate) frame: Option<Frame>,
    pub(crate) retrain_frequency: usize,
    pub(crate) status: Option<StatusMessage>,
    next_request_id: u64,
    pending_request: Option<u64>,
}

impl SessionState {
    pub fn new(scheme: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            scheme: scheme.into(),
            user: user.into(),
            config: SelectionConfig::default(),
            history: SessionHistory::default(),
            labels: LabelSet::default(),
            model: None,
            samples: SamplePool::ALL.to_vec(),
            element: None,
            statistics: None,
            frame: None,
            retrain_frequency: crate::config::DEFAULT_RETRAIN_FREQUENCY,
            status: None,
            next_request_id: 1,
            pending_request: None,
        }
    }

    /// Seed selection defaults and retrain cadence from the settings file.
    pub fn with_settings(mut self, settings: &AppConfig) -> Self {
        let mut config = SelectionConfig::new(settings.session.default_mode, settings.session.default_sample);
        config.set_display_prediction(settings.display.show_prediction);
        config.set_display_context(settings.display.show_context);
        self.config = config;
        self.retrain_frequency = settings.session.retrain_frequency.max(1);
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn model(&self) -> Option<&ModelRef> {
        self.model.as_ref()
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Strategies to offer in the mode selector.
    pub fn available_modes(&self) -> &'static [SelectionMode] {
        crate::selection::available_modes(self.has_model())
    }

    pub fn samples(&self) -> &[SamplePool] {
        &self.samples
    }

    pub fn element(&self) -> Option<&AnnotationElement> {
        self.element.as_ref()
    }

    pub fn element_id(&self) -> Option<&ElementId> {
        self.element.as_ref().map(|element| &element.element_id)
    }

    pub fn statistics(&self) -> Option<Statistics> {
        self.statistics
    }

    pub fn frame(&self) -> Option<Frame> {
        self.frame
    }

    pub fn retrain_frequency(&self) -> usize {
        self.retrain_frequency
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    /// True while a fetch is outstanding.
    pub fn is_fetching(&self) -> bool {
        self.pending_request.is_some()
    }

    pub(crate) fn set_status(&mut self, text: impl Into<String>, tone: StatusTone) {
        self.status = Some(StatusMessage {
            text: text.into(),
            tone,
        });
    }

    /// Start a fetch. The displayed element is cleared right away so nothing
    /// can act on it while the next one loads.
    pub(crate) fn begin_fetch(&mut self) -> FetchTicket {
        let request_id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1).max(1);
        self.pending_request = Some(request_id);
        self.element = None;
        FetchTicket(request_id)
    }

    /// Close `ticket` if it is the latest one. Returns false for stale tickets.
    pub(crate) fn complete_fetch(&mut self, ticket: FetchTicket) -> bool {
        if self.pending_request != Some(ticket.0) {
            return false;
        }
        self.pending_request = None;
        true
    }
}
