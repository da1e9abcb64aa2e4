//! Selection configuration and next-element resolution.

mod filter;
mod resolver;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use filter::{CONTEXT_PREFIX, ElementFilter};
pub use resolver::{Candidate, ResolveContext, Split, resolve_next};

/// Policy used to pick the next element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    #[default]
    Deterministic,
    Random,
    /// Highest predicted probability for the configured label.
    Maxprob,
}

impl SelectionMode {
    /// Strategies offered once a classifier exists.
    pub const METHODS: [SelectionMode; 3] = [
        SelectionMode::Deterministic,
        SelectionMode::Random,
        SelectionMode::Maxprob,
    ];
    /// Strategies offered while no classifier is trained.
    pub const METHODS_MIN: [SelectionMode; 2] =
        [SelectionMode::Deterministic, SelectionMode::Random];

    pub fn as_str(self) -> &'static str {
        match self {
            SelectionMode::Deterministic => "deterministic",
            SelectionMode::Random => "random",
            SelectionMode::Maxprob => "maxprob",
        }
    }

    pub fn requires_model(self) -> bool {
        matches!(self, SelectionMode::Maxprob)
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectionMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "deterministic" => Ok(SelectionMode::Deterministic),
            "random" => Ok(SelectionMode::Random),
            "maxprob" => Ok(SelectionMode::Maxprob),
            other => Err(format!("Unknown selection mode: {other}")),
        }
    }
}

/// Modes a presentation layer may offer for the current classifier state.
pub fn available_modes(has_model: bool) -> &'static [SelectionMode] {
    if has_model {
        &SelectionMode::METHODS
    } else {
        &SelectionMode::METHODS_MIN
    }
}

/// Pool of elements a selection draws from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplePool {
    /// Train split elements without a stored annotation.
    #[default]
    Untagged,
    /// Train split elements that already carry a stored annotation.
    Tagged,
    Train,
    Test,
    All,
}

impl SamplePool {
    pub const ALL: [SamplePool; 5] = [
        SamplePool::Untagged,
        SamplePool::Tagged,
        SamplePool::Train,
        SamplePool::Test,
        SamplePool::All,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SamplePool::Untagged => "untagged",
            SamplePool::Tagged => "tagged",
            SamplePool::Train => "train",
            SamplePool::Test => "test",
            SamplePool::All => "all",
        }
    }
}

impl fmt::Display for SamplePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SamplePool {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        SamplePool::ALL
            .into_iter()
            .find(|pool| pool.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("Unknown sample pool: {}", value.trim()))
    }
}

/// Live selection settings, mutated only through the setters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectionConfig {
    mode: SelectionMode,
    label: Option<String>,
    sample: SamplePool,
    filter: String,
    frame_selection: bool,
    display_prediction: bool,
    display_context: bool,
}

impl SelectionConfig {
    pub fn new(mode: SelectionMode, sample: SamplePool) -> Self {
        Self {
            mode,
            sample,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Mode actually used for resolution; probability ranking needs a model.
    pub fn effective_mode(&self, has_model: bool) -> SelectionMode {
        if self.mode.requires_model() && !has_model {
            SelectionMode::Deterministic
        } else {
            self.mode
        }
    }

    /// Ranking label, only meaningful for probability-driven modes.
    pub fn label(&self) -> Option<&str> {
        if self.mode.requires_model() {
            self.label.as_deref()
        } else {
            None
        }
    }

    pub fn sample(&self) -> SamplePool {
        self.sample
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn frame_selection(&self) -> bool {
        self.frame_selection
    }

    pub fn display_prediction(&self) -> bool {
        self.display_prediction
    }

    pub fn display_context(&self) -> bool {
        self.display_context
    }

    pub fn set_mode(&mut self, mode: SelectionMode) {
        self.mode = mode;
    }

    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label.filter(|value| !value.trim().is_empty());
    }

    pub fn set_sample(&mut self, sample: SamplePool) {
        self.sample = sample;
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
    }

    pub fn set_frame_selection(&mut self, enabled: bool) {
        self.frame_selection = enabled;
    }

    pub fn set_display_prediction(&mut self, enabled: bool) {
        self.display_prediction = enabled;
    }

    pub fn set_display_context(&mut self, enabled: bool) {
        self.display_context = enabled;
    }
}
