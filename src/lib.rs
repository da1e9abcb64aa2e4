//! Annotation session controller for active-learning labeling loops.
/// Application directory resolution.
pub mod app_dirs;
/// TOML settings file.
pub mod config;
/// JSON-lines dataset loading and annotation export.
pub mod dataset;
/// Labeling action orchestration.
pub mod dispatcher;
/// Elements, labels and the records exchanged with the store.
pub mod element;
/// Session error taxonomy.
pub mod error;
/// Undoable session history.
pub mod history;
/// Digit shortcuts bound to the label set.
pub mod hotkeys;
/// Tracing subscriber setup.
pub mod logging;
/// Classifier refresh scheduling.
pub mod retrain;
/// Selection configuration and next-element strategies.
pub mod selection;
/// Explicit session state.
pub mod session;
/// External annotation store contract.
pub mod store;

pub use dispatcher::{AnnotationDispatcher, Navigation};
pub use error::SessionError;
pub use session::SessionState;
