//! JSON-lines dataset files and annotation exports.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::element::{Annotation, ElementId};
use crate::selection::{Candidate, Split};

/// One element per line of a dataset file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub id: ElementId,
    pub text: String,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    #[serde(default)]
    pub split: Split,
    #[serde(default)]
    pub position: Option<(f64, f64)>,
    /// Precomputed classifier probabilities per label.
    #[serde(default)]
    pub proba: BTreeMap<String, f64>,
}

impl DatasetRecord {
    pub fn new(id: impl Into<ElementId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            limit: None,
            context: BTreeMap::new(),
            split: Split::Train,
            position: None,
            proba: BTreeMap::new(),
        }
    }

    pub(crate) fn into_candidate(self) -> Candidate {
        Candidate {
            id: self.id,
            text: self.text,
            context: self.context,
            split: self.split,
            annotated: false,
            position: self.position,
            proba: self.proba,
        }
    }
}

/// Errors raised while reading datasets or writing exports.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid record at {path}:{line}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Read every non-blank line of `path` as a [`DatasetRecord`].
pub fn load_jsonl(path: &Path) -> Result<Vec<DatasetRecord>, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| DatasetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| DatasetError::Parse {
            path: path.to_path_buf(),
            line: index + 1,
            source,
        })?;
        records.push(record);
    }
    tracing::info!("Loaded {} elements from {}", records.len(), path.display());
    Ok(records)
}

/// Write annotations as JSON lines, replacing any existing file.
pub fn write_annotations(path: &Path, annotations: &[Annotation]) -> Result<(), DatasetError> {
    let map_write = |source: std::io::Error| DatasetError::Write {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(map_write)?;
    let mut writer = BufWriter::new(file);
    for annotation in annotations {
        serde_json::to_writer(&mut writer, annotation)
            .map_err(|err| map_write(std::io::Error::other(err)))?;
        writer.write_all(b"\n").map_err(map_write)?;
    }
    writer.flush().map_err(map_write)
}
