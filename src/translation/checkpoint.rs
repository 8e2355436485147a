/*!
 * Durable run state.
 *
 * The whole resumable state of a run is the ordered list of translated pairs
 * plus the term store. After every window both are rewritten in full to two
 * JSON artifacts. No position is stored: on resume the next line to
 * translate is recomputed from the pairs, counting the newline-separated
 * segments of every source text.
 */

use log::{debug, warn};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::CheckpointError;
use crate::file_utils::FileManager;
use crate::translation::glossary::{Term, TermStore};

/// One unit of translated output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedPair {
    /// One source line, or several newline-joined lines after a fallback merge
    pub source: String,
    /// Translation of `source`
    pub target: String,
}

impl TranslatedPair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Number of source lines this pair accounts for
    pub fn line_count(&self) -> usize {
        self.source.split('\n').count()
    }
}

/// How a window's reply was turned into pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pairing {
    /// Line counts matched; one pair per line
    Individual(usize),
    /// Line counts differed; the whole window became one pair
    Merged,
}

/// Everything a run needs to continue where it stopped
#[derive(Debug, Default, PartialEq)]
pub struct RunState {
    pub pairs: Vec<TranslatedPair>,
    pub terms: TermStore,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the next source line to translate
    pub fn resume_index(&self) -> usize {
        self.pairs.iter().map(TranslatedPair::line_count).sum()
    }

    /// Append the pairs for a translated window.
    ///
    /// Matching line counts pair up one to one; otherwise the window and the
    /// reply are each newline-joined into a single pair.
    pub fn commit_window(&mut self, window: &[String], translated: &[String]) -> Pairing {
        if window.len() == translated.len() {
            self.pairs.extend(
                window
                    .iter()
                    .zip(translated)
                    .map(|(source, target)| TranslatedPair::new(source.as_str(), target.as_str())),
            );
            Pairing::Individual(window.len())
        } else {
            self.pairs
                .push(TranslatedPair::new(window.join("\n"), translated.join("\n")));
            Pairing::Merged
        }
    }

    /// Check the state against the input it claims to cover.
    ///
    /// Returns the resume index. A state covering more lines than exist is an
    /// error; differing text is only reported.
    pub fn validate_against(&self, lines: &[String]) -> Result<usize, CheckpointError> {
        let resume_index = self.resume_index();
        if resume_index > lines.len() {
            return Err(CheckpointError::Overrun {
                resume_index,
                total_lines: lines.len(),
            });
        }

        let segments = self.pairs.iter().flat_map(|pair| pair.source.split('\n'));
        if let Some((line_idx, _)) = segments
            .zip(lines)
            .enumerate()
            .find(|(_, (segment, line))| *segment != line.as_str())
        {
            warn!(
                "Checkpoint source text differs from the input at line {}; was the input edited?",
                line_idx + 1
            );
        }

        Ok(resume_index)
    }
}

/// Serializes a pair under the configured field labels, source first
struct LabeledPair<'a> {
    pair: &'a TranslatedPair,
    source_label: &'a str,
    target_label: &'a str,
}

impl Serialize for LabeledPair<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(self.source_label, &self.pair.source)?;
        map.serialize_entry(self.target_label, &self.pair.target)?;
        map.end()
    }
}

/// Reads and writes the output and terms artifacts
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    output_path: PathBuf,
    terms_path: PathBuf,
    source_label: String,
    target_label: String,
}

impl CheckpointManager {
    pub fn new(
        output_path: impl Into<PathBuf>,
        terms_path: impl Into<PathBuf>,
        source_label: impl Into<String>,
        target_label: impl Into<String>,
    ) -> Self {
        Self {
            output_path: output_path.into(),
            terms_path: terms_path.into(),
            source_label: source_label.into(),
            target_label: target_label.into(),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn terms_path(&self) -> &Path {
        &self.terms_path
    }

    /// Overwrite both artifacts with the complete state
    pub fn save(&self, state: &RunState) -> Result<(), CheckpointError> {
        let records: Vec<LabeledPair<'_>> = state
            .pairs
            .iter()
            .map(|pair| LabeledPair {
                pair,
                source_label: &self.source_label,
                target_label: &self.target_label,
            })
            .collect();
        write_json(&self.output_path, &records)?;

        let terms: Vec<&Term> = state.terms.iter().collect();
        write_json(&self.terms_path, &terms)?;

        debug!(
            "Checkpoint saved: {} pairs, {} terms",
            state.pairs.len(),
            state.terms.len()
        );
        Ok(())
    }

    /// Rebuild the state from whichever artifacts exist
    pub fn load(&self) -> Result<RunState, CheckpointError> {
        let mut state = RunState::new();

        if self.output_path.exists() {
            let records: Vec<Map<String, Value>> = read_json(&self.output_path)?;
            state.pairs = records
                .iter()
                .enumerate()
                .map(|(index, record)| {
                    Ok(TranslatedPair::new(
                        self.field(record, &self.source_label, index)?,
                        self.field(record, &self.target_label, index)?,
                    ))
                })
                .collect::<Result<_, CheckpointError>>()?;
        }

        if self.terms_path.exists() {
            let terms: Vec<Term> = read_json(&self.terms_path)?;
            state.terms.merge(terms);
        }

        Ok(state)
    }

    fn field(&self, record: &Map<String, Value>, label: &str, index: usize) -> Result<String, CheckpointError> {
        record
            .get(label)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| CheckpointError::MissingField {
                path: self.output_path.clone(),
                index,
                label: label.to_string(),
            })
    }
}

/// Write a JSON document with one key per line and no indentation
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), CheckpointError> {
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b""));
    value
        .serialize(&mut serializer)
        .map_err(|source| CheckpointError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

    FileManager::write_atomic(path, &buffer).map_err(|source| CheckpointError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CheckpointError> {
    let content = fs::read_to_string(path).map_err(|source| CheckpointError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CheckpointError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}
