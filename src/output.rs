//! Result types returned by conversion calls.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Which backend produced a [`ConversionResult`].
///
/// Decided per call; nothing is remembered between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendChoice {
    /// The external pandoc process.
    Primary,
    /// The embedded HTML converter plus the Markdown transformer.
    Secondary,
}

impl fmt::Display for BackendChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendChoice::Primary => f.write_str("pandoc"),
            BackendChoice::Secondary => f.write_str("embedded"),
        }
    }
}

/// The outcome of converting one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Final Markdown, identical to what was written to `output_path`.
    pub markdown: String,
    /// Messages from the embedded converter. Always empty on the primary path.
    pub diagnostics: Vec<String>,
    /// The backend that succeeded.
    pub backend: BackendChoice,
    /// Where the Markdown was written.
    pub output_path: PathBuf,
}

/// Document properties from `docProps/core.xml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub last_modified_by: Option<String>,
    /// ISO-8601 creation timestamp, as stored.
    pub created: Option<String>,
    /// ISO-8601 modification timestamp, as stored.
    pub modified: Option<String>,
    pub revision: Option<String>,
    /// Number of image relationships in the main document part.
    pub image_count: usize,
}

/// One successfully converted file of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    pub input: PathBuf,
    pub result: ConversionResult,
}
