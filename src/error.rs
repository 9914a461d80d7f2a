//! Error types for the word2md library.
//!
//! Two tiers of failure:
//!
//! * [`Word2MdError`] - **Fatal** for the current call: the input is missing,
//!   the package is unreadable, the output cannot be written. Returned as
//!   `Err(Word2MdError)` from [`crate::convert::Converter::convert`].
//!
//! * [`AssetError`] / [`FileError`] - **Non-fatal**: one embedded image (or
//!   one file of a batch) failed, everything else carries on. Asset errors are
//!   logged and skipped; file errors are yielded by the batch stream so the
//!   caller can mark that file failed and move on.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the word2md library.
#[derive(Debug, Error)]
pub enum Word2MdError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file is not a container the embedded converter understands
    /// (e.g. a legacy binary `.doc`).
    #[error("Unsupported document format for '{path}': {detail}")]
    UnsupportedFormat { path: PathBuf, detail: String },

    // ── Package errors ────────────────────────────────────────────────────
    /// ZIP container or one of its XML parts is corrupt.
    #[error("Document package is corrupt: {detail}")]
    CorruptPackage { detail: String },

    /// A required part is absent from the package.
    #[error("Document package has no part '{name}'")]
    MissingPart { name: String },

    // ── Primary backend errors ────────────────────────────────────────────
    /// pandoc could not be located, provisioned, or started.
    #[error("pandoc is unavailable: {0}")]
    PandocUnavailable(String),

    /// pandoc ran but exited unsuccessfully.
    #[error("pandoc exited with {status}: {stderr}")]
    PandocFailed { status: String, stderr: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file or directory.
    #[error("Failed to write output '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<zip::result::ZipError> for Word2MdError {
    fn from(e: zip::result::ZipError) -> Self {
        Word2MdError::CorruptPackage {
            detail: format!("zip: {e}"),
        }
    }
}

impl From<quick_xml::Error> for Word2MdError {
    fn from(e: quick_xml::Error) -> Self {
        Word2MdError::CorruptPackage {
            detail: format!("xml: {e}"),
        }
    }
}

/// A non-fatal error for a single embedded image.
///
/// Produced by [`crate::pipeline::images`]; logged and skipped so the
/// remaining images are still extracted.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum AssetError {
    /// The part's bytes could not be read from the package.
    #[error("Image part '{part}': read failed: {detail}")]
    ReadFailed { part: String, detail: String },

    /// The image file could not be written.
    #[error("Image '{path}': write failed: {detail}")]
    WriteFailed { path: PathBuf, detail: String },
}

/// A non-fatal error for one file of a batch run.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
#[error("{input}: {message}")]
pub struct FileError {
    /// The input document that failed.
    pub input: PathBuf,
    /// Human-readable cause.
    pub message: String,
}
