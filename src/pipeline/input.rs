//! Input resolution: validate a user-supplied path before any side effects.
//!
//! ## Why sniff the container?
//!
//! The embedded converter only reads ZIP packages. The magic bytes tell us
//! what we have regardless of the file extension, so the secondary backend
//! can refuse a legacy OLE `.doc` with a clear message instead of a
//! "not a zip archive" error.

use crate::error::Word2MdError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

const ZIP_MAGIC: [u8; 4] = *b"PK\x03\x04";
const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Container format detected from the first bytes of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// Office Open XML package (`.docx`).
    Zip,
    /// OLE2 compound file (legacy `.doc`).
    Ole,
    /// Anything else, including files too short to tell.
    Unknown,
}

/// A validated, readable input file.
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    pub path: PathBuf,
    pub container: Container,
}

/// Validate that `path` exists and is readable, and sniff its container.
pub fn resolve_input(path: &Path) -> Result<ResolvedInput, Word2MdError> {
    if !path.exists() {
        return Err(Word2MdError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    if path.is_dir() {
        return Err(Word2MdError::UnsupportedFormat {
            path: path.to_path_buf(),
            detail: "is a directory".into(),
        });
    }

    let mut file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Word2MdError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(Word2MdError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    };

    let mut magic = [0u8; 8];
    let n = read_prefix(&mut file, &mut magic);
    let container = sniff_container(&magic[..n]);

    debug!("Resolved input {} ({:?})", path.display(), container);
    Ok(ResolvedInput {
        path: path.to_path_buf(),
        container,
    })
}

/// Classify a file from its leading bytes.
pub fn sniff_container(prefix: &[u8]) -> Container {
    if prefix.starts_with(&ZIP_MAGIC) {
        Container::Zip
    } else if prefix.starts_with(&OLE_MAGIC) {
        Container::Ole
    } else {
        Container::Unknown
    }
}

fn read_prefix(file: &mut std::fs::File, buf: &mut [u8]) -> usize {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) | Err(_) => break,
            Ok(n) => filled += n,
        }
    }
    filled
}
