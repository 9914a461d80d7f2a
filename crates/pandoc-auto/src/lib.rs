//! # pandoc-auto
//!
//! Locate a usable [pandoc](https://pandoc.org) binary, or download and cache
//! one at runtime, so that callers shelling out to pandoc do not need the user
//! to install it by hand.
//!
//! ## How it works
//!
//! [`find_pandoc`] never touches the network. It checks, in order:
//!
//! 1. `PANDOC_PATH` - explicit path to a pandoc executable.
//! 2. Every directory on `PATH`.
//! 3. `~/.cache/word2md/pandoc-{VERSION}/` from an earlier download.
//!
//! [`ensure_pandoc`] does the same and, if nothing is found, downloads the
//! release archive for the current platform from
//! [jgm/pandoc](https://github.com/jgm/pandoc/releases), extracts the single
//! executable into the cache directory and returns its path. The download
//! happens at most once per process.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pandoc_auto::{ensure_pandoc, find_pandoc, pandoc_version};
//!
//! let path = match find_pandoc() {
//!     Some(p) => p,
//!     None => ensure_pandoc(None).expect("pandoc unavailable"),
//! };
//! println!("{}", pandoc_version(&path).unwrap());
//! ```
//!
//! ## Platform support
//!
//! | OS      | Arch    | Asset                                 |
//! |---------|---------|---------------------------------------|
//! | macOS   | arm64   | `pandoc-{V}-arm64-macOS.zip`          |
//! | macOS   | x86_64  | `pandoc-{V}-x86_64-macOS.zip`         |
//! | Linux   | x86_64  | `pandoc-{V}-linux-amd64.tar.gz`       |
//! | Linux   | aarch64 | `pandoc-{V}-linux-arm64.tar.gz`       |
//! | Windows | x86_64  | `pandoc-{V}-windows-x86_64.zip`       |
//!
//! ## Environment variable overrides
//!
//! - `PANDOC_PATH` - path to an existing pandoc executable; skips download.
//! - `PANDOC_AUTO_CACHE_DIR` - override the default cache directory.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// The pandoc release tag used for downloads.
pub const PANDOC_VERSION: &str = "3.5";

/// GitHub release base URL.
const BASE_URL: &str = "https://github.com/jgm/pandoc/releases/download";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by pandoc-auto operations.
#[derive(Error, Debug)]
pub enum PandocAutoError {
    /// The current OS/architecture combination has no prebuilt release.
    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    /// Could not create or navigate the local cache directory.
    #[error("Cache directory error: {0}")]
    CacheDir(#[source] std::io::Error),

    /// Network download failed.
    #[error("Download failed: {0}")]
    Download(String),

    /// Archive extraction failed.
    #[error("Archive extraction failed: {0}")]
    Extract(String),

    /// The binary exists but `pandoc --version` did not succeed.
    #[error("pandoc at '{path}' is not runnable: {reason}")]
    NotRunnable { path: PathBuf, reason: String },
}

// ── Internal: platform metadata ──────────────────────────────────────────────

#[derive(Debug)]
enum ArchiveKind {
    TarGz,
    Zip,
}

#[derive(Debug)]
struct PlatformInfo {
    /// Asset filename in the GitHub release, e.g. `pandoc-3.5-linux-amd64.tar.gz`.
    archive_name: String,
    /// Relative path inside the archive, e.g. `pandoc-3.5/bin/pandoc`.
    bin_path_in_archive: String,
    kind: ArchiveKind,
}

fn detect_platform() -> Result<PlatformInfo, PandocAutoError> {
    let v = PANDOC_VERSION;
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;

    match (os, arch) {
        ("macos", "aarch64") => Ok(PlatformInfo {
            archive_name: format!("pandoc-{v}-arm64-macOS.zip"),
            bin_path_in_archive: format!("pandoc-{v}-arm64/bin/pandoc"),
            kind: ArchiveKind::Zip,
        }),
        ("macos", "x86_64") => Ok(PlatformInfo {
            archive_name: format!("pandoc-{v}-x86_64-macOS.zip"),
            bin_path_in_archive: format!("pandoc-{v}-x86_64/bin/pandoc"),
            kind: ArchiveKind::Zip,
        }),
        ("linux", "x86_64") => Ok(PlatformInfo {
            archive_name: format!("pandoc-{v}-linux-amd64.tar.gz"),
            bin_path_in_archive: format!("pandoc-{v}/bin/pandoc"),
            kind: ArchiveKind::TarGz,
        }),
        ("linux", "aarch64") => Ok(PlatformInfo {
            archive_name: format!("pandoc-{v}-linux-arm64.tar.gz"),
            bin_path_in_archive: format!("pandoc-{v}/bin/pandoc"),
            kind: ArchiveKind::TarGz,
        }),
        ("windows", "x86_64") => Ok(PlatformInfo {
            archive_name: format!("pandoc-{v}-windows-x86_64.zip"),
            bin_path_in_archive: format!("pandoc-{v}/pandoc.exe"),
            kind: ArchiveKind::Zip,
        }),
        (os, arch) => Err(PandocAutoError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        }),
    }
}

fn binary_name() -> &'static str {
    if cfg!(windows) {
        "pandoc.exe"
    } else {
        "pandoc"
    }
}

// ── Cache directory resolution ───────────────────────────────────────────────

/// Returns the per-version cache directory for the pandoc binary.
///
/// Default locations:
/// - **macOS**: `~/Library/Caches/word2md/pandoc-{VERSION}/`
/// - **Linux**: `~/.cache/word2md/pandoc-{VERSION}/`
/// - **Windows**: `%LOCALAPPDATA%\word2md\pandoc-{VERSION}\`
///
/// Override by setting `PANDOC_AUTO_CACHE_DIR`.
pub fn pandoc_cache_dir() -> PathBuf {
    if let Ok(override_dir) = std::env::var("PANDOC_AUTO_CACHE_DIR") {
        return PathBuf::from(override_dir).join(format!("pandoc-{PANDOC_VERSION}"));
    }

    let base = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir);

    base.join("word2md").join(format!("pandoc-{PANDOC_VERSION}"))
}

// ── Thread-safe singleton path cache ─────────────────────────────────────────

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

// ── Public API ───────────────────────────────────────────────────────────────

/// Finds an existing pandoc executable without any network access.
///
/// Search order: `PANDOC_PATH`, the directories on `PATH`, then the
/// download cache.
pub fn find_pandoc() -> Option<PathBuf> {
    if let Some(path) = RESOLVED_PATH.get() {
        return Some(path.clone());
    }

    if let Ok(p) = std::env::var("PANDOC_PATH") {
        let pb = PathBuf::from(p);
        if pb.is_file() {
            return Some(pb);
        }
    }

    if let Some(path) = search_path(binary_name()) {
        return Some(path);
    }

    let cached = pandoc_cache_dir().join(binary_name());
    cached.is_file().then_some(cached)
}

/// Returns `true` if a previous download left pandoc in the cache directory.
pub fn is_pandoc_cached() -> bool {
    pandoc_cache_dir().join(binary_name()).is_file()
}

/// Ensures a pandoc executable is available, downloading it if necessary.
///
/// - If [`find_pandoc`] returns a path that answers `--version`, that path
///   is returned untouched.
/// - Otherwise the platform release archive is downloaded from GitHub and
///   the executable extracted to [`pandoc_cache_dir`].
///
/// `on_progress` receives `(bytes_downloaded, total_size_option)` during
/// the download.  Pass `None` to suppress progress callbacks.
///
/// # Thread safety
///
/// Safe to call from multiple threads simultaneously; once a working path
/// has been resolved it is reused for the rest of the process lifetime.
pub fn ensure_pandoc(
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<PathBuf, PandocAutoError> {
    if let Some(path) = RESOLVED_PATH.get() {
        return Ok(path.clone());
    }

    let path = resolve_runnable(find_pandoc(), || download_to_cache(on_progress))?;

    // Best-effort cache in the OnceLock (ignore race; both will succeed).
    let _ = RESOLVED_PATH.set(path.clone());

    Ok(path)
}

/// `found` if it runs, else whatever `download` produces, which must run
/// too. A path that fails `--version` is never handed back.
fn resolve_runnable(
    found: Option<PathBuf>,
    download: impl FnOnce() -> Result<PathBuf, PandocAutoError>,
) -> Result<PathBuf, PandocAutoError> {
    if let Some(path) = found {
        if pandoc_version(&path).is_ok() {
            return Ok(path);
        }
    }
    let path = download()?;
    pandoc_version(&path)?;
    Ok(path)
}

/// Runs `<path> --version` and returns the first line of its output,
/// e.g. `pandoc 3.5`.
pub fn pandoc_version(path: &Path) -> Result<String, PandocAutoError> {
    let output = Command::new(path)
        .arg("--version")
        .output()
        .map_err(|e| PandocAutoError::NotRunnable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(PandocAutoError::NotRunnable {
            path: path.to_path_buf(),
            reason: format!("exited with {}", output.status),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn search_path(name: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

fn download_to_cache(
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<PathBuf, PandocAutoError> {
    let info = detect_platform()?;
    let cache_dir = pandoc_cache_dir();
    let bin_path = cache_dir.join(binary_name());

    // A broken earlier download is replaced, not reused.
    if bin_path.is_file() && pandoc_version(&bin_path).is_ok() {
        return Ok(bin_path);
    }

    let url = format!("{}/{}/{}", BASE_URL, PANDOC_VERSION, info.archive_name);

    std::fs::create_dir_all(&cache_dir).map_err(PandocAutoError::CacheDir)?;

    let archive_bytes = download_bytes(&url, on_progress)?;
    match info.kind {
        ArchiveKind::TarGz => extract_from_tar_gz(&archive_bytes, &info.bin_path_in_archive, &bin_path)?,
        ArchiveKind::Zip => extract_from_zip(&archive_bytes, &info.bin_path_in_archive, &bin_path)?,
    }
    mark_executable(&bin_path)?;

    Ok(bin_path)
}

/// Streams a URL into a `Vec<u8>`, calling `on_progress` every 64 KiB.
fn download_bytes(
    url: &str,
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<Vec<u8>, PandocAutoError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pandoc-auto/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| PandocAutoError::Download(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .map_err(|e| PandocAutoError::Download(format!("GET {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(PandocAutoError::Download(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }

    let total = response.content_length();
    let capacity = total.unwrap_or(40 * 1024 * 1024) as usize;
    let mut buf = Vec::with_capacity(capacity);

    let mut stream = response;
    let mut chunk = vec![0u8; 64 * 1024];
    let mut downloaded: u64 = 0;

    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                downloaded += n as u64;
                if let Some(cb) = on_progress {
                    cb(downloaded, total);
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(PandocAutoError::Download(format!("Read error: {e}")));
            }
        }
    }

    Ok(buf)
}

/// Extracts a single file from a gzipped tar archive into `dest_path`.
fn extract_from_tar_gz(
    archive_bytes: &[u8],
    path_in_archive: &str,
    dest_path: &Path,
) -> Result<(), PandocAutoError> {
    use flate2::read::GzDecoder;
    use tar::Archive;

    let gz = GzDecoder::new(archive_bytes);
    let mut archive = Archive::new(gz);

    for entry in archive
        .entries()
        .map_err(|e| PandocAutoError::Extract(e.to_string()))?
    {
        let mut entry = entry.map_err(|e| PandocAutoError::Extract(e.to_string()))?;
        let entry_path = entry
            .path()
            .map_err(|e| PandocAutoError::Extract(e.to_string()))?;

        if entry_path.to_string_lossy() == path_in_archive {
            entry
                .unpack(dest_path)
                .map_err(|e| PandocAutoError::Extract(format!("Unpack failed: {e}")))?;
            return Ok(());
        }
    }

    Err(PandocAutoError::Extract(format!(
        "'{path_in_archive}' not found in archive"
    )))
}

/// Extracts a single file from a zip archive into `dest_path`.
fn extract_from_zip(
    archive_bytes: &[u8],
    path_in_archive: &str,
    dest_path: &Path,
) -> Result<(), PandocAutoError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(archive_bytes))
        .map_err(|e| PandocAutoError::Extract(e.to_string()))?;

    let mut entry = archive
        .by_name(path_in_archive)
        .map_err(|_| PandocAutoError::Extract(format!("'{path_in_archive}' not found in archive")))?;

    let mut out = std::fs::File::create(dest_path)
        .map_err(|e| PandocAutoError::Extract(format!("Create failed: {e}")))?;
    std::io::copy(&mut entry, &mut out)
        .map_err(|e| PandocAutoError::Extract(format!("Write failed: {e}")))?;

    Ok(())
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<(), PandocAutoError> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .map_err(|e| PandocAutoError::Extract(format!("chmod failed: {e}")))
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> Result<(), PandocAutoError> {
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
