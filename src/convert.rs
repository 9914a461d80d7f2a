//! Conversion orchestrator.
//!
//! ## Why a `Converter` value?
//!
//! Finding pandoc means running `pandoc --version`, and possibly a one-time
//! download. That is done once, in [`Converter::new`], and the result is
//! kept for the life of the value. Every [`Converter::convert`] call then
//! builds its own ordered backend list from that cached status and the
//! caller's `prefer_primary` flag; nothing else is shared between calls.

use crate::backend::{self, ConversionJob, ConversionStrategy, EmbeddedBackend, PandocBackend, PrimaryStatus};
use crate::config::ConversionConfig;
use crate::error::Word2MdError;
use crate::output::{ConversionResult, DocumentMetadata};
use crate::pipeline::input;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Converts documents, preferring pandoc when it is available.
///
/// Cheap to clone; clones share the configuration and the cached pandoc
/// status.
#[derive(Clone, Debug)]
pub struct Converter {
    config: Arc<ConversionConfig>,
    primary: Option<PrimaryStatus>,
}

impl Converter {
    /// Create a converter and probe for pandoc.
    ///
    /// Blocking (see [`PrimaryStatus::probe`]). Inside an async context use
    /// [`Converter::new_async`].
    pub fn new(config: ConversionConfig) -> Self {
        let primary = PrimaryStatus::probe(&config);
        Self::with_primary(config, primary)
    }

    /// [`Converter::new`] with the probe moved to the blocking pool.
    pub async fn new_async(config: ConversionConfig) -> Result<Self, Word2MdError> {
        tokio::task::spawn_blocking(move || Self::new(config))
            .await
            .map_err(|e| Word2MdError::Internal(format!("pandoc probe task failed: {e}")))
    }

    /// Create a converter with a known pandoc status, skipping the probe.
    /// `None` means the embedded converter is always used.
    pub fn with_primary(config: ConversionConfig, primary: Option<PrimaryStatus>) -> Self {
        match &primary {
            Some(s) => info!("Primary backend: {} ({})", s.version, s.path.display()),
            None => info!("Primary backend unavailable; using embedded converter"),
        }
        Self {
            config: Arc::new(config),
            primary,
        }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// The pandoc found at construction, if any.
    pub fn primary(&self) -> Option<&PrimaryStatus> {
        self.primary.as_ref()
    }

    pub fn primary_available(&self) -> bool {
        self.primary.is_some()
    }

    /// Convert `input` to Markdown at `output`.
    ///
    /// With `prefer_primary` and pandoc available, pandoc is tried first and
    /// any pandoc failure falls through to the embedded converter. Errors of
    /// the last backend tried are returned.
    ///
    /// # Errors
    /// - `FileNotFound` / `PermissionDenied` before anything is written
    /// - `OutputWriteFailed` if the output directory cannot be created
    /// - whatever the embedded converter fails with
    pub async fn convert(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        prefer_primary: bool,
    ) -> Result<ConversionResult, Word2MdError> {
        let input = input.as_ref();
        let image_subdir = self.config.image_dir_name.clone();
        let media_dir = media_dir_name(&document_stem(input));
        self.convert_job(input, output.as_ref(), prefer_primary, image_subdir, media_dir)
            .await
    }

    /// [`Self::convert`] with explicit image and pandoc media directories,
    /// both relative to the output directory.
    pub(crate) async fn convert_job(
        &self,
        input: &Path,
        output: &Path,
        prefer_primary: bool,
        image_subdir: String,
        media_dir: String,
    ) -> Result<ConversionResult, Word2MdError> {
        let start = Instant::now();
        info!("Starting conversion: {}", input.display());

        // ── Step 1: Validate input (no side effects before this) ─────────
        let resolved = input::resolve_input(input)?;

        // ── Step 2: Output directory ─────────────────────────────────────
        let job = ConversionJob {
            input: resolved,
            output: output.to_path_buf(),
            image_subdir,
            media_dir,
            config: Arc::clone(&self.config),
        };
        let output_dir = job.output_dir();
        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|e| Word2MdError::OutputWriteFailed {
                path: output_dir.clone(),
                source: e,
            })?;

        // ── Step 3: Walk the strategy chain ──────────────────────────────
        let chain = self.strategies(prefer_primary);
        let last = chain.len() - 1;
        for (i, strategy) in chain.iter().enumerate() {
            debug!("Trying {} backend", strategy.name());
            match strategy.attempt(&job).await {
                Ok(result) => {
                    info!(
                        "Converted {} with {} backend in {}ms ({} bytes, {} diagnostics)",
                        input.display(),
                        strategy.name(),
                        start.elapsed().as_millis(),
                        result.markdown.len(),
                        result.diagnostics.len()
                    );
                    return Ok(result);
                }
                Err(e) if i < last => {
                    warn!("{} backend failed, falling back: {}", strategy.name(), e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(Word2MdError::Internal("no conversion backend configured".into()))
    }

    /// Ordered backends for one call: `[pandoc, embedded]` or `[embedded]`.
    fn strategies(&self, prefer_primary: bool) -> Vec<Box<dyn ConversionStrategy>> {
        let mut chain: Vec<Box<dyn ConversionStrategy>> = Vec::with_capacity(2);
        if prefer_primary {
            if let Some(status) = &self.primary {
                chain.push(Box::new(PandocBackend::new(status.clone())));
            }
        }
        chain.push(Box::new(EmbeddedBackend));
        chain
    }

    /// Blocking wrapper around [`Converter::convert`].
    ///
    /// Creates a temporary tokio runtime internally; do not call from
    /// inside an async context.
    pub fn convert_sync(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        prefer_primary: bool,
    ) -> Result<ConversionResult, Word2MdError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| Word2MdError::Internal(format!("Failed to create tokio runtime: {}", e)))?
            .block_on(self.convert(input, output, prefer_primary))
    }

    /// Convert document bytes held in memory.
    ///
    /// The bytes are written to a managed temporary directory as
    /// `file_name` (whose stem names pandoc's media folder) and removed on
    /// return.
    ///
    /// # Example
    /// ```rust,no_run
    /// use word2md::{Converter, ConversionConfig};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let converter = Converter::new_async(ConversionConfig::default()).await?;
    /// let bytes: Vec<u8> = std::fs::read("report.docx")?;
    /// let result = converter
    ///     .convert_from_bytes(&bytes, "report.docx", "out/report.md", true)
    ///     .await?;
    /// println!("{}", result.markdown);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn convert_from_bytes(
        &self,
        bytes: &[u8],
        file_name: &str,
        output: impl AsRef<Path>,
        prefer_primary: bool,
    ) -> Result<ConversionResult, Word2MdError> {
        let name = Path::new(file_name)
            .file_name()
            .ok_or_else(|| Word2MdError::InvalidConfig(format!("'{file_name}' is not a file name")))?;
        let dir = tempfile::TempDir::new().map_err(|e| Word2MdError::Internal(format!("tempdir: {e}")))?;
        let path = dir.path().join(name);
        std::fs::File::create(&path)
            .and_then(|mut f| f.write_all(bytes))
            .map_err(|e| Word2MdError::Internal(format!("tempfile write: {e}")))?;
        // `dir` is dropped (and the file deleted) when `convert` returns
        self.convert(&path, output, prefer_primary).await
    }
}

/// Convert one document with a freshly probed [`Converter`], preferring
/// pandoc.
pub async fn convert(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: ConversionConfig,
) -> Result<ConversionResult, Word2MdError> {
    Converter::new_async(config)
        .await?
        .convert(input, output, true)
        .await
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: ConversionConfig,
) -> Result<ConversionResult, Word2MdError> {
    Converter::new(config).convert_sync(input, output, true)
}

/// File stem used for output and media names; `document` when there is none.
pub(crate) fn document_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string())
}

/// pandoc's `--extract-media` directory for a document stem.
pub(crate) fn media_dir_name(stem: &str) -> String {
    format!("{stem}_media")
}

/// Read document properties without converting content.
///
/// Does not need pandoc.
pub async fn inspect(path: impl AsRef<Path>) -> Result<DocumentMetadata, Word2MdError> {
    let resolved = input::resolve_input(path.as_ref())?;
    backend::read_metadata(&resolved).await
}
