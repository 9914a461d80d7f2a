//! Conversion backends.
//!
//! ## Why a strategy list?
//!
//! A call tries pandoc first when it is wanted and available, then the
//! embedded converter. Expressing each as a [`ConversionStrategy`] lets the
//! orchestrator walk an ordered `Vec` and stop at the first success, and
//! lets tests swap either side out.
//!
//! Both backends finish the same way: optional YAML front matter, then an
//! atomic write (temp file + rename) so a crash never leaves a half-written
//! Markdown file behind.

pub mod embedded;
pub mod pandoc;

use crate::config::ConversionConfig;
use crate::error::Word2MdError;
use crate::output::{BackendChoice, ConversionResult, DocumentMetadata};
use crate::pipeline::input::{Container, ResolvedInput};
use crate::pipeline::package::DocxPackage;
use futures::future::BoxFuture;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

pub use embedded::EmbeddedBackend;
pub use pandoc::{PandocBackend, PrimaryStatus};

/// Everything a backend needs for one document.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub input: ResolvedInput,
    /// Markdown file to write.
    pub output: PathBuf,
    /// Image directory relative to the output directory, `/`-separated.
    /// Also the prefix of image links in the Markdown.
    pub image_subdir: String,
    /// Directory pandoc extracts media into, relative to the output
    /// directory.
    pub media_dir: String,
    pub config: Arc<ConversionConfig>,
}

impl ConversionJob {
    /// Directory containing [`Self::output`]; `.` for a bare file name.
    pub fn output_dir(&self) -> PathBuf {
        match self.output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

/// One way of turning a document into Markdown.
pub trait ConversionStrategy: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    fn choice(&self) -> BackendChoice;

    /// Convert `job.input`, write `job.output`, and return the result.
    fn attempt<'a>(
        &'a self,
        job: &'a ConversionJob,
    ) -> BoxFuture<'a, Result<ConversionResult, Word2MdError>>;
}

// ── Shared finishing steps ───────────────────────────────────────────────

/// Prepend front matter when configured, then write atomically.
pub(crate) async fn finish(
    job: &ConversionJob,
    markdown: String,
    backend: BackendChoice,
    diagnostics: Vec<String>,
) -> Result<ConversionResult, Word2MdError> {
    let markdown = if job.config.include_metadata {
        match read_metadata(&job.input).await {
            Ok(meta) => format!("{}{}", format_yaml_front_matter(&meta), markdown),
            Err(e) => {
                warn!("Skipping front matter for {}: {}", job.input.path.display(), e);
                markdown
            }
        }
    } else {
        markdown
    };

    write_atomic(&job.output, &markdown).await?;
    debug!("Wrote {} bytes to {}", markdown.len(), job.output.display());

    Ok(ConversionResult {
        markdown,
        diagnostics,
        backend,
        output_path: job.output.clone(),
    })
}

/// Document properties of a `.docx` input, read off the async runtime.
pub(crate) async fn read_metadata(input: &ResolvedInput) -> Result<DocumentMetadata, Word2MdError> {
    if input.container != Container::Zip {
        return Err(Word2MdError::UnsupportedFormat {
            path: input.path.clone(),
            detail: "document properties can only be read from .docx packages".into(),
        });
    }
    let path = input.path.clone();
    tokio::task::spawn_blocking(move || DocxPackage::open(&path)?.metadata())
        .await
        .map_err(|e| Word2MdError::Internal(format!("metadata task failed: {e}")))?
}

/// Write `content` to `path` via a sibling temp file and a rename.
pub(crate) async fn write_atomic(path: &Path, content: &str) -> Result<(), Word2MdError> {
    let fail = |e| Word2MdError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(fail)?;
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, content).await.map_err(fail)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(fail)
}

/// Format document metadata as YAML front matter.
pub fn format_yaml_front_matter(meta: &DocumentMetadata) -> String {
    let mut yaml = String::from("---\n");

    let fields = [
        ("title", &meta.title),
        ("author", &meta.author),
        ("subject", &meta.subject),
        ("description", &meta.description),
        ("keywords", &meta.keywords),
        ("last_modified_by", &meta.last_modified_by),
        ("created", &meta.created),
        ("modified", &meta.modified),
        ("revision", &meta.revision),
    ];
    for (key, value) in fields {
        if let Some(v) = value {
            yaml.push_str(&format!("{key}: \"{}\"\n", yaml_escape(v)));
        }
    }
    yaml.push_str(&format!("images: {}\n", meta.image_count));

    yaml.push_str("---\n\n");
    yaml
}

fn yaml_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn front_matter_escapes_quotes() {
        let meta = DocumentMetadata {
            title: Some("The \"Plan\"".into()),
            author: Some("Ada".into()),
            image_count: 2,
            ..Default::default()
        };
        let yaml = format_yaml_front_matter(&meta);
        assert_eq!(
            yaml,
            "---\ntitle: \"The \\\"Plan\\\"\"\nauthor: \"Ada\"\nimages: 2\n---\n\n"
        );
    }

    #[test]
    fn output_dir_of_bare_name() {
        let job = ConversionJob {
            input: ResolvedInput {
                path: PathBuf::from("a.docx"),
                container: Container::Zip,
            },
            output: PathBuf::from("a.md"),
            image_subdir: "images".into(),
            media_dir: "a_media".into(),
            config: Arc::new(ConversionConfig::default()),
        };
        assert_eq!(job.output_dir(), PathBuf::from("."));
    }

    #[tokio::test]
    async fn atomic_write_creates_parents_and_leaves_no_temp() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("nested/dir/doc.md");
        write_atomic(&out, "# hi").await.unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "# hi");
        assert!(!out.with_extension("md.tmp").exists());
    }
}
