//! Secondary backend: embedded HTML converter plus regex Markdown rewrite.
//!
//! Steps, all inside `spawn_blocking` because ZIP/XML parsing and the image
//! writes are synchronous:
//!
//! 1. extract every image part to `<output_dir>/<image_subdir>/`
//! 2. convert `document.xml` to HTML; the image callback writes each image
//!    again under the next free sequence number (or inlines it as a
//!    `data:` URI) and returns the link target
//! 3. normalise math glyphs in the HTML
//! 4. rewrite the HTML as Markdown
//!
//! Step 1 and step 2 both write images, so a document with N images ends up
//! with 2N files: the relationship-ordered copies `image_000…` from step 1
//! and the appearance-ordered copies continuing the sequence that the
//! Markdown actually links to.

use super::{finish, ConversionJob, ConversionStrategy};
use crate::error::Word2MdError;
use crate::output::{BackendChoice, ConversionResult};
use crate::pipeline::images::{extension_for_content_type, extract_images, ImageSequence};
use crate::pipeline::input::Container;
use crate::pipeline::package::DocxPackage;
use crate::pipeline::{encode, html, markdown, math};
use futures::future::BoxFuture;
use std::path::Path;
use tracing::{debug, info};

/// Converts without any external process.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedBackend;

impl EmbeddedBackend {
    async fn run(&self, job: &ConversionJob) -> Result<ConversionResult, Word2MdError> {
        if job.input.container != Container::Zip {
            return Err(Word2MdError::UnsupportedFormat {
                path: job.input.path.clone(),
                detail: "the embedded converter reads only .docx (ZIP) packages; \
                         install pandoc for other formats"
                    .into(),
            });
        }

        let owned = job.clone();
        let (markdown, diagnostics) = tokio::task::spawn_blocking(move || convert_blocking(&owned))
            .await
            .map_err(|e| Word2MdError::Internal(format!("embedded converter task failed: {e}")))??;

        for message in &diagnostics {
            debug!("embedded converter: {}", message);
        }
        finish(job, markdown, BackendChoice::Secondary, diagnostics).await
    }
}

impl ConversionStrategy for EmbeddedBackend {
    fn name(&self) -> &'static str {
        "embedded"
    }

    fn choice(&self) -> BackendChoice {
        BackendChoice::Secondary
    }

    fn attempt<'a>(
        &'a self,
        job: &'a ConversionJob,
    ) -> BoxFuture<'a, Result<ConversionResult, Word2MdError>> {
        Box::pin(self.run(job))
    }
}

/// The synchronous part: returns Markdown and converter messages.
fn convert_blocking(job: &ConversionJob) -> Result<(String, Vec<String>), Word2MdError> {
    let config = &job.config;
    let mut package = DocxPackage::open(&job.input.path)?;
    let image_dir = job.output_dir().join(&job.image_subdir);

    let mut seq = if config.inline_images {
        ImageSequence::default()
    } else {
        let extracted = extract_images(&mut package, &image_dir)?;
        info!(
            "Extracted {} images to {}",
            extracted.paths.len(),
            image_dir.display()
        );
        extracted.next
    };

    let conversion = html::convert_to_html(&mut package, |bytes, content_type| {
        if config.inline_images {
            return Ok(encode::data_uri(bytes, content_type));
        }
        write_linked_image(&mut seq, &image_dir, &job.image_subdir, bytes, content_type)
    })?;

    let html = math::normalize_math(&conversion.html);
    let markdown = markdown::html_to_markdown(&html, &config.default_image_caption);
    Ok((markdown, conversion.messages))
}

/// Write one callback image under the next sequence number and return its
/// link target. The number is only consumed once the file exists.
fn write_linked_image(
    seq: &mut ImageSequence,
    image_dir: &Path,
    image_subdir: &str,
    bytes: &[u8],
    content_type: &str,
) -> Result<String, Word2MdError> {
    let name = seq.file_name(extension_for_content_type(content_type, bytes));
    let path = image_dir.join(&name);
    std::fs::write(&path, bytes).map_err(|e| Word2MdError::OutputWriteFailed { path, source: e })?;
    *seq = seq.advance();
    Ok(format!("{image_subdir}/{name}"))
}
