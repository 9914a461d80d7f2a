//! Primary backend: the external `pandoc` process.
//!
//! ## Why run pandoc in the output directory?
//!
//! `--extract-media=<stem>_media` is given as a relative path and pandoc
//! writes image links exactly as it was given. Running with the output
//! directory as working directory puts the media folder next to the
//! Markdown and keeps the links relative, so the pair can be moved together.
//! The input path is made absolute first for the same reason.

use super::{finish, ConversionJob, ConversionStrategy};
use crate::config::ConversionConfig;
use crate::error::Word2MdError;
use crate::output::{BackendChoice, ConversionResult};
use crate::pipeline::math;
use futures::future::BoxFuture;
use std::path::PathBuf;
use std::process::Stdio;
use tracing::{debug, info, warn};

/// A pandoc executable known to run, found once per [`crate::Converter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryStatus {
    pub path: PathBuf,
    /// First line of `pandoc --version`, e.g. `pandoc 3.5`.
    pub version: String,
}

impl PrimaryStatus {
    /// Locate a working pandoc.
    ///
    /// Order: `config.pandoc_path`, then [`pandoc_auto::find_pandoc`]
    /// (`PANDOC_PATH`, `PATH`, download cache). When nothing runs and
    /// `auto_install_pandoc` is set, one download is attempted.
    ///
    /// Blocking: may spawn processes and download an archive. Returns
    /// `None` when pandoc is unavailable; callers fall back to the
    /// embedded converter.
    pub fn probe(config: &ConversionConfig) -> Option<PrimaryStatus> {
        let candidate = config.pandoc_path.clone().or_else(pandoc_auto::find_pandoc);
        if let Some(path) = candidate {
            match Self::check(path) {
                Ok(status) => return Some(status),
                Err(e) => warn!("{}", e),
            }
        }

        if !config.auto_install_pandoc {
            info!("pandoc not found; the embedded converter will be used");
            return None;
        }

        info!("pandoc not found; downloading pandoc {}", pandoc_auto::PANDOC_VERSION);
        match pandoc_auto::ensure_pandoc(None) {
            Ok(path) => match Self::check(path) {
                Ok(status) => Some(status),
                Err(e) => {
                    warn!("{}", e);
                    None
                }
            },
            Err(e) => {
                warn!("pandoc auto-install failed: {}", e);
                None
            }
        }
    }

    /// Run `--version` on a specific executable.
    pub fn check(path: PathBuf) -> Result<PrimaryStatus, Word2MdError> {
        let version = pandoc_auto::pandoc_version(&path)
            .map_err(|e| Word2MdError::PandocUnavailable(e.to_string()))?;
        debug!("Using {} at {}", version, path.display());
        Ok(PrimaryStatus { path, version })
    }
}

/// Converts by running pandoc.
#[derive(Debug, Clone)]
pub struct PandocBackend {
    status: PrimaryStatus,
}

impl PandocBackend {
    pub fn new(status: PrimaryStatus) -> Self {
        Self { status }
    }

    /// Arguments after the executable, in order. `media_dir` is relative to
    /// the working directory pandoc runs in.
    pub fn arguments(
        input: &std::path::Path,
        media_dir: &str,
        config: &ConversionConfig,
    ) -> Vec<String> {
        let mut args = vec![
            input.to_string_lossy().to_string(),
            "--to".to_string(),
            config.target_format.clone(),
            "--wrap=none".to_string(),
            "--standalone".to_string(),
            format!("--extract-media={media_dir}"),
        ];
        args.extend(config.extra_pandoc_args.iter().cloned());
        args
    }

    async fn run(&self, job: &ConversionJob) -> Result<ConversionResult, Word2MdError> {
        let input = std::path::absolute(&job.input.path)
            .map_err(|e| Word2MdError::Internal(format!("cannot resolve input path: {e}")))?;
        let args = Self::arguments(&input, &job.media_dir, &job.config);
        debug!("Running {} {}", self.status.path.display(), args.join(" "));

        let output = tokio::process::Command::new(&self.status.path)
            .args(&args)
            .current_dir(job.output_dir())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                Word2MdError::PandocUnavailable(format!(
                    "failed to start {}: {e}",
                    self.status.path.display()
                ))
            })?;

        if !output.status.success() {
            return Err(Word2MdError::PandocFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let markdown = String::from_utf8_lossy(&output.stdout);
        let markdown = math::normalize_math(&markdown);
        finish(job, markdown, BackendChoice::Primary, Vec::new()).await
    }
}

impl ConversionStrategy for PandocBackend {
    fn name(&self) -> &'static str {
        "pandoc"
    }

    fn choice(&self) -> BackendChoice {
        BackendChoice::Primary
    }

    fn attempt<'a>(
        &'a self,
        job: &'a ConversionJob,
    ) -> BoxFuture<'a, Result<ConversionResult, Word2MdError>> {
        Box::pin(self.run(job))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn default_arguments() {
        let args = PandocBackend::arguments(
            Path::new("/docs/report.docx"),
            "report_media",
            &ConversionConfig::default(),
        );
        assert_eq!(
            args,
            vec![
                "/docs/report.docx",
                "--to",
                "gfm+tex_math_dollars+pipe_tables",
                "--wrap=none",
                "--standalone",
                "--extract-media=report_media",
            ]
        );
    }

    #[test]
    fn extra_arguments_are_appended() {
        let config = ConversionConfig::builder()
            .extra_pandoc_arg("--toc")
            .build()
            .unwrap();
        let args = PandocBackend::arguments(Path::new("a.docx"), "a_media", &config);
        assert_eq!(args.last().map(String::as_str), Some("--toc"));
    }

    #[test]
    fn missing_executable_is_unavailable() {
        let err = PrimaryStatus::check(PathBuf::from("/no/such/pandoc")).unwrap_err();
        assert!(matches!(err, Word2MdError::PandocUnavailable(_)));
    }

    #[test]
    fn probe_without_auto_install_never_downloads() {
        let config = ConversionConfig::builder()
            .pandoc_path("/no/such/pandoc")
            .auto_install_pandoc(false)
            .build()
            .unwrap();
        // An explicit path that does not run is not replaced by a PATH lookup.
        assert!(PrimaryStatus::probe(&config).is_none());
    }
}
