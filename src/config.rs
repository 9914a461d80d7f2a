//! Configuration types for Word-to-Markdown conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The only per-call knob that is not in
//! here is `prefer_primary`, which is an argument of
//! [`crate::convert::Converter::convert`].

use crate::error::Word2MdError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// pandoc output format used by the primary backend.
pub const DEFAULT_TARGET_FORMAT: &str = "gfm+tex_math_dollars+pipe_tables";

/// Configuration for a Word-to-Markdown conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use word2md::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .auto_install_pandoc(false)
///     .image_dir_name("assets")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Explicit pandoc executable. If None, pandoc is located via
    /// `PANDOC_PATH`, `PATH`, then the pandoc-auto cache.
    pub pandoc_path: Option<PathBuf>,

    /// Download pandoc once at startup when it cannot be found. Default: true.
    pub auto_install_pandoc: bool,

    /// pandoc `--to` format. Default: [`DEFAULT_TARGET_FORMAT`].
    pub target_format: String,

    /// Additional arguments appended to the pandoc invocation.
    pub extra_pandoc_args: Vec<String>,

    /// Name of the image directory created next to the output on the
    /// secondary path. Default: `images`.
    pub image_dir_name: String,

    /// Embed secondary-path images as base64 `data:` URIs instead of writing
    /// them to the image directory. Default: false.
    pub inline_images: bool,

    /// Alt text used for images that carry none. Default: `image`.
    pub default_image_caption: String,

    /// Prepend YAML front-matter with document properties. Default: false.
    pub include_metadata: bool,

    /// Receives batch progress events. Not serialised.
    #[serde(skip)]
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            pandoc_path: None,
            auto_install_pandoc: true,
            target_format: DEFAULT_TARGET_FORMAT.to_string(),
            extra_pandoc_args: Vec::new(),
            image_dir_name: "images".to_string(),
            inline_images: false,
            default_image_caption: "image".to_string(),
            include_metadata: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("pandoc_path", &self.pandoc_path)
            .field("auto_install_pandoc", &self.auto_install_pandoc)
            .field("target_format", &self.target_format)
            .field("extra_pandoc_args", &self.extra_pandoc_args)
            .field("image_dir_name", &self.image_dir_name)
            .field("inline_images", &self.inline_images)
            .field("default_image_caption", &self.default_image_caption)
            .field("include_metadata", &self.include_metadata)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn pandoc_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pandoc_path = Some(path.into());
        self
    }

    pub fn auto_install_pandoc(mut self, v: bool) -> Self {
        self.config.auto_install_pandoc = v;
        self
    }

    pub fn target_format(mut self, format: impl Into<String>) -> Self {
        self.config.target_format = format.into();
        self
    }

    pub fn extra_pandoc_arg(mut self, arg: impl Into<String>) -> Self {
        self.config.extra_pandoc_args.push(arg.into());
        self
    }

    pub fn image_dir_name(mut self, name: impl Into<String>) -> Self {
        self.config.image_dir_name = name.into();
        self
    }

    pub fn inline_images(mut self, v: bool) -> Self {
        self.config.inline_images = v;
        self
    }

    pub fn default_image_caption(mut self, caption: impl Into<String>) -> Self {
        self.config.default_image_caption = caption.into();
        self
    }

    pub fn include_metadata(mut self, v: bool) -> Self {
        self.config.include_metadata = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Word2MdError> {
        let c = &self.config;
        if c.target_format.trim().is_empty() {
            return Err(Word2MdError::InvalidConfig(
                "pandoc target format must not be empty".into(),
            ));
        }
        let dir = c.image_dir_name.trim();
        if dir.is_empty() || dir == "." || dir == ".." || dir.contains(['/', '\\']) {
            return Err(Word2MdError::InvalidConfig(format!(
                "image directory must be a single path component, got '{}'",
                c.image_dir_name
            )));
        }
        Ok(self.config)
    }
}
