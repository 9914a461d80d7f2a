//! # word2md
//!
//! Convert Word documents (`.docx`, and `.doc` when pandoc is installed) to
//! Markdown, with images extracted next to the output and Unicode math
//! glyphs rewritten as LaTeX.
//!
//! ## Why two backends?
//!
//! pandoc produces the best Markdown by far, but it is an external program
//! that may be missing or may choke on a damaged file. The embedded backend
//! needs nothing but this crate: it reads the OOXML package directly,
//! renders a small HTML subset, and rewrites that as Markdown. Every
//! conversion tries pandoc first (when wanted and found) and falls back to
//! the embedded backend on any pandoc failure.
//!
//! ## Pipeline Overview
//!
//! ```text
//! .docx / .doc
//!  │
//!  ├─ 1. Input     validate path, sniff ZIP vs. OLE container
//!  ├─ 2. Primary   pandoc → Markdown (+ <stem>_media/)       ─┐
//!  │               on failure ↓                               │
//!  ├─ 3. Secondary package → images/ + HTML → Markdown        │
//!  ├─ 4. Math      Unicode glyphs → $\latex$                 ─┤
//!  └─ 5. Output    optional front matter, atomic write  ◄─────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use word2md::{ConversionConfig, Converter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder().include_metadata(true).build()?;
//!     let converter = Converter::new_async(config).await?;
//!     let result = converter.convert("report.docx", "out/report.md", true).await?;
//!     eprintln!("converted with {} ({} diagnostics)", result.backend, result.diagnostics.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `word2md` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! word2md = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{format_yaml_front_matter, PrimaryStatus};
pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{convert, convert_sync, inspect, Converter};
pub use error::{AssetError, FileError, Word2MdError};
pub use output::{BackendChoice, ConversionResult, DocumentMetadata, FileResult};
pub use pipeline::math::normalize_math;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{collect_inputs, convert_batch, BatchStream};
