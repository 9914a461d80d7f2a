//! CLI binary for word2md.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use word2md::{
    collect_inputs, convert_batch, inspect, ConversionConfig, ConversionProgressCallback,
    Converter, DocumentMetadata, ProgressCallback,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Batch progress bar plus one log line per finished file.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} files  \
                 ⏱ {elapsed_precise}  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

fn file_label(input: &Path) -> String {
    input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| input.display().to_string())
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_files} documents…"))
        ));
    }

    fn on_file_start(&self, _index: usize, _total_files: usize, input: &Path) {
        self.bar.set_message(file_label(input));
    }

    fn on_file_complete(&self, index: usize, total_files: usize, input: &Path, markdown_len: usize) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            green("✓"),
            index + 1,
            total_files,
            file_label(input),
            dim(&format!("{markdown_len} chars")),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, total_files: usize, input: &Path, error: &str) {
        // Keep long pandoc stderr dumps to one line.
        let msg: String = if error.chars().count() > 80 {
            let head: String = error.chars().take(79).collect();
            format!("{head}\u{2026}")
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            index + 1,
            total_files,
            file_label(input),
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let failed = total_files.saturating_sub(success_count);
        self.bar.finish_and_clear();
        if failed == 0 {
            eprintln!(
                "{} {} documents converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents converted  ({} failed)",
                if failed == total_files { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert one document (writes report.md next to it)
  word2md report.docx

  # Convert to a specific file
  word2md report.docx -o out/report.md

  # Convert a whole folder (recursive) into out/
  word2md reports/ -o out/

  # Skip pandoc and use the embedded converter
  word2md --no-pandoc report.docx

  # Embed images as data: URIs instead of writing image files
  word2md --no-pandoc --inline-images report.docx

  # Prepend YAML front matter from the document properties
  word2md --metadata report.docx

  # Show document properties only
  word2md --inspect-only report.docx

BACKENDS:
  pandoc     used when found (or downloaded); best output, also reads .doc
  embedded   built in; .docx only; used when pandoc is missing or fails

OUTPUT LAYOUT:
  pandoc     <output_dir>/<stem>_media/...
  embedded   <output_dir>/images/image_000.png, image_001.jpeg, ...
             (batch mode: <output_dir>/images/<stem>/...)

ENVIRONMENT VARIABLES:
  PANDOC_PATH              Path to an existing pandoc executable
  WORD2MD_PANDOC           Same as --pandoc
  WORD2MD_NO_PANDOC        Same as --no-pandoc
  WORD2MD_NO_AUTO_INSTALL  Same as --no-auto-install
  RUST_LOG                 Override log filter (e.g. word2md=debug)

  pandoc (~30 MB) is downloaded automatically on first use when it is not on
  PATH, and cached in ~/.cache/word2md/pandoc-3.5/.
"#;

/// Convert Word documents to Markdown.
#[derive(Parser, Debug)]
#[command(
    name = "word2md",
    version,
    about = "Convert Word documents to Markdown",
    long_about = "Convert Word documents (.docx, and .doc when pandoc is available) to Markdown. \
Images are extracted next to the output and Unicode math symbols become LaTeX. pandoc is used \
when available; otherwise a built-in converter handles .docx files.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Documents or directories to convert.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file (one document) or directory (batch).
    #[arg(short, long, env = "WORD2MD_OUTPUT")]
    output: Option<PathBuf>,

    /// Never use pandoc; always use the embedded converter.
    #[arg(long, env = "WORD2MD_NO_PANDOC")]
    no_pandoc: bool,

    /// Path to a pandoc executable.
    #[arg(long = "pandoc", env = "WORD2MD_PANDOC", value_name = "PATH")]
    pandoc_path: Option<PathBuf>,

    /// Do not download pandoc when it is not installed.
    #[arg(long, env = "WORD2MD_NO_AUTO_INSTALL")]
    no_auto_install: bool,

    /// pandoc output format.
    #[arg(long = "to", env = "WORD2MD_TO", default_value = word2md::config::DEFAULT_TARGET_FORMAT)]
    target_format: String,

    /// Extra argument passed to pandoc (repeatable).
    #[arg(long = "pandoc-arg", value_name = "ARG", allow_hyphen_values = true)]
    pandoc_args: Vec<String>,

    /// Image directory name for the embedded converter.
    #[arg(long, env = "WORD2MD_IMAGE_DIR", default_value = "images")]
    image_dir: String,

    /// Embed images as base64 data: URIs (embedded converter only).
    #[arg(long, env = "WORD2MD_INLINE_IMAGES")]
    inline_images: bool,

    /// Alt text for images that have none.
    #[arg(long, env = "WORD2MD_IMAGE_CAPTION", default_value = "image")]
    image_caption: String,

    /// Prepend YAML front matter with document properties.
    #[arg(long, env = "WORD2MD_METADATA")]
    metadata: bool,

    /// Print results as JSON on stdout.
    #[arg(long, env = "WORD2MD_JSON")]
    json: bool,

    /// Print document properties only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "WORD2MD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "WORD2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "WORD2MD_QUIET")]
    quiet: bool,
}

impl Cli {
    /// A single non-directory argument is a single conversion; anything
    /// else is a batch.
    fn is_batch(&self) -> bool {
        self.inputs.len() > 1 || self.inputs.iter().any(|p| p.is_dir())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let batch = cli.is_batch();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar provides the feedback in batch mode, so library INFO
    // logs are suppressed while it is shown.
    let show_progress = batch && !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        return inspect_all(&cli).await;
    }

    // ── Ensure pandoc is available ───────────────────────────────────────
    // Download up front with a visible bar instead of silently inside the
    // converter probe. A failed download is not fatal: the embedded
    // converter takes over.
    let auto_install = !cli.no_pandoc && !cli.no_auto_install;
    if auto_install && cli.pandoc_path.is_none() && pandoc_auto::find_pandoc().is_none() {
        download_pandoc(cli.quiet);
    }

    // ── Build converter ──────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    // The explicit download above was the one attempt.
    let config = build_config(&cli, false, progress_cb)?;
    let converter = if cli.no_pandoc {
        Converter::with_primary(config, None)
    } else {
        Converter::new_async(config)
            .await
            .context("Failed to probe for pandoc")?
    };
    if !cli.quiet && !cli.no_pandoc && !converter.primary_available() {
        eprintln!(
            "{} pandoc not available; using the embedded converter (.docx only)",
            cyan("⚠")
        );
    }

    // ── Run conversion ───────────────────────────────────────────────────
    if batch {
        run_batch(&cli, converter).await
    } else {
        run_single(&cli, &converter).await
    }
}

/// Download pandoc into the cache, with a byte-progress bar unless quiet.
fn download_pandoc(quiet: bool) {
    let result = if quiet {
        tokio::task::block_in_place(|| pandoc_auto::ensure_pandoc(None))
    } else {
        let dl_bar = ProgressBar::new(0);
        dl_bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        dl_bar.set_prefix("pandoc");
        dl_bar.enable_steady_tick(Duration::from_millis(80));

        let bar = dl_bar.clone();
        // block_in_place keeps the callback borrow valid without a 'static
        // bound while the blocking download runs.
        let result = tokio::task::block_in_place(|| {
            pandoc_auto::ensure_pandoc(Some(&|downloaded, total| {
                if let Some(t) = total {
                    if bar.length().unwrap_or(0) != t {
                        bar.set_length(t);
                    }
                }
                bar.set_position(downloaded);
            }))
        });
        dl_bar.finish_and_clear();
        result
    };

    if let Err(e) = result {
        tracing::warn!("pandoc download failed: {}", e);
        if !quiet {
            eprintln!("{} pandoc download failed: {}", red("✗"), e);
        }
    }
}

/// Map CLI args to `ConversionConfig`.
fn build_config(
    cli: &Cli,
    auto_install: bool,
    progress: Option<ProgressCallback>,
) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .auto_install_pandoc(auto_install)
        .target_format(cli.target_format.clone())
        .image_dir_name(cli.image_dir.clone())
        .inline_images(cli.inline_images)
        .default_image_caption(cli.image_caption.clone())
        .include_metadata(cli.metadata);

    if let Some(ref path) = cli.pandoc_path {
        builder = builder.pandoc_path(path.clone());
    }
    for arg in &cli.pandoc_args {
        builder = builder.extra_pandoc_arg(arg.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

async fn run_single(cli: &Cli, converter: &Converter) -> Result<()> {
    let input = &cli.inputs[0];
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| input.with_extension("md"));

    let start = Instant::now();
    let result = converter
        .convert(input, &output, !cli.no_pandoc)
        .await
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialise result")?
        );
        return Ok(());
    }

    if !cli.quiet {
        for d in &result.diagnostics {
            eprintln!("  {} {}", cyan("⚠"), dim(d));
        }
        eprintln!(
            "{}  {} via {}  {}ms  →  {}",
            green("✔"),
            input.display(),
            result.backend,
            start.elapsed().as_millis(),
            bold(&result.output_path.display().to_string()),
        );
    }
    Ok(())
}

async fn run_batch(cli: &Cli, converter: Converter) -> Result<()> {
    let Some(output_dir) = cli.output.clone() else {
        anyhow::bail!("several inputs or a directory need an output directory (-o DIR)");
    };
    if output_dir.is_file() {
        anyhow::bail!("{} is a file; batch output must be a directory", output_dir.display());
    }

    let inputs = collect_inputs(&cli.inputs);
    if inputs.is_empty() {
        anyhow::bail!("no .docx or .doc files found");
    }

    let mut results = convert_batch(converter, inputs, &output_dir, !cli.no_pandoc);
    let mut report = Vec::new();
    let mut failed = 0usize;

    while let Some(item) = results.next().await {
        match item {
            Ok(done) => {
                if !cli.quiet && !cli.json && cli.no_progress {
                    eprintln!(
                        "{} {} → {}",
                        green("✓"),
                        done.input.display(),
                        done.result.output_path.display()
                    );
                }
                report.push(serde_json::json!({
                    "input": done.input,
                    "ok": true,
                    "output": done.result.output_path,
                    "backend": done.result.backend,
                    "diagnostics": done.result.diagnostics,
                }));
            }
            Err(e) => {
                failed += 1;
                if !cli.json && cli.no_progress {
                    eprintln!("{} {}", red("✗"), e);
                }
                report.push(serde_json::json!({
                    "input": e.input,
                    "ok": false,
                    "error": e.message,
                }));
            }
        }
    }

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise results")?
        );
    }

    if failed > 0 {
        // The queue ran to the end; the exit status reports the failures.
        std::process::exit(1);
    }
    Ok(())
}

async fn inspect_all(cli: &Cli) -> Result<()> {
    let inputs = collect_inputs(&cli.inputs);
    let mut all = Vec::new();

    for input in &inputs {
        let meta = inspect(input)
            .await
            .with_context(|| format!("Failed to inspect {}", input.display()))?;
        if cli.json {
            all.push(serde_json::json!({ "input": input, "metadata": meta }));
        } else {
            print_metadata(input, &meta);
        }
    }

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&all).context("Failed to serialise metadata")?
        );
    }
    Ok(())
}

fn print_metadata(input: &Path, meta: &DocumentMetadata) {
    println!("File:         {}", input.display());
    let rows = [
        ("Title:", &meta.title),
        ("Author:", &meta.author),
        ("Subject:", &meta.subject),
        ("Description:", &meta.description),
        ("Keywords:", &meta.keywords),
        ("Modified by:", &meta.last_modified_by),
        ("Created:", &meta.created),
        ("Modified:", &meta.modified),
        ("Revision:", &meta.revision),
    ];
    for (label, value) in rows {
        if let Some(v) = value {
            println!("{label:<13} {v}");
        }
    }
    println!("Images:       {}", meta.image_count);
    println!();
}
