//! Batch conversion: emit one result per file as each completes.
//!
//! ## Why a stream?
//!
//! A folder of reports can take a while. Yielding each file's outcome as it
//! finishes lets callers update a progress bar or a results table
//! immediately, and a failed file is just an `Err` item: the queue carries
//! on with the next one.
//!
//! Files are converted strictly one after another. Each conversion may run
//! pandoc, and two pandoc processes writing media next to each other buys
//! nothing but contention.

use crate::convert::{document_stem, media_dir_name, Converter};
use crate::error::FileError;
use crate::output::FileResult;
use crate::progress::ProgressCallback;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::{info, warn};
use walkdir::WalkDir;

/// A boxed stream of per-file results.
pub type BatchStream = Pin<Box<dyn Stream<Item = Result<FileResult, FileError>> + Send>>;

/// Extensions picked up when walking a directory.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["docx", "doc"];

/// Expand files and directories into a list of documents.
///
/// Directories are walked recursively (sorted by file name) and only
/// `.docx` / `.doc` files are kept. Paths given directly are kept whatever
/// their extension, including ones that do not exist, so the batch can
/// report them. Duplicates are dropped, first occurrence wins.
pub fn collect_inputs<P: AsRef<Path>>(paths: &[P]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut push = |p: PathBuf| {
        if seen.insert(p.clone()) {
            out.push(p);
        }
    };

    for path in paths {
        let path = path.as_ref();
        if !path.is_dir() {
            push(path.to_path_buf());
            continue;
        }
        for entry in WalkDir::new(path).sort_by_file_name() {
            match entry {
                Ok(e) if e.file_type().is_file() && is_document(e.path()) => {
                    push(e.into_path());
                }
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable entry under {}: {}", path.display(), e),
            }
        }
    }
    out
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| DOCUMENT_EXTENSIONS.iter().any(|d| e.eq_ignore_ascii_case(d)))
        .unwrap_or(false)
}

/// Output stems for a batch, made unique by suffixing `_2`, `_3`, …
///
/// A suffixed name is itself checked against every name handed out so far,
/// so an input already called `report_2` cannot collide with a renamed
/// second `report`.
fn unique_stems(inputs: &[PathBuf]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    inputs
        .iter()
        .map(|p| {
            let stem = document_stem(p);
            let mut name = stem.clone();
            let mut n = 2;
            while used.contains(&name) {
                name = format!("{stem}_{n}");
                n += 1;
            }
            used.insert(name.clone());
            name
        })
        .collect()
}

/// Convert `inputs` one by one into `output_dir`.
///
/// Each document becomes `<output_dir>/<stem>.md`; images from the embedded
/// converter go to `<output_dir>/<image_dir_name>/<stem>/` and pandoc media
/// to `<output_dir>/<stem>_media/`, so files in the same batch never
/// overwrite each other's images.
///
/// # Example
/// ```rust,no_run
/// use word2md::{collect_inputs, convert_batch, ConversionConfig, Converter};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let converter = Converter::new_async(ConversionConfig::default()).await?;
/// let inputs = collect_inputs(&["reports/"]);
/// let mut results = convert_batch(converter, inputs, "out", true);
/// while let Some(item) = results.next().await {
///     match item {
///         Ok(r) => println!("{} -> {}", r.input.display(), r.result.output_path.display()),
///         Err(e) => eprintln!("failed: {e}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub fn convert_batch(
    converter: Converter,
    inputs: Vec<PathBuf>,
    output_dir: impl AsRef<Path>,
    prefer_primary: bool,
) -> BatchStream {
    let output_dir = output_dir.as_ref().to_path_buf();
    let total = inputs.len();
    let callback: Option<ProgressCallback> = converter.config().progress_callback.clone();
    let succeeded = Arc::new(AtomicUsize::new(0));

    info!("Starting batch of {} files into {}", total, output_dir.display());
    if let Some(cb) = &callback {
        cb.on_batch_start(total);
    }

    let stems = unique_stems(&inputs);
    let jobs = inputs.into_iter().zip(stems).enumerate();

    let files = {
        let callback = callback.clone();
        let succeeded = Arc::clone(&succeeded);
        stream::iter(jobs).then(move |(index, (input, stem))| {
            let converter = converter.clone();
            let callback = callback.clone();
            let succeeded = Arc::clone(&succeeded);
            let output = output_dir.join(format!("{stem}.md"));
            let image_subdir = format!("{}/{}", converter.config().image_dir_name, stem);
            let media_dir = media_dir_name(&stem);
            async move {
                if let Some(cb) = &callback {
                    cb.on_file_start(index, total, &input);
                }
                match converter
                    .convert_job(&input, &output, prefer_primary, image_subdir, media_dir)
                    .await
                {
                    Ok(result) => {
                        succeeded.fetch_add(1, Ordering::SeqCst);
                        if let Some(cb) = &callback {
                            cb.on_file_complete(index, total, &input, result.markdown.len());
                        }
                        Ok(FileResult { input, result })
                    }
                    Err(e) => {
                        let message = e.to_string();
                        warn!("Failed to convert {}: {}", input.display(), message);
                        if let Some(cb) = &callback {
                            cb.on_file_error(index, total, &input, &message);
                        }
                        Err(FileError { input, message })
                    }
                }
            }
        })
    };

    // Fires once after the last file, yields nothing.
    let done = stream::once(async move {
        let ok = succeeded.load(Ordering::SeqCst);
        info!("Batch complete: {}/{} files converted", ok, total);
        if let Some(cb) = &callback {
            cb.on_batch_complete(total, ok);
        }
    })
    .filter_map(|()| async { None::<Result<FileResult, FileError>> });

    Box::pin(files.chain(done))
}
