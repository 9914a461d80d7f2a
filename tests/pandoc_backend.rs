//! Primary-backend tests against fake `pandoc` shell scripts.
//!
//! The scripts append their arguments to `args.log` in their working
//! directory, which is the output directory of the conversion.

#![cfg(unix)]

mod common;

use common::{sample_report, write_script};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use futures::StreamExt;
use word2md::{convert_batch, BackendChoice, ConversionConfig, Converter, PrimaryStatus};

// Writing an executable while another test thread forks can fail with
// ETXTBSY; keep script creation and execution in this file serialised.
static SCRIPTS: Mutex<()> = Mutex::new(());

const VERSION: &str = r#"if [ "$1" = "--version" ]; then echo "pandoc 3.5"; exit 0; fi
echo "$@" >> args.log"#;

fn fake_pandoc(dir: &Path, convert_body: &str) -> PathBuf {
    let path = dir.join("pandoc");
    write_script(&path, &format!("{VERSION}\n{convert_body}"));
    path
}

fn converter_with(pandoc: PathBuf) -> Converter {
    let status = PrimaryStatus::check(pandoc).unwrap();
    Converter::with_primary(ConversionConfig::default(), Some(status))
}

#[tokio::test]
async fn primary_output_is_math_normalised() {
    let _guard = SCRIPTS.lock().unwrap_or_else(|e| e.into_inner());
    let tmp = tempfile::tempdir().unwrap();
    let pandoc = fake_pandoc(tmp.path(), r"printf '# Fake\n\nArea is π r²\n'");
    let input = tmp.path().join("report.docx");
    sample_report().write_to(&input);

    let out_dir = tmp.path().join("out");
    let result = converter_with(pandoc)
        .convert(&input, out_dir.join("report.md"), true)
        .await
        .unwrap();

    assert_eq!(result.backend, BackendChoice::Primary);
    assert!(result.diagnostics.is_empty());
    assert!(result.markdown.contains(r"Area is $\pi$ r$^2$"), "{}", result.markdown);
    assert_eq!(
        std::fs::read_to_string(out_dir.join("report.md")).unwrap(),
        result.markdown
    );

    // pandoc ran inside the output directory with the expected arguments.
    let args = std::fs::read_to_string(out_dir.join("args.log")).unwrap();
    assert!(args.starts_with(&input.display().to_string()), "{args}");
    assert!(args.contains("--to gfm+tex_math_dollars+pipe_tables"), "{args}");
    assert!(args.contains("--wrap=none --standalone --extract-media=report_media"), "{args}");
}

#[tokio::test]
async fn primary_failure_falls_back_to_embedded() {
    let _guard = SCRIPTS.lock().unwrap_or_else(|e| e.into_inner());
    let tmp = tempfile::tempdir().unwrap();
    let pandoc = fake_pandoc(tmp.path(), "echo 'pandoc: cannot parse' >&2\nexit 3");
    let input = tmp.path().join("report.docx");
    sample_report().write_to(&input);

    let out = tmp.path().join("out/report.md");
    let result = converter_with(pandoc).convert(&input, &out, true).await.unwrap();

    assert_eq!(result.backend, BackendChoice::Secondary);
    assert!(result.markdown.contains("# Quarterly Report"));
    assert!(tmp.path().join("out/images/image_001.png").is_file());
    assert!(tmp.path().join("out/args.log").is_file(), "pandoc was tried first");
}

#[tokio::test]
async fn primary_is_skipped_when_not_preferred() {
    let _guard = SCRIPTS.lock().unwrap_or_else(|e| e.into_inner());
    let tmp = tempfile::tempdir().unwrap();
    let pandoc = fake_pandoc(tmp.path(), "printf 'from pandoc\\n'");
    let input = tmp.path().join("report.docx");
    sample_report().write_to(&input);

    let result = converter_with(pandoc)
        .convert(&input, tmp.path().join("out/report.md"), false)
        .await
        .unwrap();

    assert_eq!(result.backend, BackendChoice::Secondary);
    assert!(!tmp.path().join("out/args.log").exists());
}

#[tokio::test]
async fn batch_gives_each_document_its_own_media_dir() {
    let _guard = SCRIPTS.lock().unwrap_or_else(|e| e.into_inner());
    let tmp = tempfile::tempdir().unwrap();
    // $6 is `--extract-media=<dir>`; a plain mkdir fails if a name repeats.
    let pandoc = fake_pandoc(
        tmp.path(),
        r#"media="${6#--extract-media=}"
mkdir "$media" || exit 9
printf '# From pandoc\n'"#,
    );
    let inputs: Vec<PathBuf> = ["x", "y"]
        .iter()
        .map(|d| {
            let dir = tmp.path().join(d);
            std::fs::create_dir(&dir).unwrap();
            let input = dir.join("report.docx");
            sample_report().write_to(&input);
            input
        })
        .collect();

    let out = tmp.path().join("out");
    let items: Vec<_> = convert_batch(converter_with(pandoc), inputs, &out, true)
        .collect()
        .await;

    assert_eq!(items.len(), 2);
    for item in &items {
        assert_eq!(item.as_ref().unwrap().result.backend, BackendChoice::Primary);
    }
    assert!(out.join("report.md").is_file());
    assert!(out.join("report_2.md").is_file());
    assert!(out.join("report_media").is_dir());
    assert!(out.join("report_2_media").is_dir());

    let args = std::fs::read_to_string(out.join("args.log")).unwrap();
    let lines: Vec<_> = args.lines().collect();
    assert_eq!(lines.len(), 2, "{args}");
    assert!(lines[0].ends_with("--extract-media=report_media"), "{args}");
    assert!(lines[1].ends_with("--extract-media=report_2_media"), "{args}");
}

#[test]
fn probe_accepts_configured_executable() {
    let _guard = SCRIPTS.lock().unwrap_or_else(|e| e.into_inner());
    let tmp = tempfile::tempdir().unwrap();
    let pandoc = fake_pandoc(tmp.path(), "exit 0");

    let config = ConversionConfig::builder()
        .pandoc_path(&pandoc)
        .auto_install_pandoc(false)
        .build()
        .unwrap();
    let status = PrimaryStatus::probe(&config).unwrap();
    assert_eq!(status.path, pandoc);
    assert_eq!(status.version, "pandoc 3.5");
}
