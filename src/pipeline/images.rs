//! Image extraction: copy every embedded image part into a directory under
//! stable, sequential names.
//!
//! ## Naming
//!
//! Files are named `image_000.png`, `image_001.jpg`, … from an explicit
//! [`ImageSequence`] value. Every extraction starts from
//! [`ImageSequence::default()`] and hands the advanced value back, so
//! callers that keep numbering (the embedded converter's image callback)
//! continue from where extraction stopped instead of sharing hidden state.
//!
//! ## Ordering
//!
//! Images are written in relationship order as listed in
//! `document.xml.rels`. Word usually lists them in insertion order, which is
//! not guaranteed to be the order in which they appear in the document.

use crate::error::{AssetError, Word2MdError};
use crate::pipeline::package::{PartSource, Relationship};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extensions kept as-is; anything else is written as `png`.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tiff", "webp"];

const FALLBACK_EXTENSION: &str = "png";

/// Explicit image counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ImageSequence(u32);

impl ImageSequence {
    pub fn value(self) -> u32 {
        self.0
    }

    /// `image_<nnn>.<ext>` for the current value.
    pub fn file_name(self, ext: &str) -> String {
        format!("image_{:03}.{}", self.0, ext)
    }

    /// The next value.
    #[must_use]
    pub fn advance(self) -> Self {
        ImageSequence(self.0 + 1)
    }
}

/// Result of one extraction call.
#[derive(Debug, Clone, Default)]
pub struct ExtractedImages {
    /// Written files, in relationship order.
    pub paths: Vec<PathBuf>,
    /// First counter value not used by this extraction.
    pub next: ImageSequence,
}

/// Lower-cased extension of a part name, forced into [`ALLOWED_EXTENSIONS`].
pub fn extension_from_part_name(part_name: &str) -> &'static str {
    let ext = part_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    ALLOWED_EXTENSIONS
        .iter()
        .find(|allowed| **allowed == ext)
        .copied()
        .unwrap_or(FALLBACK_EXTENSION)
}

/// Extension for an image handed over by the embedded converter, from its
/// content type, then from the bytes themselves.
pub fn extension_for_content_type(content_type: &str, bytes: &[u8]) -> &'static str {
    let ct = content_type.to_ascii_lowercase();
    let by_type = [
        ("jpeg", "jpg"),
        ("jpg", "jpg"),
        ("png", "png"),
        ("gif", "gif"),
        ("bmp", "bmp"),
        ("tiff", "tiff"),
        ("webp", "webp"),
    ];
    if let Some((_, ext)) = by_type.iter().find(|(needle, _)| ct.contains(needle)) {
        return *ext;
    }

    match image::guess_format(bytes) {
        Ok(image::ImageFormat::Jpeg) => "jpg",
        Ok(image::ImageFormat::Png) => "png",
        Ok(image::ImageFormat::Gif) => "gif",
        Ok(image::ImageFormat::Bmp) => "bmp",
        Ok(image::ImageFormat::Tiff) => "tiff",
        Ok(image::ImageFormat::WebP) => "webp",
        _ => FALLBACK_EXTENSION,
    }
}

/// Write every image part of `source` into `dest`.
///
/// `dest` is created if missing; failing to create it is fatal. A failure on
/// a single part (read or write) is logged and that part skipped.
pub fn extract_images(
    source: &mut impl PartSource,
    dest: &Path,
) -> Result<ExtractedImages, Word2MdError> {
    std::fs::create_dir_all(dest).map_err(|e| Word2MdError::OutputWriteFailed {
        path: dest.to_path_buf(),
        source: e,
    })?;

    let image_rels: Vec<_> = source
        .relationships()
        .iter()
        .filter(|r| r.is_image())
        .cloned()
        .collect();

    let mut out = ExtractedImages::default();
    for rel in &image_rels {
        match extract_one(source, rel, dest, out.next) {
            Ok(path) => {
                debug!("Extracted {} → {}", rel.target, path.display());
                out.paths.push(path);
                out.next = out.next.advance();
            }
            Err(e) => warn!("Skipping image: {}", e),
        }
    }

    debug!("Extracted {} of {} images", out.paths.len(), image_rels.len());
    Ok(out)
}

fn extract_one(
    source: &mut impl PartSource,
    rel: &Relationship,
    dest: &Path,
    seq: ImageSequence,
) -> Result<PathBuf, AssetError> {
    let part = rel.part_name().unwrap_or_else(|| rel.target.clone());
    let bytes = source
        .read_part_blob(rel)
        .map_err(|e| AssetError::ReadFailed {
            part: part.clone(),
            detail: e.to_string(),
        })?;

    let path = dest.join(seq.file_name(extension_from_part_name(&part)));
    std::fs::write(&path, &bytes).map_err(|e| AssetError::WriteFailed {
        path: path.clone(),
        detail: e.to_string(),
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

    /// In-memory package; parts listed in `broken` fail to read.
    struct FakeSource {
        rels: Vec<Relationship>,
        broken: Vec<String>,
    }

    impl FakeSource {
        fn with_images(targets: &[&str]) -> Self {
            let rels = targets
                .iter()
                .enumerate()
                .map(|(i, t)| Relationship::internal(format!("rId{i}"), IMAGE_REL, *t, "word"))
                .collect();
            Self {
                rels,
                broken: Vec::new(),
            }
        }
    }

    impl PartSource for FakeSource {
        fn relationships(&self) -> &[Relationship] {
            &self.rels
        }

        fn read_part_blob(&mut self, rel: &Relationship) -> Result<Vec<u8>, Word2MdError> {
            if self.broken.contains(&rel.target) {
                return Err(Word2MdError::MissingPart {
                    name: rel.target.clone(),
                });
            }
            Ok(rel.target.as_bytes().to_vec())
        }
    }

    #[test]
    fn sequence_naming() {
        let s = ImageSequence::default();
        assert_eq!(s.file_name("png"), "image_000.png");
        assert_eq!(s.advance().advance().file_name("jpg"), "image_002.jpg");
        assert_eq!(ImageSequence(1234).file_name("gif"), "image_1234.gif");
    }

    #[test]
    fn extension_normalisation() {
        assert_eq!(extension_from_part_name("word/media/image1.PNG"), "png");
        assert_eq!(extension_from_part_name("word/media/image2.jpeg"), "jpeg");
        assert_eq!(extension_from_part_name("word/media/image3.emf"), "png");
        assert_eq!(extension_from_part_name("word/media/noext"), "png");
    }

    #[test]
    fn extension_from_content_type_then_bytes() {
        assert_eq!(extension_for_content_type("image/jpeg", b""), "jpg");
        assert_eq!(extension_for_content_type("image/x-wmf", b""), "png");
        let gif = b"GIF89a\x01\x00\x01\x00";
        assert_eq!(extension_for_content_type("application/octet-stream", gif), "gif");
    }

    #[test]
    fn n_images_are_numbered_from_zero() {
        let tmp = tempfile::tempdir().unwrap();
        let mut src = FakeSource::with_images(&["media/a.png", "media/b.jpeg", "media/c.wmf"]);
        let out = extract_images(&mut src, &tmp.path().join("images")).unwrap();

        let names: Vec<_> = out
            .paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["image_000.png", "image_001.jpeg", "image_002.png"]);
        assert_eq!(out.next.value(), 3);
        assert_eq!(std::fs::read(&out.paths[1]).unwrap(), b"media/b.jpeg");
    }

    #[test]
    fn failing_part_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let mut src = FakeSource::with_images(&["media/a.png", "media/b.png", "media/c.png"]);
        src.broken.push("media/b.png".into());

        let out = extract_images(&mut src, tmp.path()).unwrap();
        assert_eq!(out.paths.len(), 2);
        assert!(tmp.path().join("image_000.png").exists());
        assert!(tmp.path().join("image_001.png").exists());
        assert!(!tmp.path().join("image_002.png").exists());
    }

    #[test]
    fn non_image_relationships_are_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let mut src = FakeSource {
            rels: vec![Relationship::internal("rId1", "…/styles", "styles.xml", "word")],
            broken: Vec::new(),
        };
        let out = extract_images(&mut src, tmp.path()).unwrap();
        assert!(out.paths.is_empty());
        assert_eq!(out.next, ImageSequence::default());
    }

    #[test]
    fn every_call_starts_from_zero() {
        let tmp = tempfile::tempdir().unwrap();
        let mut src = FakeSource::with_images(&["media/a.png"]);
        let first = extract_images(&mut src, &tmp.path().join("one")).unwrap();
        let second = extract_images(&mut src, &tmp.path().join("two")).unwrap();
        assert_eq!(first.paths[0].file_name(), second.paths[0].file_name());
    }
}
