//! Read access to a `.docx` package: a ZIP container of XML parts tied
//! together by relationship files.
//!
//! ## Why a thin reader of our own?
//!
//! Both the image extractor and the embedded HTML converter need only three
//! things from the package: the relationship table of the main document,
//! the content type of a part, and the raw bytes of a part. `zip` plus
//! `quick-xml` cover that in a few hundred lines, and the [`PartSource`]
//! trait lets tests substitute an in-memory package.

use crate::error::Word2MdError;
use crate::output::DocumentMetadata;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

const PACKAGE_RELS: &str = "_rels/.rels";
const CONTENT_TYPES: &str = "[Content_Types].xml";
const DEFAULT_MAIN_DOCUMENT: &str = "word/document.xml";
const OFFICE_DOCUMENT_REL: &str = "/officeDocument";
/// Upper bound on the buffer reserved up front from a ZIP header's size.
const MAX_PREALLOCATE: u64 = 64 << 20;

// ── Relationships ────────────────────────────────────────────────────────

/// One `<Relationship>` entry of a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// `r:id` referenced from the source part, e.g. `rId5`.
    pub id: String,
    /// Full relationship type URI.
    pub rel_type: String,
    /// Target as written in the `.rels` file (usually relative).
    pub target: String,
    /// `TargetMode="External"`: the target is a URL, not a part.
    pub external: bool,
    /// Directory of the part that owns this relationship, e.g. `word`.
    source_dir: String,
}

impl Relationship {
    /// A package-internal relationship owned by a part in `source_dir`.
    pub fn internal(
        id: impl Into<String>,
        rel_type: impl Into<String>,
        target: impl Into<String>,
        source_dir: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            rel_type: rel_type.into(),
            target: target.into(),
            external: false,
            source_dir: source_dir.into(),
        }
    }

    /// Whether this relationship points at an image part.
    pub fn is_image(&self) -> bool {
        !self.external && self.rel_type.contains("image")
    }

    /// Absolute part name inside the ZIP (no leading `/`), or `None` for
    /// external targets.
    pub fn part_name(&self) -> Option<String> {
        if self.external {
            return None;
        }
        let joined = match self.target.strip_prefix('/') {
            Some(abs) => abs.to_string(),
            None if self.source_dir.is_empty() => self.target.clone(),
            None => format!("{}/{}", self.source_dir, self.target),
        };
        Some(normalize_part_name(&joined))
    }
}

/// Resolve `.` and `..` segments of a `/`-separated part name.
fn normalize_part_name(name: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for seg in name.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Parse a `.rels` part. `source_dir` is the directory of the owning part.
pub fn parse_relationships(xml: &[u8], source_dir: &str) -> Result<Vec<Relationship>, Word2MdError> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut rels = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) => {
                if local_name(e.name().as_ref()) == b"Relationship" {
                    let id = attr_value(&reader, e, b"Id").unwrap_or_default();
                    let rel_type = attr_value(&reader, e, b"Type").unwrap_or_default();
                    let target = attr_value(&reader, e, b"Target").unwrap_or_default();
                    let external = attr_value(&reader, e, b"TargetMode")
                        .is_some_and(|m| m.eq_ignore_ascii_case("external"));
                    rels.push(Relationship {
                        id,
                        rel_type,
                        target,
                        external,
                        source_dir: source_dir.to_string(),
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

// ── Content types ────────────────────────────────────────────────────────

/// Parsed `[Content_Types].xml`.
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    defaults: HashMap<String, String>,
    overrides: HashMap<String, String>,
}

impl ContentTypes {
    pub fn parse(xml: &[u8]) -> Result<Self, Word2MdError> {
        let mut reader = Reader::from_reader(xml);
        reader.trim_text(true);
        let mut buf = Vec::new();
        let mut types = ContentTypes::default();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let ct = attr_value(&reader, e, b"ContentType");
                    match (local_name(e.name().as_ref()), ct) {
                        (b"Default", Some(ct)) => {
                            if let Some(ext) = attr_value(&reader, e, b"Extension") {
                                types.defaults.insert(ext.to_ascii_lowercase(), ct);
                            }
                        }
                        (b"Override", Some(ct)) => {
                            if let Some(part) = attr_value(&reader, e, b"PartName") {
                                types
                                    .overrides
                                    .insert(part.trim_start_matches('/').to_string(), ct);
                            }
                        }
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(types)
    }

    /// Content type of `part_name`: an explicit override, else the default
    /// registered for its extension.
    pub fn get(&self, part_name: &str) -> Option<&str> {
        let part_name = part_name.trim_start_matches('/');
        if let Some(ct) = self.overrides.get(part_name) {
            return Some(ct);
        }
        let ext = part_name.rsplit_once('.')?.1.to_ascii_lowercase();
        self.defaults.get(&ext).map(String::as_str)
    }
}

// ── Part access ──────────────────────────────────────────────────────────

/// Anything that can hand out the main document's relationships and the
/// bytes behind them.
pub trait PartSource {
    /// Relationships of the main document part, in package order.
    fn relationships(&self) -> &[Relationship];

    /// Read the part a relationship points at.
    fn read_part_blob(&mut self, rel: &Relationship) -> Result<Vec<u8>, Word2MdError>;

    /// Content type of the part a relationship points at, if known.
    fn part_content_type(&self, rel: &Relationship) -> Option<String> {
        let _ = rel;
        None
    }
}

/// An opened `.docx` package.
pub struct DocxPackage<R: Read + Seek> {
    archive: ZipArchive<R>,
    main_document: String,
    relationships: Vec<Relationship>,
    content_types: ContentTypes,
}

impl DocxPackage<BufReader<File>> {
    /// Open a package from disk.
    pub fn open(path: &Path) -> Result<Self, Word2MdError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Word2MdError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => Word2MdError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => Word2MdError::CorruptPackage {
                detail: format!("{}: {e}", path.display()),
            },
        })?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> DocxPackage<R> {
    /// Open a package from any seekable reader.
    pub fn from_reader(reader: R) -> Result<Self, Word2MdError> {
        let mut archive = ZipArchive::new(reader)?;

        let content_types = match read_entry(&mut archive, CONTENT_TYPES)? {
            Some(xml) => ContentTypes::parse(&xml)?,
            None => ContentTypes::default(),
        };

        let main_document = match read_entry(&mut archive, PACKAGE_RELS)? {
            Some(xml) => parse_relationships(&xml, "")?
                .into_iter()
                .find(|r| r.rel_type.ends_with(OFFICE_DOCUMENT_REL))
                .and_then(|r| r.part_name())
                .unwrap_or_else(|| DEFAULT_MAIN_DOCUMENT.to_string()),
            None => DEFAULT_MAIN_DOCUMENT.to_string(),
        };

        if archive.by_name(&main_document).is_err() {
            return Err(Word2MdError::MissingPart {
                name: main_document,
            });
        }

        let (dir, file) = split_part_name(&main_document);
        let rels_name = if dir.is_empty() {
            format!("_rels/{file}.rels")
        } else {
            format!("{dir}/_rels/{file}.rels")
        };
        let relationships = match read_entry(&mut archive, &rels_name)? {
            Some(xml) => parse_relationships(&xml, dir)?,
            None => Vec::new(),
        };

        debug!(
            "Opened package: main part '{}', {} relationships",
            main_document,
            relationships.len()
        );

        Ok(Self {
            archive,
            main_document,
            relationships,
            content_types,
        })
    }

    /// Name of the main document part, normally `word/document.xml`.
    pub fn main_document_name(&self) -> &str {
        &self.main_document
    }

    /// Bytes of the main document part.
    pub fn main_document(&mut self) -> Result<Vec<u8>, Word2MdError> {
        let name = self.main_document.clone();
        self.read_part(&name)
    }

    /// Look up a relationship of the main document by id.
    pub fn relationship(&self, id: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.id == id)
    }

    /// Content type of a part by name.
    pub fn content_type(&self, part_name: &str) -> Option<&str> {
        self.content_types.get(part_name)
    }

    /// Read a part that must exist.
    pub fn read_part(&mut self, name: &str) -> Result<Vec<u8>, Word2MdError> {
        read_entry(&mut self.archive, name)?.ok_or_else(|| Word2MdError::MissingPart {
            name: name.to_string(),
        })
    }

    /// Read a part that may be absent (`styles.xml`, `numbering.xml`, …).
    pub fn read_optional_part(&mut self, name: &str) -> Result<Option<Vec<u8>>, Word2MdError> {
        read_entry(&mut self.archive, name)
    }

    /// Read a sibling part of the main document, e.g. `styles.xml`.
    pub fn read_sibling_part(&mut self, file_name: &str) -> Result<Option<Vec<u8>>, Word2MdError> {
        let (dir, _) = split_part_name(&self.main_document);
        let name = if dir.is_empty() {
            file_name.to_string()
        } else {
            format!("{dir}/{file_name}")
        };
        self.read_optional_part(&name)
    }

    /// Document properties from `docProps/core.xml` plus the number of
    /// image relationships.
    pub fn metadata(&mut self) -> Result<DocumentMetadata, Word2MdError> {
        let mut meta = match self.read_optional_part("docProps/core.xml")? {
            Some(xml) => parse_core_properties(&xml)?,
            None => DocumentMetadata::default(),
        };
        meta.image_count = self.relationships.iter().filter(|r| r.is_image()).count();
        Ok(meta)
    }
}

impl<R: Read + Seek> PartSource for DocxPackage<R> {
    fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    fn read_part_blob(&mut self, rel: &Relationship) -> Result<Vec<u8>, Word2MdError> {
        let name = rel.part_name().ok_or_else(|| Word2MdError::MissingPart {
            name: rel.target.clone(),
        })?;
        self.read_part(&name)
    }

    fn part_content_type(&self, rel: &Relationship) -> Option<String> {
        rel.part_name()
            .and_then(|name| self.content_types.get(&name).map(str::to_string))
    }
}

// ── Core properties ──────────────────────────────────────────────────────

/// Parse `docProps/core.xml`.
pub fn parse_core_properties(xml: &[u8]) -> Result<DocumentMetadata, Word2MdError> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut meta = DocumentMetadata::default();
    let mut current: Vec<u8> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => current = local_name(e.name().as_ref()).to_vec(),
            Event::Text(e) => {
                let text = e.unescape()?.trim().to_string();
                let slot = match current.as_slice() {
                    b"title" => Some(&mut meta.title),
                    b"creator" => Some(&mut meta.author),
                    b"subject" => Some(&mut meta.subject),
                    b"description" => Some(&mut meta.description),
                    b"keywords" => Some(&mut meta.keywords),
                    b"lastModifiedBy" => Some(&mut meta.last_modified_by),
                    b"created" => Some(&mut meta.created),
                    b"modified" => Some(&mut meta.modified),
                    b"revision" => Some(&mut meta.revision),
                    _ => None,
                };
                if let Some(slot) = slot {
                    if !text.is_empty() {
                        *slot = Some(text);
                    }
                }
            }
            Event::End(_) => current.clear(),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(meta)
}

// ── XML helpers ──────────────────────────────────────────────────────────

/// Strip a namespace prefix: `w:p` → `p`.
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().rposition(|b| *b == b':') {
        Some(i) => &name[i + 1..],
        None => name,
    }
}

/// Value of the attribute whose local name is `key`, unescaped.
pub(crate) fn attr_value<B>(reader: &Reader<B>, element: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in element.attributes().with_checks(false) {
        let attr = attr.ok()?;
        if local_name(attr.key.as_ref()) == key {
            if let Ok(value) = attr.decode_and_unescape_value(reader) {
                return Some(value.into_owned());
            }
        }
    }
    None
}

fn split_part_name(name: &str) -> (&str, &str) {
    name.rsplit_once('/').unwrap_or(("", name))
}

/// The declared size comes from the archive and may be forged; anything
/// beyond the cap grows through `read_to_end` as real bytes arrive.
fn capacity_hint(declared: u64) -> usize {
    usize::try_from(declared.min(MAX_PREALLOCATE)).unwrap_or(0)
}

fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<Vec<u8>>, Word2MdError> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut bytes = Vec::with_capacity(capacity_hint(entry.size()));
    entry
        .read_to_end(&mut bytes)
        .map_err(|e| Word2MdError::CorruptPackage {
            detail: format!("{name}: {e}"),
        })?;
    Ok(Some(bytes))
}
