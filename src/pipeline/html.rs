//! Embedded `.docx` → HTML converter (secondary backend, first half).
//!
//! ## Why HTML first?
//!
//! When pandoc is unavailable we still want headings, emphasis, links,
//! lists, tables and images. Emitting a small, predictable HTML fragment
//! and then rewriting it with [`crate::pipeline::markdown`] keeps the two
//! concerns apart: this module knows WordprocessingML, the transformer
//! knows Markdown.
//!
//! ## What is recognised
//!
//! | WordprocessingML | HTML |
//! |------------------|------|
//! | paragraph styled `heading N` / `Title` | `<hN>` / `<h1>` |
//! | paragraph with `w:numPr` | `<li>` inside `<ul>` or `<ol>` (from `numbering.xml`) |
//! | other paragraphs | `<p>` |
//! | run with `w:b` / `w:i` | `<strong>` / `<em>` |
//! | `w:hyperlink` | `<a href>` |
//! | `a:blip` / `v:imagedata` | `<img>` via the image callback |
//! | `w:tbl` | `<table><tr><td>` |
//!
//! Paragraph styles outside that set are rendered as `<p>` and reported once
//! each in [`HtmlConversion::messages`].

use crate::error::Word2MdError;
use crate::pipeline::package::{attr_value, local_name, DocxPackage, PartSource};
use html_escape::{encode_double_quoted_attribute, encode_text};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Read, Seek};
use tracing::debug;

/// Output of [`convert_to_html`].
#[derive(Debug, Clone, Default)]
pub struct HtmlConversion {
    /// HTML fragment (no `<html>`/`<body>` wrapper).
    pub html: String,
    /// Warnings about content that was simplified or dropped.
    pub messages: Vec<String>,
}

/// Convert the main document part of `package` to an HTML fragment.
///
/// `on_image(bytes, content_type)` is called once per embedded image in
/// document order and returns the `src` to emit. An error from the callback
/// (or from reading the image part) drops that image and adds a message.
pub fn convert_to_html<R, F>(
    package: &mut DocxPackage<R>,
    mut on_image: F,
) -> Result<HtmlConversion, Word2MdError>
where
    R: Read + Seek,
    F: FnMut(&[u8], &str) -> Result<String, Word2MdError>,
{
    let styles = match package.read_sibling_part("styles.xml")? {
        Some(xml) => StyleNames::parse(&xml)?,
        None => StyleNames::default(),
    };
    let numbering = match package.read_sibling_part("numbering.xml")? {
        Some(xml) => Numbering::parse(&xml)?,
        None => Numbering::default(),
    };
    let document = package.main_document()?;

    let mut walker = Walker::new(&styles, &numbering);
    let mut reader = Reader::from_reader(document.as_slice());
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => walker.start(&reader, e, package, &mut on_image),
            Event::Empty(ref e) => {
                walker.start(&reader, e, package, &mut on_image);
                walker.end(local_name(e.name().as_ref()));
            }
            Event::End(ref e) => walker.end(local_name(e.name().as_ref())),
            Event::Text(ref e) => {
                if walker.in_text {
                    let text = e.unescape()?;
                    walker.push_run_html(&encode_text(&text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let out = walker.finish();
    debug!(
        "Embedded converter produced {} bytes of HTML, {} messages",
        out.html.len(),
        out.messages.len()
    );
    Ok(out)
}

// ── styles.xml ───────────────────────────────────────────────────────────

/// Style id → display name.
#[derive(Debug, Default)]
struct StyleNames {
    names: HashMap<String, String>,
}

impl StyleNames {
    fn parse(xml: &[u8]) -> Result<Self, Word2MdError> {
        let mut reader = Reader::from_reader(xml);
        reader.trim_text(true);
        let mut buf = Vec::new();
        let mut names = HashMap::new();
        let mut current: Option<String> = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) | Event::Empty(ref e) => match local_name(e.name().as_ref()) {
                    b"style" => current = attr_value(&reader, e, b"styleId"),
                    b"name" => {
                        if let (Some(id), Some(name)) = (current.as_ref(), attr_value(&reader, e, b"val")) {
                            names.insert(id.clone(), name);
                        }
                    }
                    _ => {}
                },
                Event::End(ref e) => {
                    if local_name(e.name().as_ref()) == b"style" {
                        current = None;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(Self { names })
    }

    fn name<'a>(&'a self, id: &'a str) -> &'a str {
        self.names.get(id).map(String::as_str).unwrap_or(id)
    }
}

// ── numbering.xml ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn tag(self) -> &'static str {
        match self {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
        }
    }
}

/// `numId` → abstract definition → per-level `numFmt`.
#[derive(Debug, Default)]
struct Numbering {
    num_to_abstract: HashMap<String, String>,
    formats: HashMap<(String, u32), String>,
}

impl Numbering {
    fn parse(xml: &[u8]) -> Result<Self, Word2MdError> {
        let mut reader = Reader::from_reader(xml);
        reader.trim_text(true);
        let mut buf = Vec::new();
        let mut out = Numbering::default();
        let mut abstract_id: Option<String> = None;
        let mut level: Option<u32> = None;
        let mut num_id: Option<String> = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) | Event::Empty(ref e) => match local_name(e.name().as_ref()) {
                    b"abstractNum" => abstract_id = attr_value(&reader, e, b"abstractNumId"),
                    b"lvl" => level = attr_value(&reader, e, b"ilvl").and_then(|v| v.parse().ok()),
                    b"numFmt" => {
                        if let (Some(a), Some(l), Some(fmt)) =
                            (abstract_id.as_ref(), level, attr_value(&reader, e, b"val"))
                        {
                            out.formats.insert((a.clone(), l), fmt);
                        }
                    }
                    b"num" => num_id = attr_value(&reader, e, b"numId"),
                    b"abstractNumId" => {
                        if let (Some(n), Some(a)) = (num_id.as_ref(), attr_value(&reader, e, b"val")) {
                            out.num_to_abstract.insert(n.clone(), a);
                        }
                    }
                    _ => {}
                },
                Event::End(ref e) => match local_name(e.name().as_ref()) {
                    b"abstractNum" => abstract_id = None,
                    b"lvl" => level = None,
                    b"num" => num_id = None,
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(out)
    }

    /// `None` when the paragraph is explicitly un-numbered.
    fn kind(&self, num_id: &str, ilvl: u32) -> Option<ListKind> {
        if num_id == "0" {
            return None;
        }
        let fmt = self
            .num_to_abstract
            .get(num_id)
            .and_then(|a| self.formats.get(&(a.clone(), ilvl)));
        match fmt.map(String::as_str) {
            Some("none") => None,
            Some("bullet") | None => Some(ListKind::Unordered),
            Some(_) => Some(ListKind::Ordered),
        }
    }
}

// ── document.xml ─────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Paragraph {
    style_id: Option<String>,
    num_id: Option<String>,
    ilvl: u32,
    segments: Vec<Segment>,
}

#[derive(Debug, Default)]
struct Run {
    bold: bool,
    italic: bool,
    html: String,
}

/// A stretch of paragraph content with uniform formatting.
#[derive(Debug)]
struct Segment {
    bold: bool,
    italic: bool,
    link: Option<String>,
    html: String,
}

impl Segment {
    fn render(&self) -> String {
        let mut s = self.html.clone();
        if self.italic {
            s = format!("<em>{s}</em>");
        }
        if self.bold {
            s = format!("<strong>{s}</strong>");
        }
        if let Some(href) = &self.link {
            s = format!("<a href=\"{}\">{s}</a>", encode_double_quoted_attribute(href));
        }
        s
    }
}

struct Walker<'s> {
    styles: &'s StyleNames,
    numbering: &'s Numbering,
    html: String,
    messages: Vec<String>,
    // Stacks: text boxes nest paragraphs inside runs.
    paragraphs: Vec<Paragraph>,
    runs: Vec<Run>,
    in_rpr: bool,
    in_text: bool,
    link: Option<String>,
    image_alt: Option<String>,
    open_list: Option<ListKind>,
}

impl<'s> Walker<'s> {
    fn new(styles: &'s StyleNames, numbering: &'s Numbering) -> Self {
        Self {
            styles,
            numbering,
            html: String::new(),
            messages: Vec::new(),
            paragraphs: Vec::new(),
            runs: Vec::new(),
            in_rpr: false,
            in_text: false,
            link: None,
            image_alt: None,
            open_list: None,
        }
    }

    fn start<R, F>(
        &mut self,
        reader: &Reader<&[u8]>,
        e: &BytesStart,
        package: &mut DocxPackage<R>,
        on_image: &mut F,
    ) where
        R: Read + Seek,
        F: FnMut(&[u8], &str) -> Result<String, Word2MdError>,
    {
        let in_run = !self.runs.is_empty();
        match local_name(e.name().as_ref()) {
            b"p" => self.paragraphs.push(Paragraph::default()),
            b"pStyle" if !in_run => {
                if let Some(p) = self.paragraphs.last_mut() {
                    p.style_id = attr_value(reader, e, b"val");
                }
            }
            b"ilvl" if !in_run => {
                if let Some(p) = self.paragraphs.last_mut() {
                    p.ilvl = attr_value(reader, e, b"val")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(0);
                }
            }
            b"numId" if !in_run => {
                if let Some(p) = self.paragraphs.last_mut() {
                    p.num_id = attr_value(reader, e, b"val");
                }
            }
            b"r" => self.runs.push(Run::default()),
            b"rPr" => self.in_rpr = in_run,
            b"b" if self.in_rpr => {
                let on = toggle_value(reader, e);
                if let Some(r) = self.runs.last_mut() {
                    r.bold = on;
                }
            }
            b"i" if self.in_rpr => {
                let on = toggle_value(reader, e);
                if let Some(r) = self.runs.last_mut() {
                    r.italic = on;
                }
            }
            b"t" => self.in_text = in_run,
            b"tab" if in_run && !self.in_rpr => self.push_run_html("\t"),
            b"br" | b"cr" if in_run => self.push_run_html("<br />"),
            b"hyperlink" => self.link = self.hyperlink_target(reader, e, package),
            b"drawing" | b"pict" => self.image_alt = None,
            b"docPr" => {
                self.image_alt = attr_value(reader, e, b"descr").filter(|d| !d.trim().is_empty());
            }
            b"blip" => {
                if let Some(id) = attr_value(reader, e, b"embed") {
                    self.image(&id, package, on_image);
                }
            }
            b"imagedata" => {
                if self.image_alt.is_none() {
                    self.image_alt = attr_value(reader, e, b"title").filter(|t| !t.trim().is_empty());
                }
                if let Some(id) = attr_value(reader, e, b"id") {
                    self.image(&id, package, on_image);
                }
            }
            b"tbl" => {
                self.close_list();
                self.html.push_str("<table>");
            }
            b"tr" => self.html.push_str("<tr>"),
            b"tc" => {
                self.close_list();
                self.html.push_str("<td>");
            }
            _ => {}
        }
    }

    fn end(&mut self, local: &[u8]) {
        match local {
            b"p" => self.finish_paragraph(),
            b"r" => self.finish_run(),
            b"rPr" => self.in_rpr = false,
            b"t" => self.in_text = false,
            b"hyperlink" => self.link = None,
            b"drawing" | b"pict" => self.image_alt = None,
            b"tc" => {
                self.close_list();
                self.html.push_str("</td>");
            }
            b"tr" => self.html.push_str("</tr>"),
            b"tbl" => {
                self.close_list();
                self.html.push_str("</table>");
            }
            _ => {}
        }
    }

    fn finish(mut self) -> HtmlConversion {
        while !self.paragraphs.is_empty() {
            self.finish_paragraph();
        }
        self.close_list();
        HtmlConversion {
            html: self.html,
            messages: self.messages,
        }
    }

    fn push_run_html(&mut self, html: &str) {
        if let Some(run) = self.runs.last_mut() {
            run.html.push_str(html);
        } else if let Some(p) = self.paragraphs.last_mut() {
            p.segments.push(Segment {
                bold: false,
                italic: false,
                link: self.link.clone(),
                html: html.to_string(),
            });
        }
    }

    fn finish_run(&mut self) {
        let Some(run) = self.runs.pop() else {
            return;
        };
        if run.html.is_empty() {
            return;
        }
        let Some(p) = self.paragraphs.last_mut() else {
            self.html.push_str(&run.html);
            return;
        };
        match p.segments.last_mut() {
            Some(last) if last.bold == run.bold && last.italic == run.italic && last.link == self.link => {
                last.html.push_str(&run.html);
            }
            _ => p.segments.push(Segment {
                bold: run.bold,
                italic: run.italic,
                link: self.link.clone(),
                html: run.html,
            }),
        }
    }

    fn finish_paragraph(&mut self) {
        let Some(p) = self.paragraphs.pop() else {
            return;
        };
        let inner: String = p.segments.iter().map(Segment::render).collect();
        let heading = p.style_id.as_deref().and_then(|id| self.heading_level(id));

        if heading.is_none() {
            let list = p
                .num_id
                .as_deref()
                .and_then(|n| self.numbering.kind(n, p.ilvl));
            if let Some(kind) = list {
                if inner.trim().is_empty() {
                    return;
                }
                if self.open_list != Some(kind) {
                    self.close_list();
                    self.html.push_str(&format!("<{}>", kind.tag()));
                    self.open_list = Some(kind);
                }
                self.html.push_str(&format!("<li>{inner}</li>"));
                return;
            }
        }

        self.close_list();
        if let (None, Some(id)) = (heading, p.style_id.as_deref()) {
            self.check_style(id);
        }
        if inner.trim().is_empty() {
            return;
        }
        match heading {
            Some(n) => self.html.push_str(&format!("<h{n}>{inner}</h{n}>")),
            None => self.html.push_str(&format!("<p>{inner}</p>")),
        }
    }

    fn close_list(&mut self) {
        if let Some(kind) = self.open_list.take() {
            self.html.push_str(&format!("</{}>", kind.tag()));
        }
    }

    fn heading_level(&self, style_id: &str) -> Option<u8> {
        let name = self.styles.name(style_id).to_ascii_lowercase();
        if name == "title" {
            return Some(1);
        }
        let from_name: Option<u8> = name.strip_prefix("heading ").and_then(|n| n.trim().parse().ok());
        let from_id: Option<u8> = style_id.strip_prefix("Heading").and_then(|n| n.parse().ok());
        from_name.or(from_id).filter(|n| (1..=6).contains(n))
    }

    fn check_style(&mut self, style_id: &str) {
        let name = self.styles.name(style_id);
        if matches!(name.to_ascii_lowercase().as_str(), "normal" | "list paragraph") {
            return;
        }
        let msg = format!("Unrecognised paragraph style: '{name}' (Style ID: {style_id})");
        if !self.messages.contains(&msg) {
            self.messages.push(msg);
        }
    }

    fn hyperlink_target<R: Read + Seek>(
        &self,
        reader: &Reader<&[u8]>,
        e: &BytesStart,
        package: &DocxPackage<R>,
    ) -> Option<String> {
        if let Some(id) = attr_value(reader, e, b"id") {
            if let Some(rel) = package.relationship(&id) {
                return Some(rel.target.clone());
            }
        }
        attr_value(reader, e, b"anchor").map(|a| format!("#{a}"))
    }

    fn image<R, F>(&mut self, rel_id: &str, package: &mut DocxPackage<R>, on_image: &mut F)
    where
        R: Read + Seek,
        F: FnMut(&[u8], &str) -> Result<String, Word2MdError>,
    {
        let Some(rel) = package.relationship(rel_id).cloned() else {
            self.messages
                .push(format!("Image relationship '{rel_id}' not found; image dropped"));
            return;
        };
        let content_type = package.part_content_type(&rel).unwrap_or_default();
        let src = match package.read_part_blob(&rel) {
            Ok(bytes) => on_image(&bytes, &content_type),
            Err(e) => Err(e),
        };
        match src {
            Ok(src) => {
                let alt = self.image_alt.clone().unwrap_or_default();
                let tag = format!(
                    "<img src=\"{}\" alt=\"{}\" />",
                    encode_double_quoted_attribute(&src),
                    encode_double_quoted_attribute(&alt)
                );
                self.push_run_html(&tag);
            }
            Err(e) => self
                .messages
                .push(format!("Image '{}' could not be converted: {e}", rel.target)),
        }
    }
}

/// `<w:b/>` is on; `w:val` of `0`, `false` or `off` turns it off.
fn toggle_value(reader: &Reader<&[u8]>, e: &BytesStart) -> bool {
    !matches!(
        attr_value(reader, e, b"val").as_deref(),
        Some("0") | Some("false") | Some("off")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;

    const W: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing""#;

    const RELS: &str = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/a?b=1&amp;c=2" TargetMode="External"/>
</Relationships>"#;

    const STYLES: &str = r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/></w:style>
<w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/></w:style>
<w:style w:type="paragraph" w:styleId="Quote"><w:name w:val="Quote"/></w:style>
</w:styles>"#;

    const NUMBERING: &str = r#"<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:abstractNum w:abstractNumId="10"><w:lvl w:ilvl="0"><w:numFmt w:val="bullet"/></w:lvl></w:abstractNum>
<w:abstractNum w:abstractNumId="11"><w:lvl w:ilvl="0"><w:numFmt w:val="decimal"/></w:lvl></w:abstractNum>
<w:num w:numId="1"><w:abstractNumId w:val="10"/></w:num>
<w:num w:numId="2"><w:abstractNumId w:val="11"/></w:num>
</w:numbering>"#;

    fn package(body: &str) -> DocxPackage<Cursor<Vec<u8>>> {
        let doc = format!(r#"<w:document {W}><w:body>{body}</w:body></w:document>"#);
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in [
            ("word/document.xml", doc.as_bytes()),
            ("word/_rels/document.xml.rels", RELS.as_bytes()),
            ("word/styles.xml", STYLES.as_bytes()),
            ("word/numbering.xml", NUMBERING.as_bytes()),
            ("word/media/image1.png", b"\x89PNG\r\n\x1a\n".as_slice()),
        ] {
            zip.start_file(name, FileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        let bytes = zip.finish().unwrap().into_inner();
        DocxPackage::from_reader(Cursor::new(bytes)).unwrap()
    }

    fn convert(body: &str) -> HtmlConversion {
        let mut pkg = package(body);
        convert_to_html(&mut pkg, |_, _| Ok("images/x.png".to_string())).unwrap()
    }

    fn para(style: Option<&str>, text: &str) -> String {
        let ppr = style
            .map(|s| format!(r#"<w:pPr><w:pStyle w:val="{s}"/></w:pPr>"#))
            .unwrap_or_default();
        format!(r#"<w:p>{ppr}<w:r><w:t>{text}</w:t></w:r></w:p>"#)
    }

    #[test]
    fn headings_from_style_names() {
        let out = convert(&(para(Some("Heading2"), "Intro") + &para(Some("Title"), "Doc")));
        assert_eq!(out.html, "<h2>Intro</h2><h1>Doc</h1>");
        assert!(out.messages.is_empty());
    }

    #[test]
    fn plain_paragraph_keeps_spaces_and_escapes() {
        let out = convert(r#"<w:p><w:r><w:t xml:space="preserve">a &lt; b </w:t></w:r><w:r><w:t>&amp; c</w:t></w:r></w:p>"#);
        assert_eq!(out.html, "<p>a &lt; b &amp; c</p>");
    }

    #[test]
    fn run_formatting_merges_adjacent_runs() {
        let out = convert(
            r#"<w:p>
                <w:r><w:rPr><w:b/></w:rPr><w:t>bo</w:t></w:r>
                <w:r><w:rPr><w:b/></w:rPr><w:t>ld</w:t></w:r>
                <w:r><w:rPr><w:b w:val="0"/><w:i/></w:rPr><w:t>it</w:t></w:r>
            </w:p>"#,
        );
        assert_eq!(out.html, "<p><strong>bold</strong><em>it</em></p>");
    }

    #[test]
    fn paragraph_mark_formatting_is_ignored() {
        let out = convert(r#"<w:p><w:pPr><w:rPr><w:b/></w:rPr></w:pPr><w:r><w:t>x</w:t></w:r></w:p>"#);
        assert_eq!(out.html, "<p>x</p>");
    }

    #[test]
    fn hyperlinks_external_and_anchor() {
        let out = convert(
            r#"<w:p><w:hyperlink r:id="rId2"><w:r><w:t>site</w:t></w:r></w:hyperlink>
               <w:r><w:t xml:space="preserve"> and </w:t></w:r>
               <w:hyperlink w:anchor="sec1"><w:r><w:t>there</w:t></w:r></w:hyperlink></w:p>"#,
        );
        assert_eq!(
            out.html,
            r##"<p><a href="https://example.com/a?b=1&amp;c=2">site</a> and <a href="#sec1">there</a></p>"##
        );
    }

    #[test]
    fn numbered_paragraphs_become_lists() {
        let li = |num: &str, text: &str| {
            format!(
                r#"<w:p><w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="{num}"/></w:numPr></w:pPr><w:r><w:t>{text}</w:t></w:r></w:p>"#
            )
        };
        let body = li("1", "a") + &li("1", "b") + &li("2", "one") + &para(None, "after");
        let out = convert(&body);
        assert_eq!(
            out.html,
            "<ul><li>a</li><li>b</li></ul><ol><li>one</li></ol><p>after</p>"
        );
    }

    #[test]
    fn tables() {
        let cell = |t: &str| format!("<w:tc>{}</w:tc>", para(None, t));
        let row = |a: &str, b: &str| format!("<w:tr>{}{}</w:tr>", cell(a), cell(b));
        let out = convert(&format!("<w:tbl>{}{}</w:tbl>", row("A", "B"), row("1", "2")));
        assert_eq!(
            out.html,
            "<table><tr><td><p>A</p></td><td><p>B</p></td></tr><tr><td><p>1</p></td><td><p>2</p></td></tr></table>"
        );
    }

    #[test]
    fn images_go_through_callback() {
        let body = r#"<w:p><w:r><w:drawing><wp:inline><wp:docPr id="1" name="Picture 1" descr="A chart"/>
            <a:graphic><a:graphicData><a:blip r:embed="rId1"/></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#;
        let mut pkg = package(body);
        let mut seen = Vec::new();
        let out = convert_to_html(&mut pkg, |bytes, ct| {
            seen.push((bytes.len(), ct.to_string()));
            Ok("images/image_007.png".to_string())
        })
        .unwrap();
        assert_eq!(seen, vec![(8, String::new())]);
        assert_eq!(out.html, r#"<p><img src="images/image_007.png" alt="A chart" /></p>"#);
    }

    #[test]
    fn failed_image_is_dropped_with_message() {
        let body = r#"<w:p><w:r><w:drawing><a:blip r:embed="rId1"/></w:drawing><w:t>text</w:t></w:r></w:p>"#;
        let mut pkg = package(body);
        let out = convert_to_html(&mut pkg, |_, _| Err(Word2MdError::Internal("disk full".into()))).unwrap();
        assert_eq!(out.html, "<p>text</p>");
        assert_eq!(out.messages.len(), 1);
        assert!(out.messages[0].contains("disk full"));
    }

    #[test]
    fn unknown_style_reported_once() {
        let out = convert(&(para(Some("Quote"), "x") + &para(Some("Quote"), "y")));
        assert_eq!(out.html, "<p>x</p><p>y</p>");
        assert_eq!(
            out.messages,
            vec!["Unrecognised paragraph style: 'Quote' (Style ID: Quote)".to_string()]
        );
    }

    #[test]
    fn tabs_and_breaks() {
        let out = convert(r#"<w:p><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>c</w:t></w:r></w:p>"#);
        assert_eq!(out.html, "<p>a\tb<br />c</p>");
    }

    #[test]
    fn empty_paragraphs_are_dropped() {
        let out = convert("<w:p/><w:p><w:r><w:t></w:t></w:r></w:p>");
        assert_eq!(out.html, "");
    }
}
