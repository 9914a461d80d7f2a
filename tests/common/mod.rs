//! Shared fixtures: `.docx` packages assembled in memory with `zip::ZipWriter`.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::FileOptions;

const W_NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture""#;

const IMAGE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:style w:type="paragraph" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
<w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/></w:style>
<w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/></w:style>
<w:style w:type="paragraph" w:styleId="Sidebar"><w:name w:val="Sidebar Note"/></w:style>
</w:styles>"#;

/// A minimal but well-formed Word package.
#[derive(Default)]
pub struct DocxBuilder {
    body: String,
    images: Vec<(String, Vec<u8>)>,
    title: Option<String>,
    author: Option<String>,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A paragraph with an optional style id (`Heading1`, `Heading2`, …).
    pub fn paragraph(mut self, style: Option<&str>, text: &str) -> Self {
        let ppr = style
            .map(|s| format!(r#"<w:pPr><w:pStyle w:val="{s}"/></w:pPr>"#))
            .unwrap_or_default();
        self.body.push_str(&format!(
            r#"<w:p>{ppr}<w:r><w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#
        ));
        self
    }

    /// A paragraph holding one inline picture.
    pub fn image(mut self, alt: &str, file_name: &str, bytes: Vec<u8>) -> Self {
        let rel_id = format!("rIdImg{}", self.images.len() + 1);
        self.body.push_str(&format!(
            r#"<w:p><w:r><w:drawing><wp:inline><wp:docPr id="1" name="Picture" descr="{alt}"/><a:graphic><a:graphicData><pic:pic><pic:blipFill><a:blip r:embed="{rel_id}"/></pic:blipFill></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#
        ));
        self.images.push((file_name.to_string(), bytes));
        self
    }

    /// Raw WordprocessingML appended to the body.
    pub fn raw(mut self, xml: &str) -> Self {
        self.body.push_str(xml);
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn author(mut self, author: &str) -> Self {
        self.author = Some(author.to_string());
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document {W_NS}><w:body>{}</w:body></w:document>"#,
            self.body
        );

        let mut rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        rels.push_str(r#"<Relationship Id="rIdStyles" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#);
        for (i, (name, _)) in self.images.iter().enumerate() {
            rels.push_str(&format!(
                r#"<Relationship Id="rIdImg{}" Type="{IMAGE_REL}" Target="media/{name}"/>"#,
                i + 1
            ));
        }
        rels.push_str("</Relationships>");

        let mut core = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/">"#,
        );
        if let Some(t) = &self.title {
            core.push_str(&format!("<dc:title>{t}</dc:title>"));
        }
        if let Some(a) = &self.author {
            core.push_str(&format!("<dc:creator>{a}</dc:creator>"));
        }
        core.push_str("</cp:coreProperties>");

        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let mut put = |name: &str, data: &[u8]| {
            zip.start_file(name, FileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        };

        put("[Content_Types].xml", CONTENT_TYPES.as_bytes());
        put("_rels/.rels", ROOT_RELS.as_bytes());
        put("word/document.xml", document.as_bytes());
        put("word/_rels/document.xml.rels", rels.as_bytes());
        put("word/styles.xml", STYLES.as_bytes());
        put("docProps/core.xml", core.as_bytes());
        for (name, bytes) in &self.images {
            put(&format!("word/media/{name}"), bytes);
        }

        zip.finish().unwrap().into_inner()
    }

    pub fn write_to(&self, path: &Path) {
        std::fs::write(path, self.build()).unwrap();
    }
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Default Extension="png" ContentType="image/png"/>
<Default Extension="jpeg" ContentType="image/jpeg"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
</Relationships>"#;

/// A real 2×2 PNG.
pub fn tiny_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(2, 2, image::Rgb([200, 30, 30]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

/// A sample report: headings, math, an image and an unknown style.
pub fn sample_report() -> DocxBuilder {
    DocxBuilder::new()
        .title("Quarterly Report")
        .author("Ada Lovelace")
        .paragraph(Some("Heading1"), "Quarterly Report")
        .paragraph(None, "Growth was α ≤ 5 percent.")
        .image("Company logo", "image1.png", tiny_png())
        .paragraph(Some("Heading2"), "Details")
        .paragraph(Some("Sidebar"), "Aside text")
}

/// Write an executable shell script (unix only).
#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = std::fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).unwrap();
}
