//! HTML fragment → Markdown via ordered regex passes.
//!
//! ## Why regexes and not a DOM?
//!
//! The input is the fragment produced by [`crate::pipeline::html`]: flat,
//! predictable markup with one element kind per construct. A handful of
//! ordered passes is enough for it and never fails: malformed or unexpected
//! markup simply survives a pass untouched and is stripped by the final
//! cleanup. Nested elements of the same kind (a list inside a list, bold
//! inside bold) are not handled; the innermost match wins.
//!
//! ## Pass Order
//!
//! ```text
//! headings ─▶ paragraphs ─▶ emphasis ─▶ links ─▶ images ─▶ ul ─▶ ol ─▶ tables ─▶ cleanup
//! ```
//!
//! Paragraphs go before lists and tables so `<p>` inside `<li>`/`<td>`
//! has already become plain text when the container pass trims it.
//!
//! Every tag pattern ends in `\b`, so `<b` never matches `<br>`, `<i` never
//! matches `<img>` and `<p` never matches `<pre>`.

use crate::pipeline::postprocess;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Convert an HTML fragment to Markdown.
///
/// `default_caption` is used as alt text for images that have none.
pub fn html_to_markdown(html: &str, default_caption: &str) -> String {
    let s = convert_headings(html);
    let s = convert_paragraphs(&s);
    let s = convert_emphasis(&s);
    let s = convert_links(&s);
    let s = convert_images(&s, default_caption);
    let s = convert_unordered_lists(&s);
    let s = convert_ordered_lists(&s);
    let s = convert_tables(&s);
    postprocess::clean_markdown(&s)
}

// ── Pass 1: Headings ─────────────────────────────────────────────────────

static RE_HEADINGS: Lazy<Vec<(usize, Regex)>> = Lazy::new(|| {
    (1..=6)
        .rev()
        .map(|n| {
            let re = Regex::new(&format!(r"(?is)<h{n}\b[^>]*>(.*?)</h{n}\s*>")).unwrap();
            (n, re)
        })
        .collect()
});

fn convert_headings(input: &str) -> String {
    let mut s = input.to_string();
    for (level, re) in RE_HEADINGS.iter() {
        s = re
            .replace_all(&s, |caps: &Captures<'_>| {
                format!("{} {}\n\n", "#".repeat(*level), caps[1].trim())
            })
            .into_owned();
    }
    s
}

// ── Pass 2: Paragraphs ───────────────────────────────────────────────────

static RE_PARAGRAPH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<p\b[^>]*>(.*?)</p\s*>").unwrap());

fn convert_paragraphs(input: &str) -> String {
    RE_PARAGRAPH
        .replace_all(input, |caps: &Captures<'_>| {
            let inner = caps[1].trim();
            if inner.is_empty() {
                String::new()
            } else {
                format!("{inner}\n\n")
            }
        })
        .into_owned()
}

// ── Pass 3: Bold / italic ────────────────────────────────────────────────

static RE_BOLD: Lazy<Vec<Regex>> = Lazy::new(|| {
    ["b", "strong"]
        .iter()
        .map(|t| Regex::new(&format!(r"(?is)<{t}\b[^>]*>(.*?)</{t}\s*>")).unwrap())
        .collect()
});

static RE_ITALIC: Lazy<Vec<Regex>> = Lazy::new(|| {
    ["i", "em"]
        .iter()
        .map(|t| Regex::new(&format!(r"(?is)<{t}\b[^>]*>(.*?)</{t}\s*>")).unwrap())
        .collect()
});

fn convert_emphasis(input: &str) -> String {
    let mut s = input.to_string();
    for re in RE_BOLD.iter() {
        s = re.replace_all(&s, "**${1}**").into_owned();
    }
    for re in RE_ITALIC.iter() {
        s = re.replace_all(&s, "*${1}*").into_owned();
    }
    s
}

// ── Pass 4: Links ────────────────────────────────────────────────────────

static RE_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?\bhref\s*=\s*"([^"]*)"[^>]*>(.*?)</a\s*>"#).unwrap()
});

fn convert_links(input: &str) -> String {
    RE_LINK.replace_all(input, "[${2}](${1})").into_owned()
}

// ── Pass 5: Images ───────────────────────────────────────────────────────

static RE_IMG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<img\b[^>]*>").unwrap());
static RE_SRC: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\ssrc\s*=\s*"([^"]*)""#).unwrap());
static RE_ALT: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\salt\s*=\s*"([^"]*)""#).unwrap());

/// `<img>` → `![alt](src)`. Attribute order is irrelevant; a tag without a
/// usable `src` is left for the cleanup pass to strip.
fn convert_images(input: &str, default_caption: &str) -> String {
    RE_IMG
        .replace_all(input, |caps: &Captures<'_>| {
            let tag = &caps[0];
            let src = RE_SRC
                .captures(tag)
                .map(|c| c[1].trim().to_string())
                .unwrap_or_default();
            if src.is_empty() {
                return tag.to_string();
            }
            let alt = RE_ALT
                .captures(tag)
                .map(|c| c[1].trim().to_string())
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| default_caption.to_string());
            format!("![{alt}]({src})\n\n")
        })
        .into_owned()
}

// ── Pass 6/7: Lists ──────────────────────────────────────────────────────

static RE_UL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<ul\b[^>]*>(.*?)</ul\s*>").unwrap());
static RE_OL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<ol\b[^>]*>(.*?)</ol\s*>").unwrap());
static RE_LI: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<li\b[^>]*>(.*?)</li\s*>").unwrap());
static RE_ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Text of every non-empty `<li>`, tags stripped and trimmed, with the
/// item's position among all `<li>` elements (empty ones included).
fn list_items(inner: &str) -> Vec<(usize, String)> {
    RE_LI
        .captures_iter(inner)
        .map(|c| RE_ANY_TAG.replace_all(&c[1], "").trim().to_string())
        .enumerate()
        .filter(|(_, item)| !item.is_empty())
        .collect()
}

fn render_list(items: Vec<(usize, String)>, marker: impl Fn(usize) -> String) -> String {
    if items.is_empty() {
        return String::new();
    }
    let lines: Vec<String> = items
        .iter()
        .map(|(i, item)| format!("{}{}", marker(*i), item))
        .collect();
    format!("{}\n\n", lines.join("\n"))
}

fn convert_unordered_lists(input: &str) -> String {
    RE_UL
        .replace_all(input, |caps: &Captures<'_>| {
            render_list(list_items(&caps[1]), |_| "- ".to_string())
        })
        .into_owned()
}

fn convert_ordered_lists(input: &str) -> String {
    RE_OL
        .replace_all(input, |caps: &Captures<'_>| {
            render_list(list_items(&caps[1]), |i| format!("{}. ", i + 1))
        })
        .into_owned()
}

// ── Pass 8: Tables ───────────────────────────────────────────────────────

static RE_TABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<table\b[^>]*>(.*?)</table\s*>").unwrap());
static RE_TR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr\s*>").unwrap());
static RE_CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<t[hd]\b[^>]*>(.*?)</t[hd]\s*>").unwrap());
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn cell_text(raw: &str) -> String {
    let text = RE_ANY_TAG.replace_all(raw, " ");
    let text = RE_WHITESPACE.replace_all(&text, " ");
    text.trim().replace('|', "\\|")
}

/// Rows become `| a | b |`; the first emitted row is always followed by a
/// separator sized to its cell count. Rows without cells are skipped.
fn convert_tables(input: &str) -> String {
    RE_TABLE
        .replace_all(input, |caps: &Captures<'_>| {
            let mut lines: Vec<String> = Vec::new();
            for row in RE_TR.captures_iter(&caps[1]) {
                let cells: Vec<String> = RE_CELL
                    .captures_iter(&row[1])
                    .map(|c| cell_text(&c[1]))
                    .collect();
                if cells.is_empty() {
                    continue;
                }
                lines.push(format!("| {} |", cells.join(" | ")));
                if lines.len() == 1 {
                    lines.push(format!("|{}", " --- |".repeat(cells.len())));
                }
            }
            if lines.is_empty() {
                String::new()
            } else {
                format!("{}\n\n", lines.join("\n"))
            }
        })
        .into_owned()
}
