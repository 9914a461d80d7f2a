//! Post-processing: the final cleanup pass of the HTML → Markdown rewrite.
//!
//! ## Why a separate pass?
//!
//! The structural passes in [`crate::pipeline::markdown`] only rewrite the
//! elements they know. Whatever HTML is left (`<br>`, `<span>`, `<div>`,
//! stray closing tags, entities) has to go before the text is written out.
//! Keeping that here lets each structural pass assume nothing about the
//! markup around it.
//!
//! ## Rule Order
//!
//! Breaks are turned into newlines before tags are stripped (otherwise they
//! would vanish), and entities are decoded only after stripping so that an
//! escaped `&lt;b&gt;` in the text survives as a literal `<b>`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to transformer output.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF → LF)
/// 2. `<br>` (any form) → newline
/// 3. Strip every remaining tag
/// 4. Decode HTML entities
/// 5. Collapse 3+ consecutive newlines into one blank line
/// 6. Trim leading and trailing whitespace
///
/// Running it again on its own output changes nothing for ordinary Markdown.
/// Text that still contains entity-like or tag-like sequences after one
/// pass (a literal `&amp;lt;`, `a < b > c`) is decoded or stripped again.
pub fn clean_markdown(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = convert_line_breaks(&s);
    let s = strip_tags(&s);
    let s = decode_entities(&s);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Line breaks ──────────────────────────────────────────────────────

static RE_BR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\b[^>]*>").unwrap());

fn convert_line_breaks(input: &str) -> String {
    RE_BR.replace_all(input, "\n").into_owned()
}

// ── Rule 3: Strip remaining tags ─────────────────────────────────────────────

static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

fn strip_tags(input: &str) -> String {
    RE_TAG.replace_all(input, "").into_owned()
}

// ── Rule 4: Decode entities ──────────────────────────────────────────────────

fn decode_entities(input: &str) -> String {
    html_escape::decode_html_entities(input).into_owned()
}

// ── Rule 5: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").into_owned()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_line_breaks_all_forms() {
        assert_eq!(convert_line_breaks("a<br>b<BR/>c<br />d"), "a\nb\nc\nd");
    }

    #[test]
    fn test_bold_tag_is_not_a_break() {
        assert_eq!(convert_line_breaks("<b>x</b>"), "<b>x</b>");
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<div><span class=\"x\">hi</span></div>"), "hi");
    }

    #[test]
    fn test_decode_after_strip_keeps_literal_markup() {
        assert_eq!(clean_markdown("&lt;b&gt; is bold &amp; more"), "<b> is bold & more");
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_clean_markdown_full_pipeline() {
        let input = "\n\n# Title\r\n\r\n\r\n<div>Some<br>text</div>\n\n\n\n- a\n- b\n\n";
        assert_eq!(clean_markdown(input), "# Title\n\nSome\ntext\n\n- a\n- b");
    }

    #[test]
    fn test_clean_markdown_idempotent() {
        let input = "# Title\n\nSome **bold** and *it* with [link](https://x.org/?a=1).\n\n\
                     | A | B |\n| --- | --- |\n| 1 | 2 |\n\n![image](images/image_000.png)";
        let once = clean_markdown(input);
        let twice = clean_markdown(&once);
        assert_eq!(once, input);
        assert_eq!(once, twice);
    }
}
