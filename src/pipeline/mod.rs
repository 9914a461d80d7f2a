//! Pipeline stages for Word-to-Markdown conversion.
//!
//! Each submodule implements exactly one transformation step, so each is
//! testable on its own and the two backends can share what they have in
//! common (input validation and math normalisation).
//!
//! ## Data Flow
//!
//! ```text
//!            ┌─▶ pandoc (primary) ─▶ math ────────────────────────┐
//! input ─────┤                                                    ├─▶ write
//!            └─▶ package ─▶ images ─▶ html ─▶ math ─▶ markdown ───┘
//!                (zip/xml)  (files)   (embedded)      (+postprocess)
//! ```
//!
//! 1. [`input`]    - check the file exists and sniff its container
//! 2. [`package`]  - open the ZIP, parse relationships and content types
//! 3. [`images`]   - copy embedded image parts to `image_NNN.ext`
//! 4. [`html`]     - WordprocessingML → HTML fragment, with an image callback
//! 5. [`encode`]   - base64 `data:` URIs for inline-image mode
//! 6. [`math`]     - Unicode math glyphs → LaTeX, delimiter-aware
//! 7. [`markdown`] - ordered regex passes HTML → Markdown
//! 8. [`postprocess`] - final tag/entity/whitespace cleanup

pub mod encode;
pub mod html;
pub mod images;
pub mod input;
pub mod markdown;
pub mod math;
pub mod package;
pub mod postprocess;
