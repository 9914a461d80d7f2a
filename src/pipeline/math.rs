//! Unicode math glyphs → LaTeX tokens.
//!
//! Word documents often carry formulas as plain Unicode (`α²`, `x ≤ y`)
//! rather than as equation objects. This pass rewrites every glyph from a
//! fixed table into its LaTeX token and makes sure it ends up inside a
//! `$…$` span.

/// Fixed glyph → LaTeX mapping.
pub const MATH_SYMBOLS: &[(&str, &str)] = &[
    ("α", r"\alpha"),
    ("β", r"\beta"),
    ("γ", r"\gamma"),
    ("δ", r"\delta"),
    ("ε", r"\varepsilon"),
    ("θ", r"\theta"),
    ("λ", r"\lambda"),
    ("μ", r"\mu"),
    ("π", r"\pi"),
    ("σ", r"\sigma"),
    ("φ", r"\varphi"),
    ("ω", r"\omega"),
    ("∑", r"\sum"),
    ("∫", r"\int"),
    ("∞", r"\infty"),
    ("∂", r"\partial"),
    ("±", r"\pm"),
    ("×", r"\times"),
    ("÷", r"\div"),
    ("≤", r"\leq"),
    ("≥", r"\geq"),
    ("≠", r"\neq"),
    ("≈", r"\approx"),
    ("√", r"\sqrt"),
    ("²", "^2"),
    ("³", "^3"),
    ("¹", "^1"),
    ("₀", "_0"),
    ("₁", "_1"),
    ("₂", "_2"),
    ("₃", "_3"),
    ("₄", "_4"),
];

const DELIMITER: char = '$';

/// Look up the LaTeX token for a glyph.
pub fn latex_for(glyph: &str) -> Option<&'static str> {
    MATH_SYMBOLS
        .iter()
        .find(|(g, _)| *g == glyph)
        .map(|(_, latex)| *latex)
}

/// Rewrite every known math glyph in `content` into LaTeX.
///
/// Occurrences are replaced right-to-left so the byte offsets of the ones
/// still to be processed stay valid. Whether an occurrence is already inside
/// a formula is decided by the parity of `$` characters before it: odd means
/// inside (bare token), even means outside (`$token$`).
///
/// This is a textual approximation. A stray `$` anywhere earlier in the text
/// (a price, an escaped dollar) flips every decision after it; a precise
/// version would track actual formula spans.
pub fn normalize_math(content: &str) -> String {
    let mut content = content.to_string();

    for (glyph, latex) in MATH_SYMBOLS {
        if !content.contains(glyph) {
            continue;
        }

        let offsets: Vec<usize> = content.match_indices(glyph).map(|(i, _)| i).collect();
        for start in offsets.into_iter().rev() {
            let end = start + glyph.len();
            let in_math = content[..start].matches(DELIMITER).count() % 2 == 1;
            let replacement = if in_math {
                (*latex).to_string()
            } else {
                format!("{DELIMITER}{latex}{DELIMITER}")
            };
            content.replace_range(start..end, &replacement);
        }
    }

    content
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_glyph_outside_math_is_wrapped() {
        for (glyph, latex) in MATH_SYMBOLS {
            assert_eq!(normalize_math(glyph), format!("${latex}$"), "glyph {glyph}");
        }
    }

    #[test]
    fn every_glyph_inside_math_is_bare() {
        for (glyph, latex) in MATH_SYMBOLS {
            assert_eq!(
                normalize_math(&format!("${glyph}")),
                format!("${latex}"),
                "glyph {glyph}"
            );
        }
    }

    #[test]
    fn mixed_text() {
        assert_eq!(
            normalize_math("area = π r² and $x ≤ y$"),
            r"area = $\pi$ r$^2$ and $x \leq y$"
        );
    }

    #[test]
    fn repeated_glyph_keeps_offsets() {
        assert_eq!(normalize_math("α+α"), r"$\alpha$+$\alpha$");
    }

    #[test]
    fn unknown_glyphs_pass_through() {
        assert_eq!(normalize_math("ℵ and ∇"), "ℵ and ∇");
    }

    #[test]
    fn idempotent_once_rewritten() {
        let once = normalize_math("x² ≠ y₁");
        assert_eq!(normalize_math(&once), once);
    }

    #[test]
    fn stray_dollar_misclassifies() {
        // Known limitation of the parity rule.
        assert_eq!(normalize_math("costs $5, α"), r"costs $5, \alpha");
    }

    #[test]
    fn delimiters_stay_balanced() {
        let out = normalize_math("α β γ $δ$ ε");
        assert_eq!(out.matches('$').count() % 2, 0, "{out}");
    }

    #[test]
    fn lookup() {
        assert_eq!(latex_for("∞"), Some(r"\infty"));
        assert_eq!(latex_for("x"), None);
    }
}
