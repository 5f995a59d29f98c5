//! MathML to LaTeX conversion.

mod mathml;

pub use self::mathml::BasicMathml;

use crate::error::RenderError;
use crate::tree::{NodeId, Tree};
use regex::Regex;
use std::sync::LazyLock;

/// Trait for MathML transforms.
///
/// The renderer treats the output as correct LaTeX and only applies
/// [`post_process`] to it.
pub trait MathTransform {
    /// Convert the `math` element at `node` to LaTeX math-mode source.
    fn to_latex(&self, tree: &Tree, node: NodeId) -> Result<String, RenderError>;
}

static SIZED_DELIMITER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\(?:left|right)(?:\.|\b)").unwrap());

static FUNCTION_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^\\A-Za-z])(sin|cos|tan|sec|csc|cot|log|ln)\b").unwrap()
});

/// Clean up transform output for LaTeX.
///
/// Drops every `\left`/`\right` when they do not pair up, and rewrites
/// Unicode operators, arrow accents and bare function names.
pub fn post_process(latex: &str) -> String {
    let mut out = latex.to_string();

    let opened = SIZED_DELIMITER_RE
        .find_iter(&out)
        .filter(|m| m.as_str().starts_with(r"\left"))
        .count();
    let total = SIZED_DELIMITER_RE.find_iter(&out).count();
    if opened * 2 != total {
        out = SIZED_DELIMITER_RE.replace_all(&out, "").into_owned();
    }

    out = out
        .replace('\u{d7}', r"\times ")
        .replace('\u{2212}', "-")
        .replace(r"\overset{\rightarrow}", r"\vec");

    FUNCTION_NAME_RE.replace_all(&out, r"${1}\${2} ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_balanced_delimiters_kept() {
        assert_eq!(post_process(r"\left(x\right)"), r"\left(x\right)");
    }

    #[test]
    fn test_unbalanced_delimiters_stripped() {
        assert_eq!(post_process(r"\left(x\right)\right]"), "(x)]");
        assert_eq!(post_process(r"\left. x"), " x");
        assert_eq!(post_process(r"x \rightarrow y \left("), r"x \rightarrow y (");
    }

    #[test]
    fn test_symbol_normalization() {
        assert_eq!(post_process("2\u{d7}3\u{2212}1"), r"2\times 3-1");
        assert_eq!(post_process(r"\overset{\rightarrow}{F}"), r"\vec{F}");
    }

    #[test]
    fn test_function_names() {
        assert_eq!(post_process("sin(x)+ln x"), r"\sin (x)+\ln  x");
        assert_eq!(post_process(r"\sin x"), r"\sin x");
        assert_eq!(post_process("sinh x + cosine"), "sinh x + cosine");
    }
}
