//! # html2latex
//!
//! Renders semantically tagged lesson content, either HTML whose structure is
//! carried by `class` attributes or the CNXML+ vocabulary, into LaTeX for a
//! print textbook pipeline.
//!
//! ## Pipeline
//!
//! 1. **Load** an XML document into an arena [`Tree`] ([`parse_xml`]).
//! 2. **Normalize** numeric markup: `currency`, `percentage`, `unit_number`,
//!    `number` and `unit` elements become formatted text runs, honoring
//!    whether they sit in running text or in a math context ([`normalize()`]).
//! 3. **Render** the tree depth first. Each element is dispatched on
//!    `(dialect, tag, class)` to a variant that computes a field record and
//!    hands it to a named template ([`Renderer`]).
//!
//! ## Quick Start
//!
//! ```rust
//! use html2latex::{render, Dialect, RenderConfig};
//!
//! let input = r#"<section>
//!   <title>Motion</title>
//!   <para>A car travels <unit_number><number>1500</number><unit>m</unit></unit_number>.</para>
//! </section>"#;
//!
//! let config = RenderConfig::for_dialect(Dialect::Cnxml);
//! let latex = render(input, Some(&config)).unwrap();
//! assert!(latex.contains("\\chapter{Motion}"));
//! assert!(latex.contains("1\u{a0}500\u{2009}m"));
//! ```
//!
//! ## Templates
//!
//! Output is produced only by templates. The built-in set uses delimiters
//! that do not clash with LaTeX braces:
//!
//! ```text
//! \section{(((content.title)))}
//! ((* if content.caption *))\caption{(((content.caption)))}((* endif *))
//! ((= a comment =))
//! ```
//!
//! Every template sees one variable, `content`, holding the node's
//! attributes plus `tag`, `class`, `text` and variant specific fields such as
//! `title`, `ncols` or `inside_float`. Templates can be overridden by name
//! through [`RenderConfig::templates`].
//!
//! ## Configuration
//!
//! ```text
//! dialect = "html"
//! standalone = true
//! table-width = 0.85
//!
//! [numbers]
//! currency-symbol = "R"
//! fractional-precision = 2
//!
//! [templates]
//! h1 = "\\part{(((content.text)))}"
//! ```
//!
//! ## FFI
//!
//! The library is also built as a C library. See the `ffi` module for the
//! exported functions and header.

pub mod config;
pub mod error;
pub mod escape;
pub mod normalize;
pub mod parser;
pub mod render;
pub mod template;
pub mod tree;

// FFI module (always compiled for cdylib)
pub mod ffi;

// Convenience re-exports
pub use config::{CurrencyPosition, Dialect, NumberPolicy, RenderConfig};
pub use error::{ConfigError, Error, NormalizeError, ParseError, RenderError, Result, TemplateError};
pub use escape::{escape, unescape};
pub use normalize::{format_number, normalize, Mode};
pub use parser::parse_xml;
pub use render::{ContentRecord, ImageResolver, MathTransform, Renderer};
pub use template::{LatexTemplates, TemplateBackend};
pub use tree::{Fragment, Node, NodeId, Tree};

/// Normalize `tree` in place and render it with the built-in collaborators.
pub fn convert(tree: &mut Tree, config: &RenderConfig) -> Result<String> {
    let renderer = Renderer::new(config.clone())?;
    normalize(tree, &config.numbers)?;
    Ok(renderer.render_document(tree)?)
}

/// Parse, normalize and render an XML document in one step.
///
/// # Example
///
/// ```rust
/// use html2latex::{render, Dialect, RenderConfig};
///
/// let latex = render("<h1>Hello &amp; welcome</h1>", Some(&RenderConfig::for_dialect(Dialect::Html))).unwrap();
/// assert_eq!(latex, "\\chapter{Hello \\& welcome}");
/// ```
pub fn render(input: &str, config: Option<&RenderConfig>) -> Result<String> {
    let mut tree = parse_xml(input)?;
    convert(&mut tree, config.unwrap_or(&RenderConfig::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cnxml(input: &str) -> Result<String> {
        render(input, None)
    }

    #[test]
    fn test_full_pipeline() {
        let input = "<para>It costs <currency><number>1500</number></currency> \
                     for <unit_number><number>2500</number><unit>m</unit></unit_number>.</para>";
        assert_eq!(
            cnxml(input).unwrap(),
            "\nIt costs R\u{a0}1500 for 2\u{a0}500\u{2009}m.\n"
        );
    }

    #[test]
    fn test_percentage_by_mode() {
        assert_eq!(
            cnxml("<para><percentage><number>45</number></percentage> done</para>").unwrap(),
            "\n45\\% done\n"
        );
        assert_eq!(
            cnxml("<latex><percentage><number>45</number></percentage></latex>").unwrap(),
            r"$45\%$"
        );
    }

    #[test]
    fn test_scientific_number_in_text() {
        assert_eq!(
            cnxml("<para><number>1.5e-3</number></para>").unwrap(),
            "\n1,5 \u{d7} 10\\textsuperscript{\u{2212}3}\n"
        );
    }

    #[test]
    fn test_numeric_document_root() {
        assert_eq!(cnxml("<number>1234567</number>").unwrap(), "1\u{a0}234\u{a0}567");
        assert_eq!(cnxml("<percentage><number>45</number></percentage>").unwrap(), "45\\%");
    }

    #[test]
    fn test_malformed_number_is_fatal() {
        assert!(matches!(
            cnxml("<para><number>12a</number></para>"),
            Err(Error::Normalize(NormalizeError::MalformedNumber(text))) if text == "12a"
        ));
    }

    #[test]
    fn test_config_errors_come_first() {
        let mut config = RenderConfig::default();
        config.templates.insert("para".into(), "((* for *))".into());
        let mut tree = parse_xml("<para><number>12a</number></para>").unwrap();
        assert!(matches!(
            convert(&mut tree, &config),
            Err(Error::Config(ConfigError::InvalidTemplate { .. }))
        ));
    }

    #[test]
    fn test_html_document() {
        let input = r#"<html><body>
<div class="section"><h1>Forces</h1><p>Push &amp; pull.</p><div class="keyconcepts"></div></div>
</body></html>"#;
        let config = RenderConfig::for_dialect(Dialect::Html);
        assert_eq!(
            render(input, Some(&config)).unwrap(),
            "\n\n\\chapter{Forces}\n\nPush \\& pull.\n\n\\keyconcepts{}\n\n"
        );
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(cnxml(""), Err(Error::Parse(_))));
    }
}
