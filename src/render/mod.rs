//! Recursive LaTeX rendering of a normalized tree.
//!
//! A [`Renderer`] owns its configuration, the variant table for its dialect
//! and the three collaborators it calls out to: templates, the MathML
//! transform and the image resolver. Rendering never mutates the tree, so a
//! renderer can be reused across documents.

mod dispatch;
mod record;
mod variants;

pub mod image;
pub mod math;
pub mod table;

pub use dispatch::{BlockSpec, ClassPattern, Variant, VariantTable};
pub use image::{ImageResolver, PassthroughImages};
pub use math::{post_process, BasicMathml, MathTransform};
pub use record::ContentRecord;

use crate::config::{Dialect, RenderConfig};
use crate::error::{ConfigError, RenderError};
use crate::escape::{clean_encoding, escape};
use crate::template::{LatexTemplates, TemplateBackend, DOCUMENT, ERROR, NOT_IMPLEMENTED, REQUIRED, STANDALONE};
use crate::tree::{Node, NodeId, Tree};

/// Root tags whose content, rather than the element itself, is the document.
const CONTAINER_ROOTS: &[&str] = &["document", "html", "body", "content"];

/// Tree to LaTeX renderer.
pub struct Renderer {
    config: RenderConfig,
    variants: VariantTable,
    templates: Box<dyn TemplateBackend>,
    math: Box<dyn MathTransform>,
    images: Box<dyn ImageResolver>,
}

impl Renderer {
    /// Create a renderer with the built-in templates, plus any overrides
    /// from `config.templates`.
    pub fn new(config: RenderConfig) -> Result<Self, ConfigError> {
        let templates = LatexTemplates::with_overrides(config.dialect, &config.templates)?;
        Self::with_backend(config, Box::new(templates))
    }

    /// Create a renderer on a custom template backend.
    ///
    /// Fails when the backend lacks a required template.
    pub fn with_backend(config: RenderConfig, templates: Box<dyn TemplateBackend>) -> Result<Self, ConfigError> {
        let standalone = config.standalone.then_some(&STANDALONE);
        if let Some(missing) = REQUIRED
            .iter()
            .chain(standalone)
            .find(|name| !templates.has_template(name))
        {
            return Err(ConfigError::MissingTemplate(missing.to_string()));
        }

        Ok(Self {
            variants: VariantTable::new(config.dialect),
            config,
            templates,
            math: Box::new(BasicMathml),
            images: Box::new(PassthroughImages),
        })
    }

    /// Replace the MathML transform.
    pub fn with_math(mut self, math: impl MathTransform + 'static) -> Self {
        self.math = Box::new(math);
        self
    }

    /// Replace the image resolver.
    pub fn with_images(mut self, images: impl ImageResolver + 'static) -> Self {
        self.images = Box::new(images);
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render a whole document through the `document` (or `standalone`)
    /// template.
    pub fn render_document(&self, tree: &Tree) -> Result<String, RenderError> {
        let start = self.start_node(tree);
        let node = tree.node(start);
        tracing::debug!(
            dialect = ?self.config.dialect,
            root = node.local_name(),
            "Rendering document"
        );

        let text = if CONTAINER_ROOTS.iter().any(|&tag| tag == node.local_name()) {
            self.render_inner(tree, start, 0, &[])?
        } else {
            self.render_at(tree, start, 0)?
        };

        let mut record = ContentRecord::seed(node);
        record.insert("text", text);
        let template = if self.config.standalone { STANDALONE } else { DOCUMENT };
        let output = self.templates.render_template(template, &record)?;

        tracing::debug!(bytes = output.len(), "Document rendered");
        Ok(output)
    }

    /// Render the subtree at `id`, without its tail.
    pub fn render_node(&self, tree: &Tree, id: NodeId) -> Result<String, RenderError> {
        self.render_at(tree, id, 0)
    }

    /// HTML documents render from `body` when the root is `html`.
    fn start_node(&self, tree: &Tree) -> NodeId {
        let root = tree.root();
        if self.config.dialect == Dialect::Html && tree.node(root).local_name() == "html" {
            if let Some(body) = tree
                .descendants(root)
                .into_iter()
                .find(|&id| tree.node(id).local_name() == "body")
            {
                return body;
            }
        }
        root
    }

    pub(crate) fn render_at(&self, tree: &Tree, id: NodeId, depth: usize) -> Result<String, RenderError> {
        let node = tree.node(id);
        if node.is_comment() {
            return Ok(String::new());
        }

        let result = if depth > self.config.max_depth {
            Err(RenderError::DepthExceeded {
                depth: self.config.max_depth,
            })
        } else {
            let variant = self.variants.lookup(node);
            variants::render(self, tree, id, variant, depth)
        };

        match result {
            Err(err) if err.is_recoverable() => self.recover(node, &err),
            other => other,
        }
    }

    /// Escaped text of `id` followed by each child's output and escaped tail.
    /// Children in `skip` contribute their tail only.
    pub(crate) fn render_inner(
        &self,
        tree: &Tree,
        id: NodeId,
        depth: usize,
        skip: &[NodeId],
    ) -> Result<String, RenderError> {
        let node = tree.node(id);
        let mut out = escape(&clean_encoding(&node.text));
        for &child in node.children() {
            if !skip.contains(&child) {
                out.push_str(&self.render_at(tree, child, depth + 1)?);
            }
            out.push_str(&escape(&clean_encoding(&tree.node(child).tail)));
        }
        Ok(out)
    }

    /// Render `record` through the template `name`, falling back to
    /// `not_implemented` when the backend has no such template.
    pub(crate) fn apply(&self, node: &Node, name: &str, record: &ContentRecord) -> Result<String, RenderError> {
        let name = if self.templates.has_template(name) {
            name
        } else {
            tracing::debug!(tag = node.local_name(), template = name, "No template, rendering as not implemented");
            NOT_IMPLEMENTED
        };

        match self.templates.render_template(name, record) {
            Ok(output) => Ok(output),
            Err(err) => {
                tracing::error!(
                    template = %err.name,
                    error = %err.message,
                    "Template failed, substituting error template"
                );
                let mut fallback = ContentRecord::seed(node);
                fallback.insert("message", escape(&err.message));
                Ok(self.templates.render_template(ERROR, &fallback)?)
            }
        }
    }

    /// Render `node` through the `error` template after a recoverable failure.
    fn recover(&self, node: &Node, err: &RenderError) -> Result<String, RenderError> {
        tracing::warn!(
            tag = node.local_name(),
            attrs = ?node.attrs,
            error = %err,
            "Rendering node through error template"
        );
        let message = match err {
            RenderError::Structure { message, .. } => message.clone(),
            other => other.to_string(),
        };
        let mut record = ContentRecord::seed(node);
        record.insert("message", escape(&message));
        Ok(self.templates.render_template(ERROR, &record)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemplateError;
    use crate::parser::parse_xml;
    use pretty_assertions::assert_eq;

    fn renderer(dialect: Dialect) -> Renderer {
        Renderer::new(RenderConfig::for_dialect(dialect)).unwrap()
    }

    #[test]
    fn test_document_from_container_root() {
        let tree = parse_xml("<document><title>T</title><content><para>x</para></content></document>").unwrap();
        let out = renderer(Dialect::Cnxml).render_document(&tree).unwrap();
        assert_eq!(out, "\\textbf{T}\nx\n");
    }

    #[test]
    fn test_html_document_starts_at_body() {
        let tree = parse_xml("<html><head><title>ignored</title></head><body><p>x</p></body></html>").unwrap();
        let out = renderer(Dialect::Html).render_document(&tree).unwrap();
        assert_eq!(out, "\nx\n");
    }

    #[test]
    fn test_document_from_element_root() {
        let tree = parse_xml("<p>50% of <b>all</b> cases</p>").unwrap();
        let out = renderer(Dialect::Html).render_document(&tree).unwrap();
        assert_eq!(out, "\n50\\% of \\textbf{all} cases\n");
    }

    #[test]
    fn test_standalone_wraps_preamble() {
        let mut config = RenderConfig::for_dialect(Dialect::Html);
        config.standalone = true;
        let tree = parse_xml("<p>x</p>").unwrap();
        let out = Renderer::new(config).unwrap().render_document(&tree).unwrap();
        assert!(out.starts_with("\\documentclass{book}\n"));
        assert!(out.contains("\\begin{document}\n\nx\n\n\\end{document}\n"));
    }

    #[test]
    fn test_comments_render_empty_and_keep_tail() {
        let tree = parse_xml("<para>a<!-- note -->b</para>").unwrap();
        assert_eq!(renderer(Dialect::Cnxml).render_node(&tree, tree.root()).unwrap(), "\nab\n");
    }

    #[test]
    fn test_depth_guard_recovers() {
        let mut config = RenderConfig::for_dialect(Dialect::Cnxml);
        config.max_depth = 1;
        let tree = parse_xml("<para><emphasis><emphasis>x</emphasis></emphasis></para>").unwrap();
        let out = Renderer::new(config).unwrap().render_node(&tree, tree.root()).unwrap();
        assert_eq!(
            out,
            "\n\\textit{\\textbf{[error in emphasis: Nesting exceeds 1 levels]}}\n"
        );
    }

    struct Minimal;

    impl TemplateBackend for Minimal {
        fn has_template(&self, name: &str) -> bool {
            REQUIRED.iter().any(|&required| required == name)
        }

        fn render_template(&self, name: &str, content: &ContentRecord) -> Result<String, TemplateError> {
            match name {
                ERROR => Err(TemplateError {
                    name: name.to_string(),
                    message: "broken".to_string(),
                }),
                _ => Ok(format!("[{name}:{}]", content.text("text"))),
            }
        }
    }

    #[test]
    fn test_custom_backend() {
        let renderer = Renderer::with_backend(RenderConfig::default(), Box::new(Minimal)).unwrap();
        let tree = parse_xml("<para>x<emphasis>y</emphasis></para>").unwrap();
        assert_eq!(
            renderer.render_node(&tree, tree.root()).unwrap(),
            "[not_implemented:x[not_implemented:y]]"
        );
    }

    #[test]
    fn test_missing_required_template() {
        let mut config = RenderConfig::default();
        config.standalone = true;
        assert!(matches!(
            Renderer::with_backend(config, Box::new(Minimal)),
            Err(ConfigError::MissingTemplate(name)) if name == "standalone"
        ));
    }

    #[test]
    fn test_broken_error_template_is_fatal() {
        let renderer = Renderer::with_backend(RenderConfig::default(), Box::new(Minimal)).unwrap();
        let tree = parse_xml("<para><table/></para>").unwrap();
        assert!(matches!(
            renderer.render_node(&tree, tree.root()),
            Err(RenderError::Template(TemplateError { name, .. })) if name == "error"
        ));
    }
}
