//! Template backends.
//!
//! The renderer never formats output itself; every node ends in a call to
//! [`TemplateBackend::render_template`] with the node's [`ContentRecord`].

mod latex;

pub use self::latex::LatexTemplates;

use crate::error::TemplateError;
use crate::render::ContentRecord;
use serde::Serialize;

/// Template used for the document root.
pub const DOCUMENT: &str = "document";
/// Template used instead of [`DOCUMENT`] for standalone output.
pub const STANDALONE: &str = "standalone";
/// Template used for elements without a template of their own.
pub const NOT_IMPLEMENTED: &str = "not_implemented";
/// Template used for nodes that failed to render.
pub const ERROR: &str = "error";

/// Templates every backend must provide.
pub const REQUIRED: &[&str] = &[DOCUMENT, NOT_IMPLEMENTED, ERROR];

/// A single value in a content record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Field {
    Text(String),
    Flag(bool),
    Count(usize),
}

impl Field {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<bool> for Field {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<usize> for Field {
    fn from(value: usize) -> Self {
        Self::Count(value)
    }
}

/// Trait for template backends.
pub trait TemplateBackend {
    /// Whether a template with this name exists.
    fn has_template(&self, name: &str) -> bool;

    /// Render the named template with `content` bound to the record.
    fn render_template(&self, name: &str, content: &ContentRecord) -> Result<String, TemplateError>;
}
