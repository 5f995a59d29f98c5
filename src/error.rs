//! Error types for the html2latex library.

use thiserror::Error;

/// Result type alias for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Normalization error: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

/// Errors raised while loading an XML document into a tree.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Encoding error: {0}")]
    Encoding(#[from] quick_xml::encoding::EncodingError),

    #[error("Document has no elements")]
    Empty,

    #[error("Unclosed element <{0}>")]
    Unclosed(String),
}

/// Errors in renderer configuration. Always reported before any output.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown dialect: {0}")]
    UnknownDialect(String),

    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Missing required template: {0}")]
    MissingTemplate(String),

    #[error("Template {name} does not compile: {message}")]
    InvalidTemplate { name: String, message: String },
}

/// Errors from the normalization pass. These are fatal for the document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Malformed number literal: {0:?}")]
    MalformedNumber(String),

    #[error("Currency without a number")]
    MissingCurrencyNumber,

    #[error("Invalid precision attribute: {0:?}")]
    InvalidPrecision(String),

    #[error("Cannot splice the document root")]
    SpliceRoot,
}

/// Errors raised by a template backend.
#[derive(Debug, Error)]
#[error("Template {name}: {message}")]
pub struct TemplateError {
    pub name: String,
    pub message: String,
}

/// Errors that occur while rendering a node.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("<{tag}>: {message}")]
    Structure { tag: String, message: String },

    #[error("Nesting exceeds {depth} levels")]
    DepthExceeded { depth: usize },

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
}

impl RenderError {
    /// Whether the dispatcher can recover by rendering the node through the
    /// `error` template.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Template(_))
    }
}
