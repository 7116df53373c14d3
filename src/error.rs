//! Error types for xsdform
//!
//! Fatal conditions surface as [`Error`]. Recoverable problems found while
//! walking a schema are not errors; see [`crate::form::Anomaly`].

use std::fmt;
use thiserror::Error;

/// Result type alias using xsdform Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for xsdform operations
#[derive(Error, Debug)]
pub enum Error {
    /// XML Schema parsing error
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Form synthesis aborted
    #[error("synthesis failure: {0}")]
    Synthesis(#[from] SynthesisError),

    /// Namespace error
    #[error("namespace error: {0}")]
    Namespace(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML reading or writing error
    #[error("XML error: {0}")]
    Xml(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

/// Fatal conditions that abort a synthesis run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    /// The requested root element is not declared under the target namespace
    #[error("invalid root element tag name [{name}, targetNamespace={namespace}]")]
    RootElementNotFound {
        /// Requested local name
        name: String,
        /// Namespace searched (empty for no namespace)
        namespace: String,
    },

    /// The supplied instance document has a different root element
    #[error("instance document root tag name invalid. expected {expected}, got {found}")]
    InstanceRootMismatch {
        /// Root element expected by the schema
        expected: String,
        /// Root element found in the instance document
        found: String,
    },
}

/// XML Schema parsing error
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Location in the schema document
    pub location: Option<String>,
    /// Schema source that caused the error
    pub source: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            source: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref loc) = self.location {
            write!(f, "\n\nLocation: {}", loc)?;
        }

        if let Some(ref src) = self.source {
            write!(f, "\n\nSource:\n{}", src)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}
