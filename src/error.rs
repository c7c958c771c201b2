//! Error types for nodeparse
//!
//! [`ParseError`] covers everything that can go wrong while turning a single
//! link into a node. [`Error`] wraps it together with the failures of the
//! collaborators that feed text into the collection (file reads, HTTP
//! fetches) and of the export step.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// A node field that failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeField {
    Method,
    Password,
    Server,
    Port,
    Uuid,
    AlterId,
}

impl fmt::Display for NodeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeField::Method => write!(f, "method"),
            NodeField::Password => write!(f, "password"),
            NodeField::Server => write!(f, "server"),
            NodeField::Port => write!(f, "port"),
            NodeField::Uuid => write!(f, "uuid"),
            NodeField::AlterId => write!(f, "alterId"),
        }
    }
}

/// Errors produced while parsing a single link
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A required delimiter is missing
    #[error("missing '{separator}' separator in {context}")]
    Structural {
        separator: char,
        context: &'static str,
    },

    /// A required field is empty or out of range
    #[error("invalid {field}: {reason}")]
    Field { field: NodeField, reason: String },

    /// Mandatory decoding failed
    #[error("failed to decode {context}: {source}")]
    Decode {
        context: &'static str,
        #[source]
        source: DecodeError,
    },

    /// No registered parser recognizes the link
    #[error("unsupported protocol: {0}")]
    UnsupportedProtocol(String),
}

impl ParseError {
    pub(crate) fn structural(separator: char, context: &'static str) -> Self {
        ParseError::Structural { separator, context }
    }

    pub(crate) fn field(field: NodeField, reason: impl Into<String>) -> Self {
        ParseError::Field {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn decode(context: &'static str, source: DecodeError) -> Self {
        ParseError::Decode { context, source }
    }

    /// The field that failed validation, if this is a field error
    pub fn field_name(&self) -> Option<NodeField> {
        match self {
            ParseError::Field { field, .. } => Some(*field),
            _ => None,
        }
    }
}

/// Failure to decode an encoded link component
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("input is not valid base64 in any supported alphabet")]
    InvalidBase64,

    #[error("decoded content is not valid UTF-8")]
    InvalidUtf8,

    #[error("decoded content is not valid JSON: {0}")]
    InvalidJson(String),
}

/// Errors surfaced by the node manager and its I/O collaborators
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP request failed with status {status}: {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("node is missing")]
    MissingNode,

    #[error("failed to render export: {0}")]
    Render(String),
}

/// Result type alias for nodeparse
pub type Result<T> = std::result::Result<T, Error>;
