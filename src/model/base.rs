//! Fields shared by every node variant
//!
//! Name synthesis and port validation live here so each variant applies them
//! the same way.

use crate::error::{NodeField, ParseError};

/// Fields shared by every node variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseNode {
    name: String,
    server: String,
    port: u16,
}

impl BaseNode {
    /// Validates the shared fields, falling back to `{prefix}-{server}:{port}`
    /// when no usable name is given
    pub(crate) fn new(
        name: Option<String>,
        server: String,
        port: u16,
        default_prefix: &str,
    ) -> Result<Self, ParseError> {
        if server.is_empty() {
            return Err(ParseError::field(NodeField::Server, "server address is empty"));
        }
        if port == 0 {
            return Err(ParseError::field(NodeField::Port, "port out of range: 0"));
        }

        let name = match name {
            Some(name) if !name.is_empty() => name,
            _ => format!("{}-{}:{}", default_prefix, server, port),
        };

        Ok(Self { name, server, port })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

/// Parses a port number, accepting only values in 1..=65535
pub fn parse_port(raw: &str) -> Result<u16, ParseError> {
    let value: i64 = raw
        .parse()
        .map_err(|_| ParseError::field(NodeField::Port, format!("invalid port number: {}", raw)))?;

    u16::try_from(value)
        .ok()
        .filter(|port| *port != 0)
        .ok_or_else(|| ParseError::field(NodeField::Port, format!("port out of range: {}", value)))
}
