//! Protocol parsers module
//!
//! This module contains parsers for the supported proxy link formats.
//! Each parser implements the `ProtocolParser` trait; the `ProtocolRegistry`
//! dispatches a link to the first registered parser that recognizes it.

mod shadowsocks;
mod vmess;

pub use shadowsocks::ShadowsocksParser;
pub use vmess::VMessParser;

use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::ParseError;
use crate::model::Node;

// ============================================================================
// Protocol Parser Trait
// ============================================================================

/// Trait for parsing individual protocol links
pub trait ProtocolParser: Send + Sync {
    /// Returns the protocol scheme this parser handles (e.g., "ss", "vmess")
    fn scheme(&self) -> &str;

    /// Parses a link into a validated node
    fn parse(&self, link: &str) -> Result<Node, ParseError>;

    /// Checks if this parser can handle the given link
    fn can_parse(&self, link: &str) -> bool {
        link.strip_prefix(self.scheme())
            .is_some_and(|rest| rest.starts_with("://"))
    }
}

// ============================================================================
// Protocol Registry
// ============================================================================

/// Ordered list of protocol parsers
///
/// Registration order is precedence order: the first parser whose
/// `can_parse` accepts a link decodes it, and its result is final.
#[derive(Default, Clone)]
pub struct ProtocolRegistry {
    parsers: Vec<Arc<dyn ProtocolParser>>,
}

impl ProtocolRegistry {
    /// Creates a new empty registry
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Creates a registry with all built-in parsers registered
    pub fn with_builtin_parsers() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ShadowsocksParser));
        registry.register(Arc::new(VMessParser));
        registry
    }

    /// Appends a parser after every parser already registered
    pub fn register(&mut self, parser: Arc<dyn ProtocolParser>) {
        debug!(
            scheme = parser.scheme(),
            position = self.parsers.len(),
            "Registered protocol parser"
        );
        self.parsers.push(parser);
    }

    /// Registered schemes in precedence order
    pub fn schemes(&self) -> Vec<&str> {
        self.parsers.iter().map(|p| p.scheme()).collect()
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// Parses a link with the first parser that recognizes it
    pub fn dispatch(&self, link: &str) -> Result<Node, ParseError> {
        let parser = self
            .parsers
            .iter()
            .find(|p| p.can_parse(link))
            .ok_or_else(|| ParseError::UnsupportedProtocol(link_preview(link)))?;

        trace!("Dispatching link to '{}' parser", parser.scheme());
        let result = parser.parse(link);
        match &result {
            Ok(node) => debug!("Successfully parsed {} link -> {}", parser.scheme(), node),
            Err(e) => debug!("Failed to parse {} link: {}", parser.scheme(), e),
        }
        result
    }

    /// Parses every link independently
    ///
    /// Failed links are dropped. If nothing parsed and at least one link
    /// failed, the first error is returned instead.
    pub fn dispatch_all<I, S>(&self, links: I) -> Result<Vec<Node>, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut nodes = Vec::new();
        let mut first_error = None;
        let mut failed = 0usize;

        for link in links {
            match self.dispatch(link.as_ref()) {
                Ok(node) => nodes.push(node),
                Err(e) => {
                    failed += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        debug!(
            "Batch dispatch complete: {} successful, {} failed",
            nodes.len(),
            failed
        );

        match first_error {
            Some(e) if nodes.is_empty() => Err(e),
            _ => Ok(nodes),
        }
    }
}

impl std::fmt::Debug for ProtocolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolRegistry")
            .field("schemes", &self.schemes())
            .finish()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Splits a trailing `#fragment` off a link body, percent-decoding it
///
/// The fragment is kept raw when it is not valid percent-encoded UTF-8.
pub fn split_fragment(body: &str) -> (&str, Option<String>) {
    match body.split_once('#') {
        Some((main, fragment)) => {
            let name = urlencoding::decode(fragment)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| fragment.to_string());
            (main, Some(name))
        }
        None => (body, None),
    }
}

/// Splits `server:rest` on the first colon
///
/// A bracketed IPv6 host (`[::1]:8388`) is kept whole and returned without
/// its brackets.
pub fn split_host_port<'a>(
    serverinfo: &'a str,
    context: &'static str,
) -> Result<(&'a str, &'a str), ParseError> {
    if let Some(bracketed) = serverinfo.strip_prefix('[') {
        let (host, after) = bracketed
            .split_once(']')
            .ok_or_else(|| ParseError::structural(']', context))?;
        let rest = after
            .strip_prefix(':')
            .ok_or_else(|| ParseError::structural(':', context))?;
        return Ok((host, rest));
    }

    serverinfo
        .split_once(':')
        .ok_or_else(|| ParseError::structural(':', context))
}

/// Shortens a link for error messages
fn link_preview(link: &str) -> String {
    const MAX_CHARS: usize = 64;
    if link.chars().count() <= MAX_CHARS {
        return link.to_string();
    }
    let mut preview: String = link.chars().take(MAX_CHARS).collect();
    preview.push_str("...");
    preview
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SsNode;

    /// Parser that recognizes any link with the given scheme and always
    /// returns a fixed node or a fixed error
    struct StubParser {
        scheme: &'static str,
        server: Option<&'static str>,
    }

    impl ProtocolParser for StubParser {
        fn scheme(&self) -> &str {
            self.scheme
        }

        fn parse(&self, _link: &str) -> Result<Node, ParseError> {
            match self.server {
                Some(server) => Ok(SsNode::new(None, server, 1, "m", "p")?.into()),
                None => Err(ParseError::structural('@', "stub")),
            }
        }
    }

    #[test]
    fn test_protocol_registry_new() {
        let registry = ProtocolRegistry::new();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_protocol_registry_with_builtin_parsers() {
        let registry = ProtocolRegistry::with_builtin_parsers();
        assert_eq!(registry.schemes(), ["ss", "vmess"]);
    }

    #[test]
    fn test_dispatch_unknown_scheme() {
        let registry = ProtocolRegistry::with_builtin_parsers();
        let err = registry.dispatch("http://not-a-proxy-link").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnsupportedProtocol("http://not-a-proxy-link".to_string())
        );
    }

    #[test]
    fn test_dispatch_empty_registry() {
        let registry = ProtocolRegistry::new();
        assert!(matches!(
            registry.dispatch("ss://abc"),
            Err(ParseError::UnsupportedProtocol(_))
        ));
    }

    #[test]
    fn test_dispatch_first_registered_wins() {
        let mut registry = ProtocolRegistry::new();
        registry.register(Arc::new(StubParser {
            scheme: "ss",
            server: Some("first"),
        }));
        registry.register(Arc::new(StubParser {
            scheme: "ss",
            server: Some("second"),
        }));
        let node = registry.dispatch("ss://anything").unwrap();
        assert_eq!(node.server(), "first");
    }

    #[test]
    fn test_dispatch_does_not_fall_through_after_failure() {
        let mut registry = ProtocolRegistry::new();
        registry.register(Arc::new(StubParser {
            scheme: "ss",
            server: None,
        }));
        registry.register(Arc::new(StubParser {
            scheme: "ss",
            server: Some("second"),
        }));
        assert!(matches!(
            registry.dispatch("ss://anything"),
            Err(ParseError::Structural { .. })
        ));
    }

    #[test]
    fn test_dispatch_all_drops_failures() {
        let registry = ProtocolRegistry::with_builtin_parsers();
        let links = [
            "ss://YWVzLTI1Ni1nY206cGFzc3dvcmQ@a.example.com:8388#a",
            "http://nope",
            "ss://YWVzLTI1Ni1nY206cGFzc3dvcmQ@b.example.com:8388#b",
        ];
        let nodes = registry.dispatch_all(links).unwrap();
        let names: Vec<&str> = nodes.iter().map(|n| n.name()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_dispatch_all_returns_first_error_when_all_fail() {
        let registry = ProtocolRegistry::with_builtin_parsers();
        let err = registry
            .dispatch_all(["http://first", "ss://broken"])
            .unwrap_err();
        assert_eq!(err, ParseError::UnsupportedProtocol("http://first".to_string()));
    }

    #[test]
    fn test_dispatch_all_empty_input() {
        let registry = ProtocolRegistry::with_builtin_parsers();
        let nodes = registry.dispatch_all(Vec::<String>::new()).unwrap();
        assert!(nodes.is_empty());
    }

    #[test]
    fn test_can_parse_requires_scheme_separator() {
        let parser = StubParser {
            scheme: "ss",
            server: None,
        };
        assert!(parser.can_parse("ss://abc"));
        assert!(!parser.can_parse("ssr://abc"));
        assert!(!parser.can_parse("ss:abc"));
    }

    #[test]
    fn test_split_fragment() {
        assert_eq!(split_fragment("body#name"), ("body", Some("name".to_string())));
        assert_eq!(split_fragment("body"), ("body", None));
        assert_eq!(
            split_fragment("body#My%20Node"),
            ("body", Some("My Node".to_string()))
        );
    }

    #[test]
    fn test_split_fragment_invalid_encoding_kept_raw() {
        // %FF is not valid UTF-8 once decoded
        assert_eq!(
            split_fragment("body#bad%FF"),
            ("body", Some("bad%FF".to_string()))
        );
    }

    #[test]
    fn test_split_host_port() {
        assert_eq!(
            split_host_port("example.com:8388", "test").unwrap(),
            ("example.com", "8388")
        );
        assert_eq!(
            split_host_port("example.com:8388?plugin=x", "test").unwrap(),
            ("example.com", "8388?plugin=x")
        );
    }

    #[test]
    fn test_split_host_port_ipv6() {
        assert_eq!(split_host_port("[::1]:8080", "test").unwrap(), ("::1", "8080"));
        assert_eq!(
            split_host_port("[2001:db8::1]:443", "test").unwrap(),
            ("2001:db8::1", "443")
        );
    }

    #[test]
    fn test_split_host_port_missing_colon() {
        let err = split_host_port("example.com", "test").unwrap_err();
        assert_eq!(err, ParseError::structural(':', "test"));
    }

    #[test]
    fn test_split_host_port_ipv6_missing_bracket() {
        assert!(split_host_port("[::1:8080", "test").is_err());
        assert!(split_host_port("[::1]8080", "test").is_err());
    }

    #[test]
    fn test_link_preview_truncates() {
        let long = format!("ss://{}", "a".repeat(100));
        let preview = link_preview(&long);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 67);
    }
}
