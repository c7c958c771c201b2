//! Node collection manager
//!
//! [`NodeManager`] owns the ordered list of parsed nodes. Raw subscription
//! text is handed to it either directly ([`NodeManager::ingest`]) or through
//! the file/URL loaders, which do the I/O and then ingest synchronously.

mod observer;

pub use observer::{
    CollectingObserver, IngestFailure, IngestObserver, IngestReport, TracingObserver,
};

use std::path::Path;
use std::sync::Arc;

use serde_yaml::Mapping;
use tracing::debug;

use crate::error::{Error, Result};
use crate::export::{OutputFormat, render};
use crate::model::Node;
use crate::parser::{ProtocolParser, ProtocolRegistry, decode_subscription_content};
use crate::source::{self, SourceOptions};

// ============================================================================
// Node Manager
// ============================================================================

/// Append-only collection of parsed nodes, in input order
#[derive(Debug)]
pub struct NodeManager {
    registry: ProtocolRegistry,
    nodes: Vec<Node>,
    source_options: SourceOptions,
}

impl Default for NodeManager {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeManager {
    /// Creates a manager using the built-in parsers
    pub fn new() -> Self {
        Self::with_registry(ProtocolRegistry::with_builtin_parsers())
    }

    pub fn with_registry(registry: ProtocolRegistry) -> Self {
        Self {
            registry,
            nodes: Vec::new(),
            source_options: SourceOptions::default(),
        }
    }

    /// Sets the options used by the file/URL loaders
    pub fn with_source_options(mut self, options: SourceOptions) -> Self {
        self.source_options = options;
        self
    }

    /// Registers an extra parser after the existing ones
    pub fn register_parser(&mut self, parser: Arc<dyn ProtocolParser>) {
        self.registry.register(parser);
    }

    pub fn registry(&self) -> &ProtocolRegistry {
        &self.registry
    }

    // ------------------------------------------------------------------------
    // Ingestion
    // ------------------------------------------------------------------------

    /// Parses line-delimited links, logging rejected lines through `tracing`
    pub fn ingest(&mut self, text: &str) -> IngestReport {
        self.ingest_with(text, &mut TracingObserver)
    }

    /// Parses line-delimited links, reporting every event to `observer`
    ///
    /// Blank lines and `#` comments are skipped. A line that fails to parse
    /// is reported and skipped; it never aborts the pass or touches nodes
    /// already collected.
    pub fn ingest_with(&mut self, text: &str, observer: &mut dyn IngestObserver) -> IngestReport {
        let content = decode_subscription_content(text);
        let mut report = IngestReport::default();

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                report.skipped += 1;
                continue;
            }

            match self.registry.dispatch(line) {
                Ok(node) => {
                    observer.on_node(index + 1, &node);
                    self.nodes.push(node);
                    report.parsed += 1;
                }
                Err(e) => {
                    observer.on_error(index + 1, line, &e);
                    report.failed += 1;
                }
            }
        }

        debug!(
            "Ingest complete: {} parsed, {} failed, {} skipped, {} nodes total",
            report.parsed,
            report.failed,
            report.skipped,
            self.nodes.len()
        );
        observer.on_complete(&report);
        report
    }

    /// Reads a local file and ingests its contents
    pub async fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<IngestReport> {
        let content = source::read_file(path.as_ref()).await?;
        Ok(self.ingest(&content))
    }

    /// Fetches a subscription URL and ingests the response body
    pub async fn load_from_url(&mut self, url: &str) -> Result<IngestReport> {
        let content = source::fetch_text(url, &self.source_options).await?;
        Ok(self.ingest(&content))
    }

    /// Loads from a URL when given `http(s)://`, otherwise from a file
    pub async fn load(&mut self, path_or_url: &str) -> Result<IngestReport> {
        let content = source::load_text(path_or_url, &self.source_options).await?;
        Ok(self.ingest(&content))
    }

    // ------------------------------------------------------------------------
    // Collection
    // ------------------------------------------------------------------------

    /// Appends a node; an absent node is rejected
    pub fn add_node(&mut self, node: impl Into<Option<Node>>) -> Result<()> {
        let node = node.into().ok_or(Error::MissingNode)?;
        self.nodes.push(node);
        Ok(())
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Removes every collected node
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    // ------------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------------

    /// Maps every node to its Clash proxy definition, in collection order
    pub fn export(&self) -> Vec<Mapping> {
        self.nodes.iter().map(Node::to_clash_config).collect()
    }

    /// Renders the exported proxies as a document in the given format
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        render(&self.export(), format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::model::SsNode;

    const VALID_LINK: &str = "ss://YWVzLTI1Ni1nY206cGFzc3dvcmQ=@example.com:8388#MyNode";

    fn ss_node(name: &str) -> Node {
        SsNode::new(Some(name.to_string()), "example.com", 8388, "aes-256-gcm", "pw")
            .unwrap()
            .into()
    }

    #[test]
    fn test_ingest_skips_blank_and_unsupported_lines() {
        let mut manager = NodeManager::new();
        let mut observer = CollectingObserver::default();
        let content = format!("{}\n\nhttp://not-a-proxy-link\n", VALID_LINK);

        let report = manager.ingest_with(&content, &mut observer);

        assert_eq!(manager.len(), 1);
        assert_eq!(manager.nodes()[0].name(), "MyNode");
        assert_eq!(
            report,
            IngestReport {
                parsed: 1,
                failed: 1,
                skipped: 1
            }
        );
        assert_eq!(observer.failures.len(), 1);
        assert_eq!(observer.failures[0].line, 3);
        assert!(matches!(
            observer.failures[0].error,
            ParseError::UnsupportedProtocol(_)
        ));
    }

    #[test]
    fn test_ingest_skips_comments() {
        let mut manager = NodeManager::new();
        let report = manager.ingest("# comment\n   # indented comment\n");
        assert!(manager.is_empty());
        assert_eq!(report.skipped, 2);
        assert_eq!(report.total(), 0);
    }

    #[test]
    fn test_ingest_trims_lines() {
        let mut manager = NodeManager::new();
        manager.ingest(&format!("   {}\t\r\n", VALID_LINK));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_ingest_preserves_order_and_duplicates() {
        let mut manager = NodeManager::new();
        let content = [
            "ss://YWVzLTI1Ni1nY206cGFzc3dvcmQ@a.example.com:1#a",
            "ss://broken",
            "ss://YWVzLTI1Ni1nY206cGFzc3dvcmQ@b.example.com:2#b",
            "ss://YWVzLTI1Ni1nY206cGFzc3dvcmQ@a.example.com:1#a",
        ]
        .join("\n");

        let report = manager.ingest(&content);

        let names: Vec<&str> = manager.nodes().iter().map(|n| n.name()).collect();
        assert_eq!(names, ["a", "b", "a"]);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn test_ingest_failure_keeps_existing_nodes() {
        let mut manager = NodeManager::new();
        manager.ingest(VALID_LINK);
        manager.ingest("ss://broken\nvless://x");
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_ingest_base64_subscription_body() {
        use base64::Engine;
        use base64::engine::general_purpose::STANDARD;

        let mut manager = NodeManager::new();
        let body = STANDARD.encode(format!("{}\n{}", VALID_LINK, VALID_LINK));
        let report = manager.ingest(&body);
        assert_eq!(report.parsed, 2);
    }

    #[test]
    fn test_observer_sees_completion() {
        let mut manager = NodeManager::new();
        let mut observer = CollectingObserver::default();
        let report = manager.ingest_with(VALID_LINK, &mut observer);
        assert_eq!(observer.reports, vec![report]);
        assert_eq!(observer.nodes, vec![(1, "MyNode".to_string())]);
    }

    #[test]
    fn test_add_node() {
        let mut manager = NodeManager::new();
        manager.add_node(ss_node("first")).unwrap();
        manager.add_node(Some(ss_node("second"))).unwrap();
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.nodes()[1].name(), "second");
    }

    #[test]
    fn test_add_node_rejects_missing_node() {
        let mut manager = NodeManager::new();
        assert!(matches!(manager.add_node(None::<Node>), Err(Error::MissingNode)));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut manager = NodeManager::new();
        manager.ingest(VALID_LINK);
        manager.clear();
        assert!(manager.is_empty());
    }

    #[test]
    fn test_export_preserves_order() {
        let mut manager = NodeManager::new();
        manager.add_node(ss_node("one")).unwrap();
        manager.add_node(ss_node("two")).unwrap();

        let exported = manager.export();
        let names: Vec<&str> = exported
            .iter()
            .filter_map(|m| m.get("name").and_then(|v| v.as_str()))
            .collect();
        assert_eq!(names, ["one", "two"]);
    }

    #[test]
    fn test_register_parser_appends() {
        let mut manager = NodeManager::with_registry(ProtocolRegistry::new());
        assert!(manager.registry().is_empty());
        manager.register_parser(Arc::new(crate::parser::ShadowsocksParser));
        manager.ingest(VALID_LINK);
        assert_eq!(manager.len(), 1);
    }

    #[tokio::test]
    async fn test_load_from_missing_file() {
        let mut manager = NodeManager::new();
        let err = manager
            .load_from_file("/nonexistent/nodeparse/nodes.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }
}
