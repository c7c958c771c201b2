//! Ingestion observers
//!
//! The manager reports every parsed node and every rejected line to an
//! [`IngestObserver`] instead of logging directly, so callers decide whether
//! failures end up in logs, in memory, or nowhere.

use tracing::{debug, info, warn};

use crate::error::ParseError;
use crate::model::Node;

/// Counts for one ingestion pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Lines that produced a node
    pub parsed: usize,
    /// Lines rejected by the registry
    pub failed: usize,
    /// Blank and comment lines
    pub skipped: usize,
}

impl IngestReport {
    /// Candidate link lines seen, excluding blanks and comments
    pub fn total(&self) -> usize {
        self.parsed + self.failed
    }
}

/// Receives ingestion events, line numbers are 1-based
pub trait IngestObserver {
    fn on_node(&mut self, _line: usize, _node: &Node) {}

    fn on_error(&mut self, _line: usize, _text: &str, _error: &ParseError) {}

    fn on_complete(&mut self, _report: &IngestReport) {}
}

/// Logs ingestion events through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl IngestObserver for TracingObserver {
    fn on_node(&mut self, line: usize, node: &Node) {
        debug!(line, "Added node {}", node);
    }

    fn on_error(&mut self, line: usize, _text: &str, error: &ParseError) {
        warn!(line, "Failed to parse line: {}", error);
    }

    fn on_complete(&mut self, report: &IngestReport) {
        info!(
            "Loaded {} nodes ({} failed, {} skipped)",
            report.parsed, report.failed, report.skipped
        );
    }
}

/// A rejected line kept by [`CollectingObserver`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestFailure {
    pub line: usize,
    pub text: String,
    pub error: ParseError,
}

/// Keeps every ingestion event in memory
#[derive(Debug, Default)]
pub struct CollectingObserver {
    /// (line, node name) for every parsed line
    pub nodes: Vec<(usize, String)>,
    pub failures: Vec<IngestFailure>,
    pub reports: Vec<IngestReport>,
}

impl IngestObserver for CollectingObserver {
    fn on_node(&mut self, line: usize, node: &Node) {
        self.nodes.push((line, node.name().to_string()));
    }

    fn on_error(&mut self, line: usize, text: &str, error: &ParseError) {
        self.failures.push(IngestFailure {
            line,
            text: text.to_string(),
            error: error.clone(),
        });
    }

    fn on_complete(&mut self, report: &IngestReport) {
        self.reports.push(*report);
    }
}
