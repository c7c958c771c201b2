//! Node model
//!
//! A [`Node`] is one proxy endpoint decoded from a subscription link. Every
//! protocol variant embeds a [`BaseNode`] with the fields all clients need
//! (display name, server, port) and adds its own payload. Nodes are validated
//! on construction and are immutable afterwards.

mod base;
mod ss;
mod vmess;

pub use base::{BaseNode, parse_port};
pub use ss::SsNode;
pub use vmess::{VmessNode, VmessOptions};

use std::fmt;

use serde_yaml::Mapping;

// ============================================================================
// Proxy Node Trait
// ============================================================================

/// Capabilities shared by every protocol variant
pub trait ProxyNode {
    /// Shared name/server/port fields
    fn base(&self) -> &BaseNode;

    /// Protocol tag as written in the Clash `type` field (e.g., "ss")
    fn protocol(&self) -> &'static str;

    /// Maps the node to a Clash proxy definition
    fn to_clash_config(&self) -> Mapping;

    fn name(&self) -> &str {
        self.base().name()
    }

    fn server(&self) -> &str {
        self.base().server()
    }

    fn port(&self) -> u16 {
        self.base().port()
    }
}

// ============================================================================
// Node
// ============================================================================

/// A parsed proxy node, one variant per supported protocol
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Ss(SsNode),
    Vmess(VmessNode),
}

impl Node {
    fn inner(&self) -> &dyn ProxyNode {
        match self {
            Node::Ss(node) => node,
            Node::Vmess(node) => node,
        }
    }

    pub fn name(&self) -> &str {
        self.inner().name()
    }

    pub fn server(&self) -> &str {
        self.inner().server()
    }

    pub fn port(&self) -> u16 {
        self.inner().port()
    }

    pub fn protocol(&self) -> &'static str {
        self.inner().protocol()
    }

    pub fn to_clash_config(&self) -> Mapping {
        self.inner().to_clash_config()
    }

    pub fn as_ss(&self) -> Option<&SsNode> {
        match self {
            Node::Ss(node) => Some(node),
            Node::Vmess(_) => None,
        }
    }

    pub fn as_vmess(&self) -> Option<&VmessNode> {
        match self {
            Node::Vmess(node) => Some(node),
            Node::Ss(_) => None,
        }
    }
}

impl From<SsNode> for Node {
    fn from(node: SsNode) -> Self {
        Node::Ss(node)
    }
}

impl From<VmessNode> for Node {
    fn from(node: VmessNode) -> Self {
        Node::Vmess(node)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' ({}:{})",
            self.protocol(),
            self.name(),
            self.server(),
            self.port()
        )
    }
}
