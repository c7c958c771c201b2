//! Shadowsocks node

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_yaml::Mapping;

use crate::error::{NodeField, ParseError};

use super::{BaseNode, ProxyNode};

/// A Shadowsocks node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsNode {
    base: BaseNode,
    method: String,
    password: String,
    plugin: Option<String>,
}

impl SsNode {
    /// Creates a validated Shadowsocks node
    ///
    /// Fields are checked in the order method, password, server, port; the
    /// first failure is returned.
    pub fn new(
        name: Option<String>,
        server: impl Into<String>,
        port: u16,
        method: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ParseError> {
        let method = method.into();
        let password = password.into();

        if method.is_empty() {
            return Err(ParseError::field(NodeField::Method, "encryption method is empty"));
        }
        if password.is_empty() {
            return Err(ParseError::field(NodeField::Password, "password is empty"));
        }

        Ok(Self {
            base: BaseNode::new(name, server.into(), port, "SS")?,
            method,
            password,
            plugin: None,
        })
    }

    /// Attaches the raw SIP003 `plugin` parameter
    pub fn with_plugin(mut self, plugin: Option<String>) -> Self {
        self.plugin = plugin.filter(|p| !p.is_empty());
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// The raw `plugin` query value, e.g. `obfs-local;obfs=http`
    pub fn plugin(&self) -> Option<&str> {
        self.plugin.as_deref()
    }

    /// Encodes the node as a legacy `ss://BASE64(method:password@server:port)#name` link
    pub fn to_legacy_link(&self) -> String {
        let server = if self.server().contains(':') {
            format!("[{}]", self.server())
        } else {
            self.server().to_string()
        };
        let body = format!("{}:{}@{}:{}", self.method, self.password, server, self.port());
        format!(
            "ss://{}#{}",
            STANDARD.encode(body),
            urlencoding::encode(self.name())
        )
    }
}

impl ProxyNode for SsNode {
    fn base(&self) -> &BaseNode {
        &self.base
    }

    fn protocol(&self) -> &'static str {
        "ss"
    }

    fn to_clash_config(&self) -> Mapping {
        let mut map = Mapping::new();
        map.insert("name".into(), self.name().into());
        map.insert("type".into(), self.protocol().into());
        map.insert("server".into(), self.server().into());
        map.insert("port".into(), self.port().into());
        map.insert("password".into(), self.password.as_str().into());
        map.insert("cipher".into(), self.method.as_str().into());
        map
    }
}
