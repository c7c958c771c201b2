//! VMess node and its optional transport settings

use std::collections::BTreeMap;

use serde_yaml::{Mapping, Value};

use crate::error::{NodeField, ParseError};

use super::{BaseNode, ProxyNode};

/// Optional VMess settings, all with client defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmessOptions {
    pub alter_id: u32,
    /// Cipher, exported as `cipher`
    pub security: String,
    pub network: String,
    pub ws_path: Option<String>,
    pub ws_headers: BTreeMap<String, String>,
    pub tls: bool,
    pub skip_cert_verify: bool,
}

impl Default for VmessOptions {
    fn default() -> Self {
        Self {
            alter_id: 0,
            security: "auto".to_string(),
            network: "tcp".to_string(),
            ws_path: None,
            ws_headers: BTreeMap::new(),
            tls: false,
            skip_cert_verify: false,
        }
    }
}

/// A VMess node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmessNode {
    base: BaseNode,
    uuid: String,
    options: VmessOptions,
}

impl VmessNode {
    pub fn new(
        name: Option<String>,
        server: impl Into<String>,
        port: u16,
        uuid: impl Into<String>,
        options: VmessOptions,
    ) -> Result<Self, ParseError> {
        let base = BaseNode::new(name, server.into(), port, "VMESS")?;
        let uuid = uuid.into();
        if uuid.is_empty() {
            return Err(ParseError::field(NodeField::Uuid, "uuid is empty"));
        }
        Ok(Self {
            base,
            uuid,
            options,
        })
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn options(&self) -> &VmessOptions {
        &self.options
    }
}

impl ProxyNode for VmessNode {
    fn base(&self) -> &BaseNode {
        &self.base
    }

    fn protocol(&self) -> &'static str {
        "vmess"
    }

    fn to_clash_config(&self) -> Mapping {
        let opts = &self.options;
        let headers: Mapping = opts
            .ws_headers
            .iter()
            .map(|(k, v)| (Value::from(k.as_str()), Value::from(v.as_str())))
            .collect();

        let mut map = Mapping::new();
        map.insert("name".into(), self.name().into());
        map.insert("type".into(), self.protocol().into());
        map.insert("server".into(), self.server().into());
        map.insert("port".into(), self.port().into());
        map.insert("uuid".into(), self.uuid.as_str().into());
        map.insert("alterId".into(), opts.alter_id.into());
        map.insert("cipher".into(), opts.security.as_str().into());
        map.insert("network".into(), opts.network.as_str().into());
        map.insert(
            "ws-path".into(),
            opts.ws_path.as_deref().unwrap_or_default().into(),
        );
        map.insert("ws-headers".into(), Value::Mapping(headers));
        map.insert("tls".into(), opts.tls.into());
        map.insert("skip-cert-verify".into(), opts.skip_cert_verify.into());
        map
    }
}
