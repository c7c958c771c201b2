//! VMess protocol parser
//!
//! This module provides parsing for VMess (vmess://) links.
//! VMess links are Base64 encoded JSON containing connection details.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::trace;

use crate::error::{DecodeError, NodeField, ParseError};
use crate::model::{Node, VmessNode, VmessOptions, parse_port};
use crate::parser::base64::decode_base64_to_string;

use super::{ProtocolParser, split_fragment};

// ============================================================================
// VMess Parser
// ============================================================================

/// Parser for VMess (vmess://) links
///
/// VMess links are Base64 encoded JSON:
/// vmess://BASE64({ "v": "2", "ps": "name", "add": "host", "port": 443, ... })
pub struct VMessParser;

/// VMess link JSON structure
#[derive(Deserialize, Debug)]
struct VMessJson {
    /// Remark/name
    #[serde(default)]
    ps: String,
    /// Server address
    #[serde(default)]
    add: String,
    /// Server port (can be string or number)
    #[serde(default, deserialize_with = "deserialize_option_text")]
    port: Option<String>,
    /// UUID
    #[serde(default)]
    id: String,
    /// Alter ID (can be string or number)
    #[serde(default, deserialize_with = "deserialize_option_text")]
    aid: Option<String>,
    /// Security/encryption method
    #[serde(default)]
    scy: Option<String>,
    /// Network type (tcp, ws, etc.)
    #[serde(default)]
    net: Option<String>,
    /// TLS setting
    #[serde(default)]
    tls: Option<String>,
    /// WebSocket host
    #[serde(default)]
    host: Option<String>,
    /// WebSocket path
    #[serde(default)]
    path: Option<String>,
    #[serde(
        default,
        rename = "allowInsecure",
        alias = "skip-cert-verify",
        deserialize_with = "deserialize_option_text"
    )]
    allow_insecure: Option<String>,
}

impl ProtocolParser for VMessParser {
    fn scheme(&self) -> &str {
        "vmess"
    }

    fn parse(&self, link: &str) -> Result<Node, ParseError> {
        let link = link.trim();
        trace!("Parsing VMess link");

        let without_scheme = link
            .strip_prefix("vmess://")
            .ok_or_else(|| ParseError::UnsupportedProtocol(link.to_string()))?;

        // Some exporters append a #remark after the encoded JSON
        let (encoded, fragment_name) = split_fragment(without_scheme);

        let decoded = decode_base64_to_string(encoded)
            .map_err(|e| ParseError::decode("VMess body", e))?;

        trace!("Decoded VMess JSON: {}", decoded);

        let json: VMessJson = serde_json::from_str(&decoded).map_err(|e| {
            ParseError::decode("VMess body", DecodeError::InvalidJson(e.to_string()))
        })?;

        let port = match json.port.as_deref() {
            Some(raw) => parse_port(raw.trim())?,
            None => return Err(ParseError::field(NodeField::Port, "port is missing")),
        };

        trace!(
            "VMess config: server={}:{}, uuid={}, net={:?}, tls={:?}",
            json.add, port, json.id, json.net, json.tls
        );

        let options = build_options(&json)?;
        let name = Some(json.ps).filter(|ps| !ps.is_empty()).or(fragment_name);

        let node = VmessNode::new(name, json.add, port, json.id, options)?;
        Ok(node.into())
    }
}

fn build_options(json: &VMessJson) -> Result<VmessOptions, ParseError> {
    let defaults = VmessOptions::default();

    let alter_id = match json.aid.as_deref().map(str::trim) {
        None | Some("") => defaults.alter_id,
        Some(raw) => raw.parse().map_err(|_| {
            ParseError::field(NodeField::AlterId, format!("invalid alterId: {}", raw))
        })?,
    };

    let mut ws_headers = BTreeMap::new();
    if let Some(host) = &json.host
        && !host.is_empty()
    {
        ws_headers.insert("Host".to_string(), host.clone());
    }

    Ok(VmessOptions {
        alter_id,
        security: non_empty(&json.scy).unwrap_or(defaults.security),
        network: non_empty(&json.net).unwrap_or(defaults.network),
        ws_path: non_empty(&json.path),
        ws_headers,
        tls: json.tls.as_deref() == Some("tls"),
        skip_cert_verify: json.allow_insecure.as_deref().is_some_and(is_truthy),
    })
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ============================================================================
// Deserialization Helpers
// ============================================================================

/// Custom deserializer for loosely typed fields (string, number or bool)
fn deserialize_option_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextValue {
        Integer(i64),
        Bool(bool),
        String(String),
    }

    Ok(
        Option::<TextValue>::deserialize(deserializer)?.map(|value| match value {
            TextValue::Integer(n) => n.to_string(),
            TextValue::Bool(b) => b.to_string(),
            TextValue::String(s) => s,
        }),
    )
}
