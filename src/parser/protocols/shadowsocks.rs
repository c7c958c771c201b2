//! Shadowsocks protocol parser
//!
//! This module provides parsing for Shadowsocks (ss://) links in both the
//! legacy form and the SIP002 form, including the SIP003 `plugin` parameter.

use tracing::trace;

use crate::error::ParseError;
use crate::model::{Node, SsNode, parse_port};
use crate::parser::base64::decode_base64_to_string;

use super::{ProtocolParser, split_fragment, split_host_port};

// ============================================================================
// Shadowsocks Parser
// ============================================================================

/// Parser for Shadowsocks (ss://) links
///
/// Supported body forms, tried in this order:
/// - Legacy: ss://BASE64(method:password@host:port)#tag
/// - SIP002: ss://BASE64(method:password)@host:port#tag
/// - SIP002 with SIP003 plugin: ss://BASE64(method:password)@host:port/?plugin=name;opts#tag
pub struct ShadowsocksParser;

/// Decoded fields of a link body, not yet validated
#[derive(Debug, PartialEq, Eq)]
struct SsFields {
    method: String,
    password: String,
    server: String,
    port: u16,
    plugin: Option<String>,
}

/// A body decoder returns `None` when the body is not in its form, letting
/// the next decoder try. `Some(Err(..))` is final.
type BodyDecoder = fn(&str) -> Option<Result<SsFields, ParseError>>;

/// Body forms in precedence order
const BODY_DECODERS: &[(&str, BodyDecoder)] =
    &[("legacy", decode_legacy), ("sip002", decode_sip002)];

impl ProtocolParser for ShadowsocksParser {
    fn scheme(&self) -> &str {
        "ss"
    }

    fn parse(&self, link: &str) -> Result<Node, ParseError> {
        let link = link.trim();
        trace!("Parsing Shadowsocks link");

        let without_scheme = link
            .strip_prefix("ss://")
            .ok_or_else(|| ParseError::UnsupportedProtocol(link.to_string()))?;

        let (body, name) = split_fragment(without_scheme);

        for (form, decoder) in BODY_DECODERS {
            let Some(result) = decoder(body) else {
                trace!(form, "Shadowsocks body is not in this form");
                continue;
            };
            trace!(form, "Decoding Shadowsocks body");
            let fields = result?;

            let node = SsNode::new(
                name,
                fields.server,
                fields.port,
                fields.method,
                fields.password,
            )?
            .with_plugin(fields.plugin);
            return Ok(node.into());
        }

        Err(ParseError::structural('@', "Shadowsocks link"))
    }
}

// ============================================================================
// Body Decoders
// ============================================================================

/// Legacy form: the whole body is base64 of `method:password@host:port`
fn decode_legacy(body: &str) -> Option<Result<SsFields, ParseError>> {
    let decoded = decode_base64_to_string(body).ok()?;
    Some(parse_legacy_content(&decoded))
}

fn parse_legacy_content(content: &str) -> Result<SsFields, ParseError> {
    let (userinfo, serverinfo) = content
        .split_once('@')
        .ok_or_else(|| ParseError::structural('@', "legacy Shadowsocks body"))?;

    let (method, password) = userinfo
        .split_once(':')
        .ok_or_else(|| ParseError::structural(':', "legacy Shadowsocks userinfo"))?;

    let (server, port) = split_host_port(serverinfo, "legacy Shadowsocks server info")?;

    Ok(SsFields {
        method: method.to_string(),
        password: password.to_string(),
        server: server.to_string(),
        port: parse_port(port)?,
        plugin: None,
    })
}

/// SIP002 form: `BASE64(method:password)@host:port[/][?query]`
///
/// Always applies, so it must stay last.
fn decode_sip002(body: &str) -> Option<Result<SsFields, ParseError>> {
    Some(parse_sip002(body))
}

fn parse_sip002(body: &str) -> Result<SsFields, ParseError> {
    let (userinfo, serverinfo) = body
        .split_once('@')
        .ok_or_else(|| ParseError::structural('@', "SIP002 body"))?;

    // Some clients percent-encode the base64 padding
    let userinfo = urlencoding::decode(userinfo)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| userinfo.to_string());
    let credentials = decode_base64_to_string(&userinfo)
        .map_err(|e| ParseError::decode("SIP002 userinfo", e))?;

    let (method, password) = credentials
        .split_once(':')
        .ok_or_else(|| ParseError::structural(':', "SIP002 userinfo"))?;

    let (server, rest) = split_host_port(serverinfo, "SIP002 server info")?;

    let (port, query) = match rest.split_once('?') {
        Some((port, query)) => (port, Some(query)),
        None => (rest, None),
    };
    // SIP002 writes the query as `host:port/?plugin=...`
    let port = parse_port(port.trim_end_matches('/'))?;

    let plugin = query.and_then(parse_plugin_param);
    if let Some(plugin) = &plugin {
        trace!(plugin = plugin.as_str(), "Found SIP003 plugin parameter");
    }

    Ok(SsFields {
        method: method.to_string(),
        password: password.to_string(),
        server: server.to_string(),
        port,
        plugin,
    })
}

/// Extracts the raw `plugin` value from a query string
///
/// The value is kept as a whole (`name;opt=value;...`) and not interpreted.
fn parse_plugin_param(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "plugin")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
