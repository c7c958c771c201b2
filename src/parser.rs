//! Subscription and Protocol Parsing Module
//!
//! This module provides functionality for:
//! - Decoding base64 content in its standard and URL-safe variants
//! - Parsing protocol links (ss://, vmess://) into validated nodes
//! - Ordered dispatch to the first parser that recognizes a link

pub mod base64;
pub mod protocols;

pub use self::base64::{
    add_base64_padding, decode_base64_to_string, decode_base64_tolerant,
    decode_subscription_content,
};
pub use protocols::{
    ProtocolParser, ProtocolRegistry, ShadowsocksParser, VMessParser, split_fragment,
    split_host_port,
};
