//! Base64 decoding utilities
//!
//! Subscription links carry base64 in several shapes: standard or URL-safe
//! alphabet, with or without padding, occasionally wrapped across lines.
//! Everything here is tolerant of those variations and only reports a
//! [`DecodeError`] once every alphabet has been tried.

use std::borrow::Cow;

use base64::Engine;
use base64::alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use tracing::{debug, trace};

use crate::error::DecodeError;

// ============================================================================
// Base64 Decoding
// ============================================================================

/// Decoding accepts non-zero bits after the last full byte
const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true);

const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// Alphabets tried by [`decode_base64_tolerant`], in order
pub const BASE64_ALPHABETS: &[(&str, &GeneralPurpose)] = &[
    ("standard", &LENIENT_STANDARD),
    ("url-safe", &LENIENT_URL_SAFE),
];

/// Decodes base64 content, repairing padding and trying every alphabet
///
/// Whitespace is removed and padding is normalised to a multiple of 4
/// characters, then the standard alphabet is tried before the URL-safe one.
/// Input missing its padding decodes to the same bytes as the padded form.
pub fn decode_base64_tolerant(content: &str) -> Result<Vec<u8>, DecodeError> {
    let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let padded = add_base64_padding(cleaned.trim_end_matches('='));
    trace!("Attempting Base64 decode, padded length: {} bytes", padded.len());

    for (alphabet, engine) in BASE64_ALPHABETS {
        if let Ok(decoded) = engine.decode(&padded) {
            trace!(alphabet, "Decoded Base64 content");
            return Ok(decoded);
        }
    }

    Err(DecodeError::InvalidBase64)
}

/// Decodes base64 content into a UTF-8 string
pub fn decode_base64_to_string(content: &str) -> Result<String, DecodeError> {
    let bytes = decode_base64_tolerant(content)?;
    String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)
}

/// Adds proper padding to Base64 string if missing
///
/// Base64 strings should have a length that is a multiple of 4.
/// This function adds '=' padding characters as needed.
pub fn add_base64_padding(s: &str) -> String {
    let mut result = s.to_string();
    while !result.len().is_multiple_of(4) {
        result.push('=');
    }
    result
}

/// Decodes subscription content when a provider serves the whole list as one
/// base64 blob
///
/// Content that already contains a link scheme is returned unchanged, as is
/// anything that does not decode to text containing one.
pub fn decode_subscription_content(content: &str) -> Cow<'_, str> {
    let trimmed = content.trim();
    if trimmed.is_empty() || trimmed.contains("://") {
        return Cow::Borrowed(content);
    }

    match decode_base64_to_string(trimmed) {
        Ok(decoded) if decoded.contains("://") => {
            debug!(
                "Decoded base64 subscription body into {} bytes of links",
                decoded.len()
            );
            Cow::Owned(decoded)
        }
        _ => Cow::Borrowed(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_base64_standard() {
        let decoded = decode_base64_tolerant("aGVsbG8gd29ybGQ=").unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "hello world");
    }

    #[test]
    fn test_decode_base64_url_safe() {
        // 0xfb 0xff encodes to "-_8" in the URL-safe alphabet
        let decoded = decode_base64_tolerant("-_8=").unwrap();
        assert_eq!(decoded, vec![0xfb, 0xff]);
    }

    #[test]
    fn test_decode_base64_url_safe_without_padding() {
        let decoded = decode_base64_tolerant("-_8").unwrap();
        assert_eq!(decoded, vec![0xfb, 0xff]);
    }

    #[test]
    fn test_missing_padding_decodes_identically() {
        // "a" -> "YQ==", "ab" -> "YWI=", "abc" -> "YWJj"
        assert_eq!(
            decode_base64_tolerant("YQ").unwrap(),
            decode_base64_tolerant("YQ==").unwrap()
        );
        assert_eq!(
            decode_base64_tolerant("YQ=").unwrap(),
            decode_base64_tolerant("YQ==").unwrap()
        );
        assert_eq!(
            decode_base64_tolerant("YWI").unwrap(),
            decode_base64_tolerant("YWI=").unwrap()
        );
        assert_eq!(decode_base64_tolerant("YQ").unwrap(), b"a".to_vec());
    }

    #[test]
    fn test_decode_base64_non_zero_trailing_bits() {
        // "YR" carries 0001 after the single byte 'a'
        assert_eq!(decode_base64_tolerant("YR").unwrap(), b"a".to_vec());
        assert_eq!(decode_base64_tolerant("YR==").unwrap(), b"a".to_vec());
    }

    #[test]
    fn test_decode_base64_with_linebreaks() {
        let decoded = decode_base64_tolerant("aGVs\nbG8g\nd29y\nbGQ=").unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "hello world");
    }

    #[test]
    fn test_decode_base64_with_whitespace() {
        let decoded = decode_base64_tolerant("  aGVsbG8gd29ybGQ=  ").unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "hello world");
    }

    #[test]
    fn test_decode_base64_empty() {
        let decoded = decode_base64_tolerant("").unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_decode_base64_invalid() {
        assert_eq!(
            decode_base64_tolerant("not valid base64!!!"),
            Err(DecodeError::InvalidBase64)
        );
    }

    #[test]
    fn test_decode_base64_mixed_alphabets_fails() {
        // '+' only exists in standard, '-' only in URL-safe
        assert!(decode_base64_tolerant("ab+-").is_err());
    }

    #[test]
    fn test_decode_base64_to_string_invalid_utf8() {
        // 0xfb 0xff is not UTF-8
        assert_eq!(
            decode_base64_to_string("-_8"),
            Err(DecodeError::InvalidUtf8)
        );
    }

    #[test]
    fn test_add_base64_padding() {
        assert_eq!(add_base64_padding("abcd"), "abcd");
        assert_eq!(add_base64_padding("abc"), "abc=");
        assert_eq!(add_base64_padding("ab"), "ab==");
        assert_eq!(add_base64_padding("a"), "a===");
        assert_eq!(add_base64_padding(""), "");
    }

    #[test]
    fn test_decode_subscription_content_base64_blob() {
        use base64::engine::general_purpose::STANDARD;
        let original = "ss://YWVzLTI1Ni1nY206cGFzc3dvcmQ@host1:1234#node1\nss://abc@host2:5678";
        let encoded = STANDARD.encode(original);
        assert_eq!(decode_subscription_content(&encoded), original);
    }

    #[test]
    fn test_decode_subscription_content_plain_list_unchanged() {
        let content = "ss://abc@host:1\n# comment\n";
        assert!(matches!(
            decode_subscription_content(content),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn test_decode_subscription_content_non_link_text_unchanged() {
        use base64::engine::general_purpose::STANDARD;
        let encoded = STANDARD.encode("just some text");
        assert_eq!(decode_subscription_content(&encoded), encoded);
    }
}
