//! Base64 text transport for binary payloads.
//!
//! Every binary field that travels inside an envelope (public key blobs,
//! initialization vectors, ciphertext) crosses the wire as base64 text,
//! line-wrapped for readability in logs and serialized documents. Decoding
//! accepts any whitespace layout, so re-wrapped or minified text round-trips.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{Error, Result};

/// Column at which encoded output is wrapped with CRLF
const LINE_WIDTH: usize = 76;

/// Encode bytes as line-wrapped base64 text
///
/// Empty input encodes to the empty string.
pub fn to_base64(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return String::new();
    }

    let raw = STANDARD.encode(bytes);
    let mut wrapped = String::with_capacity(raw.len() + 2 * (raw.len() / LINE_WIDTH));
    for (i, ch) in raw.chars().enumerate() {
        if i > 0 && i % LINE_WIDTH == 0 {
            wrapped.push_str("\r\n");
        }
        wrapped.push(ch);
    }
    wrapped
}

/// Decode base64 text, ignoring all whitespace
///
/// Empty or whitespace-only input decodes to an empty byte vector.
pub fn from_base64(text: &str) -> Result<Vec<u8>> {
    let stripped: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if stripped.is_empty() {
        return Ok(Vec::new());
    }

    STANDARD
        .decode(stripped.as_bytes())
        .map_err(|e| Error::InvalidArgument(format!("invalid base64 data: {}", e)))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_round_trip() {
        assert_eq!(to_base64(&[]), "");
        assert_eq!(from_base64("").unwrap(), Vec::<u8>::new());
        assert_eq!(from_base64(" \r\n\t ").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_wrapping_at_76_columns() {
        let bytes = vec![0xAB; 200];
        let text = to_base64(&bytes);

        for line in text.split("\r\n") {
            assert!(line.len() <= 76);
        }
        assert!(text.contains("\r\n"));
    }

    #[test]
    fn test_round_trip_survives_rewrapping() {
        let bytes: Vec<u8> = (0..=255).collect();
        let text = to_base64(&bytes);

        // Minified, re-wrapped, and space-indented variants all decode
        let minified: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let spaced = minified
            .as_bytes()
            .chunks(10)
            .map(|c| String::from_utf8_lossy(c).into_owned())
            .collect::<Vec<_>>()
            .join("  \n");

        assert_eq!(from_base64(&text).unwrap(), bytes);
        assert_eq!(from_base64(&minified).unwrap(), bytes);
        assert_eq!(from_base64(&spaced).unwrap(), bytes);
    }

    #[test]
    fn test_invalid_text_rejected() {
        assert!(matches!(
            from_base64("!!not base64!!").unwrap_err(),
            Error::InvalidArgument(_)
        ));
    }

    #[test]
    fn test_short_input_stays_on_one_line() {
        let text = to_base64(b"short");
        assert!(!text.contains('\n'));
    }
}
