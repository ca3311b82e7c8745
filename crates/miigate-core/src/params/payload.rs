//! Avatar payload ("store data") decoding.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{RenderError, Result};

/// Size of raw Mii Studio data, the shortest accepted format.
pub const STORE_DATA_MIN: usize = 46;
/// Size of full native store data, and of the request's payload slot.
pub const STORE_DATA_MAX: usize = 96;

/// Decode `data` as hex, falling back to Base64 (standard or URL-safe, with
/// or without padding).
///
/// Spaces are insignificant for hex. For Base64 they are read back as `+`,
/// since form decoding of the query string has already turned every
/// unescaped `+` into a space.
pub fn decode_store_data(raw: &str) -> Result<Vec<u8>> {
    let compact: String = raw.chars().filter(|c| *c != ' ').collect();
    if let Ok(bytes) = hex::decode(&compact) {
        return Ok(bytes);
    }
    decode_base64(raw).map_err(|e| RenderError::invalid("data", format!("failed to decode data: {e}")))
}

fn decode_base64(s: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let mut s: String = s
        .chars()
        .map(|c| match c {
            ' ' | '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect();
    match s.len() % 4 {
        2 => s.push_str("=="),
        3 => s.push('='),
        _ => {}
    }
    STANDARD.decode(s)
}

/// Enforce the accepted payload size range.
pub fn check_length(data: &[u8]) -> Result<()> {
    if (STORE_DATA_MIN..=STORE_DATA_MAX).contains(&data.len()) {
        Ok(())
    } else {
        Err(RenderError::invalid(
            "data",
            format!(
                "length should be between {STORE_DATA_MIN}-{STORE_DATA_MAX} bytes, got {}",
                data.len()
            ),
        ))
    }
}
