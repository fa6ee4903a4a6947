//! Single-byte Western (windows-1252) text handling for the parameter block
//!
//! Every byte maps to exactly one character and back, so character counts are
//! byte counts once encoded.

use crate::error::{Result, TwixError};
use encoding_rs::WINDOWS_1252;

pub fn decode_header_text(bytes: &[u8]) -> String {
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    text.into_owned()
}

pub fn encode_header_text(text: &str) -> Result<Vec<u8>> {
    let (bytes, _, unmappable) = WINDOWS_1252.encode(text);
    if unmappable {
        return Err(TwixError::format(
            "header text contains characters outside windows-1252",
        ));
    }
    Ok(bytes.into_owned())
}

/// Decodes a fixed-width NUL-padded field.
pub fn decode_fixed_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    decode_header_text(&bytes[..end])
}
