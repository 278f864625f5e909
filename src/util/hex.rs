//! # Hex Encoding/Decoding Utilities
//!
//! Hex helpers shared by the codec, the Actisense formatter and the CLI.
//! The Actisense serial format lists payload bytes as comma-separated,
//! two-digit lowercase tokens (`30,99,07,f4,01,00,00,05`); log output uses a
//! space-separated form instead.
//!
//! ## Usage
//!
//! ```rust
//! use empirbus_rs::util::hex::{format_hex_list, parse_hex_list, parse_hex_lenient};
//!
//! let data = [0x30, 0x99, 0x07];
//! assert_eq!(format_hex_list(&data), "30,99,07");
//! assert_eq!(parse_hex_list("30,99,07").unwrap(), data);
//! assert_eq!(parse_hex_lenient("30 99 07").unwrap(), data);
//! ```

use thiserror::Error;

/// Errors that can occur during hex operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HexError {
    #[error("Invalid hex token: {0:?}")]
    InvalidToken(String),

    #[error("Odd number of hex characters: {0}")]
    OddLength(usize),

    #[error("Empty hex string")]
    EmptyString,

    #[error("Hex decoding error: {0}")]
    DecodeError(String),
}

/// Format bytes as comma-separated, zero-padded, lowercase tokens
///
/// This is the payload tail of an Actisense serial line. Byte order is kept
/// as-is.
pub fn format_hex_list(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse a comma-separated list of hex byte tokens
///
/// Tokens may be one or two hex digits in either case. An empty input yields
/// an empty payload.
pub fn parse_hex_list(input: &str) -> Result<Vec<u8>, HexError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    trimmed.split(',').map(|token| hex_byte(token.trim())).collect()
}

/// Format hex data for compact display (useful for logs)
///
/// Formats data as "30 99 07" with spaces between bytes.
pub fn format_hex_compact(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse hex string that may contain spaces or other separators
///
/// Strips all non-hex characters. An optional
/// `0x` prefix is dropped first.
pub fn parse_hex_lenient(input: &str) -> Result<Vec<u8>, HexError> {
    let input = input
        .trim()
        .strip_prefix("0x")
        .unwrap_or_else(|| input.trim());
    let hex_chars: String = input.chars().filter(|c| c.is_ascii_hexdigit()).collect();

    if hex_chars.is_empty() {
        return Err(HexError::EmptyString);
    }

    if hex_chars.len() % 2 != 0 {
        return Err(HexError::OddLength(hex_chars.len()));
    }

    hex::decode(&hex_chars).map_err(|e| HexError::DecodeError(e.to_string()))
}

/// Convert a single hex byte token (one or two digits) to u8
pub fn hex_byte(token: &str) -> Result<u8, HexError> {
    if token.is_empty() || token.len() > 2 || !token.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(HexError::InvalidToken(token.to_string()));
    }

    u8::from_str_radix(token, 16).map_err(|_| HexError::InvalidToken(token.to_string()))
}
