//! # Utility Modules
//!
//! This module provides common utility functions used throughout the
//! empirbus-rs crate: hex encoding/decoding and rate-limited logging.

pub mod hex;
pub mod logging;

// Re-export commonly used types and functions
pub use hex::{format_hex_compact, format_hex_list, parse_hex_lenient, parse_hex_list, HexError};
pub use logging::{log_frame_hex, suppressed_note, LogThrottle};
