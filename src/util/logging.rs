//! # Bus Logging Utilities
//!
//! Logging helpers for the EmpirBus bridge: rate limiting for warnings raised
//! by bus traffic, hex dumps of payloads, and optional `tracing` spans.
//!
//! ## Usage
//!
//! ```rust
//! use empirbus_rs::util::logging::{log_frame_hex, suppressed_note, LogThrottle};
//!
//! // Allow 5 warnings per second
//! let mut throttle = LogThrottle::new(1000, 5);
//! if let Some(suppressed) = throttle.admit() {
//!     log::warn!("Malformed EmpirBus frame dropped{}", suppressed_note(suppressed));
//! }
//!
//! log_frame_hex("Inbound payload", &[0x30, 0x99, 0x07]);
//! ```

use std::time::{Duration, Instant};

use crate::util::hex::format_hex_compact;

/// Caps how many warnings of one kind are logged per time window.
///
/// A misbehaving node can put a corrupt frame on the bus many times per
/// second; the listener logs through a throttle so the log stays readable.
/// Messages refused by [`LogThrottle::allow`] are counted and can be
/// reported with the next message that gets through.
#[derive(Debug)]
pub struct LogThrottle {
    window: Duration,
    cap: u32,
    window_start: Instant,
    in_window: u32,
    suppressed: u64,
}

impl LogThrottle {
    /// At most `cap` messages per `window_ms` milliseconds
    pub fn new(window_ms: u64, cap: u32) -> Self {
        Self {
            window: Duration::from_millis(window_ms),
            cap,
            window_start: Instant::now(),
            in_window: 0,
            suppressed: 0,
        }
    }

    /// `true` if the caller may log now
    pub fn allow(&mut self) -> bool {
        if self.window_start.elapsed() > self.window {
            self.window_start = Instant::now();
            self.in_window = 0;
        }

        if self.in_window < self.cap {
            self.in_window += 1;
            return true;
        }
        self.suppressed += 1;
        false
    }

    /// Messages refused since the last call
    pub fn take_suppressed(&mut self) -> u64 {
        std::mem::take(&mut self.suppressed)
    }

    /// Like [`allow`](Self::allow), but hands back how many messages were
    /// refused since the last admitted one
    pub fn admit(&mut self) -> Option<u64> {
        self.allow().then(|| self.take_suppressed())
    }
}

/// ` (N similar warnings suppressed)`, or nothing when none were
pub fn suppressed_note(suppressed: u64) -> String {
    if suppressed > 0 {
        format!(" ({suppressed} similar warnings suppressed)")
    } else {
        String::new()
    }
}

impl Default for LogThrottle {
    fn default() -> Self {
        Self::new(1000, 5)
    }
}

/// Longest payload dump written in full
const MAX_LOGGED_BYTES: usize = 64;

/// Logs `data` as spaced hex on the `empirbus::frame` target at debug level.
///
/// Longer payloads are cut after 64 bytes and the total length is appended.
pub fn log_frame_hex(prefix: &str, data: &[u8]) {
    if !log::log_enabled!(target: "empirbus::frame", log::Level::Debug) {
        return;
    }
    let shown = format_hex_compact(&data[..data.len().min(MAX_LOGGED_BYTES)]);
    if data.len() > MAX_LOGGED_BYTES {
        log::debug!(target: "empirbus::frame", "{prefix}: {shown} .. ({} bytes)", data.len());
    } else {
        log::debug!(target: "empirbus::frame", "{prefix}: {shown}");
    }
}

/// Enter a tracing span for frame processing; it closes when dropped
#[cfg(feature = "tracing")]
pub fn span_frame_processing(direction: &str, instance: Option<u8>) -> tracing::span::EnteredSpan {
    tracing::info_span!("frame_processing", direction = direction, instance = instance).entered()
}

/// Fallback span creation when tracing is not available
#[cfg(not(feature = "tracing"))]
pub fn span_frame_processing(_direction: &str, _instance: Option<u8>) {}
