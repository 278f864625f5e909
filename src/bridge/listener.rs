//! Inbound listener: Actisense lines in, state updates out.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tokio::sync::mpsc;

use crate::actisense::format::SerialLine;
use crate::actisense::transport::FrameTransport;
use crate::bridge::{Bridge, InboundMessage, InboundOutcome, StateUpdate};
use crate::error::EmpirBusError;
use crate::util::logging::{suppressed_note, LogThrottle};

/// Longest line kept, newline included. A full 255-byte record is about 810.
pub const MAX_LINE_BYTES: u64 = 1024;

enum LineRead {
    Eof,
    Line,
    TooLong,
}

/// Reads one line into `buf`, never buffering more than [`MAX_LINE_BYTES`].
/// An over-long line is discarded up to and including its newline.
async fn read_capped_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<LineRead>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let n = (&mut *reader).take(MAX_LINE_BYTES).read_until(b'\n', buf).await?;
    if n == 0 {
        return Ok(LineRead::Eof);
    }
    if (n as u64) < MAX_LINE_BYTES || buf.last() == Some(&b'\n') {
        return Ok(LineRead::Line);
    }

    loop {
        buf.clear();
        let n = (&mut *reader).take(MAX_LINE_BYTES).read_until(b'\n', buf).await?;
        if n == 0 || buf.last() == Some(&b'\n') {
            break;
        }
    }
    buf.clear();
    Ok(LineRead::TooLong)
}

/// Counters for one listener run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ListenerStats {
    /// Non-empty lines read
    pub lines: u64,
    /// Lines that were not valid Actisense records
    pub unparsable: u64,
    /// Records for other PGNs or manufacturers
    pub ignored: u64,
    /// EmpirBus records whose payload failed to decode
    pub dropped: u64,
    pub published: u64,
}

/// Reads lines until EOF (or until the update receiver goes away) and feeds
/// every record through the bridge.
///
/// Bad lines and bad frames are counted and logged; only an I/O error on the
/// reader ends the run with an error.
pub async fn run_listener<T, R>(
    bridge: &Bridge<T>,
    mut reader: R,
    updates: mpsc::Sender<StateUpdate>,
) -> Result<ListenerStats, EmpirBusError>
where
    T: FrameTransport,
    R: AsyncBufRead + Unpin,
{
    let mut stats = ListenerStats::default();
    let mut parse_log = LogThrottle::default();
    let mut buf = Vec::new();

    loop {
        match read_capped_line(&mut reader, &mut buf).await? {
            LineRead::Eof => break,
            LineRead::Line => {}
            LineRead::TooLong => {
                stats.lines += 1;
                stats.unparsable += 1;
                if let Some(suppressed) = parse_log.admit() {
                    log::warn!(
                        "Skipping line longer than {MAX_LINE_BYTES} bytes{}",
                        suppressed_note(suppressed)
                    );
                }
                continue;
            }
        }

        // Serial noise may not be valid UTF-8; such lines fail to parse below
        let text = String::from_utf8_lossy(&buf);
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        stats.lines += 1;

        let line = match SerialLine::parse(text) {
            Ok(line) => line,
            Err(err) => {
                stats.unparsable += 1;
                if let Some(suppressed) = parse_log.admit() {
                    log::warn!("Skipping unparsable line: {err}{}", suppressed_note(suppressed));
                }
                continue;
            }
        };

        match bridge.handle_inbound(&InboundMessage::from_serial_line(&line)).await {
            InboundOutcome::Ignored => stats.ignored += 1,
            InboundOutcome::Dropped(_) => stats.dropped += 1,
            InboundOutcome::Published(update) => {
                stats.published += 1;
                if updates.send(update).await.is_err() {
                    log::info!("Update receiver closed, stopping listener");
                    break;
                }
            }
        }
    }

    log::debug!("Listener finished: {stats:?}");
    Ok(stats)
}
