//! # Actisense Serial Format
//!
//! Formatting and parsing of the ASCII interchange line used by NMEA 2000
//! logging and playback tools:
//!
//! ```text
//! 2026-10-18T09:30:00.000Z,2,65280,0,255,8,30,99,07,f4,01,00,00,05
//! <timestamp>,<prio>,<pgn>,<src>,<dst>,<len>,<byte>,<byte>,...
//! ```
//!
//! Payload bytes are written as two-digit lowercase hex tokens in payload
//! order. Timestamps are written as ISO-8601 UTC with millisecond precision;
//! the parser also accepts the `YYYY-MM-DD-HH:MM:SS.sss` form some loggers
//! emit.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use nom::{
    bytes::complete::take_till,
    character::complete::{char, u32 as dec_u32, u8 as dec_u8, u64 as dec_u64},
    sequence::terminated,
    IResult,
};

use crate::constants::{ACTISENSE_PRIORITY, BROADCAST_ADDRESS};
use crate::error::EmpirBusError;
use crate::util::hex::{format_hex_list, parse_hex_list};

/// Largest payload the length field can describe
pub const MAX_LINE_PAYLOAD: usize = u8::MAX as usize;

/// Sub-second digits carried by a line timestamp
const TIMESTAMP_DIGITS: u16 = 3;

/// One Actisense serial record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialLine {
    pub timestamp: DateTime<Utc>,
    pub priority: u8,
    pub pgn: u32,
    pub source: u8,
    pub destination: u8,
    pub data: Vec<u8>,
}

impl SerialLine {
    /// Builds an outbound line at the fixed priority 2.
    ///
    /// `destination` defaults to the broadcast address 255. The timestamp is
    /// truncated to milliseconds, the precision the line carries.
    pub fn new(
        pgn: u32,
        data: &[u8],
        source: u8,
        destination: Option<u8>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, EmpirBusError> {
        if data.len() > MAX_LINE_PAYLOAD {
            return Err(EmpirBusError::InvalidPayloadLength(data.len()));
        }
        Ok(Self {
            timestamp: timestamp.trunc_subsecs(TIMESTAMP_DIGITS),
            priority: ACTISENSE_PRIORITY,
            pgn,
            source,
            destination: destination.unwrap_or(BROADCAST_ADDRESS),
            data: data.to_vec(),
        })
    }

    /// Parses one line; surrounding whitespace and line endings are ignored.
    pub fn parse(line: &str) -> Result<Self, EmpirBusError> {
        let line = line.trim();
        let (rest, header) = parse_header(line)
            .map_err(|e| EmpirBusError::SerialLineParse(format!("{e:?} in {line:?}")))?;

        if header.len > MAX_LINE_PAYLOAD as u64 {
            return Err(EmpirBusError::InvalidPayloadLength(
                usize::try_from(header.len).unwrap_or(usize::MAX),
            ));
        }
        let timestamp = parse_timestamp(header.timestamp)?;
        let data = parse_hex_list(rest)?;
        if header.len as usize != data.len() {
            return Err(EmpirBusError::SerialLineParse(format!(
                "length field says {} bytes, line carries {}",
                header.len,
                data.len()
            )));
        }

        Ok(Self {
            timestamp,
            priority: header.priority,
            pgn: header.pgn,
            source: header.source,
            destination: header.destination,
            data,
        })
    }
}

impl fmt::Display for SerialLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{},{}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.priority,
            self.pgn,
            self.source,
            self.destination,
            self.data.len(),
            format_hex_list(&self.data)
        )
    }
}

impl FromStr for SerialLine {
    type Err = EmpirBusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SerialLine::parse(s)
    }
}

/// Formats one outbound Actisense line.
///
/// Fails with `InvalidPayloadLength` when the payload exceeds 255 bytes.
pub fn format_serial_line(
    pgn: u32,
    payload: &[u8],
    source: u8,
    destination: Option<u8>,
    timestamp: DateTime<Utc>,
) -> Result<String, EmpirBusError> {
    Ok(SerialLine::new(pgn, payload, source, destination, timestamp)?.to_string())
}

struct LineHeader<'a> {
    timestamp: &'a str,
    priority: u8,
    pgn: u32,
    source: u8,
    destination: u8,
    len: u64,
}

fn comma(input: &str) -> IResult<&str, char> {
    char(',')(input)
}

fn parse_header(input: &str) -> IResult<&str, LineHeader<'_>> {
    let (input, timestamp) = terminated(take_till(|c| c == ','), comma)(input)?;
    let (input, priority) = terminated(dec_u8, comma)(input)?;
    let (input, pgn) = terminated(dec_u32, comma)(input)?;
    let (input, source) = terminated(dec_u8, comma)(input)?;
    let (input, destination) = terminated(dec_u8, comma)(input)?;
    let (input, len) = dec_u64(input)?;
    // An empty payload may be written with or without the trailing comma
    let input = input.strip_prefix(',').unwrap_or(input);
    Ok((
        input,
        LineHeader {
            timestamp,
            priority,
            pgn,
            source,
            destination,
            len,
        },
    ))
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, EmpirBusError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(ts.with_timezone(&Utc).trunc_subsecs(TIMESTAMP_DIGITS));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d-%H:%M:%S%.f")
        .map(|naive| naive.and_utc().trunc_subsecs(TIMESTAMP_DIGITS))
        .map_err(|e| EmpirBusError::SerialLineParse(format!("bad timestamp {text:?}: {e}")))
}
