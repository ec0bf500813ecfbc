//! NMEA 0183 GPS receiver.
//!
//! The module streams sentences over a UART.  [`NmeaParser`] assembles
//! bytes into lines, verifies the `*hh` checksum and extracts position
//! from RMC and GGA sentences from any talker (`GP`, `GN`, `GL`, …).
//! A void RMC (`V`) or a zero-quality GGA drops the fix.
//!
//! [`GpsReceiver`] pumps a [`ByteLink`] into the parser without blocking;
//! each poll reads at most [`MAX_BYTES_PER_POLL`] bytes.  The hub polls
//! on every tick (about 96 bytes arrive per 100 ms at 9600 baud), so the
//! UART buffer stays near empty and the parser holds the newest fix.

use heapless::Vec;
use log::debug;

use super::sample::LocationSample;
use crate::error::SensorError;
use crate::link::ByteLink;

/// NMEA caps sentences at 82 characters including `$` and CRLF.
const MAX_SENTENCE: usize = 96;

pub const MAX_BYTES_PER_POLL: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NmeaError {
    /// Missing `*hh` trailer or non-hex digits.
    MissingChecksum,
    BadChecksum { expected: u8, computed: u8 },
    /// A position field could not be parsed.
    BadField,
}

/// What a well-formed sentence says about the fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sentence {
    Position(LocationSample),
    NoFix,
    /// Checksummed but not a position sentence.
    Other,
}

/// Parse one sentence (with or without the leading `$`, without CRLF).
pub fn parse_sentence(line: &str) -> Result<Sentence, NmeaError> {
    let line = line.strip_prefix('$').unwrap_or(line);
    let (body, trailer) = line.split_once('*').ok_or(NmeaError::MissingChecksum)?;
    let expected = u8::from_str_radix(trailer.trim_end(), 16)
        .ok()
        .filter(|_| trailer.trim_end().len() == 2)
        .ok_or(NmeaError::MissingChecksum)?;
    let computed = body.bytes().fold(0u8, |acc, b| acc ^ b);
    if expected != computed {
        return Err(NmeaError::BadChecksum { expected, computed });
    }

    let mut fields = body.split(',');
    let id = fields.next().unwrap_or_default();
    let kind = id.get(2..).unwrap_or_default();
    let f: Vec<&str, 20> = fields.take(20).collect();
    let field = |i: usize| f.get(i).copied().unwrap_or_default();

    match kind {
        "RMC" => {
            // time, status, lat, N/S, lon, E/W, …
            if field(1) != "A" {
                return Ok(Sentence::NoFix);
            }
            position(field(2), field(3), field(4), field(5))
        }
        "GGA" => {
            // time, lat, N/S, lon, E/W, quality, …
            match field(5).parse::<u8>() {
                Ok(q) if q > 0 => position(field(1), field(2), field(3), field(4)),
                _ => Ok(Sentence::NoFix),
            }
        }
        _ => Ok(Sentence::Other),
    }
}

fn position(lat: &str, ns: &str, lon: &str, ew: &str) -> Result<Sentence, NmeaError> {
    let lat = degrees(lat, ns, 'N', 'S')?;
    let lon = degrees(lon, ew, 'E', 'W')?;
    LocationSample::new(lat, lon)
        .validated()
        .map(Sentence::Position)
        .map_err(|_| NmeaError::BadField)
}

/// `ddmm.mmmm` / `dddmm.mmmm` plus hemisphere → signed decimal degrees.
fn degrees(value: &str, hemi: &str, pos: char, neg: char) -> Result<f64, NmeaError> {
    let v: f64 = value.parse().map_err(|_| NmeaError::BadField)?;
    if !v.is_finite() || v < 0.0 {
        return Err(NmeaError::BadField);
    }
    let deg = (v / 100.0).trunc();
    let minutes = v - deg * 100.0;
    if minutes >= 60.0 {
        return Err(NmeaError::BadField);
    }
    let magnitude = deg + minutes / 60.0;
    match hemi.chars().next() {
        Some(c) if c == pos => Ok(magnitude),
        Some(c) if c == neg => Ok(-magnitude),
        _ => Err(NmeaError::BadField),
    }
}

// ───────────────────────────────────────────────────────────────
// Line assembler
// ───────────────────────────────────────────────────────────────

/// Byte-at-a-time sentence assembler holding the latest fix.
#[derive(Debug, Default)]
pub struct NmeaParser {
    line: Vec<u8, MAX_SENTENCE>,
    in_sentence: bool,
    fix: Option<LocationSample>,
    rejected: u32,
}

impl NmeaParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fix(&self) -> Option<LocationSample> {
        self.fix
    }

    /// Sentences dropped for bad checksums or fields.
    pub fn rejected(&self) -> u32 {
        self.rejected
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.push_byte(b);
        }
    }

    pub fn push_byte(&mut self, b: u8) {
        match b {
            b'$' => {
                self.line.clear();
                self.in_sentence = true;
            }
            b'\r' | b'\n' => {
                if self.in_sentence {
                    self.finish();
                }
                self.in_sentence = false;
            }
            _ if self.in_sentence => {
                if self.line.push(b).is_err() {
                    // Overlong: discard until the next '$'.
                    self.in_sentence = false;
                    self.rejected += 1;
                }
            }
            _ => {}
        }
    }

    fn finish(&mut self) {
        let Ok(text) = core::str::from_utf8(&self.line) else {
            self.rejected += 1;
            return;
        };
        match parse_sentence(text) {
            Ok(Sentence::Position(loc)) => self.fix = Some(loc),
            Ok(Sentence::NoFix) => self.fix = None,
            Ok(Sentence::Other) => {}
            Err(e) => {
                debug!("NMEA rejected: {:?}", e);
                self.rejected += 1;
            }
        }
        self.line.clear();
    }
}

// ───────────────────────────────────────────────────────────────
// Receiver
// ───────────────────────────────────────────────────────────────

pub struct GpsReceiver<L> {
    link: L,
    parser: NmeaParser,
}

impl<L: ByteLink> GpsReceiver<L> {
    pub fn new(link: L) -> Self {
        Self {
            link,
            parser: NmeaParser::new(),
        }
    }

    /// Consume pending bytes without blocking.
    pub fn poll(&mut self) -> Result<(), SensorError> {
        let mut buf = [0u8; 64];
        let mut total = 0;
        while total < MAX_BYTES_PER_POLL {
            let n = self.link.read(&mut buf).map_err(|_| SensorError::Bus)?;
            if n == 0 {
                break;
            }
            self.parser.feed(&buf[..n]);
            total += n;
        }
        Ok(())
    }

    /// Latest fix after draining the link.
    pub fn location(&mut self) -> Result<LocationSample, SensorError> {
        self.poll()?;
        self.parser.fix().ok_or(SensorError::NotReady)
    }

    pub fn parser(&self) -> &NmeaParser {
        &self.parser
    }
}
