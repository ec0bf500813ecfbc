//! Newline-delimited JSON over a byte link.
//!
//! The helmet talks to the paired phone through a UART Bluetooth module.
//! Each [`StructuredMessage`] becomes one JSON object followed by `\n`.
//! The module's STATE output (high while a peer is connected) gates
//! sending; without a peer, messages fail fast with `NotConnected`.
//!
//! A write that stalls part-way leaves a torn line on the wire.  The next
//! send terminates it with a bare `\n` first, so the phone discards one
//! unparseable line and the following message stays framed.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin};

use crate::alerts::StructuredMessage;
use crate::app::ports::TransportPort;
use crate::error::TransportError;
use crate::link::ByteLink;

/// Stand-in status line for modules without a STATE pin.
pub struct AlwaysConnected;

impl ErrorType for AlwaysConnected {
    type Error = Infallible;
}

impl InputPin for AlwaysConnected {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(true)
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(false)
    }
}

pub struct JsonLineTransport<L, P = AlwaysConnected> {
    link: L,
    status: P,
    sent: u32,
    /// A previous line was cut short and still needs its terminator.
    torn: bool,
}

impl<L: ByteLink> JsonLineTransport<L> {
    pub fn new(link: L) -> Self {
        Self::with_status(link, AlwaysConnected)
    }
}

impl<L: ByteLink, P: InputPin> JsonLineTransport<L, P> {
    pub fn with_status(link: L, status: P) -> Self {
        Self {
            link,
            status,
            sent: 0,
            torn: false,
        }
    }

    /// Messages written completely.
    pub fn sent(&self) -> u32 {
        self.sent
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    /// Whether the last line on the wire is unterminated.
    pub fn is_torn(&self) -> bool {
        self.torn
    }

    fn terminate_torn_line(&mut self) -> Result<(), TransportError> {
        if self.torn {
            match self.link.write(b"\n").map_err(|_| TransportError::Io)? {
                0 => return Err(TransportError::Busy),
                _ => self.torn = false,
            }
        }
        Ok(())
    }
}

impl<L: ByteLink, P: InputPin> TransportPort for JsonLineTransport<L, P> {
    fn send(&mut self, message: &StructuredMessage) -> Result<(), TransportError> {
        if !self.status.is_high().unwrap_or(false) {
            return Err(TransportError::NotConnected);
        }
        let mut line = message.to_json()?;
        line.push('\n');
        self.terminate_torn_line()?;

        let mut rest = line.as_bytes();
        let mut written = 0;
        while !rest.is_empty() {
            let n = match self.link.write(rest) {
                Ok(n) if n > 0 => n,
                result => {
                    self.torn = written > 0;
                    return Err(if result.is_ok() {
                        TransportError::Busy
                    } else {
                        TransportError::Io
                    });
                }
            };
            written += n;
            rest = &rest[n.min(rest.len())..];
        }
        self.sent += 1;
        Ok(())
    }
}
