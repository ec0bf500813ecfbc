//! Byte link abstraction: any byte-oriented serial channel.
//!
//! Concrete implementations:
//! - UART to the Bluetooth module (outbound JSON lines)
//! - UART from the GPS receiver (inbound NMEA sentences)
//!
//! The NMEA receiver and the JSON-line transport are generic over
//! [`ByteLink`], so swapping the physical link needs no changes to either.

/// Byte-oriented channel.
pub trait ByteLink {
    /// Error type for this link.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns the number of bytes actually read.
    /// Returns 0 if no data is available (non-blocking).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data` to the link.
    /// Returns the number of bytes actually written.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Check if data is available for reading.
    fn available(&self) -> bool;
}

/// A null link that discards all writes and never reads.
/// Bench builds use it when no Bluetooth module is fitted.
pub struct NullLink;

impl ByteLink for NullLink {
    type Error = ();

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, ()> {
        Ok(0)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn available(&self) -> bool {
        false
    }
}

// ═══════════════════════════════════════════════════════════════
//  ESP-IDF UART
// ═══════════════════════════════════════════════════════════════

#[cfg(feature = "espidf")]
pub use uart::UartLink;

#[cfg(feature = "espidf")]
mod uart {
    use esp_idf_hal::delay::NON_BLOCK;
    use esp_idf_hal::sys::EspError;
    use esp_idf_hal::uart::UartDriver;

    use super::ByteLink;

    /// Non-blocking [`ByteLink`] over an ESP-IDF UART driver.
    pub struct UartLink<'d> {
        uart: UartDriver<'d>,
    }

    impl<'d> UartLink<'d> {
        pub fn new(uart: UartDriver<'d>) -> Self {
            Self { uart }
        }
    }

    impl ByteLink for UartLink<'_> {
        type Error = EspError;

        fn read(&mut self, buf: &mut [u8]) -> Result<usize, EspError> {
            self.uart.read(buf, NON_BLOCK)
        }

        fn write(&mut self, data: &[u8]) -> Result<usize, EspError> {
            self.uart.write(data)
        }

        fn flush(&mut self) -> Result<(), EspError> {
            self.uart.wait_tx_done(NON_BLOCK)
        }

        fn available(&self) -> bool {
            self.uart.remaining_read().is_ok_and(|n| n > 0)
        }
    }
}
