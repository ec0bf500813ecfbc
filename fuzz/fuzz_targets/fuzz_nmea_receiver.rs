//! Fuzz target: `GpsReceiver::location` over a byte link
//!
//! Feeds arbitrary bytes through the same path the GPS UART takes and
//! asserts that the receiver never panics and only ever reports
//! coordinates inside the valid range.  Each input is split at its first
//! byte so sentences straddling two polls are exercised too.
//!
//! cargo fuzz run fuzz_nmea_receiver

#![no_main]

use libfuzzer_sys::fuzz_target;
use safex::link::ByteLink;
use safex::sensors::gps::GpsReceiver;

struct Chunks<'a> {
    parts: [&'a [u8]; 2],
    next: usize,
}

impl ByteLink for Chunks<'_> {
    type Error = ();

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
        let Some(part) = self.parts.get_mut(self.next) else {
            return Ok(0);
        };
        let n = buf.len().min(part.len());
        buf[..n].copy_from_slice(&part[..n]);
        *part = &part[n..];
        if part.is_empty() {
            self.next += 1;
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn available(&self) -> bool {
        self.next < self.parts.len()
    }
}

fuzz_target!(|data: &[u8]| {
    let split = data.first().map_or(0, |&b| usize::from(b).min(data.len()));
    let (head, tail) = data.split_at(split);
    let mut rx = GpsReceiver::new(Chunks {
        parts: [head, tail],
        next: 0,
    });

    for _ in 0..4 {
        if let Ok(fix) = rx.location() {
            assert!((-90.0..=90.0).contains(&fix.lat), "lat out of range");
            assert!((-180.0..=180.0).contains(&fix.lon), "lon out of range");
        }
    }
});
