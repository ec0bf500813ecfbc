//! Application core: domain vocabulary and port traits, zero I/O.
//!
//! Everything the control loop touches outside its own memory goes
//! through a **port trait** defined in [`ports`]: sensors, the phone
//! link, engine relay, status LED, voice prompts, clock, and persisted
//! configuration.  Host tests substitute fakes for all of them.

pub mod commands;
pub mod events;
pub mod ports;
