//! Output drivers, input conditioning, and the task watchdog.

pub mod engine;
pub mod status_led;
pub mod switch;
pub mod watchdog;
