//! SafeX smart-helmet firmware library.
//!
//! Exposes the control loop, detectors, and adapters for integration
//! testing and host simulation. ESP-IDF-specific code is guarded by
//! `#[cfg(feature = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod alerts;
pub mod app;
pub mod config;
pub mod detect;
pub mod error;
pub mod link;
pub mod pins;
pub mod safety;
pub mod scheduler;

pub mod adapters;
pub mod drivers;
pub mod sensors;
