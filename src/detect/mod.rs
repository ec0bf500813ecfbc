//! Pure detectors evaluated once per tick: fall and heart-rate bounds.

pub mod fall;
pub mod vitals;

pub use fall::{FallDetector, FallModel, FallModelKind, MagnitudeMode, WindowedFallDetector};
pub use vitals::{HeartRateBounds, VitalsMonitor};
