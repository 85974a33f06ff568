//! Testing utilities for ndcam
//!
//! Provides a simulated platform camera service so the state machine and
//! callback routing can be exercised without camera hardware.

pub mod simulated;

pub use simulated::{SimulatedCamera, SimulatedPlatform, SimulatedWindow};
