//! ndcam: device and capture-session lifecycle for native camera services
//!
//! This crate tracks a fixed set of camera devices exposed by a platform
//! camera service: discovery, open/close, at most one active capture session
//! per device, and the asynchronous callbacks the hardware fires back.
//!
//! # Features
//! - Device discovery bounded by a fixed maximum device count
//! - Per-device state machine safe against concurrent hardware callbacks
//! - Typed hardware events, routed to device state and to subscribers
//! - Stream configuration enumeration from capability metadata
//! - Status-code translation into typed errors
//!
//! # Usage
//! ```rust,ignore
//! use std::sync::Arc;
//! use ndcam::{CameraContext, Surface};
//!
//! let context = CameraContext::with_defaults(Arc::new(platform));
//! context.initialize()?;
//! context.open(0)?;
//! context.start_repeat(0, &Surface::new(window))?;
//! // ...
//! context.stop_repeat(0)?;
//! context.close(0)?;
//! context.release();
//! ```
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod errors;
pub mod events;
pub mod metadata;
pub mod platform;
pub mod registry;
pub mod scanner;
pub mod session;
pub mod status;
pub mod types;

// Simulated camera service - available for external tests
pub mod testing;

// Re-exports for convenience
pub use config::NdcamConfig;
pub use context::CameraContext;
pub use dispatcher::{CallbackDispatcher, EventSink};
pub use errors::{CameraError, ErrorKind};
pub use events::{CameraEvent, CaptureFailure, DeviceErrorCode, EventKind, HardwareEvent};
pub use metadata::{CameraMetadata, MetadataEntry};
pub use platform::{
    CameraPlatform, NativeWindow, PlatformDevice, PlatformManager, PlatformSession, Surface,
};
pub use registry::{DeviceRegistry, MAX_CAMERA_COUNT};
pub use scanner::{scan, ImageFormat, StreamConfig, StreamDirection};
pub use session::SessionController;
pub use status::{translate, CameraStatus};
pub use types::{
    CaptureMode, DeviceFault, DeviceInfo, DeviceSnapshot, FacingDirection, SessionId,
    SessionState,
};

/// Initialize logging with the default filter
pub fn init_logging() {
    init_logging_with(&NdcamConfig::default().logging.filter);
}

/// Initialize logging, using `filter` when `RUST_LOG` is not set
pub fn init_logging_with(filter: &str) {
    let env = env_logger::Env::default().default_filter_or(filter);
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
        max_devices: MAX_CAMERA_COUNT,
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub max_devices: usize,
}
