//! Platform camera service seam
//!
//! A backend exposes the native camera service through these traits. Handles
//! are owned values: dropping a device or session closes it on the platform.
//! Backends must deliver events through the [`EventSink`] they are handed,
//! asynchronously, never from inside the call that registered the sink.

pub mod surface;

pub use surface::{NativeWindow, Surface};

use crate::dispatcher::EventSink;
use crate::metadata::CameraMetadata;
use crate::status::CameraStatus;

/// Entry point into a platform camera service.
pub trait CameraPlatform: Send + Sync {
    fn create_manager(&self) -> Result<Box<dyn PlatformManager>, CameraStatus>;
}

/// The platform's camera manager handle.
pub trait PlatformManager: Send + Sync {
    fn camera_ids(&self) -> Result<Vec<String>, CameraStatus>;

    fn characteristics(&self, camera_id: &str) -> Result<CameraMetadata, CameraStatus>;

    /// Open a device. Disconnect and error callbacks go to `events`.
    fn open_camera(
        &self,
        camera_id: &str,
        events: EventSink,
    ) -> Result<Box<dyn PlatformDevice>, CameraStatus>;
}

/// An open device handle.
pub trait PlatformDevice: Send {
    fn id(&self) -> &str;

    /// Build a capture session writing into `target`. Session state callbacks go to `events`.
    fn create_session(
        &mut self,
        target: &Surface,
        events: EventSink,
    ) -> Result<Box<dyn PlatformSession>, CameraStatus>;
}

/// An active capture session handle.
pub trait PlatformSession: Send {
    /// Issue a request the platform repeats until stopped. Returns the sequence id.
    fn set_repeating_request(
        &mut self,
        target: &Surface,
        events: EventSink,
    ) -> Result<i32, CameraStatus>;

    /// Issue a single capture request. Returns the sequence id.
    fn capture(&mut self, target: &Surface, events: EventSink) -> Result<i32, CameraStatus>;

    fn stop_repeating(&mut self) -> Result<(), CameraStatus>;
}
