//! Hardware event types
//!
//! `HardwareEvent` is what a platform backend reports through an
//! [`crate::dispatcher::EventSink`]. `CameraEvent` is the projection handed to
//! subscribers once the dispatcher has routed it.

use crate::metadata::CameraMetadata;
use crate::types::SessionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error codes carried by a device error callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceErrorCode {
    CameraInUse,
    MaxCamerasInUse,
    CameraDisabled,
    CameraDevice,
    CameraService,
    Other(i32),
}

impl DeviceErrorCode {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => DeviceErrorCode::CameraInUse,
            2 => DeviceErrorCode::MaxCamerasInUse,
            3 => DeviceErrorCode::CameraDisabled,
            4 => DeviceErrorCode::CameraDevice,
            5 => DeviceErrorCode::CameraService,
            other => DeviceErrorCode::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureFailure {
    pub frame_number: i64,
    pub reason: i32,
    pub sequence_id: i32,
    pub was_image_captured: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HardwareEvent {
    DeviceDisconnected,
    DeviceError { code: i32 },
    SessionActive,
    SessionReady,
    SessionClosed,
    CaptureStarted { timestamp: u64 },
    CaptureProgressed { result: CameraMetadata },
    CaptureCompleted { result: CameraMetadata },
    CaptureFailed(CaptureFailure),
    CaptureBufferLost { frame_number: i64 },
    SequenceAborted { sequence_id: i32 },
    SequenceCompleted { sequence_id: i32, frame_number: i64 },
}

impl HardwareEvent {
    /// Per-frame events, which subscribers may opt out of.
    pub fn is_per_frame(&self) -> bool {
        matches!(
            self,
            HardwareEvent::CaptureStarted { .. }
                | HardwareEvent::CaptureProgressed { .. }
                | HardwareEvent::CaptureCompleted { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    DeviceDisconnected,
    DeviceError { code: i32, error: DeviceErrorCode },
    SessionActive,
    SessionReady,
    SessionClosed,
    CaptureStarted { timestamp: u64 },
    CaptureProgressed { sensor_timestamp: Option<i64> },
    CaptureCompleted { sensor_timestamp: Option<i64> },
    CaptureFailed(CaptureFailure),
    CaptureBufferLost { frame_number: i64 },
    SequenceAborted { sequence_id: i32 },
    SequenceCompleted { sequence_id: i32, frame_number: i64 },
}

impl From<&HardwareEvent> for EventKind {
    fn from(event: &HardwareEvent) -> Self {
        match event {
            HardwareEvent::DeviceDisconnected => EventKind::DeviceDisconnected,
            HardwareEvent::DeviceError { code } => EventKind::DeviceError {
                code: *code,
                error: DeviceErrorCode::from_code(*code),
            },
            HardwareEvent::SessionActive => EventKind::SessionActive,
            HardwareEvent::SessionReady => EventKind::SessionReady,
            HardwareEvent::SessionClosed => EventKind::SessionClosed,
            HardwareEvent::CaptureStarted { timestamp } => EventKind::CaptureStarted {
                timestamp: *timestamp,
            },
            HardwareEvent::CaptureProgressed { result } => EventKind::CaptureProgressed {
                sensor_timestamp: result.sensor_timestamp(),
            },
            HardwareEvent::CaptureCompleted { result } => EventKind::CaptureCompleted {
                sensor_timestamp: result.sensor_timestamp(),
            },
            HardwareEvent::CaptureFailed(failure) => EventKind::CaptureFailed(*failure),
            HardwareEvent::CaptureBufferLost { frame_number } => EventKind::CaptureBufferLost {
                frame_number: *frame_number,
            },
            HardwareEvent::SequenceAborted { sequence_id } => EventKind::SequenceAborted {
                sequence_id: *sequence_id,
            },
            HardwareEvent::SequenceCompleted {
                sequence_id,
                frame_number,
            } => EventKind::SequenceCompleted {
                sequence_id: *sequence_id,
                frame_number: *frame_number,
            },
        }
    }
}

/// An event as seen by subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraEvent {
    pub device_index: u16,
    pub device_id: String,
    pub session_id: Option<SessionId>,
    pub received_at: DateTime<Utc>,
    pub kind: EventKind,
}
