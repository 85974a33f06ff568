//! Platform camera status codes and their translation into error kinds.
//!
//! The numeric values follow the native camera service's documented
//! `camera_status_t` codes. Translation is a pure lookup with no state.

use crate::errors::ErrorKind;
use serde::{Deserialize, Serialize};

const ERROR_BASE: i32 = -10000;

/// Status returned by every platform camera call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraStatus {
    Ok,
    Unknown,
    InvalidParameter,
    CameraDisconnected,
    NotEnoughMemory,
    MetadataNotFound,
    CameraDevice,
    CameraService,
    SessionClosed,
    InvalidOperation,
    StreamConfigureFail,
    CameraInUse,
    MaxCameraInUse,
    CameraDisabled,
    PermissionDenied,
    UnsupportedOperation,
    /// A code the platform documents nowhere we know of.
    Unrecognized(i32),
}

impl CameraStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => CameraStatus::Ok,
            c if c == ERROR_BASE => CameraStatus::Unknown,
            c if c == ERROR_BASE - 1 => CameraStatus::InvalidParameter,
            c if c == ERROR_BASE - 2 => CameraStatus::CameraDisconnected,
            c if c == ERROR_BASE - 3 => CameraStatus::NotEnoughMemory,
            c if c == ERROR_BASE - 4 => CameraStatus::MetadataNotFound,
            c if c == ERROR_BASE - 5 => CameraStatus::CameraDevice,
            c if c == ERROR_BASE - 6 => CameraStatus::CameraService,
            c if c == ERROR_BASE - 7 => CameraStatus::SessionClosed,
            c if c == ERROR_BASE - 8 => CameraStatus::InvalidOperation,
            c if c == ERROR_BASE - 9 => CameraStatus::StreamConfigureFail,
            c if c == ERROR_BASE - 10 => CameraStatus::CameraInUse,
            c if c == ERROR_BASE - 11 => CameraStatus::MaxCameraInUse,
            c if c == ERROR_BASE - 12 => CameraStatus::CameraDisabled,
            c if c == ERROR_BASE - 13 => CameraStatus::PermissionDenied,
            c if c == ERROR_BASE - 14 => CameraStatus::UnsupportedOperation,
            other => CameraStatus::Unrecognized(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            CameraStatus::Ok => 0,
            CameraStatus::Unknown => ERROR_BASE,
            CameraStatus::InvalidParameter => ERROR_BASE - 1,
            CameraStatus::CameraDisconnected => ERROR_BASE - 2,
            CameraStatus::NotEnoughMemory => ERROR_BASE - 3,
            CameraStatus::MetadataNotFound => ERROR_BASE - 4,
            CameraStatus::CameraDevice => ERROR_BASE - 5,
            CameraStatus::CameraService => ERROR_BASE - 6,
            CameraStatus::SessionClosed => ERROR_BASE - 7,
            CameraStatus::InvalidOperation => ERROR_BASE - 8,
            CameraStatus::StreamConfigureFail => ERROR_BASE - 9,
            CameraStatus::CameraInUse => ERROR_BASE - 10,
            CameraStatus::MaxCameraInUse => ERROR_BASE - 11,
            CameraStatus::CameraDisabled => ERROR_BASE - 12,
            CameraStatus::PermissionDenied => ERROR_BASE - 13,
            CameraStatus::UnsupportedOperation => ERROR_BASE - 14,
            CameraStatus::Unrecognized(code) => *code,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, CameraStatus::Ok)
    }
}

impl std::fmt::Display for CameraStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

/// Map a status to the error kind it represents and a human-readable message.
///
/// Returns `None` for [`CameraStatus::Ok`].
pub fn translate(status: CameraStatus) -> Option<(ErrorKind, &'static str)> {
    let entry = match status {
        CameraStatus::Ok => return None,
        CameraStatus::Unknown => (
            ErrorKind::Unknown,
            "Camera operation has failed due to an unspecified cause.",
        ),
        CameraStatus::InvalidParameter => (
            ErrorKind::InvalidOperation,
            "Camera operation has failed due to an invalid parameter being passed to the method.",
        ),
        CameraStatus::CameraDisconnected => (
            ErrorKind::Disconnected,
            "Camera operation has failed because the camera device has been closed, possibly \
             because a higher-priority client has taken ownership of the camera device.",
        ),
        CameraStatus::NotEnoughMemory => (
            ErrorKind::OutOfMemory,
            "Camera operation has failed due to insufficient memory.",
        ),
        CameraStatus::MetadataNotFound => (
            ErrorKind::MetadataUnavailable,
            "Camera operation has failed due to the requested metadata tag cannot be found in \
             input metadata or capture request.",
        ),
        CameraStatus::CameraDevice => (
            ErrorKind::DeviceInError,
            "Camera operation has failed and the camera device has encountered a fatal error \
             and needs to be re-opened before it can be used again.",
        ),
        CameraStatus::CameraService => (
            ErrorKind::ManagerUnavailable,
            "Camera operation has failed and the camera service has encountered a fatal error.",
        ),
        CameraStatus::SessionClosed => (
            ErrorKind::InvalidOperation,
            "The capture session has been closed and cannot perform any operation other than \
             close.",
        ),
        CameraStatus::InvalidOperation => (
            ErrorKind::InvalidOperation,
            "Camera operation has failed due to an invalid internal operation. Usually this is \
             due to a low-level problem that may resolve itself on retry.",
        ),
        CameraStatus::StreamConfigureFail => (
            ErrorKind::StreamConfigureFailed,
            "Camera device does not support the stream configuration provided by application \
             in capture session creation.",
        ),
        CameraStatus::CameraInUse => (
            ErrorKind::AlreadyInUse,
            "Camera device is being used by another higher priority camera API client.",
        ),
        CameraStatus::MaxCameraInUse => (
            ErrorKind::MaxCameraInUse,
            "The system-wide limit for number of open cameras or camera resources has been \
             reached, and more camera devices cannot be opened until previous instances are \
             closed.",
        ),
        CameraStatus::CameraDisabled => (
            ErrorKind::Disabled,
            "The camera is disabled due to a device policy, and cannot be opened.",
        ),
        CameraStatus::PermissionDenied => (
            ErrorKind::PermissionDenied,
            "The application does not have permission to open camera.",
        ),
        CameraStatus::UnsupportedOperation => (
            ErrorKind::InvalidOperation,
            "The operation is not supported by the camera device.",
        ),
        CameraStatus::Unrecognized(_) => (
            ErrorKind::Unknown,
            "Camera operation has failed with an unrecognized status code.",
        ),
    };
    Some(entry)
}

/// Lift a raw status into a `Result`, translating failures into [`crate::CameraError`].
pub fn check(status: CameraStatus) -> Result<(), crate::errors::CameraError> {
    match status {
        CameraStatus::Ok => Ok(()),
        failure => Err(crate::errors::CameraError::from_status(failure)),
    }
}
