use crate::status::{translate, CameraStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    ManagerUnavailable,
    MetadataUnavailable,
    InvalidIndex,
    AlreadyInUse,
    PermissionDenied,
    Disabled,
    Disconnected,
    DeviceInError,
    SessionBusy,
    InvalidOperation,
    StreamConfigureFailed,
    MaxCameraInUse,
    OutOfMemory,
    CapacityExceeded,
    Config,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CameraError {
    pub kind: ErrorKind,
    pub message: String,
    /// Raw platform status, when the error came from a platform call.
    pub status: Option<CameraStatus>,
}

impl CameraError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    /// Build an error from a failed platform status through the status translator.
    pub fn from_status(status: CameraStatus) -> Self {
        let (kind, description) = translate(status).unwrap_or((
            ErrorKind::Unknown,
            "Camera operation reported success where a failure was expected.",
        ));
        Self {
            kind,
            message: description.to_string(),
            status: Some(status),
        }
    }

    pub fn manager_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ManagerUnavailable, message)
    }

    pub fn not_initialized() -> Self {
        Self::new(
            ErrorKind::ManagerUnavailable,
            "camera context is not initialized",
        )
    }

    pub fn metadata_unavailable(index: u16, status: CameraStatus) -> Self {
        Self {
            kind: ErrorKind::MetadataUnavailable,
            message: format!("metadata unavailable for device {index}: {status}"),
            status: Some(status),
        }
    }

    pub fn invalid_index(index: u16, count: u16) -> Self {
        Self::new(
            ErrorKind::InvalidIndex,
            format!("device index {index} out of range (device count {count})"),
        )
    }

    pub fn capacity_exceeded(reported: usize, max: usize) -> Self {
        Self::new(
            ErrorKind::CapacityExceeded,
            format!("platform reported {reported} devices, at most {max} are supported"),
        )
    }

    pub fn device_in_error(device_id: &str, detail: &str) -> Self {
        Self::new(
            ErrorKind::DeviceInError,
            format!("device {device_id} is in error state ({detail}); close and reopen it"),
        )
    }

    pub fn session_busy(device_id: &str) -> Self {
        Self::new(
            ErrorKind::SessionBusy,
            format!("device {device_id} already has an active capture session"),
        )
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidOperation, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl From<CameraStatus> for CameraError {
    fn from(status: CameraStatus) -> Self {
        Self::from_status(status)
    }
}
