use crate::metadata::{LENS_FACING_BACK, LENS_FACING_EXTERNAL, LENS_FACING_FRONT};
use crate::scanner::StreamConfig;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which way a device's lens points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacingDirection {
    Front,
    Back,
    External,
    Unknown,
}

impl FacingDirection {
    /// Interpret the lens-facing metadata value. Anything unexpected is `Unknown`.
    pub fn from_lens_facing(value: Option<u8>) -> Self {
        match value {
            Some(LENS_FACING_FRONT) => FacingDirection::Front,
            Some(LENS_FACING_BACK) => FacingDirection::Back,
            Some(LENS_FACING_EXTERNAL) => FacingDirection::External,
            _ => FacingDirection::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FacingDirection::Front => "front",
            FacingDirection::Back => "back",
            FacingDirection::External => "external",
            FacingDirection::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FacingDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    Closed,
    Open,
    SessionStarting,
    Repeating,
    Capturing,
    Error,
}

impl SessionState {
    pub fn has_session(&self) -> bool {
        matches!(self, SessionState::Repeating | SessionState::Capturing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaptureMode {
    Repeating,
    OneShot,
}

impl CaptureMode {
    pub(crate) fn active_state(&self) -> SessionState {
        match self {
            CaptureMode::Repeating => SessionState::Repeating,
            CaptureMode::OneShot => SessionState::Capturing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a device ended up in [`SessionState::Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceFault {
    Disconnected,
    Error { code: i32 },
}

impl std::fmt::Display for DeviceFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceFault::Disconnected => write!(f, "disconnected"),
            DeviceFault::Error { code } => write!(f, "device error {}", code),
        }
    }
}

/// Static description of a registered device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub index: u16,
    pub id: String,
    pub facing: FacingDirection,
    pub stream_configs: Vec<StreamConfig>,
}

/// Point-in-time view of a device's state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub index: u16,
    pub device_id: String,
    pub state: SessionState,
    pub session_id: Option<SessionId>,
    pub capture_mode: Option<CaptureMode>,
    pub fault: Option<DeviceFault>,
}
