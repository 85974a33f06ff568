//! In-process camera service
//!
//! Behaves like a platform camera service with a fixed set of devices. Every
//! platform call can be made to fail with a chosen status, live handles are
//! counted so tests can check nothing leaks, and the event sinks the crate
//! registers are kept so tests can fire callbacks at will.

use crate::dispatcher::EventSink;
use crate::events::HardwareEvent;
use crate::metadata::{
    CameraMetadata, MetadataEntry, LENS_FACING, LENS_FACING_BACK, LENS_FACING_EXTERNAL,
    LENS_FACING_FRONT, SCALER_AVAILABLE_STREAM_CONFIGURATIONS, SENSOR_TIMESTAMP,
};
use crate::platform::{
    CameraPlatform, NativeWindow, PlatformDevice, PlatformManager, PlatformSession, Surface,
};
use crate::scanner::{self, ImageFormat, StreamConfig, StreamDirection};
use crate::status::CameraStatus;
use crate::types::FacingDirection;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone)]
pub struct SimulatedCamera {
    pub id: String,
    pub metadata: CameraMetadata,
}

impl SimulatedCamera {
    pub fn new(id: impl Into<String>, facing: FacingDirection, configs: &[StreamConfig]) -> Self {
        let mut metadata = CameraMetadata::new();
        let lens = match facing {
            FacingDirection::Front => Some(LENS_FACING_FRONT),
            FacingDirection::Back => Some(LENS_FACING_BACK),
            FacingDirection::External => Some(LENS_FACING_EXTERNAL),
            FacingDirection::Unknown => None,
        };
        if let Some(value) = lens {
            metadata.insert(LENS_FACING, MetadataEntry::U8(vec![value]));
        }
        if !configs.is_empty() {
            metadata.insert(
                SCALER_AVAILABLE_STREAM_CONFIGURATIONS,
                MetadataEntry::I32(scanner::encode(configs)),
            );
        }
        Self {
            id: id.into(),
            metadata,
        }
    }

    pub fn with_metadata(id: impl Into<String>, metadata: CameraMetadata) -> Self {
        Self {
            id: id.into(),
            metadata,
        }
    }
}

/// Window stand-in whose validity is fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedWindow {
    valid: bool,
}

impl SimulatedWindow {
    pub fn valid() -> Self {
        Self { valid: true }
    }

    pub fn invalid() -> Self {
        Self { valid: false }
    }
}

impl NativeWindow for SimulatedWindow {
    fn is_valid(&self) -> bool {
        self.valid
    }
}

#[derive(Default)]
struct Faults {
    create_manager: Option<CameraStatus>,
    camera_ids: Option<CameraStatus>,
    characteristics: HashMap<String, CameraStatus>,
    open: HashMap<String, CameraStatus>,
    create_session: Option<CameraStatus>,
    request: Option<CameraStatus>,
}

#[derive(Default)]
struct Shared {
    cameras: Vec<SimulatedCamera>,
    faults: Mutex<Faults>,
    live_managers: AtomicUsize,
    live_devices: AtomicUsize,
    live_sessions: AtomicUsize,
    opens: AtomicUsize,
    stop_repeating_calls: AtomicUsize,
    next_sequence: AtomicI32,
    device_sinks: Mutex<HashMap<String, EventSink>>,
    session_sinks: Mutex<HashMap<String, EventSink>>,
}

impl Shared {
    fn faults(&self) -> std::sync::MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remember(map: &Mutex<HashMap<String, EventSink>>, id: &str, sink: EventSink) {
        map.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), sink);
    }

    fn recall(map: &Mutex<HashMap<String, EventSink>>, id: &str) -> Option<EventSink> {
        map.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }
}

/// Cloning shares the same simulated service.
#[derive(Clone)]
pub struct SimulatedPlatform {
    shared: Arc<Shared>,
}

impl SimulatedPlatform {
    pub fn new(cameras: Vec<SimulatedCamera>) -> Self {
        Self {
            shared: Arc::new(Shared {
                cameras,
                ..Shared::default()
            }),
        }
    }

    /// A phone-like rig: "0" back, "1" front, "2" external.
    pub fn with_standard_rig() -> Self {
        let output = StreamDirection::Output;
        Self::new(vec![
            SimulatedCamera::new(
                "0",
                FacingDirection::Back,
                &[
                    StreamConfig::new(ImageFormat::Jpeg, 4032, 3024, output),
                    StreamConfig::new(ImageFormat::Yuv420_888, 1920, 1080, output),
                    StreamConfig::new(ImageFormat::Raw16, 4032, 3024, output),
                    StreamConfig::new(ImageFormat::Private, 1920, 1080, StreamDirection::Input),
                ],
            ),
            SimulatedCamera::new(
                "1",
                FacingDirection::Front,
                &[
                    StreamConfig::new(ImageFormat::Jpeg, 1920, 1080, output),
                    StreamConfig::new(ImageFormat::Yuv420_888, 640, 480, output),
                ],
            ),
            SimulatedCamera::new(
                "2",
                FacingDirection::External,
                &[StreamConfig::new(ImageFormat::Yuv420_888, 1280, 720, output)],
            ),
        ])
    }

    pub fn fail_create_manager(&self, status: CameraStatus) {
        self.shared.faults().create_manager = Some(status);
    }

    pub fn fail_camera_ids(&self, status: CameraStatus) {
        self.shared.faults().camera_ids = Some(status);
    }

    pub fn fail_characteristics(&self, camera_id: &str, status: CameraStatus) {
        self.shared
            .faults()
            .characteristics
            .insert(camera_id.to_string(), status);
    }

    pub fn fail_open(&self, camera_id: &str, status: CameraStatus) {
        self.shared.faults().open.insert(camera_id.to_string(), status);
    }

    pub fn fail_create_session(&self, status: CameraStatus) {
        self.shared.faults().create_session = Some(status);
    }

    pub fn fail_request(&self, status: CameraStatus) {
        self.shared.faults().request = Some(status);
    }

    pub fn clear_faults(&self) {
        *self.shared.faults() = Faults::default();
    }

    pub fn live_managers(&self) -> usize {
        self.shared.live_managers.load(Ordering::SeqCst)
    }

    pub fn live_devices(&self) -> usize {
        self.shared.live_devices.load(Ordering::SeqCst)
    }

    pub fn live_sessions(&self) -> usize {
        self.shared.live_sessions.load(Ordering::SeqCst)
    }

    /// Successful opens so far.
    pub fn open_count(&self) -> usize {
        self.shared.opens.load(Ordering::SeqCst)
    }

    pub fn stop_repeating_calls(&self) -> usize {
        self.shared.stop_repeating_calls.load(Ordering::SeqCst)
    }

    /// Sink registered by the most recent open of `camera_id`.
    pub fn device_sink(&self, camera_id: &str) -> Option<EventSink> {
        Shared::recall(&self.shared.device_sinks, camera_id)
    }

    /// Sink registered by the most recent session created on `camera_id`.
    pub fn session_sink(&self, camera_id: &str) -> Option<EventSink> {
        Shared::recall(&self.shared.session_sinks, camera_id)
    }

    pub fn disconnect(&self, camera_id: &str) -> bool {
        self.emit_device_event(camera_id, HardwareEvent::DeviceDisconnected)
    }

    pub fn device_error(&self, camera_id: &str, code: i32) -> bool {
        self.emit_device_event(camera_id, HardwareEvent::DeviceError { code })
    }

    pub fn emit_device_event(&self, camera_id: &str, event: HardwareEvent) -> bool {
        match self.device_sink(camera_id) {
            Some(sink) => {
                sink.emit(event);
                true
            }
            None => false,
        }
    }

    pub fn emit_session_event(&self, camera_id: &str, event: HardwareEvent) -> bool {
        match self.session_sink(camera_id) {
            Some(sink) => {
                sink.emit(event);
                true
            }
            None => false,
        }
    }

    /// Report one frame's started and completed callbacks.
    pub fn deliver_frame(&self, camera_id: &str, sensor_timestamp: i64) -> bool {
        let Some(sink) = self.session_sink(camera_id) else {
            return false;
        };
        sink.emit(HardwareEvent::CaptureStarted {
            timestamp: sensor_timestamp.max(0) as u64,
        });
        sink.emit(HardwareEvent::CaptureCompleted {
            result: CameraMetadata::new()
                .with_entry(SENSOR_TIMESTAMP, MetadataEntry::I64(vec![sensor_timestamp])),
        });
        true
    }
}

impl CameraPlatform for SimulatedPlatform {
    fn create_manager(&self) -> Result<Box<dyn PlatformManager>, CameraStatus> {
        if let Some(status) = self.shared.faults().create_manager {
            return Err(status);
        }
        self.shared.live_managers.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SimulatedManager {
            shared: Arc::clone(&self.shared),
        }))
    }
}

struct SimulatedManager {
    shared: Arc<Shared>,
}

impl PlatformManager for SimulatedManager {
    fn camera_ids(&self) -> Result<Vec<String>, CameraStatus> {
        if let Some(status) = self.shared.faults().camera_ids {
            return Err(status);
        }
        Ok(self.shared.cameras.iter().map(|c| c.id.clone()).collect())
    }

    fn characteristics(&self, camera_id: &str) -> Result<CameraMetadata, CameraStatus> {
        if let Some(status) = self.shared.faults().characteristics.get(camera_id) {
            return Err(*status);
        }
        self.shared
            .cameras
            .iter()
            .find(|c| c.id == camera_id)
            .map(|c| c.metadata.clone())
            .ok_or(CameraStatus::InvalidParameter)
    }

    fn open_camera(
        &self,
        camera_id: &str,
        events: EventSink,
    ) -> Result<Box<dyn PlatformDevice>, CameraStatus> {
        if !self.shared.cameras.iter().any(|c| c.id == camera_id) {
            return Err(CameraStatus::InvalidParameter);
        }
        if let Some(status) = self.shared.faults().open.get(camera_id) {
            return Err(*status);
        }
        Shared::remember(&self.shared.device_sinks, camera_id, events);
        self.shared.opens.fetch_add(1, Ordering::SeqCst);
        self.shared.live_devices.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SimulatedDevice {
            id: camera_id.to_string(),
            shared: Arc::clone(&self.shared),
        }))
    }
}

impl Drop for SimulatedManager {
    fn drop(&mut self) {
        self.shared.live_managers.fetch_sub(1, Ordering::SeqCst);
    }
}

struct SimulatedDevice {
    id: String,
    shared: Arc<Shared>,
}

impl PlatformDevice for SimulatedDevice {
    fn id(&self) -> &str {
        &self.id
    }

    fn create_session(
        &mut self,
        target: &Surface,
        events: EventSink,
    ) -> Result<Box<dyn PlatformSession>, CameraStatus> {
        if !target.is_valid() {
            return Err(CameraStatus::InvalidParameter);
        }
        if let Some(status) = self.shared.faults().create_session {
            return Err(status);
        }
        Shared::remember(&self.shared.session_sinks, &self.id, events.clone());
        self.shared.live_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SimulatedSession {
            shared: Arc::clone(&self.shared),
            events,
        }))
    }
}

impl Drop for SimulatedDevice {
    fn drop(&mut self) {
        self.shared.live_devices.fetch_sub(1, Ordering::SeqCst);
    }
}

struct SimulatedSession {
    shared: Arc<Shared>,
    events: EventSink,
}

impl SimulatedSession {
    fn submit(&mut self) -> Result<i32, CameraStatus> {
        if let Some(status) = self.shared.faults().request {
            return Err(status);
        }
        Ok(self.shared.next_sequence.fetch_add(1, Ordering::SeqCst))
    }
}

impl PlatformSession for SimulatedSession {
    fn set_repeating_request(
        &mut self,
        _target: &Surface,
        _events: EventSink,
    ) -> Result<i32, CameraStatus> {
        self.submit()
    }

    fn capture(&mut self, _target: &Surface, _events: EventSink) -> Result<i32, CameraStatus> {
        self.submit()
    }

    fn stop_repeating(&mut self) -> Result<(), CameraStatus> {
        self.shared.stop_repeating_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for SimulatedSession {
    fn drop(&mut self) {
        self.shared.live_sessions.fetch_sub(1, Ordering::SeqCst);
        // The platform confirms a close with a session-closed callback.
        self.events.emit(HardwareEvent::SessionClosed);
    }
}
