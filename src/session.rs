//! Device and capture-session state machine
//!
//! Every registered device gets a [`DeviceCell`]: its state, open handle and
//! active session behind one mutex. Caller operations and platform callbacks
//! both serialize on that mutex, so a close never races a callback touching
//! the same device. Handles taken out of a cell are dropped only after the
//! lock is released, which keeps a platform that reports session closure
//! while a handle is closing from deadlocking against us.

use crate::dispatcher::{CallbackDispatcher, EventOrigin, EventSink};
use crate::errors::CameraError;
use crate::platform::{PlatformDevice, PlatformSession, Surface};
use crate::registry::DeviceRegistry;
use crate::status::CameraStatus;
use crate::types::{CaptureMode, DeviceFault, DeviceSnapshot, SessionId, SessionState};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct ActiveSession {
    id: SessionId,
    mode: CaptureMode,
    sequence_id: i32,
    // Field order matters: the session closes before the surface reference goes.
    handle: Box<dyn PlatformSession>,
    _surface: Surface,
}

/// Handles removed from a cell, closed when dropped: session first, then device.
#[derive(Default)]
struct Released {
    session: Option<ActiveSession>,
    device: Option<Box<dyn PlatformDevice>>,
}

impl Released {
    fn is_empty(&self) -> bool {
        self.session.is_none() && self.device.is_none()
    }
}

struct DeviceSlot {
    state: SessionState,
    generation: u64,
    device: Option<Box<dyn PlatformDevice>>,
    session: Option<ActiveSession>,
    fault: Option<DeviceFault>,
}

impl DeviceSlot {
    /// Detach all handles and return to Closed. Stale callbacks are fenced off
    /// by bumping the generation.
    fn release_handles(&mut self) -> Released {
        if let Some(session) = self.session.as_mut() {
            if session.mode == CaptureMode::Repeating {
                if let Err(status) = session.handle.stop_repeating() {
                    log::warn!("stop_repeating during teardown failed: {}", status);
                }
            }
        }
        self.state = SessionState::Closed;
        self.fault = None;
        self.generation = self.generation.wrapping_add(1);
        Released {
            session: self.session.take(),
            device: self.device.take(),
        }
    }
}

pub(crate) struct DeviceCell {
    index: u16,
    device_id: String,
    slot: Mutex<DeviceSlot>,
}

impl DeviceCell {
    fn new(index: u16, device_id: String) -> Self {
        Self {
            index,
            device_id,
            slot: Mutex::new(DeviceSlot {
                state: SessionState::Closed,
                generation: 0,
                device: None,
                session: None,
                fault: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DeviceSlot> {
        self.slot.lock().unwrap_or_else(|poisoned| {
            log::warn!("device {} lock poisoned, recovering", self.device_id);
            poisoned.into_inner()
        })
    }

    fn in_error(&self, slot: &DeviceSlot) -> CameraError {
        let detail = slot
            .fault
            .map(|fault| fault.to_string())
            .unwrap_or_else(|| "unknown fault".to_string());
        CameraError::device_in_error(&self.device_id, &detail)
    }

    /// Move the device into Error if the fault belongs to its current open.
    pub(crate) fn mark_fault(&self, generation: u64, fault: DeviceFault) -> bool {
        let mut slot = self.lock();
        if slot.generation != generation || slot.state == SessionState::Closed {
            return false;
        }
        slot.state = SessionState::Error;
        slot.fault = Some(fault);
        true
    }

    /// Detach the active session if it is still `session`.
    pub(crate) fn session_closed(&self, session: SessionId) -> bool {
        let released = {
            let mut slot = self.lock();
            if slot.session.as_ref().map(|s| s.id) != Some(session) {
                return false;
            }
            if slot.state.has_session() {
                slot.state = SessionState::Open;
            }
            slot.session.take()
        };
        drop(released);
        true
    }

    fn snapshot(&self) -> DeviceSnapshot {
        let slot = self.lock();
        DeviceSnapshot {
            index: self.index,
            device_id: self.device_id.clone(),
            state: slot.state,
            session_id: slot.session.as_ref().map(|s| s.id),
            capture_mode: slot.session.as_ref().map(|s| s.mode),
            fault: slot.fault,
        }
    }
}

/// Owns the per-device state machines for one initialized registry.
pub struct SessionController {
    devices: Vec<Arc<DeviceCell>>,
    dispatcher: Arc<CallbackDispatcher>,
}

impl SessionController {
    pub fn new(dispatcher: Arc<CallbackDispatcher>) -> Self {
        Self {
            devices: Vec::new(),
            dispatcher,
        }
    }

    /// Build one cell per registered device.
    pub fn attach(&mut self, registry: &DeviceRegistry) {
        self.detach();
        self.devices = registry
            .entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| Arc::new(DeviceCell::new(index as u16, entry.id.clone())))
            .collect();
    }

    /// Close every device and drop the cells. Callbacks still holding a sink
    /// for one of them find it gone.
    pub fn detach(&mut self) {
        for cell in self.devices.drain(..) {
            let released = cell.lock().release_handles();
            if !released.is_empty() {
                log::info!("closing device {} on release", cell.device_id);
            }
            drop(released);
        }
    }

    pub fn device_count(&self) -> u16 {
        self.devices.len() as u16
    }

    fn cell(&self, index: u16) -> Result<&Arc<DeviceCell>, CameraError> {
        self.devices
            .get(index as usize)
            .ok_or_else(|| CameraError::invalid_index(index, self.device_count()))
    }

    fn sink(&self, cell: &Arc<DeviceCell>, generation: u64, session: Option<SessionId>) -> EventSink {
        self.dispatcher.sink(EventOrigin {
            device_index: cell.index,
            device_id: cell.device_id.clone(),
            generation,
            session,
            device: Arc::downgrade(cell),
        })
    }

    /// Open a device. A device that is already open is closed first.
    pub fn open(&self, registry: &DeviceRegistry, index: u16) -> Result<(), CameraError> {
        let manager = registry.manager()?;
        let cell = self.cell(index)?;

        let mut slot = cell.lock();
        while slot.state != SessionState::Closed {
            if slot.state == SessionState::Error {
                return Err(cell.in_error(&slot));
            }
            let previous = slot.release_handles();
            drop(slot);
            log::info!("closing device {} before reopening", cell.device_id);
            drop(previous);
            slot = cell.lock();
        }

        slot.generation = slot.generation.wrapping_add(1);
        let sink = self.sink(cell, slot.generation, None);
        match manager.open_camera(&cell.device_id, sink) {
            Ok(device) => {
                slot.device = Some(device);
                slot.state = SessionState::Open;
                log::info!("opened device {} ({})", index, cell.device_id);
                Ok(())
            }
            Err(status) => {
                log::error!("open_camera {} failed: {}", cell.device_id, status);
                Err(CameraError::from_status(status))
            }
        }
    }

    /// Tear down the active session (if any) and the device handle.
    pub fn close(&self, index: u16) -> Result<(), CameraError> {
        let cell = self.cell(index)?;
        let released = cell.lock().release_handles();
        if !released.is_empty() {
            log::info!("closed device {} ({})", index, cell.device_id);
        }
        drop(released);
        Ok(())
    }

    pub fn start_repeat(&self, index: u16, surface: &Surface) -> Result<SessionId, CameraError> {
        self.start(index, surface, CaptureMode::Repeating)
    }

    pub fn start_capture(&self, index: u16, surface: &Surface) -> Result<SessionId, CameraError> {
        self.start(index, surface, CaptureMode::OneShot)
    }

    fn start(
        &self,
        index: u16,
        surface: &Surface,
        mode: CaptureMode,
    ) -> Result<SessionId, CameraError> {
        let cell = self.cell(index)?;
        let mut slot = cell.lock();
        match slot.state {
            SessionState::Open => {}
            SessionState::Repeating | SessionState::Capturing | SessionState::SessionStarting => {
                return Err(CameraError::session_busy(&cell.device_id))
            }
            SessionState::Closed => {
                return Err(CameraError::invalid_operation(format!(
                    "device {} is not open",
                    cell.device_id
                )))
            }
            SessionState::Error => return Err(cell.in_error(&slot)),
        }

        if !surface.is_valid() {
            return Err(CameraError::invalid_operation("target surface is not valid"));
        }

        let target = surface.clone();
        let session_id = SessionId::new();
        let sink = self.sink(cell, slot.generation, Some(session_id));
        slot.state = SessionState::SessionStarting;

        let created = match slot.device.as_mut() {
            Some(device) => device.create_session(&target, sink.clone()),
            None => Err(CameraStatus::InvalidOperation),
        };
        let mut handle = match created {
            Ok(handle) => handle,
            Err(status) => {
                slot.state = SessionState::Open;
                log::error!("create_session on {} failed: {}", cell.device_id, status);
                return Err(CameraError::from_status(status));
            }
        };

        let request = match mode {
            CaptureMode::Repeating => handle.set_repeating_request(&target, sink),
            CaptureMode::OneShot => handle.capture(&target, sink),
        };
        match request {
            Ok(sequence_id) => {
                slot.session = Some(ActiveSession {
                    id: session_id,
                    mode,
                    sequence_id,
                    handle,
                    _surface: target,
                });
                slot.state = mode.active_state();
                log::info!(
                    "device {} started {:?} session {} (sequence {})",
                    cell.device_id,
                    mode,
                    session_id,
                    sequence_id
                );
                Ok(session_id)
            }
            Err(status) => {
                slot.state = SessionState::Open;
                drop(slot);
                log::error!("{:?} request on {} failed: {}", mode, cell.device_id, status);
                drop(handle);
                Err(CameraError::from_status(status))
            }
        }
    }

    pub fn stop_repeat(&self, index: u16) -> Result<(), CameraError> {
        self.stop(index)
    }

    pub fn stop_capture(&self, index: u16) -> Result<(), CameraError> {
        self.stop(index)
    }

    /// Close the active session if there is one. Never fails for a valid index.
    fn stop(&self, index: u16) -> Result<(), CameraError> {
        let cell = self.cell(index)?;
        let released = {
            let mut slot = cell.lock();
            let Some(mut session) = slot.session.take() else {
                log::debug!("no active session on {}, nothing to stop", cell.device_id);
                return Ok(());
            };
            if session.mode == CaptureMode::Repeating {
                if let Err(status) = session.handle.stop_repeating() {
                    log::warn!("stop_repeating on {} failed: {}", cell.device_id, status);
                }
            }
            if slot.state != SessionState::Error {
                slot.state = SessionState::Open;
            }
            log::info!(
                "device {} stopped session {} (sequence {})",
                cell.device_id,
                session.id,
                session.sequence_id
            );
            session
        };
        drop(released);
        Ok(())
    }

    pub fn state(&self, index: u16) -> Result<SessionState, CameraError> {
        Ok(self.cell(index)?.lock().state)
    }

    pub fn snapshot(&self, index: u16) -> Result<DeviceSnapshot, CameraError> {
        Ok(self.cell(index)?.snapshot())
    }

    pub fn snapshots(&self) -> Vec<DeviceSnapshot> {
        self.devices.iter().map(|cell| cell.snapshot()).collect()
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.detach();
    }
}
