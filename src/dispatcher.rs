//! Callback dispatch
//!
//! Platform backends report everything through an [`EventSink`]. The sink
//! knows which device (and session) it was registered for and holds only a
//! weak reference to that device, so a device torn down while a callback is
//! in flight is simply skipped. Handlers never unwind into the platform
//! thread: failures are logged and dropped.

use crate::errors::CameraError;
use crate::events::{CameraEvent, DeviceErrorCode, EventKind, HardwareEvent};
use crate::session::DeviceCell;
use crate::types::{DeviceFault, SessionId};
use chrono::Utc;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::sync::mpsc;

pub(crate) struct EventOrigin {
    pub(crate) device_index: u16,
    pub(crate) device_id: String,
    /// Open generation of the device the sink was registered for.
    pub(crate) generation: u64,
    pub(crate) session: Option<SessionId>,
    pub(crate) device: Weak<DeviceCell>,
}

/// Handle a platform backend uses to report events for one device or session.
#[derive(Clone)]
pub struct EventSink {
    origin: Arc<EventOrigin>,
    dispatcher: Arc<CallbackDispatcher>,
}

impl EventSink {
    pub fn emit(&self, event: HardwareEvent) {
        self.dispatcher.dispatch(&self.origin, event);
    }

    pub fn device_index(&self) -> u16 {
        self.origin.device_index
    }

    pub fn device_id(&self) -> &str {
        &self.origin.device_id
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.origin.session
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("device_index", &self.origin.device_index)
            .field("device_id", &self.origin.device_id)
            .field("generation", &self.origin.generation)
            .field("session", &self.origin.session)
            .finish()
    }
}

pub struct CallbackDispatcher {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<CameraEvent>>>,
    forward_capture_events: bool,
}

impl CallbackDispatcher {
    pub fn new(forward_capture_events: bool) -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            forward_capture_events,
        }
    }

    /// Receive every routed event from now on.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<CameraEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub(crate) fn sink(self: &Arc<Self>, origin: EventOrigin) -> EventSink {
        EventSink {
            origin: Arc::new(origin),
            dispatcher: Arc::clone(self),
        }
    }

    pub(crate) fn dispatch(&self, origin: &EventOrigin, event: HardwareEvent) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let applied = self.apply(origin, &event);
            self.publish(origin, &event);
            applied
        }));

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::warn!(
                "callback for device {} not applied: {}",
                origin.device_id,
                e
            ),
            Err(_) => log::error!(
                "callback handler for device {} panicked; event dropped",
                origin.device_id
            ),
        }
    }

    fn apply(&self, origin: &EventOrigin, event: &HardwareEvent) -> Result<(), CameraError> {
        let id = &origin.device_id;
        match event {
            HardwareEvent::DeviceDisconnected => {
                log::error!("on_device_disconnected: {}", id);
                Self::fault(origin, DeviceFault::Disconnected)
            }
            HardwareEvent::DeviceError { code } => {
                log::error!(
                    "on_device_error: {} {} ({:?})",
                    id,
                    code,
                    DeviceErrorCode::from_code(*code)
                );
                Self::fault(origin, DeviceFault::Error { code: *code })
            }
            HardwareEvent::SessionActive => {
                log::info!("on_session_active: {}", id);
                Ok(())
            }
            HardwareEvent::SessionReady => {
                log::info!("on_session_ready: {}", id);
                Ok(())
            }
            HardwareEvent::SessionClosed => {
                log::warn!("on_session_closed: {}", id);
                let Some(session) = origin.session else {
                    return Ok(());
                };
                let cell = Self::upgrade(origin)?;
                if !cell.session_closed(session) {
                    log::debug!("session {} on {} was already detached", session, id);
                }
                Ok(())
            }
            HardwareEvent::CaptureStarted { timestamp } => {
                log::debug!("on_capture_started: {} {}", id, timestamp);
                Ok(())
            }
            HardwareEvent::CaptureProgressed { result } => {
                log::debug!(
                    "on_capture_progressed: {} {:?}",
                    id,
                    result.sensor_timestamp()
                );
                Ok(())
            }
            HardwareEvent::CaptureCompleted { result } => {
                log::debug!(
                    "on_capture_completed: {} {:?}",
                    id,
                    result.sensor_timestamp()
                );
                Ok(())
            }
            HardwareEvent::CaptureFailed(failure) => {
                log::error!(
                    "on_capture_failed: {} frame {} reason {} sequence {} image captured {}",
                    id,
                    failure.frame_number,
                    failure.reason,
                    failure.sequence_id,
                    failure.was_image_captured
                );
                Ok(())
            }
            HardwareEvent::CaptureBufferLost { frame_number } => {
                log::error!("on_capture_buffer_lost: {} frame {}", id, frame_number);
                Ok(())
            }
            HardwareEvent::SequenceAborted { sequence_id } => {
                log::error!("on_capture_sequence_abort: {} sequence {}", id, sequence_id);
                Ok(())
            }
            HardwareEvent::SequenceCompleted {
                sequence_id,
                frame_number,
            } => {
                log::debug!(
                    "on_capture_sequence_complete: {} sequence {} frame {}",
                    id,
                    sequence_id,
                    frame_number
                );
                Ok(())
            }
        }
    }

    fn fault(origin: &EventOrigin, fault: DeviceFault) -> Result<(), CameraError> {
        let cell = Self::upgrade(origin)?;
        if !cell.mark_fault(origin.generation, fault) {
            log::debug!(
                "ignoring stale {} for device {} (generation {})",
                fault,
                origin.device_id,
                origin.generation
            );
        }
        Ok(())
    }

    fn upgrade(origin: &EventOrigin) -> Result<Arc<DeviceCell>, CameraError> {
        origin.device.upgrade().ok_or_else(|| {
            CameraError::invalid_operation(format!(
                "device {} has been released",
                origin.device_id
            ))
        })
    }

    fn publish(&self, origin: &EventOrigin, event: &HardwareEvent) {
        if !self.forward_capture_events && event.is_per_frame() {
            return;
        }

        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if subscribers.is_empty() {
            return;
        }

        let record = CameraEvent {
            device_index: origin.device_index,
            device_id: origin.device_id.clone(),
            session_id: origin.session,
            received_at: Utc::now(),
            kind: EventKind::from(event),
        };
        subscribers.retain(|tx| tx.send(record.clone()).is_ok());
    }
}

impl Default for CallbackDispatcher {
    fn default() -> Self {
        Self::new(true)
    }
}
