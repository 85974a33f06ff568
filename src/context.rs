//! The camera context
//!
//! [`CameraContext`] is the one object a binding layer talks to. It is built
//! explicitly, shared explicitly (typically in an `Arc`), and releases every
//! platform resource when [`CameraContext::release`] runs or it is dropped.

use crate::config::NdcamConfig;
use crate::dispatcher::CallbackDispatcher;
use crate::errors::CameraError;
use crate::events::CameraEvent;
use crate::platform::{CameraPlatform, Surface};
use crate::registry::DeviceRegistry;
use crate::scanner::{self, StreamConfig};
use crate::session::SessionController;
use crate::types::{DeviceInfo, DeviceSnapshot, FacingDirection, SessionId, SessionState};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::mpsc;

struct ContextInner {
    registry: DeviceRegistry,
    sessions: SessionController,
}

pub struct CameraContext {
    platform: Arc<dyn CameraPlatform>,
    config: NdcamConfig,
    dispatcher: Arc<CallbackDispatcher>,
    inner: RwLock<ContextInner>,
}

impl CameraContext {
    pub fn new(platform: Arc<dyn CameraPlatform>, config: NdcamConfig) -> Self {
        let dispatcher = Arc::new(CallbackDispatcher::new(
            config.dispatch.forward_capture_events,
        ));
        let inner = ContextInner {
            registry: DeviceRegistry::new(config.registry.max_devices),
            sessions: SessionController::new(Arc::clone(&dispatcher)),
        };
        Self {
            platform,
            config,
            dispatcher,
            inner: RwLock::new(inner),
        }
    }

    pub fn with_defaults(platform: Arc<dyn CameraPlatform>) -> Self {
        Self::new(platform, NdcamConfig::default())
    }

    pub fn config(&self) -> &NdcamConfig {
        &self.config
    }

    fn read(&self) -> RwLockReadGuard<'_, ContextInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ContextInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Discover devices. A no-op when already initialized.
    pub fn initialize(&self) -> Result<(), CameraError> {
        let mut inner = self.write();
        if inner.registry.is_initialized() {
            return Ok(());
        }
        let ContextInner { registry, sessions } = &mut *inner;
        registry.initialize(self.platform.as_ref())?;
        sessions.attach(registry);
        Ok(())
    }

    /// Close every device and free the manager and metadata. Idempotent.
    pub fn release(&self) {
        let mut inner = self.write();
        inner.sessions.detach();
        inner.registry.release();
    }

    pub fn is_initialized(&self) -> bool {
        self.read().registry.is_initialized()
    }

    pub fn device_count(&self) -> u16 {
        self.read().registry.device_count()
    }

    pub fn facing(&self, index: u16) -> Result<FacingDirection, CameraError> {
        self.read().registry.facing(index)
    }

    pub fn devices(&self) -> Vec<DeviceInfo> {
        let inner = self.read();
        inner
            .registry
            .entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| DeviceInfo {
                index: index as u16,
                id: entry.id.clone(),
                facing: entry.facing,
                stream_configs: scanner::scan(&entry.metadata),
            })
            .collect()
    }

    pub fn scan_stream_configurations(&self, index: u16) -> Result<Vec<StreamConfig>, CameraError> {
        let inner = self.read();
        Ok(scanner::scan(inner.registry.metadata(index)?))
    }

    pub fn open(&self, index: u16) -> Result<(), CameraError> {
        let inner = self.initialized()?;
        inner.sessions.open(&inner.registry, index)
    }

    pub fn close(&self, index: u16) -> Result<(), CameraError> {
        match self.initialized() {
            Ok(inner) => inner.sessions.close(index),
            Err(_) => Ok(()),
        }
    }

    pub fn start_repeat(&self, index: u16, surface: &Surface) -> Result<SessionId, CameraError> {
        self.initialized()?.sessions.start_repeat(index, surface)
    }

    pub fn stop_repeat(&self, index: u16) -> Result<(), CameraError> {
        match self.initialized() {
            Ok(inner) => inner.sessions.stop_repeat(index),
            Err(_) => Ok(()),
        }
    }

    pub fn start_capture(&self, index: u16, surface: &Surface) -> Result<SessionId, CameraError> {
        self.initialized()?.sessions.start_capture(index, surface)
    }

    pub fn stop_capture(&self, index: u16) -> Result<(), CameraError> {
        match self.initialized() {
            Ok(inner) => inner.sessions.stop_capture(index),
            Err(_) => Ok(()),
        }
    }

    pub fn state(&self, index: u16) -> Result<SessionState, CameraError> {
        self.read().sessions.state(index)
    }

    pub fn snapshot(&self, index: u16) -> Result<DeviceSnapshot, CameraError> {
        self.read().sessions.snapshot(index)
    }

    pub fn snapshots(&self) -> Vec<DeviceSnapshot> {
        self.read().sessions.snapshots()
    }

    /// Receive routed hardware events.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<CameraEvent> {
        self.dispatcher.subscribe()
    }

    fn initialized(&self) -> Result<RwLockReadGuard<'_, ContextInner>, CameraError> {
        let inner = self.read();
        if !inner.registry.is_initialized() {
            return Err(CameraError::not_initialized());
        }
        Ok(inner)
    }
}

impl Drop for CameraContext {
    fn drop(&mut self) {
        self.release();
    }
}
