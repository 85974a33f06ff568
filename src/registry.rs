//! Device discovery
//!
//! Enumerates the platform's devices once and keeps their capability
//! metadata, index-aligned with the device ids. The contents are read-only
//! until [`DeviceRegistry::release`].

use crate::errors::CameraError;
use crate::metadata::CameraMetadata;
use crate::platform::{CameraPlatform, PlatformManager};
use crate::scanner;
use crate::types::FacingDirection;
use std::sync::Arc;

/// Hard upper bound on the number of devices a registry tracks.
pub const MAX_CAMERA_COUNT: usize = 16;

#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub id: String,
    pub facing: FacingDirection,
    pub metadata: Arc<CameraMetadata>,
}

pub struct DeviceRegistry {
    max_devices: usize,
    manager: Option<Box<dyn PlatformManager>>,
    entries: Vec<RegistryEntry>,
}

impl DeviceRegistry {
    pub fn new(max_devices: usize) -> Self {
        let max_devices = max_devices.clamp(1, MAX_CAMERA_COUNT);
        Self {
            max_devices,
            manager: None,
            entries: Vec::with_capacity(max_devices),
        }
    }

    pub fn max_devices(&self) -> usize {
        self.max_devices
    }

    pub fn is_initialized(&self) -> bool {
        self.manager.is_some()
    }

    /// Acquire the manager and fetch every device's metadata.
    ///
    /// Nothing is retained unless every step succeeds. Calling this again on an
    /// initialized registry is a no-op.
    pub fn initialize(&mut self, platform: &dyn CameraPlatform) -> Result<(), CameraError> {
        if self.is_initialized() {
            log::debug!("device registry already initialized");
            return Ok(());
        }

        let manager = platform.create_manager().map_err(|status| {
            log::error!("failed to create camera manager: {}", status);
            CameraError::manager_unavailable(format!("camera manager unavailable: {}", status))
        })?;

        let ids = manager.camera_ids().map_err(|status| {
            log::error!("failed to list camera ids: {}", status);
            CameraError::manager_unavailable(format!("camera id list unavailable: {}", status))
        })?;

        if ids.len() > self.max_devices {
            log::error!(
                "platform reported {} cameras, registry holds at most {}",
                ids.len(),
                self.max_devices
            );
            return Err(CameraError::capacity_exceeded(ids.len(), self.max_devices));
        }

        let mut entries = Vec::with_capacity(self.max_devices);
        for (index, id) in ids.into_iter().enumerate() {
            let metadata = manager.characteristics(&id).map_err(|status| {
                log::error!("failed to fetch characteristics of camera {}: {}", id, status);
                CameraError::metadata_unavailable(index as u16, status)
            })?;

            let facing = FacingDirection::from_lens_facing(metadata.lens_facing());
            log::debug!("camera {} ({}) facing {}", index, id, facing);
            for config in scanner::scan(&metadata) {
                log::debug!(
                    "  {:?} {}: {} {}",
                    config.direction,
                    config.format,
                    config.width,
                    config.height
                );
            }

            entries.push(RegistryEntry {
                id,
                facing,
                metadata: Arc::new(metadata),
            });
        }

        log::info!("device registry initialized with {} cameras", entries.len());
        self.entries = entries;
        self.manager = Some(manager);
        Ok(())
    }

    /// Drop the manager and all metadata. Safe to call repeatedly.
    pub fn release(&mut self) {
        if self.manager.is_none() && self.entries.is_empty() {
            return;
        }
        self.entries.clear();
        self.manager = None;
        log::info!("device registry released");
    }

    pub fn device_count(&self) -> u16 {
        if !self.is_initialized() {
            return 0;
        }
        self.entries.len() as u16
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn entry(&self, index: u16) -> Result<&RegistryEntry, CameraError> {
        self.entries
            .get(index as usize)
            .ok_or_else(|| CameraError::invalid_index(index, self.device_count()))
    }

    pub fn facing(&self, index: u16) -> Result<FacingDirection, CameraError> {
        Ok(self.entry(index)?.facing)
    }

    pub fn device_id(&self, index: u16) -> Result<&str, CameraError> {
        Ok(&self.entry(index)?.id)
    }

    pub fn metadata(&self, index: u16) -> Result<&Arc<CameraMetadata>, CameraError> {
        Ok(&self.entry(index)?.metadata)
    }

    pub fn manager(&self) -> Result<&dyn PlatformManager, CameraError> {
        self.manager.as_deref().ok_or_else(CameraError::not_initialized)
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new(MAX_CAMERA_COUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::status::CameraStatus;
    use crate::testing::{SimulatedCamera, SimulatedPlatform};

    #[test]
    fn test_uninitialized_registry_is_empty() {
        let registry = DeviceRegistry::default();
        assert_eq!(registry.device_count(), 0);
        assert_eq!(registry.facing(0).unwrap_err().kind(), ErrorKind::InvalidIndex);
        assert_eq!(registry.manager().err().map(|e| e.kind()), Some(ErrorKind::ManagerUnavailable));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let platform = SimulatedPlatform::with_standard_rig();
        let mut registry = DeviceRegistry::default();
        registry.initialize(&platform).unwrap();
        registry.initialize(&platform).unwrap();
        assert_eq!(registry.device_count(), 3);
        assert_eq!(platform.live_managers(), 1);
    }

    #[test]
    fn test_metadata_failure_releases_everything() {
        let platform = SimulatedPlatform::with_standard_rig();
        platform.fail_characteristics("1", CameraStatus::CameraService);

        let mut registry = DeviceRegistry::default();
        let err = registry.initialize(&platform).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MetadataUnavailable);
        assert!(err.message.contains("device 1"));
        assert!(!registry.is_initialized());
        assert_eq!(registry.device_count(), 0);
        assert_eq!(platform.live_managers(), 0);
    }

    #[test]
    fn test_too_many_devices_is_fatal() {
        let cameras = (0..17)
            .map(|i| SimulatedCamera::new(i.to_string(), FacingDirection::External, &[]))
            .collect();
        let platform = SimulatedPlatform::new(cameras);

        let mut registry = DeviceRegistry::default();
        let err = registry.initialize(&platform).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CapacityExceeded);
        assert_eq!(registry.device_count(), 0);
    }

    #[test]
    fn test_configured_maximum_is_clamped() {
        assert_eq!(DeviceRegistry::new(64).max_devices(), MAX_CAMERA_COUNT);
        assert_eq!(DeviceRegistry::new(0).max_devices(), 1);
    }

    #[test]
    fn test_release_twice() {
        let platform = SimulatedPlatform::with_standard_rig();
        let mut registry = DeviceRegistry::default();
        registry.initialize(&platform).unwrap();
        registry.release();
        registry.release();
        assert_eq!(registry.device_count(), 0);
        assert_eq!(platform.live_managers(), 0);
    }
}
