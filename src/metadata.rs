//! Capability and capture-result metadata
//!
//! The platform hands out metadata as an opaque tag/value store. This module
//! models it as a map from 32-bit tags to typed entries, with the handful of
//! well-known tags this crate reads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tag section layout: the upper 16 bits select a section, the lower 16 an entry.
const fn section_start(section: u32) -> u32 {
    section << 16
}

const LENS_START: u32 = section_start(8);
const SCALER_START: u32 = section_start(13);
const SENSOR_START: u32 = section_start(14);

pub const LENS_FACING: u32 = LENS_START + 5;
pub const SCALER_AVAILABLE_STREAM_CONFIGURATIONS: u32 = SCALER_START + 10;
pub const SENSOR_TIMESTAMP: u32 = SENSOR_START + 16;

pub const LENS_FACING_FRONT: u8 = 0;
pub const LENS_FACING_BACK: u8 = 1;
pub const LENS_FACING_EXTERNAL: u8 = 2;

/// A single metadata entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetadataEntry {
    U8(Vec<u8>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    Rational(Vec<(i32, i32)>),
}

impl MetadataEntry {
    pub fn len(&self) -> usize {
        match self {
            MetadataEntry::U8(v) => v.len(),
            MetadataEntry::I32(v) => v.len(),
            MetadataEntry::I64(v) => v.len(),
            MetadataEntry::F32(v) => v.len(),
            MetadataEntry::Rational(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraMetadata {
    entries: BTreeMap<u32, MetadataEntry>,
}

impl CameraMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, tag: u32, entry: MetadataEntry) -> Self {
        self.insert(tag, entry);
        self
    }

    pub fn insert(&mut self, tag: u32, entry: MetadataEntry) {
        self.entries.insert(tag, entry);
    }

    pub fn entry(&self, tag: u32) -> Option<&MetadataEntry> {
        self.entries.get(&tag)
    }

    pub fn i32s(&self, tag: u32) -> Option<&[i32]> {
        match self.entries.get(&tag)? {
            MetadataEntry::I32(values) => Some(values),
            _ => None,
        }
    }

    pub fn i64s(&self, tag: u32) -> Option<&[i64]> {
        match self.entries.get(&tag)? {
            MetadataEntry::I64(values) => Some(values),
            _ => None,
        }
    }

    pub fn u8s(&self, tag: u32) -> Option<&[u8]> {
        match self.entries.get(&tag)? {
            MetadataEntry::U8(values) => Some(values),
            _ => None,
        }
    }

    /// First value of the sensor timestamp entry, in nanoseconds.
    pub fn sensor_timestamp(&self) -> Option<i64> {
        self.i64s(SENSOR_TIMESTAMP)?.first().copied()
    }

    pub fn lens_facing(&self) -> Option<u8> {
        self.u8s(LENS_FACING)?.first().copied()
    }

    pub fn tags(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_tag_values() {
        assert_eq!(LENS_FACING, 0x0008_0005);
        assert_eq!(SCALER_AVAILABLE_STREAM_CONFIGURATIONS, 0x000D_000A);
        assert_eq!(SENSOR_TIMESTAMP, 0x000E_0010);
    }

    #[test]
    fn test_sensor_timestamp_present_and_absent() {
        let result = CameraMetadata::new().with_entry(SENSOR_TIMESTAMP, MetadataEntry::I64(vec![123_456]));
        assert_eq!(result.sensor_timestamp(), Some(123_456));
        assert_eq!(CameraMetadata::new().sensor_timestamp(), None);
    }

    #[test]
    fn test_typed_accessor_rejects_wrong_type() {
        let metadata = CameraMetadata::new().with_entry(SENSOR_TIMESTAMP, MetadataEntry::I32(vec![1]));
        assert!(metadata.i64s(SENSOR_TIMESTAMP).is_none());
        assert!(metadata.sensor_timestamp().is_none());
        assert_eq!(metadata.entry(SENSOR_TIMESTAMP).map(MetadataEntry::len), Some(1));
    }
}
