//! Stream configuration scanning
//!
//! Decodes the scaler's available-stream-configurations entry into
//! `(format, width, height, direction)` tuples. The scan is observational:
//! anything it does not understand is skipped, never reported.

use crate::metadata::{CameraMetadata, SCALER_AVAILABLE_STREAM_CONFIGURATIONS};
use serde::{Deserialize, Serialize};

const GROUP_LEN: usize = 4;

/// Image formats the platform reports in stream configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    Rgba8888,
    Rgbx8888,
    Rgb888,
    Rgb565,
    RgbaFp16,
    Yuv420_888,
    Jpeg,
    Raw16,
    RawPrivate,
    Raw10,
    Raw12,
    Depth16,
    DepthPointCloud,
    Private,
}

impl ImageFormat {
    pub fn from_code(code: i32) -> Option<Self> {
        let format = match code {
            0x1 => ImageFormat::Rgba8888,
            0x2 => ImageFormat::Rgbx8888,
            0x3 => ImageFormat::Rgb888,
            0x4 => ImageFormat::Rgb565,
            0x16 => ImageFormat::RgbaFp16,
            0x23 => ImageFormat::Yuv420_888,
            0x100 => ImageFormat::Jpeg,
            0x20 => ImageFormat::Raw16,
            0x24 => ImageFormat::RawPrivate,
            0x25 => ImageFormat::Raw10,
            0x26 => ImageFormat::Raw12,
            0x4436_3159 => ImageFormat::Depth16,
            0x101 => ImageFormat::DepthPointCloud,
            0x22 => ImageFormat::Private,
            _ => return None,
        };
        Some(format)
    }

    pub fn code(&self) -> i32 {
        match self {
            ImageFormat::Rgba8888 => 0x1,
            ImageFormat::Rgbx8888 => 0x2,
            ImageFormat::Rgb888 => 0x3,
            ImageFormat::Rgb565 => 0x4,
            ImageFormat::RgbaFp16 => 0x16,
            ImageFormat::Yuv420_888 => 0x23,
            ImageFormat::Jpeg => 0x100,
            ImageFormat::Raw16 => 0x20,
            ImageFormat::RawPrivate => 0x24,
            ImageFormat::Raw10 => 0x25,
            ImageFormat::Raw12 => 0x26,
            ImageFormat::Depth16 => 0x4436_3159,
            ImageFormat::DepthPointCloud => 0x101,
            ImageFormat::Private => 0x22,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Rgba8888 => "RGBA_8888",
            ImageFormat::Rgbx8888 => "RGBX_8888",
            ImageFormat::Rgb888 => "RGB_888",
            ImageFormat::Rgb565 => "RGB_565",
            ImageFormat::RgbaFp16 => "RGBA_FP16",
            ImageFormat::Yuv420_888 => "YUV_420_888",
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Raw16 => "RAW16",
            ImageFormat::RawPrivate => "RAW_PRIVATE",
            ImageFormat::Raw10 => "RAW10",
            ImageFormat::Raw12 => "RAW12",
            ImageFormat::Depth16 => "DEPTH16",
            ImageFormat::DepthPointCloud => "DEPTH_POINT_CLOUD",
            ImageFormat::Private => "PRIVATE",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamDirection {
    Output,
    Input,
}

impl StreamDirection {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(StreamDirection::Output),
            1 => Some(StreamDirection::Input),
            _ => None,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            StreamDirection::Output => 0,
            StreamDirection::Input => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamConfig {
    pub format: ImageFormat,
    pub width: i32,
    pub height: i32,
    pub direction: StreamDirection,
}

impl StreamConfig {
    pub fn new(format: ImageFormat, width: i32, height: i32, direction: StreamDirection) -> Self {
        Self {
            format,
            width,
            height,
            direction,
        }
    }

    /// The four raw integers this configuration occupies in the metadata entry.
    pub fn to_raw(&self) -> [i32; GROUP_LEN] {
        [self.format.code(), self.width, self.height, self.direction.code()]
    }
}

/// Decode every recognizable stream configuration, in metadata order.
pub fn scan(metadata: &CameraMetadata) -> Vec<StreamConfig> {
    let Some(values) = metadata.i32s(SCALER_AVAILABLE_STREAM_CONFIGURATIONS) else {
        return Vec::new();
    };

    if values.len() % GROUP_LEN != 0 {
        log::warn!(
            "stream configuration entry has {} trailing values, ignoring them",
            values.len() % GROUP_LEN
        );
    }

    values
        .chunks_exact(GROUP_LEN)
        .filter_map(|group| {
            let format = ImageFormat::from_code(group[0]);
            let direction = StreamDirection::from_code(group[3]);
            match (format, direction) {
                (Some(format), Some(direction)) => {
                    Some(StreamConfig::new(format, group[1], group[2], direction))
                }
                _ => {
                    log::trace!("skipping stream configuration {:?}", group);
                    None
                }
            }
        })
        .collect()
}

/// Flatten configurations back into the raw entry layout.
pub fn encode(configs: &[StreamConfig]) -> Vec<i32> {
    configs.iter().flat_map(StreamConfig::to_raw).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MetadataEntry;

    fn metadata_with(values: Vec<i32>) -> CameraMetadata {
        CameraMetadata::new().with_entry(
            SCALER_AVAILABLE_STREAM_CONFIGURATIONS,
            MetadataEntry::I32(values),
        )
    }

    #[test]
    fn test_scan_preserves_reported_order() {
        let metadata = metadata_with(vec![0x100, 1920, 1080, 0, 0x23, 640, 480, 0]);
        let configs = scan(&metadata);
        assert_eq!(
            configs,
            vec![
                StreamConfig::new(ImageFormat::Jpeg, 1920, 1080, StreamDirection::Output),
                StreamConfig::new(ImageFormat::Yuv420_888, 640, 480, StreamDirection::Output),
            ]
        );
    }

    #[test]
    fn test_missing_entry_is_empty() {
        assert!(scan(&CameraMetadata::new()).is_empty());
    }

    #[test]
    fn test_unknown_format_and_direction_are_skipped() {
        let metadata = metadata_with(vec![
            0x7777, 100, 100, 0, // unknown format
            0x20, 4000, 3000, 5, // unknown direction
            0x22, 1280, 720, 1,
        ]);
        assert_eq!(
            scan(&metadata),
            vec![StreamConfig::new(ImageFormat::Private, 1280, 720, StreamDirection::Input)]
        );
    }

    #[test]
    fn test_trailing_partial_group_ignored() {
        let metadata = metadata_with(vec![0x100, 320, 240, 0, 0x23, 10]);
        assert_eq!(scan(&metadata).len(), 1);
    }

    #[test]
    fn test_wrongly_typed_entry_is_empty() {
        let metadata = CameraMetadata::new().with_entry(
            SCALER_AVAILABLE_STREAM_CONFIGURATIONS,
            MetadataEntry::I64(vec![0x100, 1, 1, 0]),
        );
        assert!(scan(&metadata).is_empty());
    }

    #[test]
    fn test_encode_matches_scan_input() {
        let configs = vec![StreamConfig::new(ImageFormat::Raw16, 4032, 3024, StreamDirection::Output)];
        assert_eq!(encode(&configs), vec![0x20, 4032, 3024, 0]);
    }
}
