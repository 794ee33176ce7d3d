//! Tile payload model: sample buffers and their layout descriptors.
//!
//! A payload is an opaque pixel buffer in one of six native numeric types,
//! together with enough layout metadata (dimensions, band count, origin,
//! mutability) for a swap space to reconstruct it byte-exactly.

use crate::error::CacheError;

/// Native numeric type of a sample buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleType {
    /// 8-bit unsigned integer
    U8,
    /// 16-bit signed integer
    I16,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
}

impl SampleType {
    /// Width of one sample in bytes.
    pub fn byte_width(&self) -> usize {
        match self {
            SampleType::U8 => 1,
            SampleType::I16 => 2,
            SampleType::I32 | SampleType::F32 => 4,
            SampleType::I64 | SampleType::F64 => 8,
        }
    }
}

/// Owned sample storage in the tile's native numeric type.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    U8(Vec<u8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl Samples {
    /// Number of samples in the buffer.
    pub fn len(&self) -> usize {
        match self {
            Samples::U8(v) => v.len(),
            Samples::I16(v) => v.len(),
            Samples::I32(v) => v.len(),
            Samples::I64(v) => v.len(),
            Samples::F32(v) => v.len(),
            Samples::F64(v) => v.len(),
        }
    }

    /// True if the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The native numeric type of this buffer.
    pub fn sample_type(&self) -> SampleType {
        match self {
            Samples::U8(_) => SampleType::U8,
            Samples::I16(_) => SampleType::I16,
            Samples::I32(_) => SampleType::I32,
            Samples::I64(_) => SampleType::I64,
            Samples::F32(_) => SampleType::F32,
            Samples::F64(_) => SampleType::F64,
        }
    }

    /// Total storage size in bytes.
    pub fn byte_len(&self) -> usize {
        self.len() * self.sample_type().byte_width()
    }

    /// The raw sample values as bytes in native byte order.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Samples::U8(v) => v.as_slice(),
            Samples::I16(v) => bytemuck::cast_slice(v),
            Samples::I32(v) => bytemuck::cast_slice(v),
            Samples::I64(v) => bytemuck::cast_slice(v),
            Samples::F32(v) => bytemuck::cast_slice(v),
            Samples::F64(v) => bytemuck::cast_slice(v),
        }
    }

    /// Rebuild a buffer of the given type from native-byte-order bytes.
    ///
    /// Returns an error if `bytes` is not a whole number of samples.
    pub fn from_bytes(sample_type: SampleType, bytes: &[u8]) -> Result<Self, CacheError> {
        if bytes.len() % sample_type.byte_width() != 0 {
            return Err(CacheError::Corrupt(format!(
                "{} bytes is not a whole number of {:?} samples",
                bytes.len(),
                sample_type
            )));
        }
        Ok(match sample_type {
            SampleType::U8 => Samples::U8(bytes.to_vec()),
            SampleType::I16 => Samples::I16(bytemuck::pod_collect_to_vec(bytes)),
            SampleType::I32 => Samples::I32(bytemuck::pod_collect_to_vec(bytes)),
            SampleType::I64 => Samples::I64(bytemuck::pod_collect_to_vec(bytes)),
            SampleType::F32 => Samples::F32(bytemuck::pod_collect_to_vec(bytes)),
            SampleType::F64 => Samples::F64(bytemuck::pod_collect_to_vec(bytes)),
        })
    }
}

/// Layout descriptor of a tile payload.
///
/// Carries everything a swap space needs, besides the raw samples,
/// to reconstruct the payload exactly as it was admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLayout {
    /// Native numeric type of the samples
    pub sample_type: SampleType,
    /// Tile width in pixels
    pub width: u32,
    /// Tile height in pixels
    pub height: u32,
    /// Number of sample bands
    pub bands: u32,
    /// X origin of the tile in the owner's pixel space
    pub origin_x: i32,
    /// Y origin of the tile in the owner's pixel space
    pub origin_y: i32,
    /// Whether the payload content may change after creation.
    ///
    /// Immutable payloads are eligible for the swap space's size-only
    /// "already stored" optimization; writable payloads are always
    /// re-serialized on eviction.
    pub writable: bool,
}

impl TileLayout {
    /// Logical number of samples the layout describes.
    pub fn sample_count(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.bands as u64
    }
}

/// One tile resident in memory: a sample buffer plus its layout.
#[derive(Debug, Clone, PartialEq)]
pub struct TilePayload {
    /// Layout descriptor
    pub layout: TileLayout,
    /// Sample storage
    pub samples: Samples,
    /// Logical offset of the first usable sample in the buffer
    pub offset: u32,
}

impl TilePayload {
    /// Create a payload, checking that the buffer type matches the layout.
    pub fn new(layout: TileLayout, samples: Samples, offset: u32) -> Result<Self, CacheError> {
        if samples.sample_type() != layout.sample_type {
            return Err(CacheError::LayoutMismatch {
                expected: layout.sample_type,
                actual: samples.sample_type(),
            });
        }
        Ok(Self {
            layout,
            samples,
            offset,
        })
    }

    /// Physical storage size in bytes, used for cache accounting.
    pub fn size_bytes(&self) -> u64 {
        self.samples.byte_len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(sample_type: SampleType) -> TileLayout {
        TileLayout {
            sample_type,
            width: 4,
            height: 2,
            bands: 1,
            origin_x: 0,
            origin_y: 0,
            writable: false,
        }
    }

    #[test]
    fn test_byte_widths() {
        assert_eq!(SampleType::U8.byte_width(), 1);
        assert_eq!(SampleType::I16.byte_width(), 2);
        assert_eq!(SampleType::I32.byte_width(), 4);
        assert_eq!(SampleType::I64.byte_width(), 8);
        assert_eq!(SampleType::F32.byte_width(), 4);
        assert_eq!(SampleType::F64.byte_width(), 8);
    }

    #[test]
    fn test_samples_byte_len() {
        let samples = Samples::F64(vec![1.0, 2.0, 3.0]);
        assert_eq!(samples.len(), 3);
        assert_eq!(samples.byte_len(), 24);
        assert_eq!(samples.sample_type(), SampleType::F64);
    }

    #[test]
    fn test_samples_bytes_round_trip() {
        let original = Samples::I16(vec![-1, 0, 1, i16::MAX, i16::MIN]);
        let bytes = original.as_bytes().to_vec();
        let rebuilt = Samples::from_bytes(SampleType::I16, &bytes).unwrap();
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn test_samples_from_bytes_rejects_partial_sample() {
        let result = Samples::from_bytes(SampleType::I32, &[0, 1, 2]);
        assert!(matches!(result, Err(CacheError::Corrupt(_))));
    }

    #[test]
    fn test_payload_size_accounting() {
        let payload = TilePayload::new(
            layout(SampleType::F32),
            Samples::F32(vec![0.0; 8]),
            0,
        )
        .unwrap();
        assert_eq!(payload.size_bytes(), 32);
    }

    #[test]
    fn test_payload_rejects_type_mismatch() {
        let result = TilePayload::new(layout(SampleType::F32), Samples::U8(vec![0; 8]), 0);
        assert!(matches!(
            result,
            Err(CacheError::LayoutMismatch {
                expected: SampleType::F32,
                actual: SampleType::U8,
            })
        ));
    }

    #[test]
    fn test_layout_sample_count() {
        let mut l = layout(SampleType::U8);
        l.bands = 3;
        assert_eq!(l.sample_count(), 24);
    }
}
