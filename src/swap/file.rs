//! File-backed swap space.
//!
//! One backing file per tile address, named deterministically from the
//! address, in a directory the caller chooses at construction time. The
//! on-disk layout is three `i32` header fields (array length, logical
//! buffer size, buffer offset) followed by the raw sample values in the
//! tile's native numeric type and native byte order, written in one bulk
//! write. Layout metadata never touches the disk: it lives in the
//! per-address swap record and is required to reconstruct the payload.

use crate::address::TileAddress;
use crate::entry::Priority;
use crate::error::CacheError;
use crate::payload::{Samples, TilePayload};
use crate::swap::space::{RestoredTile, SwapSpace};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Serialized header: `[i32 array_length][i32 buffer_size][i32 buffer_offset]`.
const HEADER_LEN: usize = 12;

/// Durable counterpart of a cache entry once it has been stored.
///
/// Holds everything `restore` needs besides the raw samples: the backing
/// file, the exact expected serialized length (the size-only "already
/// stored" check), the layout descriptor including the mutability flag,
/// and a copy of the priority metric.
struct SwapRecord {
    path: PathBuf,
    expected_len: u64,
    layout: crate::payload::TileLayout,
    priority: Option<Priority>,
}

/// Default file-backed swap space.
///
/// Records are tracked in memory under the swap space's own mutex,
/// independent of the cache orchestrator's lock. File handles are opened
/// and closed per operation; nothing is cached across calls.
///
/// Two cache instances must not share the same swap directory concurrently.
pub struct FileSwapSpace {
    dir: PathBuf,
    records: Mutex<HashMap<TileAddress, SwapRecord>>,
}

impl FileSwapSpace {
    /// Create a swap space rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(Self {
            dir,
            records: Mutex::new(HashMap::new()),
        })
    }

    /// The swap directory.
    pub fn directory(&self) -> &std::path::Path {
        &self.dir
    }

    /// Whether a record exists for `address`.
    pub fn contains(&self, address: &TileAddress) -> bool {
        self.records.lock().unwrap().contains_key(address)
    }

    /// Number of tracked swap records.
    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

impl SwapSpace for FileSwapSpace {
    fn store(
        &self,
        address: &TileAddress,
        payload: &TilePayload,
        priority: Option<&Priority>,
    ) -> bool {
        let mut records = self.records.lock().unwrap();
        let expected_len = serialized_len(payload);

        // Availability check: skip re-serialization only for immutable
        // payloads whose backing file already has the expected length.
        // Writable payloads may have changed since the last store and are
        // always rewritten.
        if !payload.layout.writable {
            if let Some(record) = records.get(address) {
                if record.expected_len == expected_len
                    && fs::metadata(&record.path).map(|m| m.len()).is_ok_and(|len| len == expected_len)
                {
                    tracing::debug!(%address, len = expected_len, "tile already swapped, skipping write");
                    return true;
                }
            }
        }

        let path = self.dir.join(swap_file_name(address));
        let buf = encode_payload(payload);
        match fs::write(&path, &buf) {
            Ok(()) => {
                records.insert(
                    *address,
                    SwapRecord {
                        path,
                        expected_len,
                        layout: payload.layout,
                        priority: priority.cloned(),
                    },
                );
                true
            }
            Err(e) => {
                tracing::warn!(%address, error = %e, "swap store failed, tile content lost");
                false
            }
        }
    }

    fn restore(&self, address: &TileAddress) -> Option<RestoredTile> {
        let records = self.records.lock().unwrap();
        let record = records.get(address)?;

        let bytes = match fs::read(&record.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%address, error = %e, "swap restore failed");
                return None;
            }
        };

        match decode_payload(&bytes, record.layout) {
            Ok(payload) => Some(RestoredTile {
                payload,
                priority: record.priority.clone(),
            }),
            Err(e) => {
                tracing::warn!(%address, error = %e, "swap restore failed");
                None
            }
        }
    }

    fn delete(&self, address: &TileAddress) -> bool {
        let mut records = self.records.lock().unwrap();
        match records.remove(address) {
            Some(record) => match fs::remove_file(&record.path) {
                Ok(()) => true,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
                Err(e) => {
                    tracing::warn!(%address, error = %e, "swap delete failed");
                    false
                }
            },
            None => true, // idempotent no-op
        }
    }
}

/// Deterministic backing-file name for a tile address.
fn swap_file_name(address: &TileAddress) -> String {
    format!("t{}_{}_{}.swp", address.owner, address.x, address.y)
}

/// Exact serialized size of a payload in bytes.
fn serialized_len(payload: &TilePayload) -> u64 {
    HEADER_LEN as u64 + payload.samples.byte_len() as u64
}

/// Serialize header fields and raw samples into a single buffer.
fn encode_payload(payload: &TilePayload) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.samples.byte_len());
    buf.extend_from_slice(&(payload.samples.len() as i32).to_ne_bytes());
    buf.extend_from_slice(&(payload.layout.sample_count() as i32).to_ne_bytes());
    buf.extend_from_slice(&(payload.offset as i32).to_ne_bytes());
    buf.extend_from_slice(payload.samples.as_bytes());
    buf
}

/// Reconstruct a payload from serialized bytes and the recorded layout.
fn decode_payload(
    bytes: &[u8],
    layout: crate::payload::TileLayout,
) -> Result<TilePayload, CacheError> {
    if bytes.len() < HEADER_LEN {
        return Err(CacheError::Corrupt(format!(
            "file too short for header: {} bytes",
            bytes.len()
        )));
    }

    let read_i32 =
        |at: usize| i32::from_ne_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
    let array_len = read_i32(0);
    let buffer_size = read_i32(4);
    let offset = read_i32(8);

    if array_len < 0 || offset < 0 {
        return Err(CacheError::Corrupt(format!(
            "negative header field: array_len={array_len}, offset={offset}"
        )));
    }

    let body = &bytes[HEADER_LEN..];
    let expected_body = array_len as usize * layout.sample_type.byte_width();
    if body.len() != expected_body {
        return Err(CacheError::Corrupt(format!(
            "sample data length {} does not match recorded array length {}",
            body.len(),
            array_len
        )));
    }

    if buffer_size as u64 != layout.sample_count() {
        // Banked buffers can legitimately declare a logical size smaller
        // than the physical array; only the mismatch is worth noting.
        tracing::debug!(
            buffer_size,
            layout_samples = layout.sample_count(),
            "swapped buffer size differs from layout sample count"
        );
    }

    let samples = Samples::from_bytes(layout.sample_type, body)?;
    TilePayload::new(layout, samples, offset as u32)
}
