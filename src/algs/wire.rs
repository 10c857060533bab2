//! Fixed, versioned, little-endian wire types for the exchange engine.

use bytemuck::{Pod, Zeroable};

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

pub fn cast_slice_mut<T: Pod>(v: &mut [T]) -> &mut [u8] {
    bytemuck::cast_slice_mut(v)
}

pub fn expect_exact_len(actual: usize, expected: usize) -> Result<(), String> {
    if actual == expected {
        Ok(())
    } else {
        Err(format!("expected {expected} bytes, got {actual}"))
    }
}

/// Decode received bytes into elements. `bytes` may be arbitrarily aligned,
/// so elements are copied out rather than reinterpreted in place.
/// Zero-sized `T` leaves no trace in the bytes; its count must come from
/// elsewhere.
pub fn decode_elems<T: Pod>(bytes: &[u8]) -> Option<Vec<T>> {
    let size = size_of::<T>();
    if size == 0 {
        return bytes.is_empty().then(Vec::new);
    }
    if bytes.len() % size != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(size)
            .map(bytemuck::pod_read_unaligned)
            .collect(),
    )
}

/// Bump when the layout or semantics change in incompatible ways.
pub const WIRE_VERSION: u16 = 1;

/// Rank announces it will take part in the data phase.
pub const STATUS_OK: u16 = 0;
/// Rank hit a precondition violation and is leaving the exchange.
pub const STATUS_ABORT: u16 = 1;

/// All multi-byte integers in these structs are **little-endian** on the wire.
/// We store them pre-LE with `.to_le()` and decode with `.from_le()`.
///
/// One header travels from every rank to every rank (self included) in the
/// size phase.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireSizeHeader {
    pub version_le: u16,
    pub status_le: u16,
    pub group_size_le: u32,
    /// Number of elements the sender will send to the receiver.
    pub count_le: u64,
}

impl WireSizeHeader {
    pub fn ok(group_size: usize, count: usize) -> Self {
        Self {
            version_le: WIRE_VERSION.to_le(),
            status_le: STATUS_OK.to_le(),
            group_size_le: (group_size as u32).to_le(),
            count_le: (count as u64).to_le(),
        }
    }

    pub fn abort(group_size: usize) -> Self {
        Self {
            status_le: STATUS_ABORT.to_le(),
            count_le: 0,
            ..Self::ok(group_size, 0)
        }
    }

    pub fn version(&self) -> u16 {
        u16::from_le(self.version_le)
    }
    pub fn is_abort(&self) -> bool {
        u16::from_le(self.status_le) != STATUS_OK
    }
    pub fn group_size(&self) -> usize {
        u32::from_le(self.group_size_le) as usize
    }
    pub fn count(&self) -> u64 {
        u64::from_le(self.count_le)
    }
}
