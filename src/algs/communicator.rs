//! Thin façade over intra-process (threaded) or inter-process (MPI) message passing.
//!
//! Messages are *contiguous byte slices* (no zero-copy guarantees).
//! All handles are **waitable** but non-blocking: the exchange engine calls
//! `.wait()` on every handle before it trusts that a buffer is ready, and it
//! never returns while a handle is still outstanding.

use bytes::Bytes;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

/// Non-blocking point-to-point interface over a fixed group of ranks.
pub trait Communicator {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    /// Post a send of `buf` to `peer`. The bytes are copied before returning.
    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    /// Post a receive of at most `buf.len()` bytes from `peer`.
    ///
    /// The received bytes are returned by [`Wait::wait`]; longer messages are
    /// truncated to `buf.len()`.
    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Self::RecvHandle;

    /// This process' rank within the group.
    fn rank(&self) -> usize;
    /// Number of ranks in the group.
    fn size(&self) -> usize;
}

/// Anything that can be waited on.
pub trait Wait {
    /// Wait for completion and return the received data (if any).
    fn wait(self) -> Option<Vec<u8>>;
}

/// Message tag. Independent exchanges on one communicator use distinct tags.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommTag(pub u16);

impl CommTag {
    pub const fn new(tag: u16) -> Self {
        CommTag(tag)
    }

    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Tag `n` slots after this one (wrapping).
    #[inline]
    pub const fn offset(self, n: u16) -> Self {
        CommTag(self.0.wrapping_add(n))
    }
}

/// Compile-time no-op comm for pure serial runs: rank 0 of a group of one.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) {}
    fn irecv(&self, _peer: usize, _tag: u16, _buf: &mut [u8]) {}

    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }
}

// --- RayonComm: intra-process / multi-thread ---
type Key = (u64, usize, usize, u16); // (group, src, dst, tag)

static MAILBOX: Lazy<DashMap<Key, VecDeque<Bytes>>> = Lazy::new(DashMap::new);

/// Group id 0 is shared by every handle built with [`RayonComm::new`].
static NEXT_GROUP: AtomicU64 = AtomicU64::new(1);

/// Pending receive on the in-process mailbox.
///
/// Messages on one `(group, src, dst, tag)` key are delivered in send order
/// to receives in the order they are *waited*.
pub struct LocalHandle {
    key: Key,
    cap: usize,
}

impl LocalHandle {
    fn try_take(&self) -> Option<Bytes> {
        let mut queue = MAILBOX.get_mut(&self.key)?;
        let bytes = queue.pop_front();
        let drained = queue.is_empty();
        drop(queue);
        if drained {
            MAILBOX.remove_if(&self.key, |_, q| q.is_empty());
        }
        bytes
    }
}

impl Wait for LocalHandle {
    fn wait(self) -> Option<Vec<u8>> {
        loop {
            if let Some(bytes) = self.try_take() {
                let n = bytes.len().min(self.cap);
                return Some(bytes[..n].to_vec());
            }
            std::thread::yield_now();
        }
    }
}

/// In-process group: each rank lives on its own thread and shares a
/// process-global mailbox. Every rank must run concurrently, since receives
/// block until the matching send has been posted.
///
/// Messages never cross groups: handles from different [`RayonComm::group`]
/// calls use disjoint mailbox keys even on equal tags.
#[derive(Clone, Debug)]
pub struct RayonComm {
    group: u64,
    rank: usize,
    size: usize,
}

impl RayonComm {
    /// Rank `rank` of the shared default group. All handles built this way
    /// talk to each other; use [`RayonComm::group`] for an isolated group.
    pub fn new(rank: usize, size: usize) -> Self {
        Self::in_group(0, rank, size)
    }

    /// Handles for ranks `0..size` of a fresh in-process group.
    pub fn group(size: usize) -> Vec<Self> {
        let id = NEXT_GROUP.fetch_add(1, Ordering::Relaxed);
        (0..size).map(|rank| Self::in_group(id, rank, size)).collect()
    }

    fn in_group(group: u64, rank: usize, size: usize) -> Self {
        debug_assert!(rank < size, "rank {rank} outside group of {size}");
        Self { group, rank, size }
    }
}

impl Communicator for RayonComm {
    type SendHandle = ();
    type RecvHandle = LocalHandle;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle {
        let key = (self.group, self.rank, peer, tag);
        MAILBOX
            .entry(key)
            .or_default()
            .push_back(Bytes::copy_from_slice(buf));
    }

    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Self::RecvHandle {
        LocalHandle {
            key: (self.group, peer, self.rank, tag),
            cap: buf.len(),
        }
    }

    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::{Communicator, Wait};
    use crate::mesh_error::MeshError;
    use mpi::datatype::Equivalence;
    use mpi::environment::Universe;
    use mpi::point_to_point::{Destination, Source};
    use mpi::request::StaticScope;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::Communicator as _;

    /// The MPI world communicator. Owns the MPI environment: dropping the
    /// last `MpiComm` finalizes MPI.
    ///
    /// Tags are passed to MPI as-is; the standard only guarantees tags up to
    /// 32767 (`MPI_TAG_UB`).
    pub struct MpiComm {
        world: SimpleCommunicator,
        rank: usize,
        size: usize,
        _universe: Universe,
    }

    impl MpiComm {
        pub fn new() -> Result<Self, MeshError> {
            let universe = mpi::initialize().ok_or(MeshError::MpiInit)?;
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            log::debug!("MPI initialized: rank {rank} of {size}");
            Ok(Self {
                world,
                rank,
                size,
                _universe: universe,
            })
        }

        /// The underlying MPI communicator, for the native collective path.
        pub fn world(&self) -> &SimpleCommunicator {
            &self.world
        }
    }

    /// In-flight MPI request together with the heap buffer it reads or writes.
    /// The buffer is released only after the request completes, so a handle
    /// must be waited on; dropping it unwaited leaks the buffer.
    pub struct MpiHandle {
        complete: Box<dyn FnOnce() -> Option<Vec<u8>>>,
    }

    impl Wait for MpiHandle {
        fn wait(self) -> Option<Vec<u8>> {
            (self.complete)()
        }
    }

    impl Communicator for MpiComm {
        type SendHandle = MpiHandle;
        type RecvHandle = MpiHandle;

        fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> MpiHandle {
            let raw: *mut [u8] = Box::into_raw(buf.to_vec().into_boxed_slice());
            // SAFETY: `raw` stays allocated until the request has completed below.
            let data: &'static [u8] = unsafe { &*raw };
            let req = self
                .world
                .process_at_rank(peer as i32)
                .immediate_send_with_tag(StaticScope, data, tag as i32);
            MpiHandle {
                complete: Box::new(move || {
                    req.wait();
                    // SAFETY: the request no longer references the buffer.
                    drop(unsafe { Box::from_raw(raw) });
                    None
                }),
            }
        }

        fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> MpiHandle {
            let raw: *mut [u8] = Box::into_raw(vec![0u8; buf.len()].into_boxed_slice());
            // SAFETY: `raw` stays allocated until the request has completed below.
            let data: &'static mut [u8] = unsafe { &mut *raw };
            let req = self
                .world
                .process_at_rank(peer as i32)
                .immediate_receive_into_with_tag(StaticScope, data, tag as i32);
            MpiHandle {
                complete: Box::new(move || {
                    let status = req.wait();
                    // SAFETY: the request no longer references the buffer.
                    let mut bytes = unsafe { Box::from_raw(raw) }.into_vec();
                    bytes.truncate(status.count(u8::equivalent_datatype()) as usize);
                    Some(bytes)
                }),
            }
        }

        fn rank(&self) -> usize {
            self.rank
        }

        fn size(&self) -> usize {
            self.size
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::{MpiComm, MpiHandle};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rayon_roundtrip_two_ranks() {
        // Simulate rank 0 and rank 1 in the same process:
        let comm0 = RayonComm::new(0, 2);
        let comm1 = RayonComm::new(1, 2);

        let mut recv_buf = [0u8; 4];
        let recv_handle = comm1.irecv(0, 0x7001, &mut recv_buf);
        comm0.isend(1, 0x7001, &[1, 2, 3, 4]).wait();

        let data = recv_handle
            .wait()
            .expect("Expected to receive data from rank 0");
        recv_buf.copy_from_slice(&data);
        assert_eq!(&recv_buf, &[1, 2, 3, 4]);
    }

    #[test]
    fn rayon_empty_message_is_delivered() {
        let comm0 = RayonComm::new(0, 2);
        let comm1 = RayonComm::new(1, 2);
        let h = comm1.irecv(0, 0x7002, &mut []);
        comm0.isend(1, 0x7002, &[]);
        assert_eq!(h.wait(), Some(Vec::new()));
    }

    #[test]
    fn rayon_self_send() {
        let comm = RayonComm::new(0, 1);
        let mut buf = [0u8; 2];
        let h = comm.irecv(0, 0x7003, &mut buf);
        comm.isend(0, 0x7003, &[9, 8]);
        assert_eq!(h.wait(), Some(vec![9, 8]));
    }

    #[test]
    fn no_comm_is_serial_group() {
        assert_eq!(NoComm.rank(), 0);
        assert_eq!(NoComm.size(), 1);
    }

    #[test]
    fn tag_offset_wraps() {
        assert_eq!(CommTag::new(10).offset(1).as_u16(), 11);
        assert_eq!(CommTag::new(u16::MAX).offset(1).as_u16(), 0);
    }

    #[cfg(feature = "mpi-support")]
    #[test]
    fn mpi_roundtrip() {
        let comm = MpiComm::new().expect("MPI initialization failed");
        let size = comm.size();
        let nbr = (comm.rank() + 1) % size;
        let from = (comm.rank() + size - 1) % size;
        let mut recv = [0u8; 1];
        let r = comm.irecv(from, 9, &mut recv);
        let s = comm.isend(nbr, 9, &[42]);
        s.wait();
        assert_eq!(r.wait(), Some(vec![42]));
    }
}
