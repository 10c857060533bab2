//! Irregular all-to-all exchange.
//!
//! Each rank holds one *row* of a conceptual P×P payload matrix: `row[j]` is
//! what it sends to rank `j`. After [`all_to_all`] each rank holds its
//! *column*: `column[i]` is what rank `i` sent to it, byte for byte, empty
//! payloads included.
//!
//! Receivers cannot size their buffers in advance, so the exchange runs in two
//! phases: a dense count exchange ([`size_exchange`]) followed by the
//! variable-length payload transfer ([`data_exchange`]). Preconditions are
//! checked locally before any byte moves and announced to the whole group in
//! the count phase, so a violation on one rank fails the call on every rank
//! instead of stranding the others.
//!
//! # Blocking and deadlock
//! All functions here are *collective* and *blocking*: every rank of the group
//! must make the same sequence of calls (with the same tags), and a call
//! returns only once the local row is fully sent and the local column fully
//! received. There is no timeout. If one rank never calls, the rest of the
//! group waits forever.
//!
//! Elements travel as their in-memory bytes (`T: Pod`), so all ranks must share
//! byte order.

pub mod data_exchange;
#[cfg(feature = "mpi-support")]
pub mod mpi_collective;
pub mod size_exchange;

pub use data_exchange::exchange_data;
pub use size_exchange::exchange_sizes;

use crate::algs::communicator::{CommTag, Communicator};
use crate::mesh_error::MeshError;
use bytemuck::Pod;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Base tag used by [`all_to_all`] and [`all_to_all_flat`]. Both tags it
/// yields stay below 32767, the smallest `MPI_TAG_UB` MPI allows.
pub const DEFAULT_EXCHANGE_TAG: CommTag = CommTag::new(0x2A20);

/// The pair of tags one exchange occupies.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeTags {
    pub sizes: CommTag,
    pub data: CommTag,
}

impl ExchangeTags {
    pub const fn from_base(base: CommTag) -> Self {
        Self {
            sizes: base,
            data: base.offset(1),
        }
    }
}

impl Default for ExchangeTags {
    fn default() -> Self {
        Self::from_base(DEFAULT_EXCHANGE_TAG)
    }
}

/// Redistribute `row` across the group; returns this rank's column.
///
/// `row` must hold exactly one payload per rank of the group, own rank
/// included. For a group of one the row is returned as-is.
///
/// ```
/// use mesh_connect::algs::communicator::NoComm;
/// use mesh_connect::algs::exchange::all_to_all;
///
/// let column = all_to_all(&NoComm, &[vec![1u32, 2, 3]]).unwrap();
/// assert_eq!(column, vec![vec![1, 2, 3]]);
/// ```
pub fn all_to_all<T, R, C>(comm: &C, row: &[R]) -> Result<Vec<Vec<T>>, MeshError>
where
    T: Pod,
    R: AsRef<[T]>,
    C: Communicator,
{
    all_to_all_with_tags(comm, row, ExchangeTags::default())
}

/// [`all_to_all`] on an explicit pair of tags.
pub fn all_to_all_with_tags<T, R, C>(
    comm: &C,
    row: &[R],
    tags: ExchangeTags,
) -> Result<Vec<Vec<T>>, MeshError>
where
    T: Pod,
    R: AsRef<[T]>,
    C: Communicator,
{
    let (rank, size) = (comm.rank(), comm.size());
    let local = send_counts(rank, size, row);

    if size == 1 {
        local?;
        return Ok(row.iter().map(|p| p.as_ref().to_vec()).collect());
    }

    if let Err(e) = &local {
        log::warn!("{e}; aborting exchange");
    }
    let agreed = size_exchange::size_phase(comm, local.as_deref().ok(), tags.sizes);
    // a local violation takes precedence over what the peers reported
    local?;
    let recv_counts = agreed?;

    let column = exchange_data(comm, row, &recv_counts, tags.data)?;
    log::debug!(
        "rank {rank}: all-to-all over {size} ranks sent {} / received {} elements",
        row.iter().map(|p| p.as_ref().len()).sum::<usize>(),
        recv_counts.iter().sum::<usize>()
    );
    Ok(column)
}

/// All-to-all over one packed buffer: `data` is the concatenation of the
/// payloads for ranks `0..P`, `send_counts[j]` elements each.
///
/// Returns `(recv_counts, received)`, where `received` is the concatenation of
/// the payloads from ranks `0..P` and `recv_counts[i]` the length of each.
pub fn all_to_all_flat<T, C>(
    comm: &C,
    send_counts: &[usize],
    data: &[T],
) -> Result<(Vec<usize>, Vec<T>), MeshError>
where
    T: Pod,
    C: Communicator,
{
    all_to_all_flat_with_tags(comm, send_counts, data, ExchangeTags::default())
}

/// [`all_to_all_flat`] on an explicit pair of tags.
pub fn all_to_all_flat_with_tags<T, C>(
    comm: &C,
    send_counts: &[usize],
    data: &[T],
    tags: ExchangeTags,
) -> Result<(Vec<usize>, Vec<T>), MeshError>
where
    T: Pod,
    C: Communicator,
{
    let rank = comm.rank();
    let total: usize = send_counts.iter().sum();
    if total != data.len() {
        let err = MeshError::FlatCountsMismatch {
            rank,
            total,
            len: data.len(),
        };
        if comm.size() > 1 {
            log::warn!("{err}; aborting exchange");
            let _ = size_exchange::size_phase(comm, None, tags.sizes);
        }
        return Err(err);
    }

    let row = split_by_counts(data, send_counts);
    let column = all_to_all_with_tags(comm, &row, tags)?;
    let recv_counts = column.iter().map(Vec::len).collect_vec();
    Ok((recv_counts, column.concat()))
}

/// Split `data` into consecutive slices of the given lengths.
/// The lengths must sum to `data.len()`.
pub fn split_by_counts<'a, T>(data: &'a [T], counts: &[usize]) -> Vec<&'a [T]> {
    let mut rest = data;
    counts
        .iter()
        .map(|&n| {
            let (head, tail) = rest.split_at(n);
            rest = tail;
            head
        })
        .collect()
}

/// Per-destination element counts of `row`, or the precondition it violates.
fn send_counts<T: Pod, R: AsRef<[T]>>(
    rank: usize,
    size: usize,
    row: &[R],
) -> Result<Vec<usize>, MeshError> {
    if row.len() != size {
        return Err(MeshError::RowLengthMismatch {
            rank,
            expected: size,
            found: row.len(),
        });
    }
    row.iter()
        .enumerate()
        .map(|(dest, p)| {
            let len = p.as_ref().len();
            match len.checked_mul(size_of::<T>()) {
                Some(bytes) if bytes <= isize::MAX as usize => Ok(len),
                _ => Err(MeshError::PayloadTooLarge { rank, dest, len }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::NoComm;

    #[test]
    fn single_rank_returns_row_unchanged() {
        let row = vec![vec![4i64, -1, 7]];
        assert_eq!(all_to_all(&NoComm, &row).unwrap(), row);

        let empty: Vec<Vec<u8>> = vec![vec![]];
        assert_eq!(all_to_all(&NoComm, &empty).unwrap(), empty);
    }

    #[test]
    fn single_rank_rejects_wrong_row_length() {
        let row: Vec<Vec<u8>> = vec![vec![1], vec![2]];
        assert_eq!(
            all_to_all(&NoComm, &row).unwrap_err(),
            MeshError::RowLengthMismatch {
                rank: 0,
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn flat_single_rank() {
        let (counts, data) = all_to_all_flat(&NoComm, &[3], &[7u32, 8, 9]).unwrap();
        assert_eq!(counts, vec![3]);
        assert_eq!(data, vec![7, 8, 9]);
    }

    #[test]
    fn flat_rejects_inconsistent_counts() {
        let err = all_to_all_flat(&NoComm, &[2], &[7u32, 8, 9]).unwrap_err();
        assert_eq!(
            err,
            MeshError::FlatCountsMismatch {
                rank: 0,
                total: 2,
                len: 3
            }
        );
    }

    #[test]
    fn split_keeps_empty_slices() {
        let parts = split_by_counts(&[1, 2, 3, 4], &[0, 3, 0, 1]);
        assert_eq!(parts, vec![&[][..], &[1, 2, 3][..], &[][..], &[4][..]]);
    }

    #[test]
    fn tags_from_base() {
        let t = ExchangeTags::from_base(CommTag::new(0x100));
        assert_eq!(t.sizes.as_u16(), 0x100);
        assert_eq!(t.data.as_u16(), 0x101);
        assert_eq!(ExchangeTags::default().sizes, DEFAULT_EXCHANGE_TAG);
        let d = ExchangeTags::default();
        assert!(d.sizes.as_u16() <= 32767 && d.data.as_u16() <= 32767);
    }
}
