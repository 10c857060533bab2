//! Native MPI path for the irregular all-to-all.
//!
//! Same two phases as the point-to-point engine, but each is a single MPI
//! collective: `MPI_Alltoall` for the counts and `MPI_Alltoallv` for the data.
//! A rank whose input violates a precondition sends `-1` as every count, so
//! all ranks agree to skip the data phase. MPI counts and displacements are
//! `i32`, so both the packed send buffer and the packed receive buffer must
//! hold at most `i32::MAX` elements. The receive side is only known after the
//! count exchange; ranks then share a one-flag `MPI_Allgather` so an oversized
//! column on any rank fails the call on every rank.

use crate::mesh_error::MeshError;
use bytemuck::Zeroable;
use itertools::Itertools;
use mpi::datatype::{Partition, PartitionMut};
use mpi::traits::*;

const ABORT_COUNT: i32 = -1;

/// Exclusive prefix sum, used for MPI displacements.
fn displacements(counts: &[i32]) -> Vec<i32> {
    counts
        .iter()
        .scan(0, |acc, &x| {
            let old = *acc;
            *acc += x;
            Some(old)
        })
        .collect_vec()
}

/// All-to-all over one packed buffer, with per-destination `counts`.
///
/// Returns `(recv_counts, received)` indexed by source rank.
pub fn all_to_all_varcount<T, C>(
    comm: &C,
    counts: &[usize],
    data: &[T],
) -> Result<(Vec<usize>, Vec<T>), MeshError>
where
    T: Equivalence + Zeroable + Copy,
    C: Communicator,
{
    let rank = comm.rank() as usize;
    let size = comm.size() as usize;

    let local = check_counts(rank, size, counts, data.len());
    let send_counts = match &local {
        Ok(c) => c.clone(),
        Err(e) => {
            log::warn!("{e}; aborting exchange");
            vec![ABORT_COUNT; size]
        }
    };

    // First send around the counts via an all-to-all
    let mut recv_counts = vec![0i32; size];
    comm.all_to_all_into(&send_counts[..], &mut recv_counts[..]);

    let send_counts = local?;
    if let Some(peer) = recv_counts.iter().position(|&c| c < 0) {
        return Err(MeshError::PeerFailed { rank, peer });
    }

    // every rank reached this point; agree on whether all columns fit
    let recv_check = match prefix_overflow(&recv_counts) {
        Some(src) => Err(MeshError::PayloadTooLarge {
            rank: src,
            dest: rank,
            len: recv_counts[src] as usize,
        }),
        None => Ok(()),
    };
    let flag = i32::from(recv_check.is_err());
    let mut flags = vec![0i32; size];
    comm.all_gather_into(&flag, &mut flags[..]);
    if let Err(e) = recv_check {
        log::warn!("{e}; aborting exchange");
        return Err(e);
    }
    if let Some(peer) = flags.iter().position(|&f| f != 0) {
        return Err(MeshError::PeerFailed { rank, peer });
    }

    let total = recv_counts.iter().map(|&c| c as usize).sum::<usize>();
    let mut received = vec![T::zeroed(); total];

    let send_partition = Partition::new(data, &send_counts[..], displacements(&send_counts));
    let mut receive_partition = PartitionMut::new(
        &mut received[..],
        &recv_counts[..],
        displacements(&recv_counts),
    );
    comm.all_to_all_varcount_into(&send_partition, &mut receive_partition);

    log::debug!("rank {rank}: MPI all-to-all sent {} / received {total} elements", data.len());
    Ok((recv_counts.iter().map(|&c| c as usize).collect_vec(), received))
}

/// Row-shaped wrapper around [`all_to_all_varcount`].
pub fn all_to_all<T, R, C>(comm: &C, row: &[R]) -> Result<Vec<Vec<T>>, MeshError>
where
    T: Equivalence + Zeroable + Copy,
    R: AsRef<[T]>,
    C: Communicator,
{
    let counts = row.iter().map(|p| p.as_ref().len()).collect_vec();
    let data = row.iter().flat_map(|p| p.as_ref().iter().copied()).collect_vec();
    let (recv_counts, received) = all_to_all_varcount(comm, &counts, &data)?;
    Ok(super::split_by_counts(&received, &recv_counts)
        .into_iter()
        .map(<[T]>::to_vec)
        .collect())
}

fn check_counts(
    rank: usize,
    size: usize,
    counts: &[usize],
    len: usize,
) -> Result<Vec<i32>, MeshError> {
    if counts.len() != size {
        return Err(MeshError::RowLengthMismatch {
            rank,
            expected: size,
            found: counts.len(),
        });
    }
    let total: usize = counts.iter().sum();
    if total != len {
        return Err(MeshError::FlatCountsMismatch { rank, total, len });
    }
    let counts = counts
        .iter()
        .enumerate()
        .map(|(dest, &n)| {
            i32::try_from(n).map_err(|_| MeshError::PayloadTooLarge { rank, dest, len: n })
        })
        .collect::<Result<Vec<_>, _>>()?;
    match prefix_overflow(&counts) {
        Some(dest) => Err(MeshError::PayloadTooLarge {
            rank,
            dest,
            len: counts[dest] as usize,
        }),
        None => Ok(counts),
    }
}

/// First index at which the running total of `counts` exceeds `i32::MAX`.
fn prefix_overflow(counts: &[i32]) -> Option<usize> {
    let mut total = 0i64;
    counts.iter().position(|&c| {
        total += i64::from(c);
        total > i64::from(i32::MAX)
    })
}
