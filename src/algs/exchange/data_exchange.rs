//! Stage 2 of an irregular all-to-all: move the payloads.
//!
//! Receive sizes are known from stage 1, so every receive is posted up front
//! with its exact byte length, then every send is posted, then everything is
//! waited on. One message travels along every (i, j) pair, including empty
//! ones, so matching stays positional and payload order is preserved.

use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::algs::wire::{cast_slice, decode_elems, expect_exact_len};
use crate::mesh_error::MeshError;
use bytemuck::Pod;

/// Send `row[j]` to rank `j` and receive from every rank `i` exactly
/// `recv_counts[i]` elements. Returns the column indexed by source rank.
///
/// Collective: every rank of the group must call this with the same `tag`,
/// after agreeing on the counts (see [`super::exchange_sizes`]).
///
/// # Preconditions
/// `row` and `recv_counts` must hold one entry per rank, and every
/// `recv_counts[i] * size_of::<T>()` must fit in `usize`. A violation is
/// reported before any message is posted, so the peers are *not* told and
/// block in their own call. Run [`super::exchange_sizes`] first (as
/// [`super::all_to_all`] does): it checks the row and aborts the whole group
/// coherently, and its counts always satisfy these conditions.
pub fn exchange_data<T, R, C>(
    comm: &C,
    row: &[R],
    recv_counts: &[usize],
    tag: CommTag,
) -> Result<Vec<Vec<T>>, MeshError>
where
    T: Pod,
    R: AsRef<[T]>,
    C: Communicator,
{
    let (rank, size) = (comm.rank(), comm.size());
    if row.len() != size || recv_counts.len() != size {
        return Err(MeshError::RowLengthMismatch {
            rank,
            expected: size,
            found: if row.len() != size {
                row.len()
            } else {
                recv_counts.len()
            },
        });
    }
    let elem_size = size_of::<T>();

    let recv_bytes = recv_counts
        .iter()
        .enumerate()
        .map(|(peer, &n)| {
            n.checked_mul(elem_size).ok_or(MeshError::PayloadTooLarge {
                rank: peer,
                dest: rank,
                len: n,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    // 1) post all receives, sized from stage 1
    let mut pending_recvs = Vec::with_capacity(size);
    for (peer, &n_bytes) in recv_bytes.iter().enumerate() {
        let mut buffer = vec![0u8; n_bytes];
        let h = comm.irecv(peer, tag.as_u16(), &mut buffer);
        pending_recvs.push((peer, h, n_bytes, recv_counts[peer]));
    }

    // 2) post all sends, starting after our own rank to spread the load
    let mut pending_sends = Vec::with_capacity(size);
    for k in 1..=size {
        let peer = (rank + k) % size;
        let bytes = cast_slice(row[peer].as_ref());
        pending_sends.push(comm.isend(peer, tag.as_u16(), bytes));
    }

    // 3) wait for all recvs and unpack in source order
    let mut column = Vec::with_capacity(size);
    let mut maybe_err = None;
    for (peer, h, n_bytes, count) in pending_recvs {
        let received = h.wait();
        if maybe_err.is_some() {
            continue; // just drain
        }
        let outcome = match received {
            Some(raw) => expect_exact_len(raw.len(), n_bytes)
                .map_err(|msg| MeshError::CommError {
                    neighbor: peer,
                    source: msg.into(),
                })
                .and_then(|()| {
                    if elem_size == 0 {
                        // zero-sized elements carry no bytes, only the agreed count
                        return Ok(vec![T::zeroed(); count]);
                    }
                    decode_elems::<T>(&raw).ok_or(MeshError::PayloadMisaligned {
                        neighbor: peer,
                        bytes: raw.len(),
                        elem_size,
                    })
                }),
            None => Err(MeshError::CommError {
                neighbor: peer,
                source: format!("failed to receive payload from rank {peer}").into(),
            }),
        };
        match outcome {
            Ok(payload) => column.push(payload),
            Err(e) => maybe_err = Some(e),
        }
    }

    // 4) always drain all send handles before returning
    for send in pending_sends {
        let _ = send.wait();
    }

    match maybe_err {
        Some(err) => Err(err),
        None => Ok(column),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::{NoComm, RayonComm};

    #[test]
    fn no_comm_reports_missing_payload() {
        let row = [vec![1u32]];
        let err = exchange_data(&NoComm, &row, &[1], CommTag::new(0x40)).unwrap_err();
        assert!(matches!(err, MeshError::CommError { neighbor: 0, .. }));
    }

    #[test]
    fn self_exchange_through_mailbox() {
        let comm = RayonComm::group(1).remove(0);
        let row = [vec![3u16, 4, 5]];
        let got = exchange_data(&comm, &row, &[3], CommTag::new(0x41)).unwrap();
        assert_eq!(got, vec![vec![3u16, 4, 5]]);
    }

    #[test]
    fn short_message_is_a_comm_error() {
        let comm = RayonComm::group(1).remove(0);
        let row = [vec![1u8]];
        let err = exchange_data(&comm, &row, &[2], CommTag::new(0x42)).unwrap_err();
        assert_eq!(
            err,
            MeshError::CommError {
                neighbor: 0,
                source: "expected 2 bytes, got 1".into(),
            }
        );
    }

    #[test]
    fn zero_sized_elements_follow_the_agreed_count() {
        let comm = RayonComm::group(1).remove(0);
        let row = [vec![(); 4]];
        let got = exchange_data(&comm, &row, &[4], CommTag::new(0x43)).unwrap();
        assert_eq!(got, vec![vec![(); 4]]);
    }

    #[test]
    fn wrong_counts_length_is_rejected_up_front() {
        let comm = RayonComm::group(2).remove(0);
        let row = [vec![1u8], vec![2]];
        let err = exchange_data(&comm, &row, &[1], CommTag::new(0x44)).unwrap_err();
        assert_eq!(
            err,
            MeshError::RowLengthMismatch {
                rank: 0,
                expected: 2,
                found: 1
            }
        );
    }
}
