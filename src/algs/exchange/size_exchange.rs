//! Stage 1 of an irregular all-to-all: every rank tells every rank how many
//! elements it is about to send it.
//!
//! The phase is dense: one [`WireSizeHeader`] travels along every (i, j) pair
//! of the group, self included. Besides the count, each header carries the
//! sender's view of the group size and an ok/abort status. A rank that hit a
//! local precondition violation still sends (aborting) headers, so after this
//! phase every rank holds the same information and reaches the same go/no-go
//! decision: the data phase is entered by all ranks or by none.
//!
//! Every send/receive handle is drained before returning, even on error.

use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::algs::wire::{WireSizeHeader, cast_slice, cast_slice_mut, expect_exact_len};
use crate::mesh_error::MeshError;
use bytemuck::Zeroable;

/// Exchange per-destination element counts with every rank of the group.
///
/// `send_counts[j]` is the number of elements this rank will send to rank `j`.
/// Returns `recv_counts`, where `recv_counts[i]` is the number of elements rank
/// `i` will send here.
///
/// Collective: every rank of the group must call this with the same `tag`.
/// A wrong-length `send_counts` is reported as
/// [`MeshError::RowLengthMismatch`] on this rank and as
/// [`MeshError::PeerFailed`] on all others.
pub fn exchange_sizes<C>(
    comm: &C,
    send_counts: &[usize],
    tag: CommTag,
) -> Result<Vec<usize>, MeshError>
where
    C: Communicator,
{
    let (rank, size) = (comm.rank(), comm.size());
    if send_counts.len() != size {
        let err = MeshError::RowLengthMismatch {
            rank,
            expected: size,
            found: send_counts.len(),
        };
        if size > 1 {
            log::warn!("{err}; aborting exchange");
            // participate anyway so the peers learn about the abort
            let _ = size_phase(comm, None, tag);
        }
        return Err(err);
    }
    if size == 1 {
        return Ok(send_counts.to_vec());
    }
    size_phase(comm, Some(send_counts), tag)
}

/// Run the size phase. `None` announces an abort to every peer; the result is
/// then only meaningful for draining, the caller reports its own error.
pub(crate) fn size_phase<C>(
    comm: &C,
    send_counts: Option<&[usize]>,
    tag: CommTag,
) -> Result<Vec<usize>, MeshError>
where
    C: Communicator,
{
    let (rank, size) = (comm.rank(), comm.size());
    let hdr_len = size_of::<WireSizeHeader>();

    // 1) post all receives
    let mut pending_recvs = Vec::with_capacity(size);
    for peer in 0..size {
        let mut hdr = WireSizeHeader::zeroed();
        let h = comm.irecv(
            peer,
            tag.as_u16(),
            cast_slice_mut(std::slice::from_mut(&mut hdr)),
        );
        pending_recvs.push((peer, h));
    }

    // 2) post all sends
    let mut pending_sends = Vec::with_capacity(size);
    for peer in 0..size {
        let hdr = match send_counts {
            Some(counts) => WireSizeHeader::ok(size, counts[peer]),
            None => WireSizeHeader::abort(size),
        };
        log::trace!("rank {rank}: size header to {peer}: {hdr:?}");
        pending_sends.push(comm.isend(peer, tag.as_u16(), cast_slice(std::slice::from_ref(&hdr))));
    }

    // 3) wait for all recvs, collect counts (but do not early-return)
    let mut recv_counts = vec![0usize; size];
    let mut maybe_err = None;
    for (peer, h) in pending_recvs {
        let outcome = match h.wait() {
            Some(data) => expect_exact_len(data.len(), hdr_len)
                .map_err(|msg| MeshError::CommError {
                    neighbor: peer,
                    source: msg.into(),
                })
                .and_then(|()| {
                    let hdr: WireSizeHeader = bytemuck::pod_read_unaligned(&data);
                    check_header(rank, size, peer, &hdr)
                }),
            None => Err(MeshError::CommError {
                neighbor: peer,
                source: format!("failed to receive size from rank {peer}").into(),
            }),
        };
        match outcome {
            Ok(count) => recv_counts[peer] = count,
            Err(e) if maybe_err.is_none() => maybe_err = Some(e),
            Err(_) => {} // already have an error; just drain
        }
    }

    // 4) always drain all send handles before returning
    for send in pending_sends {
        let _ = send.wait();
    }

    // 5) return error or success
    match maybe_err {
        Some(err) => Err(err),
        None => Ok(recv_counts),
    }
}

fn check_header(
    rank: usize,
    size: usize,
    peer: usize,
    hdr: &WireSizeHeader,
) -> Result<usize, MeshError> {
    if hdr.version() != crate::algs::wire::WIRE_VERSION {
        return Err(MeshError::WireVersion {
            neighbor: peer,
            found: hdr.version(),
        });
    }
    if hdr.is_abort() {
        return Err(MeshError::PeerFailed { rank, peer });
    }
    if hdr.group_size() != size {
        return Err(MeshError::GroupSizeMismatch {
            rank,
            peer,
            local: size,
            remote: hdr.group_size(),
        });
    }
    usize::try_from(hdr.count()).map_err(|_| MeshError::CommError {
        neighbor: peer,
        source: format!("element count {} does not fit in usize", hdr.count()).into(),
    })
}
