//! MeshError: Unified error type for mesh-connect public APIs
//!
//! Every variant that can arise during a collective operation records the rank
//! that observed the problem (and, where relevant, the peer responsible), so a
//! failure in a distributed run can be attributed without a debugger.

use thiserror::Error;

/// Unified error type for exchange and connectivity operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// The local row does not hold exactly one payload per rank of the group.
    #[error("rank {rank}: exchange row has {found} payloads but the group has {expected} ranks")]
    RowLengthMismatch {
        rank: usize,
        expected: usize,
        found: usize,
    },
    /// A peer announced a group size different from ours.
    #[error("rank {rank}: peer {peer} reports a group of {remote} ranks, expected {local}")]
    GroupSizeMismatch {
        rank: usize,
        peer: usize,
        local: usize,
        remote: usize,
    },
    /// A peer aborted the exchange during the size phase.
    #[error("rank {rank}: peer {peer} aborted the exchange")]
    PeerFailed { rank: usize, peer: usize },
    /// Malformed or missing message from a neighbor.
    #[error("communication error with neighbor {neighbor}: {source}")]
    CommError {
        neighbor: usize,
        #[source]
        source: CommFailure,
    },
    /// The size header from a neighbor carries an unknown wire version.
    #[error("neighbor {neighbor} sent wire version {found}")]
    WireVersion { neighbor: usize, found: u16 },
    /// A payload holds more elements than the wire count can describe.
    #[error("rank {rank}: payload for rank {dest} has {len} elements, too large to send")]
    PayloadTooLarge { rank: usize, dest: usize, len: usize },
    /// Packed send counts do not add up to the packed buffer length.
    #[error("rank {rank}: send counts add up to {total} elements but the buffer holds {len}")]
    FlatCountsMismatch { rank: usize, total: usize, len: usize },
    /// Received bytes do not form a whole number of elements.
    #[error("neighbor {neighbor} sent {bytes} bytes, not a multiple of element size {elem_size}")]
    PayloadMisaligned {
        neighbor: usize,
        bytes: usize,
        elem_size: usize,
    },
    /// A connectivity view needs `arity` identifiers but only `len` were given.
    #[error("connectivity of arity {arity} needs {arity} identifiers, got {len}")]
    ConnectivityTooShort { arity: usize, len: usize },
    /// A flat connectivity table is not a whole number of records.
    #[error("connectivity table of length {len} is not a multiple of arity {arity}")]
    RaggedConnectivity { arity: usize, len: usize },
    /// MPI could not be initialized (already initialized, or no runtime).
    #[error("MPI initialization failed")]
    MpiInit,
}

/// Reason attached to [`MeshError::CommError`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct CommFailure(pub String);

impl From<String> for CommFailure {
    fn from(s: String) -> Self {
        CommFailure(s)
    }
}

impl From<&str> for CommFailure {
    fn from(s: &str) -> Self {
        CommFailure(s.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_rank() {
        let e = MeshError::RowLengthMismatch {
            rank: 2,
            expected: 3,
            found: 4,
        };
        assert_eq!(
            e.to_string(),
            "rank 2: exchange row has 4 payloads but the group has 3 ranks"
        );

        let e = MeshError::CommError {
            neighbor: 1,
            source: "expected 16 bytes, got 3".into(),
        };
        assert_eq!(
            e.to_string(),
            "communication error with neighbor 1: expected 16 bytes, got 3"
        );
    }
}
