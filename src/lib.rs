#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-connect
//!
//! mesh-connect provides the two building blocks distributed mesh partitioning
//! rests on:
//!
//! - an **irregular all-to-all exchange** ([`algs::exchange`]): every rank
//!   sends a variable-length payload to every rank, with sizes known only to
//!   the sender, over a pluggable [`Communicator`](algs::communicator::Communicator)
//!   (serial, in-process threads, or MPI);
//! - **connectivity views** ([`topology::connectivity`]): fixed-arity,
//!   zero-copy windows over contiguous identifier tables, typed by a kind
//!   (arity + topological type code) so records of different shapes cannot be
//!   mixed.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! mesh-connect = "0.1"
//! # Optional features:
//! # features = ["mpi-support"]
//! ```
//!
//! ```
//! use mesh_connect::prelude::*;
//!
//! let mut faces = vec![1u32, 2, 3, 2, 3, 4];
//! let mut table = ConnectivityRangeMut::<_, Tri3>::new(&mut faces).unwrap();
//! table.get_mut(1).unwrap()[0] = 7;
//! assert_eq!(faces, vec![1, 2, 3, 7, 3, 4]);
//!
//! // A serial "group" of one rank: the exchange hands the row back.
//! let column = all_to_all(&NoComm, &[vec![10u64, 11]]).unwrap();
//! assert_eq!(column, vec![vec![10, 11]]);
//! ```
//!
//! ## Logging
//! The crate logs through the [`log`] facade (exchange sizes at `debug`,
//! per-peer headers at `trace`, aborted exchanges at `warn`). It never
//! installs a logger.

pub mod algs;
pub mod mesh_error;
pub mod topology;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::communicator::{CommTag, Communicator, NoComm, RayonComm, Wait};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::exchange::{
        ExchangeTags, all_to_all, all_to_all_flat, all_to_all_with_tags,
    };
    pub use crate::mesh_error::MeshError;
    pub use crate::topology::cell_type::CellType;
    pub use crate::topology::connectivity::{
        Bar2, ConnectivityKind, ConnectivityMut, ConnectivityRange, ConnectivityRangeMut,
        ConnectivityRef, ConnectivityView, Hex8, Node1, Penta6, Pyra5, Quad4, Tet4, Tri3,
    };
}
