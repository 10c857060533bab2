//! Connectivity records: fixed-arity, zero-copy views over identifier tables.
//!
//! - [`ConnectivityKind`]: arity and type code, carried by a marker type.
//! - [`ConnectivityRef`] / [`ConnectivityMut`]: read-only and read-write views
//!   of one record; compared and assigned by value.
//! - [`ConnectivityRange`] / [`ConnectivityRangeMut`]: a flat table as a
//!   sequence of records.
//!
//! Views perform no locking. Concurrent access follows the ordinary borrow
//! rules of the slice they were built from.

pub mod kind;
pub mod range;
pub mod view;

pub use kind::{Bar2, ConnectivityKind, Hex8, Node1, Penta6, Pyra5, Quad4, Tet4, Tri3};
pub use range::{ConnectivityRange, ConnectivityRangeMut};
pub use view::{ConnectivityMut, ConnectivityRef, ConnectivityView};
