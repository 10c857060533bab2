//! Mesh topology records.

pub mod cell_type;
pub mod connectivity;
