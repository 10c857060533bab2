//! Communication algorithms.

pub mod communicator;
pub mod exchange;
pub mod wire;

pub use exchange::{all_to_all, all_to_all_flat};
