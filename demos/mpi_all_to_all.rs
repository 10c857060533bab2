//! Three-rank irregular all-to-all.
//!
//! `mpirun -n 3 cargo run --features mpi-support --example mpi_all_to_all`

use mesh_connect::algs::communicator::{Communicator, MpiComm};
use mesh_connect::algs::exchange::{all_to_all, mpi_collective};
use mesh_connect::mesh_error::MeshError;

fn main() -> Result<(), MeshError> {
    let comm = MpiComm::new()?;
    if comm.size() != 3 {
        if comm.rank() == 0 {
            eprintln!("run with exactly 3 ranks (got {})", comm.size());
        }
        return Ok(());
    }

    let row: Vec<Vec<i32>> = match comm.rank() {
        0 => vec![vec![1, 2], vec![3, 4, 5], vec![6, 7]],
        1 => vec![vec![8], vec![9, 10, 11, 12], vec![13]],
        _ => vec![vec![], vec![14], vec![15, 16]],
    };

    let column = all_to_all(&comm, &row)?;
    let expected: Vec<Vec<i32>> = match comm.rank() {
        0 => vec![vec![1, 2], vec![8], vec![]],
        1 => vec![vec![3, 4, 5], vec![9, 10, 11, 12], vec![14]],
        _ => vec![vec![6, 7], vec![13], vec![15, 16]],
    };
    assert_eq!(column, expected);

    let native = mpi_collective::all_to_all(comm.world(), &row)?;
    assert_eq!(native, expected);

    println!("[rank {}] received {:?}", comm.rank(), column);
    Ok(())
}
