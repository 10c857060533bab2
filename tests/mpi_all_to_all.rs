//! Run under MPI, e.g. `mpirun -n 3 cargo test --features mpi-support --test mpi_all_to_all`.
//! With a single process the exchange degenerates to the self-exchange.
#![cfg(feature = "mpi-support")]

use mesh_connect::algs::communicator::{Communicator, MpiComm};
use mesh_connect::algs::exchange::{all_to_all, mpi_collective};

#[test]
fn mpi_all_to_all_smoke_if_available() {
    let comm = MpiComm::new().expect("MPI initialization failed");
    let me = comm.rank();
    let n = comm.size();

    // rank i sends j+1 copies of 100*i + j to rank j
    let row: Vec<Vec<u64>> = (0..n)
        .map(|j| vec![(100 * me + j) as u64; j + 1])
        .collect();
    let expected: Vec<Vec<u64>> = (0..n)
        .map(|i| vec![(100 * i + me) as u64; me + 1])
        .collect();

    let column = all_to_all(&comm, &row).expect("point-to-point exchange");
    assert_eq!(column, expected);

    // the native collective path gives the same answer
    let column = mpi_collective::all_to_all(comm.world(), &row).expect("collective exchange");
    assert_eq!(column, expected);
}
