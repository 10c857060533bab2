#![allow(dead_code)]
use mesh_connect::algs::communicator::RayonComm;

/// Run `f` once per rank of an in-process group of `size`, each rank on its
/// own thread. Results come back in rank order.
pub fn run_ranks<R, F>(size: usize, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(RayonComm) -> R + Sync,
{
    std::thread::scope(|s| {
        let handles: Vec<_> = RayonComm::group(size)
            .into_iter()
            .map(|comm| {
                let f = &f;
                s.spawn(move || f(comm))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("rank thread panicked"))
            .collect()
    })
}

/// Two-rank Rayon comms (ranks 0 and 1).
pub fn rayons() -> (RayonComm, RayonComm) {
    (RayonComm::new(0, 2), RayonComm::new(1, 2))
}

/// Rows of the three-rank reference exchange, indexed by sending rank.
pub fn reference_rows() -> Vec<Vec<Vec<i32>>> {
    vec![
        vec![vec![1, 2], vec![3, 4, 5], vec![6, 7]],
        vec![vec![8], vec![9, 10, 11, 12], vec![13]],
        vec![vec![], vec![14], vec![15, 16]],
    ]
}
