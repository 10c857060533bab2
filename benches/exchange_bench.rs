use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use mesh_connect::prelude::*;

/// Random per-destination payloads for every rank of a group of `p`.
fn random_rows(p: usize, max_len: usize, seed: u64) -> Vec<Vec<Vec<u64>>> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..p)
        .map(|_| {
            (0..p)
                .map(|_| {
                    let n = rng.gen_range(0..=max_len);
                    (0..n).map(|_| rng.r#gen::<u64>()).collect()
                })
                .collect()
        })
        .collect()
}

fn bench_in_process_all_to_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("all_to_all_in_process");
    for &p in &[2usize, 4, 8] {
        let rows = random_rows(p, 4096, 42);
        group.bench_with_input(BenchmarkId::from_parameter(p), &rows, |b, rows| {
            b.iter(|| {
                std::thread::scope(|s| {
                    for comm in RayonComm::group(p) {
                        let row = &rows[comm.rank()];
                        s.spawn(move || all_to_all(&comm, row).unwrap());
                    }
                });
            });
        });
    }
    group.finish();
}

fn bench_connectivity_scan(c: &mut Criterion) {
    let mut rng = SmallRng::seed_from_u64(7);
    let mut ids: Vec<u32> = (0..8 * 100_000).map(|_| rng.gen_range(0..1_000_000)).collect();
    c.bench_function("hex8_min_node", |b| {
        b.iter(|| {
            let table = ConnectivityRange::<_, Hex8>::new(&ids[..]).unwrap();
            table
                .iter()
                .map(|cell| cell.iter().copied().min().unwrap_or(0))
                .fold(0u64, |acc, m| acc + u64::from(m))
        });
    });
    c.bench_function("hex8_rotate_in_place", |b| {
        b.iter(|| {
            let mut table = ConnectivityRangeMut::<_, Hex8>::new(&mut ids[..]).unwrap();
            for mut cell in table.iter_mut() {
                cell.as_mut_slice().rotate_left(1);
            }
        });
    });
}

criterion_group!(benches, bench_in_process_all_to_all, bench_connectivity_scan);
criterion_main!(benches);
