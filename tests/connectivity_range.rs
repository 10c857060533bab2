use mesh_connect::prelude::*;

#[test]
fn table_of_tetrahedra() {
    let mut cells: Vec<u32> = (0..12).collect();
    let mut table = ConnectivityRangeMut::<_, Tet4>::new(&mut cells).unwrap();
    assert_eq!(table.len(), 3);

    // reverse each cell's node order in place
    for mut cell in table.iter_mut() {
        cell.as_mut_slice().reverse();
    }
    let first = table.get(0).unwrap();
    assert_eq!(first.as_slice(), &[3, 2, 1, 0]);

    let read_only = table.as_range();
    let lasts: Vec<u32> = read_only.iter().map(|c| c[3]).collect();
    assert_eq!(lasts, vec![0, 4, 8]);
    assert_eq!(cells[4..8], [7, 6, 5, 4]);
}

#[test]
fn compact_table_by_record_copy() {
    // drop the middle triangle by shifting the last one down
    let mut faces = vec![1u64, 2, 3, 9, 9, 9, 4, 5, 6];
    let mut table = ConnectivityRangeMut::<_, Tri3>::new(&mut faces).unwrap();
    table.assign_within(1, 2);
    faces.truncate(6);
    assert_eq!(faces, vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn records_compare_across_tables() {
    let a = [1u32, 2, 3, 4, 1, 2, 3, 4];
    let ra = ConnectivityRange::<_, Quad4>::new(&a).unwrap();
    assert_eq!(ra.get(0), ra.get(1));
    assert_eq!(ra.as_flat().len(), 8);
}

#[test]
fn ragged_table() {
    let mut ids = [0u8; 7];
    assert_eq!(
        ConnectivityRangeMut::<_, Penta6>::new(&mut ids).err(),
        Some(MeshError::RaggedConnectivity { arity: 6, len: 7 })
    );
}
