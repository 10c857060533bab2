//! A flat identifier table seen as consecutive fixed-arity records.
//!
//! Element connectivities are stored as one contiguous array
//! (`[n0 n1 n2 | n0 n1 n2 | ...]`); these types hand out views onto its
//! records without copying the array.

use super::kind::ConnectivityKind;
use super::view::{ConnectivityMut, ConnectivityRef};
use crate::mesh_error::MeshError;
use std::marker::PhantomData;

fn check_len<K: ConnectivityKind>(len: usize) -> Result<(), MeshError> {
    const { assert!(K::NB_NODES > 0, "connectivity kinds must have at least one node") };
    if len % K::NB_NODES == 0 {
        Ok(())
    } else {
        Err(MeshError::RaggedConnectivity {
            arity: K::NB_NODES,
            len,
        })
    }
}

/// Read-only table of records of kind `K`.
#[derive(Debug)]
pub struct ConnectivityRange<'a, I, K> {
    ids: &'a [I],
    _kind: PhantomData<fn() -> K>,
}

impl<I, K> Clone for ConnectivityRange<'_, I, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I, K> Copy for ConnectivityRange<'_, I, K> {}

impl<'a, I, K: ConnectivityKind> ConnectivityRange<'a, I, K> {
    /// `ids.len()` must be a multiple of `K::NB_NODES`.
    pub fn new(ids: &'a [I]) -> Result<Self, MeshError> {
        check_len::<K>(ids.len())?;
        Ok(Self {
            ids,
            _kind: PhantomData,
        })
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.ids.len() / K::NB_NODES
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Record `i`, if it exists.
    pub fn get(&self, i: usize) -> Option<ConnectivityRef<'a, I, K>> {
        let start = i.checked_mul(K::NB_NODES)?;
        let end = start.checked_add(K::NB_NODES)?;
        self.ids
            .get(start..end)
            .map(ConnectivityRef::from_nodes)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = ConnectivityRef<'a, I, K>> + use<'a, I, K> {
        self.ids
            .chunks_exact(K::NB_NODES)
            .map(ConnectivityRef::from_nodes)
    }

    /// The underlying flat identifiers.
    pub fn as_flat(&self) -> &'a [I] {
        self.ids
    }
}

/// Read-write table of records of kind `K`.
pub struct ConnectivityRangeMut<'a, I, K> {
    ids: &'a mut [I],
    _kind: PhantomData<fn() -> K>,
}

impl<'a, I, K: ConnectivityKind> ConnectivityRangeMut<'a, I, K> {
    /// `ids.len()` must be a multiple of `K::NB_NODES`.
    pub fn new(ids: &'a mut [I]) -> Result<Self, MeshError> {
        check_len::<K>(ids.len())?;
        Ok(Self {
            ids,
            _kind: PhantomData,
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len() / K::NB_NODES
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn as_range(&self) -> ConnectivityRange<'_, I, K> {
        ConnectivityRange {
            ids: &*self.ids,
            _kind: PhantomData,
        }
    }

    pub fn get(&self, i: usize) -> Option<ConnectivityRef<'_, I, K>> {
        self.as_range().get(i)
    }

    pub fn get_mut(&mut self, i: usize) -> Option<ConnectivityMut<'_, I, K>> {
        let start = i.checked_mul(K::NB_NODES)?;
        let end = start.checked_add(K::NB_NODES)?;
        self.ids
            .get_mut(start..end)
            .map(ConnectivityMut::from_nodes)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = ConnectivityRef<'_, I, K>> {
        self.ids
            .chunks_exact(K::NB_NODES)
            .map(ConnectivityRef::from_nodes)
    }

    pub fn iter_mut(&mut self) -> impl ExactSizeIterator<Item = ConnectivityMut<'_, I, K>> {
        self.ids
            .chunks_exact_mut(K::NB_NODES)
            .map(ConnectivityMut::from_nodes)
    }

    /// Copy record `src` over record `dst`. `src == dst` leaves the table
    /// unchanged.
    ///
    /// # Panics
    /// If either record index is out of range.
    pub fn assign_within(&mut self, dst: usize, src: usize)
    where
        I: Copy,
    {
        let n = K::NB_NODES;
        let len = self.len();
        assert!(
            dst < len && src < len,
            "record index out of range: dst {dst}, src {src}, len {len}"
        );
        self.ids.copy_within(src * n..(src + 1) * n, dst * n);
    }

    pub fn as_flat_mut(&mut self) -> &mut [I] {
        &mut *self.ids
    }
}
