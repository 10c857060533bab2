//! Fixed-arity views over externally owned identifier buffers.
//!
//! A view is a window of exactly `K::NB_NODES` identifiers inside a buffer it
//! does not own. It never allocates, and it never outlives the buffer: the
//! lifetime `'a` ties it to the borrow it was built from.
//!
//! Views have *value* semantics for comparison and assignment:
//! - `==` compares the identifiers, in order, not the addresses;
//! - [`ConnectivityMut::assign`] copies the identifiers of another view of the
//!   same kind into this view's storage; the view keeps pointing where it did.
//!
//! Copying a [`ConnectivityRef`] copies the handle (both copies see the same
//! storage), as for any shared reference.

use super::kind::ConnectivityKind;
use crate::mesh_error::MeshError;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut, Range};

/// The "indexable, fixed-size, comparable" capability shared by read-only and
/// read-write views.
pub trait ConnectivityView {
    /// Identifier type.
    type Index;
    /// Arity and type code.
    type Kind: ConnectivityKind;

    /// The `NB_NODES` identifiers, in order.
    fn as_slice(&self) -> &[Self::Index];

    /// Arity of the kind; identical for every view of that kind.
    fn size() -> usize
    where
        Self: Sized,
    {
        Self::Kind::NB_NODES
    }

    /// Topological type code of the kind.
    fn type_code() -> i32
    where
        Self: Sized,
    {
        Self::Kind::TYPE
    }

    fn iter(&self) -> std::slice::Iter<'_, Self::Index> {
        self.as_slice().iter()
    }

    /// Address of the first identifier.
    fn as_ptr(&self) -> *const Self::Index {
        self.as_slice().as_ptr()
    }

    /// Half-open address range `[begin, end)` of the viewed identifiers.
    fn as_ptr_range(&self) -> Range<*const Self::Index> {
        self.as_slice().as_ptr_range()
    }
}

/// Read-only view of one connectivity record.
pub struct ConnectivityRef<'a, I, K> {
    nodes: &'a [I],
    _kind: PhantomData<fn() -> K>,
}

/// Read-write view of one connectivity record.
pub struct ConnectivityMut<'a, I, K> {
    nodes: &'a mut [I],
    _kind: PhantomData<fn() -> K>,
}

impl<'a, I, K: ConnectivityKind> ConnectivityRef<'a, I, K> {
    /// View the first `K::NB_NODES` identifiers of `ids`.
    pub fn new(ids: &'a [I]) -> Result<Self, MeshError> {
        match ids.get(..K::NB_NODES) {
            Some(nodes) => Ok(Self::from_nodes(nodes)),
            None => Err(MeshError::ConnectivityTooShort {
                arity: K::NB_NODES,
                len: ids.len(),
            }),
        }
    }

    /// View the `K::NB_NODES` identifiers starting at `ptr`, unchecked.
    ///
    /// # Safety
    /// `ptr` must point to `K::NB_NODES` initialized identifiers inside one
    /// allocation, valid for reads and not mutated for `'a`.
    pub unsafe fn from_ptr(ptr: *const I) -> Self {
        // SAFETY: upheld by the caller.
        Self::from_nodes(unsafe { std::slice::from_raw_parts(ptr, K::NB_NODES) })
    }

    pub(crate) fn from_nodes(nodes: &'a [I]) -> Self {
        debug_assert_eq!(nodes.len(), K::NB_NODES);
        Self {
            nodes,
            _kind: PhantomData,
        }
    }

    /// The identifiers, with the lifetime of the underlying buffer.
    pub fn nodes(&self) -> &'a [I] {
        self.nodes
    }

    /// Identifier `k` without a bounds check.
    ///
    /// # Safety
    /// `k < K::NB_NODES`.
    pub unsafe fn get_unchecked(&self, k: usize) -> &'a I {
        // SAFETY: upheld by the caller.
        unsafe { self.nodes.get_unchecked(k) }
    }
}

impl<'a, I, K: ConnectivityKind> ConnectivityMut<'a, I, K> {
    /// View the first `K::NB_NODES` identifiers of `ids`.
    pub fn new(ids: &'a mut [I]) -> Result<Self, MeshError> {
        let len = ids.len();
        match ids.get_mut(..K::NB_NODES) {
            Some(nodes) => Ok(Self::from_nodes(nodes)),
            None => Err(MeshError::ConnectivityTooShort {
                arity: K::NB_NODES,
                len,
            }),
        }
    }

    /// View the `K::NB_NODES` identifiers starting at `ptr`, unchecked.
    ///
    /// # Safety
    /// `ptr` must point to `K::NB_NODES` initialized identifiers inside one
    /// allocation, valid for reads and writes and not accessed through any
    /// other path for `'a`.
    pub unsafe fn from_ptr(ptr: *mut I) -> Self {
        // SAFETY: upheld by the caller.
        Self::from_nodes(unsafe { std::slice::from_raw_parts_mut(ptr, K::NB_NODES) })
    }

    pub(crate) fn from_nodes(nodes: &'a mut [I]) -> Self {
        debug_assert_eq!(nodes.len(), K::NB_NODES);
        Self {
            nodes,
            _kind: PhantomData,
        }
    }

    /// Read-only view of the same identifiers.
    pub fn as_const(&self) -> ConnectivityRef<'_, I, K> {
        ConnectivityRef::from_nodes(&*self.nodes)
    }

    /// Shorter-lived read-write view of the same identifiers.
    pub fn reborrow(&mut self) -> ConnectivityMut<'_, I, K> {
        ConnectivityMut::from_nodes(&mut *self.nodes)
    }

    pub fn as_mut_slice(&mut self) -> &mut [I] {
        &mut *self.nodes
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, I> {
        self.nodes.iter_mut()
    }

    pub fn as_mut_ptr(&mut self) -> *mut I {
        self.nodes.as_mut_ptr()
    }

    /// Identifier `k` without a bounds check.
    ///
    /// # Safety
    /// `k < K::NB_NODES`.
    pub unsafe fn get_unchecked_mut(&mut self, k: usize) -> &mut I {
        // SAFETY: upheld by the caller.
        unsafe { self.nodes.get_unchecked_mut(k) }
    }

    /// Copy the identifiers of `src` into this view's storage.
    ///
    /// The view itself is not rebound: it keeps referring to the same storage,
    /// which now holds `src`'s values.
    pub fn assign<V>(&mut self, src: &V)
    where
        V: ConnectivityView<Index = I, Kind = K>,
        I: Copy,
    {
        self.nodes.copy_from_slice(src.as_slice());
    }

    /// Copy `ids` into this view's storage. `ids` must hold exactly
    /// `K::NB_NODES` identifiers.
    pub fn assign_from_slice(&mut self, ids: &[I]) -> Result<(), MeshError>
    where
        I: Copy,
    {
        if ids.len() != K::NB_NODES {
            return Err(MeshError::ConnectivityTooShort {
                arity: K::NB_NODES,
                len: ids.len(),
            });
        }
        self.nodes.copy_from_slice(ids);
        Ok(())
    }
}

impl<I, K: ConnectivityKind> ConnectivityView for ConnectivityRef<'_, I, K> {
    type Index = I;
    type Kind = K;

    fn as_slice(&self) -> &[I] {
        self.nodes
    }
}

impl<I, K: ConnectivityKind> ConnectivityView for ConnectivityMut<'_, I, K> {
    type Index = I;
    type Kind = K;

    fn as_slice(&self) -> &[I] {
        self.nodes
    }
}

impl<I, K> Clone for ConnectivityRef<'_, I, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I, K> Copy for ConnectivityRef<'_, I, K> {}

impl<'a, I, K: ConnectivityKind> From<ConnectivityMut<'a, I, K>> for ConnectivityRef<'a, I, K> {
    fn from(view: ConnectivityMut<'a, I, K>) -> Self {
        ConnectivityRef::from_nodes(view.nodes)
    }
}

impl<I, K> Index<usize> for ConnectivityRef<'_, I, K> {
    type Output = I;

    #[inline]
    fn index(&self, k: usize) -> &I {
        &self.nodes[k]
    }
}

impl<I, K> Index<usize> for ConnectivityMut<'_, I, K> {
    type Output = I;

    #[inline]
    fn index(&self, k: usize) -> &I {
        &self.nodes[k]
    }
}

impl<I, K> IndexMut<usize> for ConnectivityMut<'_, I, K> {
    #[inline]
    fn index_mut(&mut self, k: usize) -> &mut I {
        &mut self.nodes[k]
    }
}

impl<'a, I, K> IntoIterator for ConnectivityRef<'a, I, K> {
    type Item = &'a I;
    type IntoIter = std::slice::Iter<'a, I>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl<'s, I, K> IntoIterator for &'s ConnectivityRef<'_, I, K> {
    type Item = &'s I;
    type IntoIter = std::slice::Iter<'s, I>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl<'s, I, K> IntoIterator for &'s ConnectivityMut<'_, I, K> {
    type Item = &'s I;
    type IntoIter = std::slice::Iter<'s, I>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl<'s, I, K> IntoIterator for &'s mut ConnectivityMut<'_, I, K> {
    type Item = &'s mut I;
    type IntoIter = std::slice::IterMut<'s, I>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter_mut()
    }
}

// Equality: elementwise, across read-only and read-write views of one kind.
macro_rules! impl_view_eq {
    ($lhs:ident, $rhs:ident) => {
        impl<I: PartialEq, K> PartialEq<$rhs<'_, I, K>> for $lhs<'_, I, K> {
            fn eq(&self, other: &$rhs<'_, I, K>) -> bool {
                self.nodes == other.nodes
            }
        }
    };
}

impl_view_eq!(ConnectivityRef, ConnectivityRef);
impl_view_eq!(ConnectivityRef, ConnectivityMut);
impl_view_eq!(ConnectivityMut, ConnectivityRef);
impl_view_eq!(ConnectivityMut, ConnectivityMut);

impl<I: Eq, K> Eq for ConnectivityRef<'_, I, K> {}
impl<I: Eq, K> Eq for ConnectivityMut<'_, I, K> {}

impl<I: fmt::Debug, K> fmt::Debug for ConnectivityRef<'_, I, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConnectivityRef").field(&self.nodes).finish()
    }
}

impl<I: fmt::Debug, K> fmt::Debug for ConnectivityMut<'_, I, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConnectivityMut").field(&self.nodes).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::connectivity::kind::{Bar2, Tri3};

    #[test]
    fn new_takes_leading_window() {
        let ids = [4u32, 5, 6, 7];
        let v = ConnectivityRef::<_, Tri3>::new(&ids).unwrap();
        assert_eq!(v.as_slice(), &[4, 5, 6]);
        assert_eq!(v.as_ptr(), ids.as_ptr());
    }

    #[test]
    fn new_rejects_short_buffer() {
        let ids = [1u32, 2];
        assert_eq!(
            ConnectivityRef::<_, Tri3>::new(&ids).unwrap_err(),
            MeshError::ConnectivityTooShort { arity: 3, len: 2 }
        );
    }

    #[test]
    fn unchecked_paths_match_checked() {
        let mut ids = vec![1i64, 2];
        let mut w = unsafe { ConnectivityMut::<_, Bar2>::from_ptr(ids.as_mut_ptr()) };
        unsafe { *w.get_unchecked_mut(1) = 9 };
        let r = w.as_const();
        assert_eq!(unsafe { *r.get_unchecked(1) }, r[1]);
        assert_eq!(ids, vec![1, 9]);
    }

    #[test]
    fn assign_from_slice_checks_arity() {
        let mut ids = [0u8; 3];
        let mut w = ConnectivityMut::<_, Tri3>::new(&mut ids).unwrap();
        assert!(w.assign_from_slice(&[1, 2]).is_err());
        w.assign_from_slice(&[1, 2, 3]).unwrap();
        assert_eq!(ids, [1, 2, 3]);
    }

    #[test]
    fn debug_prints_identifiers() {
        let ids = [1u32, 2];
        let v = ConnectivityRef::<_, Bar2>::new(&ids).unwrap();
        assert_eq!(format!("{v:?}"), "ConnectivityRef([1, 2])");
    }
}
