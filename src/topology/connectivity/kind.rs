//! Connectivity kinds: arity and topological type code carried by a type.
//!
//! A kind is a zero-sized marker. Views are generic over their kind, so two
//! views of different kinds cannot be compared or assigned to each other: the
//! mismatch is a type error, never a runtime check:
//!
//! ```compile_fail
//! use mesh_connect::prelude::*;
//!
//! let tri = [1u32, 2, 3];
//! let quad = [1u32, 2, 3, 4];
//! let a = ConnectivityRef::<_, Tri3>::new(&tri).unwrap();
//! let b = ConnectivityRef::<_, Quad4>::new(&quad).unwrap();
//! let _ = a == b;
//! ```

use crate::topology::cell_type::CellType;

/// Static description of a fixed-arity connectivity record.
pub trait ConnectivityKind: 'static {
    /// Number of identifiers in one record.
    const NB_NODES: usize;
    /// Topological type code.
    const TYPE: i32;

    /// The standard element shape matching [`TYPE`](Self::TYPE), if any.
    fn cell_type() -> Option<CellType> {
        CellType::from_code(Self::TYPE)
    }
}

/// Declare a connectivity kind marker type.
///
/// Either from a standard element shape, taking its arity and code:
///
/// ```
/// use mesh_connect::connectivity_kind;
/// use mesh_connect::topology::cell_type::CellType;
/// use mesh_connect::topology::connectivity::ConnectivityKind;
///
/// connectivity_kind!(pub Face3 => CellType::Triangle);
/// assert_eq!(Face3::NB_NODES, 3);
/// assert_eq!(Face3::TYPE, 5);
/// ```
///
/// or from an explicit arity and type code:
///
/// ```
/// use mesh_connect::connectivity_kind;
/// use mesh_connect::topology::connectivity::ConnectivityKind;
///
/// connectivity_kind!(pub Custom { nb_nodes: 3, type_code: 42 });
/// assert_eq!(Custom::NB_NODES, 3);
/// assert_eq!(Custom::TYPE, 42);
/// ```
#[macro_export]
macro_rules! connectivity_kind {
    ($(#[$meta:meta])* $vis:vis $name:ident => $cell:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
        $vis struct $name;

        impl $crate::topology::connectivity::ConnectivityKind for $name {
            const NB_NODES: usize = $crate::topology::cell_type::CellType::nb_nodes($cell);
            const TYPE: i32 = $crate::topology::cell_type::CellType::code($cell);
        }
    };
    ($(#[$meta:meta])* $vis:vis $name:ident { nb_nodes: $n:expr, type_code: $code:expr $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
        $vis struct $name;

        impl $crate::topology::connectivity::ConnectivityKind for $name {
            const NB_NODES: usize = $n;
            const TYPE: i32 = $code;
        }
    };
}

connectivity_kind!(
    /// Single vertex.
    pub Node1 => CellType::Node
);
connectivity_kind!(
    /// Two-node edge.
    pub Bar2 => CellType::Bar
);
connectivity_kind!(
    /// Three-node triangle.
    pub Tri3 => CellType::Triangle
);
connectivity_kind!(
    /// Four-node quadrilateral.
    pub Quad4 => CellType::Quadrilateral
);
connectivity_kind!(
    /// Four-node tetrahedron.
    pub Tet4 => CellType::Tetrahedron
);
connectivity_kind!(
    /// Five-node pyramid.
    pub Pyra5 => CellType::Pyramid
);
connectivity_kind!(
    /// Six-node prism.
    pub Penta6 => CellType::Prism
);
connectivity_kind!(
    /// Eight-node hexahedron.
    pub Hex8 => CellType::Hexahedron
);
