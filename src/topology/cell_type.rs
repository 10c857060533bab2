//! Cell type metadata for connectivity records.

use serde::{Deserialize, Serialize};

/// Fixed-arity element shapes that connectivity records describe.
///
/// The numeric [`code`](CellType::code) follows the CGNS `ElementType_t`
/// numbering, so codes can be written to and read from CGNS files unchanged.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum CellType {
    /// 0D vertex.
    Node,
    /// 1D segment/edge.
    Bar,
    /// 2D simplex (triangle).
    Triangle,
    /// 2D tensor-product cell (quad).
    Quadrilateral,
    /// 3D simplex (tet).
    Tetrahedron,
    /// 3D pyramid.
    Pyramid,
    /// 3D wedge/prism.
    Prism,
    /// 3D tensor-product cell (hex).
    Hexahedron,
}

impl CellType {
    pub const ALL: [CellType; 8] = [
        CellType::Node,
        CellType::Bar,
        CellType::Triangle,
        CellType::Quadrilateral,
        CellType::Tetrahedron,
        CellType::Pyramid,
        CellType::Prism,
        CellType::Hexahedron,
    ];

    /// Topological type code (CGNS `NODE`, `BAR_2`, `TRI_3`, ...).
    pub const fn code(self) -> i32 {
        match self {
            CellType::Node => 2,
            CellType::Bar => 3,
            CellType::Triangle => 5,
            CellType::Quadrilateral => 7,
            CellType::Tetrahedron => 10,
            CellType::Pyramid => 12,
            CellType::Prism => 14,
            CellType::Hexahedron => 17,
        }
    }

    /// Inverse of [`code`](CellType::code).
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    /// Number of vertices of the linear element.
    pub const fn nb_nodes(self) -> usize {
        match self {
            CellType::Node => 1,
            CellType::Bar => 2,
            CellType::Triangle => 3,
            CellType::Quadrilateral => 4,
            CellType::Tetrahedron => 4,
            CellType::Pyramid => 5,
            CellType::Prism => 6,
            CellType::Hexahedron => 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for t in CellType::ALL {
            assert_eq!(CellType::from_code(t.code()), Some(t));
        }
        assert_eq!(CellType::from_code(0), None);
    }

    #[test]
    fn serde_uses_variant_names() {
        let s = serde_json::to_string(&CellType::Tetrahedron).unwrap();
        assert_eq!(s, "\"Tetrahedron\"");
        let back: CellType = serde_json::from_str(&s).unwrap();
        assert_eq!(back, CellType::Tetrahedron);
    }
}
