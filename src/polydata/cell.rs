/// Cell kinds understood by [`PolyData`](super::PolyData).
///
/// The numeric ids returned by [`CellType::vtk_id`] are the ones used by the
/// legacy VTK file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellType {
    Vertex,
    PolyVertex,
    Line,
    PolyLine,
    Triangle,
    TriangleStrip,
    Polygon,
    Quad,
}

impl CellType {
    pub const fn vtk_id(self) -> u8 {
        match self {
            CellType::Vertex => 1,
            CellType::PolyVertex => 2,
            CellType::Line => 3,
            CellType::PolyLine => 4,
            CellType::Triangle => 5,
            CellType::TriangleStrip => 6,
            CellType::Polygon => 7,
            CellType::Quad => 9,
        }
    }

    pub const fn from_vtk_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(CellType::Vertex),
            2 => Some(CellType::PolyVertex),
            3 => Some(CellType::Line),
            4 => Some(CellType::PolyLine),
            5 => Some(CellType::Triangle),
            6 => Some(CellType::TriangleStrip),
            7 => Some(CellType::Polygon),
            9 => Some(CellType::Quad),
            _ => None,
        }
    }

    /// Triangles, quads and general polygons.
    pub const fn is_polygonal(self) -> bool {
        matches!(
            self,
            CellType::Triangle | CellType::Quad | CellType::Polygon
        )
    }

    /// Pick the polygonal type matching a point count.
    pub const fn for_polygon(num_points: usize) -> Self {
        match num_points {
            3 => CellType::Triangle,
            4 => CellType::Quad,
            _ => CellType::Polygon,
        }
    }
}

/// One cell: a kind plus the ids of the points it uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub kind: CellType,
    pub ids: Vec<usize>,
}

impl Cell {
    pub const fn new(kind: CellType, ids: Vec<usize>) -> Self {
        Self { kind, ids }
    }

    /// Consecutive point pairs of a closed polygonal cell, including the wrap-around.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = self.ids.len();
        (0..n).map(move |i| (self.ids[i], self.ids[(i + 1) % n]))
    }
}
