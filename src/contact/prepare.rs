use crate::polydata::{CellType, IdArray, PolyData};
use hashbrown::HashSet;

/// Name of the cell array mapping prepared cells back to the input cells.
pub const ORIG_CELL_IDS: &str = "OrigCellIds";

/// Reduce `input` to triangles and polygons.
///
/// Quads are split along (0, 2), strips are decomposed, everything that is
/// not a surface cell is dropped and all point and cell data is discarded.
/// Returns the prepared surface and its non-manifold edges.
pub fn prepare(input: &PolyData) -> (PolyData, HashSet<(usize, usize)>) {
    let mut pd = PolyData {
        points: input.points.clone(),
        ..PolyData::default()
    };
    let mut orig = IdArray::new(ORIG_CELL_IDS, 1);

    for (cell_id, cell) in input.cells.iter().enumerate() {
        let ids = &cell.ids;
        match cell.kind {
            CellType::Triangle | CellType::Polygon if ids.len() >= 3 => {
                pd.insert_cell(cell.kind, ids.clone());
                orig.push(cell_id as i64);
            },
            CellType::Quad if ids.len() == 4 => {
                pd.insert_cell(CellType::Triangle, vec![ids[0], ids[1], ids[2]]);
                pd.insert_cell(CellType::Triangle, vec![ids[0], ids[2], ids[3]]);
                orig.push(cell_id as i64);
                orig.push(cell_id as i64);
            },
            CellType::TriangleStrip => {
                for tri in decompose_strip(ids) {
                    if tri[0] != tri[1] && tri[1] != tri[2] && tri[2] != tri[0] {
                        pd.insert_cell(CellType::Triangle, tri.to_vec());
                        orig.push(cell_id as i64);
                    }
                }
            },
            _ => {},
        }
    }

    pd.set_cell_array(orig);
    let edges = pd.non_manifold_edges();
    (pd, edges)
}

/// Triangles of a strip with alternating winding so all share the orientation
/// of the first one.
pub fn decompose_strip(ids: &[usize]) -> Vec<[usize; 3]> {
    ids.windows(3)
        .enumerate()
        .map(|(i, w)| {
            if i % 2 == 1 {
                [w[0], w[2], w[1]]
            } else {
                [w[0], w[1], w[2]]
            }
        })
        .collect()
}
