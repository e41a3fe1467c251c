//! Point merging, the equivalent of running a clean pass with an absolute tolerance.

use super::{Cell, CellType, PolyData};
use crate::float_types::Real;
use hashbrown::HashMap;
use nalgebra::Point3;

/// Uniform grid bucketing points by `floor(p / cell_size)`.
struct PointGrid {
    cell_size: Real,
    buckets: HashMap<(i64, i64, i64), Vec<usize>>,
}

impl PointGrid {
    fn new(cell_size: Real) -> Self {
        Self {
            cell_size: cell_size.max(Real::EPSILON),
            buckets: HashMap::new(),
        }
    }

    fn key(&self, p: &Point3<Real>) -> (i64, i64, i64) {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
            (p.z / self.cell_size).floor() as i64,
        )
    }

    /// Id of an already inserted point within `tolerance`, searching the 27
    /// neighbouring buckets.
    fn find(&self, p: &Point3<Real>, points: &[Point3<Real>], tolerance: Real) -> Option<usize> {
        let (kx, ky, kz) = self.key(p);
        let tol2 = tolerance * tolerance;
        let mut best: Option<(usize, Real)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = self.buckets.get(&(kx + dx, ky + dy, kz + dz)) else {
                        continue;
                    };
                    for &id in bucket {
                        let d2 = (points[id] - p).norm_squared();
                        if d2 <= tol2 && best.is_none_or(|(_, bd)| d2 < bd) {
                            best = Some((id, d2));
                        }
                    }
                }
            }
        }
        best.map(|(id, _)| id)
    }

    fn insert(&mut self, p: &Point3<Real>, id: usize) {
        let key = self.key(p);
        self.buckets.entry(key).or_default().push(id);
    }
}

impl PolyData {
    /// Merge points closer than `tolerance`, drop unused points and collapse
    /// repeated ids inside cells.
    ///
    /// Cells are never removed, only demoted: a line whose ends merged becomes
    /// a vertex, a polygon left with two distinct ids becomes a line. This
    /// keeps the cell data aligned; callers filter on [`CellType`] afterwards.
    pub fn clean(&self, tolerance: Real) -> PolyData {
        let mut grid = PointGrid::new(tolerance);
        let mut merged: Vec<Point3<Real>> = Vec::new();
        let mut old_to_new: Vec<Option<usize>> = vec![None; self.points.len()];

        let used = {
            let mut used = vec![false; self.points.len()];
            for cell in &self.cells {
                for &id in &cell.ids {
                    if let Some(u) = used.get_mut(id) {
                        *u = true;
                    }
                }
            }
            used
        };

        for (old, p) in self.points.iter().enumerate() {
            if !used[old] {
                continue;
            }
            let new = match grid.find(p, &merged, tolerance) {
                Some(id) => id,
                None => {
                    merged.push(*p);
                    let id = merged.len() - 1;
                    grid.insert(p, id);
                    id
                },
            };
            old_to_new[old] = Some(new);
        }

        let cells = self
            .cells
            .iter()
            .map(|cell| {
                let mut ids: Vec<usize> = cell
                    .ids
                    .iter()
                    .filter_map(|&i| old_to_new.get(i).copied().flatten())
                    .collect();
                ids.dedup();
                let closed = cell.kind.is_polygonal() || cell.kind == CellType::Line;
                if closed && ids.len() > 1 && ids.first() == ids.last() {
                    ids.pop();
                }
                Cell::new(demote(cell.kind, ids.len()), ids)
            })
            .collect();

        PolyData {
            points: merged,
            cells,
            cell_data: self.cell_data.clone(),
            point_data: Vec::new(),
        }
    }
}

const fn demote(kind: CellType, distinct: usize) -> CellType {
    match kind {
        CellType::Line | CellType::PolyLine if distinct < 2 => CellType::Vertex,
        CellType::Triangle | CellType::Quad | CellType::Polygon => match distinct {
            0 | 1 => CellType::Vertex,
            2 => CellType::Line,
            3 => CellType::Triangle,
            _ => kind,
        },
        CellType::TriangleStrip if distinct < 3 => CellType::PolyVertex,
        _ => kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polydata::IdArray;

    #[test]
    fn merges_close_points_and_demotes_lines() {
        let mut pd = PolyData::new();
        let a = pd.add_point(Point3::new(0.0, 0.0, 0.0));
        let b = pd.add_point(Point3::new(1.0, 0.0, 0.0));
        let c = pd.add_point(Point3::new(1.0 + 1e-7, 0.0, 0.0));
        let d = pd.add_point(Point3::new(1.0, 1e-7, 0.0));
        pd.add_point(Point3::new(5.0, 5.0, 5.0)); // unused
        pd.insert_cell(CellType::Line, vec![a, b]);
        pd.insert_cell(CellType::Line, vec![c, d]);
        pd.set_cell_array(IdArray::from_values("id", 1, vec![7, 8]));

        let cleaned = pd.clean(1e-5);
        assert_eq!(cleaned.number_of_points(), 2);
        assert_eq!(cleaned.cell_type(0), CellType::Line);
        assert_eq!(cleaned.cell_type(1), CellType::Vertex);
        assert_eq!(cleaned.cell_points(1).len(), 1);
        assert_eq!(cleaned.cell_array("id").unwrap().values, vec![7, 8]);
    }

    #[test]
    fn collapsed_quad_becomes_triangle() {
        let pd = PolyData::from_polygons(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 1e-9),
                Point3::new(0.0, 1.0, 0.0),
            ],
            &[vec![0, 1, 2, 3]],
        );
        let cleaned = pd.clean(1e-6);
        assert_eq!(cleaned.cell_type(0), CellType::Triangle);
        assert_eq!(cleaned.cell_points(0), &[0, 1, 2]);
    }
}
