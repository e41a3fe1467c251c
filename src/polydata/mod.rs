//! `PolyData`: points plus vertex/line/polygon/strip cells and named integer
//! arrays, the data object that flows between pipeline stages.

use crate::aabb::Aabb;
use crate::float_types::Real;
use nalgebra::{Point3, Vector3};

mod array;
mod cell;
mod clean;
mod features;
mod links;

pub use array::{IdArray, NOT_SET};
pub use cell::{Cell, CellType};
pub use links::CellLinks;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolyData {
    pub points: Vec<Point3<Real>>,
    pub cells: Vec<Cell>,
    /// One tuple per cell in every array.
    pub cell_data: Vec<IdArray>,
    /// One tuple per point in every array.
    pub point_data: Vec<IdArray>,
}

impl PolyData {
    pub const fn new() -> Self {
        Self {
            points: Vec::new(),
            cells: Vec::new(),
            cell_data: Vec::new(),
            point_data: Vec::new(),
        }
    }

    /// Build from raw points and polygon index lists; the cell type is picked
    /// from the number of ids.
    pub fn from_polygons(points: Vec<Point3<Real>>, polys: &[Vec<usize>]) -> Self {
        let mut pd = Self {
            points,
            ..Self::default()
        };
        for ids in polys {
            pd.insert_cell(CellType::for_polygon(ids.len()), ids.clone());
        }
        pd
    }

    pub fn number_of_points(&self) -> usize {
        self.points.len()
    }

    pub fn number_of_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn add_point(&mut self, p: Point3<Real>) -> usize {
        self.points.push(p);
        self.points.len() - 1
    }

    pub fn insert_cell(&mut self, kind: CellType, ids: Vec<usize>) -> usize {
        self.cells.push(Cell::new(kind, ids));
        self.cells.len() - 1
    }

    pub fn point(&self, id: usize) -> Point3<Real> {
        self.points[id]
    }

    pub fn cell_points(&self, cell_id: usize) -> &[usize] {
        &self.cells[cell_id].ids
    }

    pub fn cell_type(&self, cell_id: usize) -> CellType {
        self.cells[cell_id].kind
    }

    pub fn cell_array(&self, name: &str) -> Option<&IdArray> {
        self.cell_data.iter().find(|a| a.name == name)
    }

    /// Attach `array` as cell data, replacing an array of the same name.
    pub fn set_cell_array(&mut self, array: IdArray) {
        match self.cell_data.iter_mut().find(|a| a.name == array.name) {
            Some(slot) => *slot = array,
            None => self.cell_data.push(array),
        }
    }

    pub fn point_array(&self, name: &str) -> Option<&IdArray> {
        self.point_data.iter().find(|a| a.name == name)
    }

    /// Remove every cell for which `keep` returns false, together with its
    /// cell-data tuples. Points are left untouched.
    pub fn retain_cells<F>(&mut self, mut keep: F)
    where
        F: FnMut(usize, &Cell) -> bool,
    {
        let flags: Vec<bool> = self
            .cells
            .iter()
            .enumerate()
            .map(|(i, c)| keep(i, c))
            .collect();

        let mut i = 0;
        self.cells.retain(|_| {
            let k = flags[i];
            i += 1;
            k
        });

        for arr in &mut self.cell_data {
            arr.retain_tuples(&flags);
        }
    }

    pub fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(&self.points)
    }

    pub fn cell_bounding_box(&self, cell_id: usize) -> Option<Aabb> {
        Aabb::from_points(self.cells[cell_id].ids.iter().map(|&i| &self.points[i]))
    }

    /// Unit normal of a polygonal cell using Newell's method; zero for
    /// degenerate cells.
    pub fn cell_normal(&self, cell_id: usize) -> Vector3<Real> {
        newell_normal(self.cells[cell_id].ids.iter().map(|&i| self.points[i]))
    }

    /// Signed volume enclosed by the polygonal cells (positive for outward
    /// oriented closed surfaces).
    pub fn volume(&self) -> Real {
        let mut sum = 0.0;
        for cell in self.cells.iter().filter(|c| c.kind.is_polygonal()) {
            let Some((&first, rest)) = cell.ids.split_first() else {
                continue;
            };
            let p0 = self.points[first].coords;
            for w in rest.windows(2) {
                let p1 = self.points[w[0]].coords;
                let p2 = self.points[w[1]].coords;
                sum += p0.dot(&p1.cross(&p2));
            }
        }
        sum / 6.0
    }

    /// Total area of the polygonal cells.
    pub fn area(&self) -> Real {
        self.cells
            .iter()
            .filter(|c| c.kind.is_polygonal())
            .map(|c| {
                let n = c.ids.iter().zip(c.ids.iter().cycle().skip(1)).fold(
                    Vector3::zeros(),
                    |acc, (&a, &b)| acc + self.points[a].coords.cross(&self.points[b].coords),
                );
                n.norm() * 0.5
            })
            .sum()
    }

    /// Append `other`, offsetting its point ids. Cell data is kept only for
    /// arrays present on both sides.
    pub fn append(&mut self, other: &PolyData) {
        let offset = self.points.len();
        let own_cells = self.cells.len();
        self.points.extend_from_slice(&other.points);
        for cell in &other.cells {
            self.cells.push(Cell::new(
                cell.kind,
                cell.ids.iter().map(|i| i + offset).collect(),
            ));
        }

        let mut merged = Vec::new();
        for arr in self.cell_data.drain(..) {
            if let Some(theirs) = other.cell_array(&arr.name) {
                if theirs.components == arr.components && arr.len() == own_cells {
                    let mut arr = arr;
                    arr.values.extend_from_slice(&theirs.values);
                    merged.push(arr);
                }
            }
        }
        self.cell_data = merged;
        self.point_data.clear();
    }
}

/// Newell normal of a closed point loop, normalized; zero when degenerate.
pub(crate) fn newell_normal<I>(points: I) -> Vector3<Real>
where
    I: IntoIterator<Item = Point3<Real>>,
{
    let pts: Vec<Point3<Real>> = points.into_iter().collect();
    let n = pts.len();
    let mut normal = Vector3::zeros();
    for i in 0..n {
        let a = &pts[i];
        let b = &pts[(i + 1) % n];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    normal.try_normalize(Real::EPSILON).unwrap_or_else(Vector3::zeros)
}
