//! Contact lines between two polygonal surfaces.
//!
//! Every pair of polygons whose boxes overlap is intersected with the line
//! along which their planes meet. The parts of that line lying inside both
//! polygons become line cells of the output, annotated with the polygons they
//! came from and the input points their ends coincide with.

use crate::errors::{FilterError, Side};
use crate::float_types::Real;
use crate::locator::CellTree;
use crate::pipeline::Algorithm;
use crate::polydata::{CellLinks, CellType, IdArray, NOT_SET, PolyData};
use hashbrown::HashSet;
use nalgebra::{Point3, Vector3};

mod intersect;
mod prepare;

pub use intersect::{InterPt, intersect_edge_line, intersect_poly_line};
pub use prepare::{ORIG_CELL_IDS, decompose_strip, prepare};

/// Intersection points further than this from their edge are reported.
const DRIFT_TOLERANCE: Real = 1e-5;

/// Planes whose normals are this close to parallel do not intersect.
const PARALLEL_PLANES: Real = 1e-12;

/// Contact lines plus both inputs reduced to triangles and polygons.
#[derive(Debug, Clone, Default)]
pub struct ContactOutput {
    pub lines: PolyData,
    pub a: PolyData,
    pub b: PolyData,
}

/// Two inputs, three outputs: contact lines, prepared first input, prepared
/// second input.
#[derive(Debug, Clone)]
pub struct ContactFilter {
    /// Absolute tolerance used when merging the points of the contact lines.
    pub merge_tolerance: Real,
    /// Leaf size of the cell hierarchies.
    pub cells_per_node: usize,
}

impl Default for ContactFilter {
    fn default() -> Self {
        Self {
            merge_tolerance: crate::float_types::tolerance(),
            cells_per_node: 1,
        }
    }
}

/// The state of one run.
struct Contacts<'a> {
    pd_a: &'a PolyData,
    pd_b: &'a PolyData,
    links_a: CellLinks,
    links_b: CellLinks,
    edges_a: HashSet<(usize, usize)>,
    edges_b: HashSet<(usize, usize)>,
    invalid_a: bool,
    invalid_b: bool,

    lines: PolyData,
    cont_a: IdArray,
    cont_b: IdArray,
    sources_a: IdArray,
    sources_b: IdArray,
    neigs_a: IdArray,
    neigs_b: IdArray,
}

/// A contact segment before it is stored.
struct Overlap {
    first: InterPt,
    second: InterPt,
    neig_a: i64,
    neig_b: i64,
}

impl ContactFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn execute(&self, input_a: &PolyData, input_b: &PolyData) -> Result<ContactOutput, FilterError> {
        let (pd_a, edges_a) = prepare(input_a);
        let (pd_b, edges_b) = prepare(input_b);

        if pd_a.number_of_cells() == 0 {
            return Err(FilterError::NoSupportedCells(Side::A));
        }
        if pd_b.number_of_cells() == 0 {
            return Err(FilterError::NoSupportedCells(Side::B));
        }

        tracing::debug!(
            cells_a = pd_a.number_of_cells(),
            cells_b = pd_b.number_of_cells(),
            non_manifold_a = edges_a.len() / 2,
            non_manifold_b = edges_b.len() / 2,
            "prepared inputs"
        );

        let tree_a = CellTree::build(&pd_a, self.cells_per_node);
        let tree_b = CellTree::build(&pd_b, self.cells_per_node);

        let mut contacts = Contacts::new(&pd_a, &pd_b, edges_a, edges_b);

        let mut pairs = 0usize;
        tree_a.for_each_overlap(&tree_b, |id_a, id_b| {
            pairs += 1;
            contacts.intersect_polys(id_a, id_b);
        });

        if contacts.invalid_a {
            return Err(FilterError::NonManifold(Side::A));
        }
        if contacts.invalid_b {
            return Err(FilterError::NonManifold(Side::B));
        }

        let raw = contacts.into_lines();
        let raw_count = raw.number_of_cells();

        let mut lines = raw.clean(self.merge_tolerance);
        lines.retain_cells(|_, cell| cell.kind == CellType::Line);

        tracing::debug!(
            pairs,
            segments = raw_count,
            lines = lines.number_of_cells(),
            "contact lines"
        );

        Ok(ContactOutput {
            lines,
            a: pd_a,
            b: pd_b,
        })
    }
}

impl Algorithm for ContactFilter {
    fn name(&self) -> &str {
        "ContactFilter"
    }

    fn number_of_input_ports(&self) -> usize {
        2
    }

    fn number_of_output_ports(&self) -> usize {
        3
    }

    fn request_data(&mut self, inputs: &[&PolyData]) -> Result<Vec<PolyData>, FilterError> {
        let out = self.execute(inputs[0], inputs[1])?;
        Ok(vec![out.lines, out.a, out.b])
    }
}

/// Line of intersection of the planes through `pt_a`/`pt_b` with normals
/// `n_a`/`n_b`, as a unit direction and a point on it.
fn plane_intersection(
    n_a: &Vector3<Real>,
    pt_a: &Point3<Real>,
    n_b: &Vector3<Real>,
    pt_b: &Point3<Real>,
) -> Option<(Vector3<Real>, Point3<Real>)> {
    let d_a = n_a.dot(&pt_a.coords);
    let d_b = n_b.dot(&pt_b.coords);

    let r = n_a.cross(n_b).try_normalize(0.0)?;

    // The coordinate where r is largest is set to zero; Cramer's rule on the
    // remaining two.
    let i = r.iamax();
    let (u, v) = match i {
        0 => (1, 2),
        1 => (0, 2),
        _ => (0, 1),
    };

    let det = n_a[u] * n_b[v] - n_b[u] * n_a[v];
    if det.abs() < PARALLEL_PLANES {
        return None;
    }

    let mut s = Point3::origin();
    s[u] = (d_a * n_b[v] - d_b * n_a[v]) / det;
    s[v] = (n_a[u] * d_b - n_b[u] * d_a) / det;

    Some((r, s))
}

impl<'a> Contacts<'a> {
    fn new(
        pd_a: &'a PolyData,
        pd_b: &'a PolyData,
        edges_a: HashSet<(usize, usize)>,
        edges_b: HashSet<(usize, usize)>,
    ) -> Self {
        Self {
            pd_a,
            pd_b,
            links_a: pd_a.build_links(),
            links_b: pd_b.build_links(),
            edges_a,
            edges_b,
            invalid_a: false,
            invalid_b: false,
            lines: PolyData::new(),
            cont_a: IdArray::new("cA", 1),
            cont_b: IdArray::new("cB", 1),
            sources_a: IdArray::new("sourcesA", 2),
            sources_b: IdArray::new("sourcesB", 2),
            neigs_a: IdArray::new("neigsA", 1),
            neigs_b: IdArray::new("neigsB", 1),
        }
    }

    fn intersect_polys(&mut self, id_a: usize, id_b: usize) {
        let (pd_a, pd_b) = (self.pd_a, self.pd_b);
        let poly_a = pd_a.cell_points(id_a);
        let poly_b = pd_b.cell_points(id_b);

        let n_a = pd_a.cell_normal(id_a);
        let n_b = pd_b.cell_normal(id_b);

        let Some((r, s)) =
            plane_intersection(&n_a, &pd_a.point(poly_a[0]), &n_b, &pd_b.point(poly_b[0]))
        else {
            return;
        };

        tracing::trace!(id_a, id_b, ?r, ?s, "intersection line");

        let mut inters_a = intersect_poly_line(pd_a, poly_a, &r, &s, Side::A, &n_a);
        let mut inters_b = intersect_poly_line(pd_b, poly_b, &r, &s, Side::B, &n_b);

        // with inaccurate normals the points do not always lie on the edges
        check_inters(&inters_a, pd_a, poly_a, id_a, id_b);
        check_inters(&inters_b, pd_b, poly_b, id_a, id_b);

        if !inters_a.is_empty()
            && !inters_b.is_empty()
            && inters_a.len() % 2 == 0
            && inters_b.len() % 2 == 0
        {
            self.add_contact_lines(&mut inters_a, &mut inters_b, id_a, id_b);
        }
    }

    /// The neighbor of `poly_id` across the edge both points lie on, if they
    /// lie on the same edge.
    fn neighbor(&self, side: Side, p: &InterPt, q: &InterPt, poly_id: usize) -> i64 {
        if p.edge != q.edge {
            return NOT_SET;
        }

        let (pd, links) = match side {
            Side::A => (self.pd_a, &self.links_a),
            Side::B => (self.pd_b, &self.links_b),
        };
        let poly = pd.cell_points(poly_id);

        match pd
            .edge_neighbors(links, poly_id, poly[p.edge[0]], poly[p.edge[1]])
            .as_slice()
        {
            [n] => *n as i64,
            _ => NOT_SET,
        }
    }

    fn overlap_lines(
        &self,
        inters_a: &mut [InterPt],
        inters_b: &mut [InterPt],
        id_a: usize,
        id_b: usize,
    ) -> Vec<Overlap> {
        let mut overlaps = Vec::new();

        for i in (0..inters_a.len()).step_by(2) {
            let neig_a = self.neighbor(Side::A, &inters_a[i], &inters_a[i + 1], id_a);

            for j in (0..inters_b.len()).step_by(2) {
                let neig_b = self.neighbor(Side::B, &inters_b[j], &inters_b[j + 1], id_b);

                let (a0, a1) = (inters_a[i].t, inters_a[i + 1].t);
                let (b0, b1) = (inters_b[j].t, inters_b[j + 1].t);

                // Each end of the overlap is the later start and the earlier
                // end, and takes over the source point of its counterpart.
                let ends = if a0 <= b0 && a1 > b0 {
                    inters_b[j].merge(&inters_a[i]);
                    let first = inters_b[j].clone();
                    let second = if b1 < a1 {
                        inters_b[j + 1].merge(&inters_a[i + 1]);
                        inters_b[j + 1].clone()
                    } else {
                        inters_a[i + 1].merge(&inters_b[j + 1]);
                        inters_a[i + 1].clone()
                    };
                    Some((first, second))
                } else if b0 <= a0 && b1 > a0 {
                    inters_a[i].merge(&inters_b[j]);
                    let first = inters_a[i].clone();
                    let second = if a1 < b1 {
                        inters_a[i + 1].merge(&inters_b[j + 1]);
                        inters_a[i + 1].clone()
                    } else {
                        inters_b[j + 1].merge(&inters_a[i + 1]);
                        inters_b[j + 1].clone()
                    };
                    Some((first, second))
                } else {
                    None
                };

                if let Some((first, second)) = ends {
                    overlaps.push(Overlap {
                        first,
                        second,
                        neig_a,
                        neig_b,
                    });
                }
            }
        }

        overlaps
    }

    fn touches_non_manifold(&self, side: Side, p: &InterPt, poly: &[usize]) -> bool {
        let edges = match side {
            Side::A => &self.edges_a,
            Side::B => &self.edges_b,
        };
        p.src == side && edges.contains(&(poly[p.edge[0]], poly[p.edge[1]]))
    }

    fn add_contact_lines(
        &mut self,
        inters_a: &mut [InterPt],
        inters_b: &mut [InterPt],
        id_a: usize,
        id_b: usize,
    ) {
        let overlaps = self.overlap_lines(inters_a, inters_b, id_a, id_b);

        let (pd_a, pd_b) = (self.pd_a, self.pd_b);
        let poly_a = pd_a.cell_points(id_a);
        let poly_b = pd_b.cell_points(id_b);

        for Overlap {
            first,
            second,
            neig_a,
            neig_b,
        } in overlaps
        {
            if self.touches_non_manifold(Side::A, &first, poly_a)
                || self.touches_non_manifold(Side::A, &second, poly_a)
            {
                self.invalid_a = true;
            }
            if self.touches_non_manifold(Side::B, &first, poly_b)
                || self.touches_non_manifold(Side::B, &second, poly_b)
            {
                self.invalid_b = true;
            }

            let p = self.lines.add_point(first.pt);
            let q = self.lines.add_point(second.pt);
            self.lines.insert_cell(CellType::Line, vec![p, q]);

            self.sources_a.push_tuple(&[first.src_a, second.src_a]);
            self.sources_b.push_tuple(&[first.src_b, second.src_b]);

            self.cont_a.push(id_a as i64);
            self.cont_b.push(id_b as i64);

            self.neigs_a.push(neig_a);
            self.neigs_b.push(neig_b);
        }
    }

    fn into_lines(self) -> PolyData {
        let mut lines = self.lines;
        for array in [
            self.cont_a,
            self.cont_b,
            self.sources_a,
            self.sources_b,
            self.neigs_a,
            self.neigs_b,
        ] {
            lines.set_cell_array(array);
        }
        lines
    }
}

/// Warn about intersection points that are not on the edge they were
/// computed for. Returns how many there are.
fn check_inters(inters: &[InterPt], pd: &PolyData, poly: &[usize], id_a: usize, id_b: usize) -> usize {
    let mut drifted = 0;
    for p in inters {
        let e_a = pd.point(poly[p.edge[0]]);
        let e_b = pd.point(poly[p.edge[1]]);

        let Some(v) = (e_a - e_b).try_normalize(0.0) else {
            continue;
        };
        let w = e_a - p.pt;

        let d = w.cross(&v).norm();
        if d >= DRIFT_TOLERANCE {
            tracing::warn!(
                id_a,
                id_b,
                distance = d,
                "intersection point is off its edge"
            );
            drifted += 1;
        }
    }
    drifted
}
