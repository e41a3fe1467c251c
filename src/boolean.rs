//! Boolean filter: union, intersection and differences of two closed
//! polygonal surfaces.
//!
//! The inputs go through the [`ContactFilter`] first, so everything the
//! contact filter rejects (missing surface cells, non-manifold edges in the
//! intersection) is rejected here too. The set operation itself runs on BSP
//! trees built from the prepared cells.

use crate::aabb::Aabb;
use crate::contact::{ContactFilter, ORIG_CELL_IDS};
use crate::errors::{FilterError, Side};
use crate::float_types::Real;
use crate::mesh::{Node, Polygon};
use crate::pipeline::Algorithm;
use crate::polydata::{CellType, IdArray, NOT_SET, PolyData};
use nalgebra::Point3;
use std::fmt::Display;
use std::str::FromStr;

/// Cell array tracing result cells back to the cells of the first input.
pub const ORIG_CELL_IDS_A: &str = "OrigCellIdsA";
/// Cell array tracing result cells back to the cells of the second input.
pub const ORIG_CELL_IDS_B: &str = "OrigCellIdsB";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OperMode {
    /// Both surfaces, each split where it passes through the other.
    None,
    #[default]
    Union,
    Intersection,
    /// First minus second.
    Difference,
    /// Second minus first.
    Difference2,
}

impl Display for OperMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OperMode::None => "none",
            OperMode::Union => "union",
            OperMode::Intersection => "intersection",
            OperMode::Difference => "difference",
            OperMode::Difference2 => "difference2",
        };
        f.write_str(s)
    }
}

impl FromStr for OperMode {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(OperMode::None),
            "union" => Ok(OperMode::Union),
            "intersection" => Ok(OperMode::Intersection),
            "difference" => Ok(OperMode::Difference),
            "difference2" => Ok(OperMode::Difference2),
            other => Err(FilterError::InvalidParameter(format!(
                "unknown operation '{other}'"
            ))),
        }
    }
}

/// Which input a facet came from and the input cell it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacetTag {
    pub side: Side,
    pub cell: i64,
}

type Facet = Polygon<FacetTag>;

#[derive(Debug, Clone, Default)]
pub struct BooleanOutput {
    pub result: PolyData,
    pub lines: PolyData,
}

/// Two inputs, two outputs: the combined surface and the contact lines.
#[derive(Debug, Clone, Default)]
pub struct BooleanFilter {
    pub operation: OperMode,
    pub contact: ContactFilter,
}

impl BooleanFilter {
    pub fn new(operation: OperMode) -> Self {
        Self {
            operation,
            ..Self::default()
        }
    }

    pub fn set_operation(&mut self, operation: OperMode) {
        self.operation = operation;
    }

    pub fn execute(&self, input_a: &PolyData, input_b: &PolyData) -> Result<BooleanOutput, FilterError> {
        let contact = self.contact.execute(input_a, input_b)?;

        let facets_a = to_facets(&contact.a, Side::A);
        let facets_b = to_facets(&contact.b, Side::B);

        let facets = match self.operation {
            OperMode::None => split_both(&facets_a, &facets_b),
            OperMode::Union => union(&facets_a, &facets_b),
            OperMode::Intersection => intersection(&facets_a, &facets_b),
            OperMode::Difference => difference(&facets_a, &facets_b),
            OperMode::Difference2 => difference(&facets_b, &facets_a),
        };

        let result = from_facets(&facets, self.contact.merge_tolerance);

        tracing::info!(
            operation = %self.operation,
            contact_lines = contact.lines.number_of_cells(),
            cells = result.number_of_cells(),
            "boolean done"
        );

        Ok(BooleanOutput {
            result,
            lines: contact.lines,
        })
    }
}

impl Algorithm for BooleanFilter {
    fn name(&self) -> &str {
        "BooleanFilter"
    }

    fn number_of_input_ports(&self) -> usize {
        2
    }

    fn number_of_output_ports(&self) -> usize {
        2
    }

    fn request_data(&mut self, inputs: &[&PolyData]) -> Result<Vec<PolyData>, FilterError> {
        let out = self.execute(inputs[0], inputs[1])?;
        Ok(vec![out.result, out.lines])
    }
}

/// Facets of the prepared surface, tagged with the input cells.
fn to_facets(pd: &PolyData, side: Side) -> Vec<Facet> {
    let orig = pd.cell_array(ORIG_CELL_IDS);
    (0..pd.number_of_cells())
        .filter_map(|c| {
            let pts: Vec<Point3<Real>> = pd.cell_points(c).iter().map(|&i| pd.point(i)).collect();
            let cell = orig.and_then(|o| o.value(c)).unwrap_or(c as i64);
            Polygon::from_points(&pts, Some(FacetTag { side, cell }))
        })
        .collect()
}

fn from_facets(facets: &[Facet], tolerance: Real) -> PolyData {
    let mut pd = PolyData::new();
    let mut ids_a = IdArray::new(ORIG_CELL_IDS_A, 1);
    let mut ids_b = IdArray::new(ORIG_CELL_IDS_B, 1);

    for facet in facets {
        let ids: Vec<usize> = facet.vertices.iter().map(|v| pd.add_point(v.pos)).collect();
        pd.insert_cell(CellType::for_polygon(ids.len()), ids);

        let (a, b) = match facet.metadata {
            Some(FacetTag { side: Side::A, cell }) => (cell, NOT_SET),
            Some(FacetTag { side: Side::B, cell }) => (NOT_SET, cell),
            None => (NOT_SET, NOT_SET),
        };
        ids_a.push(a);
        ids_b.push(b);
    }

    pd.set_cell_array(ids_a);
    pd.set_cell_array(ids_b);

    let mut pd = pd.clean(tolerance);
    pd.retain_cells(|_, cell| cell.kind.is_polygonal());
    pd
}

fn bounding_box(facets: &[Facet]) -> Option<Aabb> {
    facets
        .iter()
        .filter_map(Polygon::bounding_box)
        .reduce(|a, b| a.merged(&b))
}

/// Split facets into those that may touch `other_bb` and those that cannot.
fn partition_facets(facets: &[Facet], other_bb: Option<&Aabb>) -> (Vec<Facet>, Vec<Facet>) {
    facets.iter().cloned().partition(|f| {
        match (f.bounding_box(), other_bb) {
            (Some(bb), Some(other)) => bb.intersects(other),
            _ => false,
        }
    })
}

fn union(a: &[Facet], b: &[Facet]) -> Vec<Facet> {
    // facets away from the other surface cannot change
    let (a_clip, a_passthru) = partition_facets(a, bounding_box(b).as_ref());
    let (b_clip, b_passthru) = partition_facets(b, bounding_box(a).as_ref());

    let mut a = Node::from_polygons(&a_clip);
    let mut b = Node::from_polygons(&b_clip);

    a.clip_to(&b);
    b.clip_to(&a);
    b.invert();
    b.clip_to(&a);
    b.invert();
    a.build(&b.all_polygons());

    let mut result = a.all_polygons();
    result.extend(a_passthru);
    result.extend(b_passthru);
    result
}

/// `a` minus `b`.
fn difference(a: &[Facet], b: &[Facet]) -> Vec<Facet> {
    let (a_clip, a_passthru) = partition_facets(a, bounding_box(b).as_ref());
    let (b_clip, _) = partition_facets(b, bounding_box(a).as_ref());

    let mut a = Node::from_polygons(&a_clip);
    let mut b = Node::from_polygons(&b_clip);

    a.invert();
    a.clip_to(&b);
    b.clip_to(&a);
    b.invert();
    b.clip_to(&a);
    b.invert();
    a.build(&b.all_polygons());
    a.invert();

    let mut result = a.all_polygons();
    result.extend(a_passthru);
    result
}

fn intersection(a: &[Facet], b: &[Facet]) -> Vec<Facet> {
    let mut a = Node::from_polygons(a);
    let mut b = Node::from_polygons(b);

    a.invert();
    b.clip_to(&a);
    b.invert();
    a.clip_to(&b);
    b.clip_to(&a);
    a.build(&b.all_polygons());
    a.invert();

    a.all_polygons()
}

fn split_both(a: &[Facet], b: &[Facet]) -> Vec<Facet> {
    let tree_a = Node::from_polygons(a);
    let tree_b = Node::from_polygons(b);

    let (a_out, a_in) = tree_b.partition_polygons(a);
    let (b_out, b_in) = tree_a.partition_polygons(b);

    tracing::debug!(
        a_outside = a_out.len(),
        a_inside = a_in.len(),
        b_outside = b_out.len(),
        b_inside = b_in.len(),
        "split surfaces"
    );

    a_out.into_iter().chain(a_in).chain(b_out).chain(b_in).collect()
}
