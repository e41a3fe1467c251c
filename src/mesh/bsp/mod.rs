//! Binary space partitioning trees over facets.
//!
//! The algorithms live behind [`BspOps`]; the methods on [`Node`] pick the
//! serial or the rayon implementation depending on the `parallel` feature.

pub mod node;
pub mod traits;

#[cfg(not(feature = "parallel"))]
pub mod serial;

#[cfg(feature = "parallel")]
pub mod parallel;

pub use node::Node;
pub use traits::{BalancedSplittingStrategy, BspOps, SplittingPlaneStrategy};

#[cfg(not(feature = "parallel"))]
pub use serial::SerialBspOps;

#[cfg(feature = "parallel")]
pub use parallel::ParallelBspOps;

use crate::mesh::polygon::Polygon;
use std::fmt::Debug;

#[cfg(not(feature = "parallel"))]
fn ops<S: Clone>() -> SerialBspOps<BalancedSplittingStrategy, S> {
    SerialBspOps::new()
}

#[cfg(feature = "parallel")]
fn ops<S: Clone>() -> ParallelBspOps<BalancedSplittingStrategy, S> {
    ParallelBspOps::new()
}

impl<S: Clone + Send + Sync + Debug> Node<S> {
    pub fn from_polygons(polygons: &[Polygon<S>]) -> Self {
        let mut node = Self::new();
        if !polygons.is_empty() {
            node.build(polygons);
        }
        node
    }

    pub fn invert(&mut self) {
        ops::<S>().invert(self);
    }

    pub fn clip_polygons(&self, polygons: &[Polygon<S>]) -> Vec<Polygon<S>> {
        ops::<S>().clip_polygons(self, polygons)
    }

    /// `(outside, inside)` parts of `polygons` with respect to this solid.
    pub fn partition_polygons(&self, polygons: &[Polygon<S>]) -> (Vec<Polygon<S>>, Vec<Polygon<S>>) {
        ops::<S>().partition_polygons(self, polygons)
    }

    pub fn clip_to(&mut self, other: &Node<S>) {
        ops::<S>().clip_to(self, other);
    }

    pub fn build(&mut self, polygons: &[Polygon<S>]) {
        ops::<S>().build(self, polygons);
    }

    pub fn all_polygons(&self) -> Vec<Polygon<S>> {
        ops::<S>().all_polygons(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::float_types::Real;
    use crate::sources::CubeSource;
    use nalgebra::Point3;

    fn cube_facets() -> Vec<Polygon<usize>> {
        let pd = CubeSource::default().polydata().unwrap();
        (0..pd.number_of_cells())
            .filter_map(|c| {
                let pts: Vec<Point3<Real>> = pd.cell_points(c).iter().map(|&i| pd.point(i)).collect();
                Polygon::from_points(&pts, Some(c))
            })
            .collect()
    }

    fn square_through_cube() -> Polygon<usize> {
        Polygon::from_points(
            &[
                Point3::new(-1.0, -1.0, 0.0),
                Point3::new(1.0, -1.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(-1.0, 1.0, 0.0),
            ],
            Some(99),
        )
        .unwrap()
    }

    fn total_area(polys: &[Polygon<usize>]) -> Real {
        polys.iter().map(Polygon::area).sum()
    }

    #[test]
    fn build_keeps_every_facet() {
        let facets = cube_facets();
        let tree = Node::from_polygons(&facets);
        let all = tree.all_polygons();
        assert_eq!(all.len(), 6);
        assert!((total_area(&all) - 6.0).abs() < 1e-12);
        assert!(tree.node_count() >= 6);
    }

    #[test]
    fn partition_splits_at_cube_faces() {
        let tree = Node::from_polygons(&cube_facets());
        let (outside, inside) = tree.partition_polygons(&[square_through_cube()]);

        assert!((total_area(&inside) - 1.0).abs() < 1e-9);
        assert!((total_area(&outside) - 3.0).abs() < 1e-9);
        assert!(inside.iter().chain(&outside).all(|p| p.metadata == Some(99)));
        for p in &inside {
            assert!(p.vertices.iter().all(|v| v.pos.x.abs() <= 0.5 + 1e-9));
        }

        let clipped = tree.clip_polygons(&[square_through_cube()]);
        assert!((total_area(&clipped) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn invert_swaps_inside_and_outside() {
        let mut tree = Node::from_polygons(&cube_facets());
        tree.invert();
        let (outside, inside) = tree.partition_polygons(&[square_through_cube()]);
        assert!((total_area(&outside) - 1.0).abs() < 1e-9);
        assert!((total_area(&inside) - 3.0).abs() < 1e-9);
    }
}
