//! Operations on BSP trees, implemented serially and with rayon.

use crate::float_types::Real;
use crate::mesh::bsp::node::Node;
use crate::mesh::plane::{BACK, COPLANAR, FRONT, Plane};
use crate::mesh::polygon::Polygon;

pub trait BspOps<S: Clone + Send + Sync> {
    /// Turn solid into empty space and back: flip every facet and plane and
    /// swap the children.
    fn invert(&self, node: &mut Node<S>);

    /// Parts of `polygons` outside the solid of `node`.
    fn clip_polygons(&self, node: &Node<S>, polygons: &[Polygon<S>]) -> Vec<Polygon<S>>;

    /// Parts of `polygons` outside and inside the solid of `node`, split along
    /// its planes. Facets coplanar with a boundary go to the side their
    /// normal faces.
    fn partition_polygons(
        &self,
        node: &Node<S>,
        polygons: &[Polygon<S>],
    ) -> (Vec<Polygon<S>>, Vec<Polygon<S>>);

    /// Remove the parts of this tree's facets that lie inside `other`.
    fn clip_to(&self, node: &mut Node<S>, other: &Node<S>);

    /// Insert `polygons` into the tree, creating nodes as needed.
    fn build(&self, node: &mut Node<S>, polygons: &[Polygon<S>]);

    fn all_polygons(&self, node: &Node<S>) -> Vec<Polygon<S>>;
}

pub trait SplittingPlaneStrategy<S: Clone> {
    /// `polygons` is never empty.
    fn pick_best_splitting_plane(&self, polygons: &[Polygon<S>]) -> Plane;
}

/// Scores candidate planes by how many facets they cut and how unevenly they
/// divide the rest; the lowest score wins.
#[derive(Debug, Clone)]
pub struct BalancedSplittingStrategy {
    pub span_weight: Real,
    pub balance_weight: Real,
    /// Only the planes of the first `sample_size` facets are tried.
    pub sample_size: usize,
}

impl Default for BalancedSplittingStrategy {
    fn default() -> Self {
        Self {
            span_weight: 8.0,
            balance_weight: 1.0,
            sample_size: 20,
        }
    }
}

impl<S: Clone> SplittingPlaneStrategy<S> for BalancedSplittingStrategy {
    fn pick_best_splitting_plane(&self, polygons: &[Polygon<S>]) -> Plane {
        let mut best_plane = polygons[0].plane.clone();
        let mut best_score = Real::MAX;

        for candidate in polygons.iter().take(self.sample_size.max(1)) {
            let plane = &candidate.plane;
            let (front, back, spanning) =
                polygons
                    .iter()
                    .fold((0i64, 0i64, 0i64), |(f, b, s), poly| {
                        match plane.classify_polygon(poly) {
                            COPLANAR => (f, b, s),
                            FRONT => (f + 1, b, s),
                            BACK => (f, b + 1, s),
                            _ => (f, b, s + 1),
                        }
                    });

            let score = self.span_weight * spanning as Real
                + self.balance_weight * ((front - back) as Real).abs();

            if score < best_score {
                best_score = score;
                best_plane = plane.clone();
            }
        }

        best_plane
    }
}
