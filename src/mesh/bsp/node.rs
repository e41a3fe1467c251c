//! BSP tree node

use crate::mesh::plane::Plane;
use crate::mesh::polygon::Polygon;
use std::fmt::Debug;

/// Node of a solid BSP tree. Front is outside, back is inside.
#[derive(Debug, Clone)]
pub struct Node<S: Clone> {
    /// Splitting plane, `None` until the node is built.
    pub plane: Option<Plane>,

    pub front: Option<Box<Node<S>>>,

    pub back: Option<Box<Node<S>>>,

    /// Facets lying in `plane`.
    pub polygons: Vec<Polygon<S>>,
}

impl<S: Clone + Send + Sync + Debug> Default for Node<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone + Send + Sync + Debug> Node<S> {
    pub const fn new() -> Self {
        Self {
            plane: None,
            front: None,
            back: None,
            polygons: Vec::new(),
        }
    }

    /// Number of nodes in the subtree, this one included.
    pub fn node_count(&self) -> usize {
        1 + self.front.as_ref().map_or(0, |n| n.node_count())
            + self.back.as_ref().map_or(0, |n| n.node_count())
    }
}
