//! Planar convex or concave facet with optional per-facet metadata.

use crate::aabb::Aabb;
use crate::float_types::Real;
use crate::mesh::plane::Plane;
use crate::mesh::vertex::Vertex;
use nalgebra::{Point3, Vector3};

#[derive(Debug, Clone, PartialEq)]
pub struct Polygon<S: Clone> {
    pub vertices: Vec<Vertex>,
    /// Plane of the original facet; split pieces inherit it.
    pub plane: Plane,
    pub metadata: Option<S>,
}

impl<S: Clone> Polygon<S> {
    /// `None` for fewer than three vertices or a loop without area.
    pub fn new(vertices: Vec<Vertex>, metadata: Option<S>) -> Option<Self> {
        if vertices.len() < 3 {
            return None;
        }
        let plane = Plane::from_vertices(&vertices)?;
        Some(Polygon {
            vertices,
            plane,
            metadata,
        })
    }

    /// Facet through `points`, every vertex carrying the facet normal.
    pub fn from_points(points: &[Point3<Real>], metadata: Option<S>) -> Option<Self> {
        let vertices = points
            .iter()
            .map(|p| Vertex::new(*p, Vector3::zeros()))
            .collect();
        let mut poly = Self::new(vertices, metadata)?;
        let n = poly.plane.normal;
        poly.vertices.iter_mut().for_each(|v| v.normal = n);
        Some(poly)
    }

    /// Same plane and metadata, other vertices.
    pub(crate) fn with_vertices(&self, vertices: Vec<Vertex>) -> Self {
        Polygon {
            vertices,
            plane: self.plane.clone(),
            metadata: self.metadata.clone(),
        }
    }

    pub fn flip(&mut self) {
        self.vertices.reverse();
        self.vertices.iter_mut().for_each(Vertex::flip);
        self.plane.flip();
    }

    pub fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(self.vertices.iter().map(|v| &v.pos))
    }

    pub fn area(&self) -> Real {
        let n = self.vertices.len();
        let sum = (0..n).fold(Vector3::zeros(), |acc, i| {
            acc + self.vertices[i]
                .pos
                .coords
                .cross(&self.vertices[(i + 1) % n].pos.coords)
        });
        0.5 * sum.dot(&self.plane.normal).abs()
    }

    /// Fan triangles `(0, i, i + 1)`.
    pub fn triangulate(&self) -> Vec<[Vertex; 3]> {
        (1..self.vertices.len().saturating_sub(1))
            .map(|i| [self.vertices[0], self.vertices[i], self.vertices[i + 1]])
            .collect()
    }
}
