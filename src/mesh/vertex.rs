//! Corner of a facet.

use crate::float_types::Real;
use nalgebra::{Point3, Vector3};

/// A facet corner: position plus the normal of the facet it was taken from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub pos: Point3<Real>,
    pub normal: Vector3<Real>,
}

impl Vertex {
    pub const fn new(pos: Point3<Real>, normal: Vector3<Real>) -> Self {
        Vertex { pos, normal }
    }

    pub fn flip(&mut self) {
        self.normal = -self.normal;
    }

    /// Point at `t` on the segment towards `other`; `t = 0` is `self`.
    pub fn interpolate(&self, other: &Vertex, t: Real) -> Vertex {
        Vertex::new(
            self.pos + (other.pos - self.pos) * t,
            self.normal.lerp(&other.normal, t),
        )
    }
}
