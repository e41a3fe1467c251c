//! Oriented planes and the polygon splitting the BSP tree is built on.

use crate::float_types::{EPSILON, Real};
use crate::mesh::polygon::Polygon;
use crate::mesh::vertex::Vertex;
use crate::polydata::newell_normal;
use nalgebra::{Point3, Vector3};

// Classification bits; a polygon with vertices on both sides is SPANNING.
pub const COPLANAR: i8 = 0;
pub const FRONT: i8 = 1;
pub const BACK: i8 = 2;
pub const SPANNING: i8 = 3;

/// Plane `normal · p = w` with unit `normal`.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub normal: Vector3<Real>,
    pub w: Real,
}

/// Result of [`Plane::split_polygon`]: coplanar facets facing the same way
/// as the plane, coplanar facets facing the other way, pieces in front and
/// pieces behind.
pub type Split<S> = (Vec<Polygon<S>>, Vec<Polygon<S>>, Vec<Polygon<S>>, Vec<Polygon<S>>);

impl Plane {
    pub fn from_normal(normal: Vector3<Real>, w: Real) -> Self {
        Plane {
            normal: normal.normalize(),
            w,
        }
    }

    /// Plane through the vertices, oriented by their winding (Newell's method,
    /// so non-planar or partially collinear loops still get a sensible normal).
    /// Returns `None` when the loop has no area.
    pub fn from_vertices(vertices: &[Vertex]) -> Option<Self> {
        let normal = newell_normal(vertices.iter().map(|v| v.pos));
        if normal.norm_squared() < 0.5 {
            return None;
        }
        let centroid = vertices
            .iter()
            .fold(Vector3::zeros(), |acc, v| acc + v.pos.coords)
            / vertices.len() as Real;
        Some(Plane {
            normal,
            w: normal.dot(&centroid),
        })
    }

    pub const fn normal(&self) -> Vector3<Real> {
        self.normal
    }

    pub const fn offset(&self) -> Real {
        self.w
    }

    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    pub fn signed_distance(&self, point: &Point3<Real>) -> Real {
        self.normal.dot(&point.coords) - self.w
    }

    pub fn orient_point(&self, point: &Point3<Real>) -> i8 {
        let d = self.signed_distance(point);
        if d > EPSILON {
            FRONT
        } else if d < -EPSILON {
            BACK
        } else {
            COPLANAR
        }
    }

    /// Bitwise OR of the classification of every vertex.
    pub fn classify_polygon<S: Clone>(&self, polygon: &Polygon<S>) -> i8 {
        polygon
            .vertices
            .iter()
            .fold(COPLANAR, |acc, v| acc | self.orient_point(&v.pos))
    }

    /// Split `polygon` by this plane into the four [`Split`] buckets.
    /// Pieces keep the plane and metadata of the polygon they came from.
    pub fn split_polygon<S: Clone>(&self, polygon: &Polygon<S>) -> Split<S> {
        let mut coplanar_front = Vec::new();
        let mut coplanar_back = Vec::new();
        let mut front = Vec::new();
        let mut back = Vec::new();

        let types: Vec<i8> = polygon
            .vertices
            .iter()
            .map(|v| self.orient_point(&v.pos))
            .collect();

        match types.iter().fold(COPLANAR, |acc, &t| acc | t) {
            COPLANAR => {
                if self.normal.dot(&polygon.plane.normal) > 0.0 {
                    coplanar_front.push(polygon.clone());
                } else {
                    coplanar_back.push(polygon.clone());
                }
            },
            FRONT => front.push(polygon.clone()),
            BACK => back.push(polygon.clone()),
            _ => {
                let n = polygon.vertices.len();
                let mut split_front = Vec::with_capacity(n + 1);
                let mut split_back = Vec::with_capacity(n + 1);

                for i in 0..n {
                    let j = (i + 1) % n;
                    let (ti, tj) = (types[i], types[j]);
                    let vi = &polygon.vertices[i];
                    let vj = &polygon.vertices[j];

                    if ti != BACK {
                        split_front.push(*vi);
                    }
                    if ti != FRONT {
                        split_back.push(*vi);
                    }

                    if (ti | tj) == SPANNING {
                        let denom = self.normal.dot(&(vj.pos - vi.pos));
                        if denom.abs() > EPSILON {
                            let t = (self.w - self.normal.dot(&vi.pos.coords)) / denom;
                            let v = vi.interpolate(vj, t);
                            split_front.push(v);
                            split_back.push(v);
                        }
                    }
                }

                if split_front.len() >= 3 {
                    front.push(polygon.with_vertices(split_front));
                }
                if split_back.len() >= 3 {
                    back.push(polygon.with_vertices(split_back));
                }
            },
        }

        (coplanar_front, coplanar_back, front, back)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(z: Real) -> Polygon<()> {
        Polygon::from_points(
            &[
                Point3::new(-1.0, -1.0, z),
                Point3::new(1.0, -1.0, z),
                Point3::new(1.0, 1.0, z),
                Point3::new(-1.0, 1.0, z),
            ],
            None,
        )
        .unwrap()
    }

    #[test]
    fn from_vertices_follows_winding() {
        let p = square(2.0);
        assert!((p.plane.normal - Vector3::z()).norm() < 1e-12);
        assert!((p.plane.w - 2.0).abs() < 1e-12);
        assert_eq!(p.plane.orient_point(&Point3::new(5.0, 5.0, 3.0)), FRONT);
        assert_eq!(p.plane.orient_point(&Point3::new(5.0, 5.0, 1.0)), BACK);
    }

    #[test]
    fn split_spanning_square() {
        let plane = Plane::from_normal(Vector3::x(), 0.25);
        let (cf, cb, front, back) = plane.split_polygon(&square(0.0));
        assert!(cf.is_empty() && cb.is_empty());
        assert_eq!(front.len(), 1);
        assert_eq!(back.len(), 1);
        assert!((front[0].area() - 1.5).abs() < 1e-12);
        assert!((back[0].area() - 2.5).abs() < 1e-12);
        assert!(front[0].vertices.iter().all(|v| v.pos.x >= 0.25 - 1e-12));
    }

    #[test]
    fn coplanar_goes_by_facing() {
        let mut plane = Plane::from_normal(Vector3::z(), 0.0);
        let (cf, cb, ..) = plane.split_polygon(&square(0.0));
        assert_eq!((cf.len(), cb.len()), (1, 0));

        plane.flip();
        let (cf, cb, ..) = plane.split_polygon(&square(0.0));
        assert_eq!((cf.len(), cb.len()), (0, 1));
    }
}
