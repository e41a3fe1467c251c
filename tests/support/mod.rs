//! Test support library
//! Provides helper functions shared by the integration tests.

#![allow(dead_code)]

use meshbool::{PolyData, float_types::Real, sources::CubeSource};
use nalgebra::{Point3, Vector3};

/// Unit cube at the origin and a unit cube moved by `offset`.
pub fn cube_pair(offset: [Real; 3]) -> (PolyData, PolyData) {
    let a = CubeSource::default().polydata().unwrap();
    let b = CubeSource::default()
        .translated(Vector3::from(offset))
        .polydata()
        .unwrap();
    (a, b)
}

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// Single polygon cell over `points`.
pub fn patch(points: &[[Real; 3]]) -> PolyData {
    let pts: Vec<Point3<Real>> = points.iter().map(|&p| Point3::from(p)).collect();
    let ids: Vec<usize> = (0..pts.len()).collect();
    PolyData::from_polygons(pts, &[ids])
}

/// Whether `p` lies on (or within `eps` of) the surface of the axis aligned
/// unit cube centered at `center`.
pub fn on_cube_surface(p: &Point3<Real>, center: [Real; 3], eps: Real) -> bool {
    let d = *p - Point3::from(center);
    let m = d.x.abs().max(d.y.abs()).max(d.z.abs());
    approx_eq(m, 0.5, eps)
}

/// Number of line cells using each point.
pub fn point_degrees(lines: &PolyData) -> Vec<usize> {
    let mut deg = vec![0; lines.number_of_points()];
    for cell in &lines.cells {
        for &id in &cell.ids {
            deg[id] += 1;
        }
    }
    deg
}
