//! Visibility polygon of a simple polygon as seen from one of its vertices.
//!
//! The input is a simple polygon given clockwise (counter-clockwise input is
//! accepted as well). The result is counter-clockwise and starts with the
//! viewpoint; every point knows which input vertex it coincides with, points
//! where a line of sight ends on an edge carry `None`.
//!
//! ```
//! use meshbool::vispoly::{visibility_polygon, signed_area};
//! use nalgebra::Point2;
//!
//! // clockwise unit square
//! let square = [
//!     Point2::new(0.0, 0.0),
//!     Point2::new(0.0, 1.0),
//!     Point2::new(1.0, 1.0),
//!     Point2::new(1.0, 0.0),
//! ];
//! let vis = visibility_polygon(&square, 0).unwrap();
//! let ids: Vec<_> = vis.iter().map(|p| p.id).collect();
//! assert_eq!(ids, [Some(0), Some(3), Some(2), Some(1)]);
//! ```

use crate::float_types::{Real, TAU};
use nalgebra::{Point2, Vector2};
use robust::{Coord, orient2d};

/// Slack on angles and ray parameters.
const VIS_EPSILON: Real = 1e-9;
/// Removing a vertex is area-neutral below this relative area change.
const AREA_TOLERANCE: Real = 1e-4;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum VisPolyError {
    #[error("polygon needs at least 3 points, got {0}")]
    TooFewPoints(usize),

    #[error("vertex {index} does not exist, polygon has {len} points")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("no interior is visible from vertex {0}")]
    DegenerateViewpoint(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisPoint {
    pub pt: Point2<Real>,
    /// Input vertex at this location.
    pub id: Option<usize>,
}

/// Enclosed area, positive for counter-clockwise polygons.
pub fn signed_area(poly: &[Point2<Real>]) -> Real {
    let n = poly.len();
    0.5 * (0..n)
        .map(|i| {
            let (a, b) = (poly[i], poly[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum::<Real>()
}

pub fn is_clockwise(poly: &[Point2<Real>]) -> bool {
    signed_area(poly) < 0.0
}

/// Indices of the vertices that remain after dropping repeated points and
/// vertices whose removal changes the area by less than a relative `1e-4`.
/// Vertex `keep` is never dropped.
pub fn simplify(poly: &[Point2<Real>], keep: usize) -> Vec<usize> {
    let n = poly.len();
    let mut kept: Vec<usize> = Vec::with_capacity(n);
    for i in 0..n {
        let repeated = kept
            .last()
            .is_some_and(|&j| (poly[j] - poly[i]).norm() < VIS_EPSILON);
        if !repeated || i == keep {
            if repeated {
                kept.pop();
            }
            kept.push(i);
        }
    }
    // closing point equal to the first one
    if kept.len() > 1 {
        let (first, last) = (kept[0], kept[kept.len() - 1]);
        if (poly[first] - poly[last]).norm() < VIS_EPSILON {
            if last == keep {
                kept.remove(0);
            } else {
                kept.pop();
            }
        }
    }

    let area_of = |ids: &[usize]| signed_area(&ids.iter().map(|&i| poly[i]).collect::<Vec<_>>());

    let mut area = area_of(&kept);
    if area == 0.0 {
        return kept;
    }

    let mut i = 0;
    while i < kept.len() && kept.len() > 3 {
        if kept[i] == keep {
            i += 1;
            continue;
        }
        let mut candidate = kept.clone();
        candidate.remove(i);
        let reduced = area_of(&candidate);
        if (1.0 - reduced / area).abs() < AREA_TOLERANCE {
            tracing::trace!(vertex = kept[i], "dropping area-neutral vertex");
            kept = candidate;
            area = reduced;
        } else {
            i += 1;
        }
    }
    kept
}

fn coord(p: &Point2<Real>) -> Coord<Real> {
    Coord { x: p.x, y: p.y }
}

/// Sign of the turn `a -> b -> c`: positive when `c` is left of `a -> b`.
fn orient(a: &Point2<Real>, b: &Point2<Real>, c: &Point2<Real>) -> Real {
    orient2d(coord(a), coord(b), coord(c))
}

fn cross(a: &Vector2<Real>, b: &Vector2<Real>) -> Real {
    a.x * b.y - a.y * b.x
}

/// Where a ray first meets the boundary: ray parameter and the ring vertex
/// found there, `None` in the middle of an edge.
#[derive(Debug, Clone, Copy)]
struct Hit {
    t: Real,
    vertex: Option<usize>,
}

fn closer(slot: &mut Option<Hit>, hit: Hit) {
    if slot.is_none_or(|s| hit.t < s.t) {
        *slot = Some(hit);
    }
}

/// Polygon in counter-clockwise order with links back to the input.
struct Ring<'a> {
    pts: &'a [Point2<Real>],
    /// Input index of every ring position.
    ids: Vec<usize>,
}

impl Ring<'_> {
    fn len(&self) -> usize {
        self.ids.len()
    }

    fn pt(&self, k: usize) -> Point2<Real> {
        self.pts[self.ids[k]]
    }

    fn next(&self, k: usize) -> usize {
        (k + 1) % self.len()
    }

    fn prev(&self, k: usize) -> usize {
        (k + self.len() - 1) % self.len()
    }

    fn point(&self, x: &Point2<Real>, d: &Vector2<Real>, hit: Hit) -> VisPoint {
        match hit.vertex {
            Some(c) => VisPoint {
                pt: self.pt(c),
                id: Some(self.ids[c]),
            },
            None => VisPoint {
                pt: *x + *d * hit.t,
                id: None,
            },
        }
    }

    /// Distances at which the ray from ring vertex `k` through `p` is closed
    /// on its right and on its left side. The edges at `k` are ignored.
    fn ray_limits(&self, k: usize, p: &Point2<Real>) -> (Option<Hit>, Option<Hit>) {
        let x = self.pt(k);
        let d = *p - x;
        let param = |q: &Point2<Real>| (*q - x).dot(&d) / d.norm_squared();

        let mut right = None;
        let mut left = None;

        for a in 0..self.len() {
            let b = self.next(a);
            if a == k || b == k {
                continue;
            }
            let (pa, pb) = (self.pt(a), self.pt(b));
            let oa = orient(&x, p, &pa);
            let ob = orient(&x, p, &pb);

            if oa == 0.0 && ob == 0.0 {
                // edge along the ray, the exterior is on its right
                let (ta, tb) = (param(&pa), param(&pb));
                let near = if ta < tb {
                    Hit { t: ta, vertex: Some(a) }
                } else {
                    Hit { t: tb, vertex: Some(b) }
                };
                if near.t <= 0.0 {
                    continue;
                }
                if tb > ta {
                    closer(&mut right, near);
                } else {
                    closer(&mut left, near);
                }
            } else if oa == 0.0 || ob == 0.0 {
                // vertex on the ray closes the side its other end lies on
                let (v, side) = if oa == 0.0 { (a, ob) } else { (b, oa) };
                let t = param(&self.pt(v));
                if t <= 0.0 {
                    continue;
                }
                let hit = Hit { t, vertex: Some(v) };
                if side > 0.0 {
                    closer(&mut left, hit);
                } else {
                    closer(&mut right, hit);
                }
            } else if (oa > 0.0) != (ob > 0.0) {
                let e = pb - pa;
                let t = cross(&(pa - x), &e) / cross(&d, &e);
                if t > 0.0 {
                    let hit = Hit { t, vertex: None };
                    closer(&mut right, hit);
                    closer(&mut left, hit);
                }
            }
        }

        (right, left)
    }
}

/// Visibility polygon from vertex `ind`.
pub fn visibility_polygon(poly: &[Point2<Real>], ind: usize) -> Result<Vec<VisPoint>, VisPolyError> {
    let n = poly.len();
    if n < 3 {
        return Err(VisPolyError::TooFewPoints(n));
    }
    if ind >= n {
        return Err(VisPolyError::IndexOutOfRange { index: ind, len: n });
    }

    let ids: Vec<usize> = if is_clockwise(poly) {
        (0..n).rev().collect()
    } else {
        (0..n).collect()
    };
    let ring = Ring { pts: poly, ids };

    let k = ring
        .ids
        .iter()
        .position(|&i| i == ind)
        .ok_or(VisPolyError::IndexOutOfRange { index: ind, len: n })?;
    let kn = ring.next(k);
    let kp = ring.prev(k);

    let x = ring.pt(k);
    let d_n = ring.pt(kn) - x;
    let d_p = ring.pt(kp) - x;
    if d_n.norm() < VIS_EPSILON || d_p.norm() < VIS_EPSILON {
        return Err(VisPolyError::DegenerateViewpoint(ind));
    }

    // angle measured counter-clockwise from the outgoing edge
    let angle = |p: &Point2<Real>| {
        let v = *p - x;
        let phi = cross(&d_n, &v).atan2(d_n.dot(&v));
        if phi < -VIS_EPSILON { phi + TAU } else { phi.max(0.0) }
    };

    let opening = angle(&ring.pt(kp));
    if opening < VIS_EPSILON {
        return Err(VisPolyError::DegenerateViewpoint(ind));
    }

    let mut candidates: Vec<(usize, Real)> = (0..ring.len())
        .filter(|&c| c != k)
        .map(|c| (c, angle(&ring.pt(c))))
        .filter(|&(c, phi)| c == kn || c == kp || phi <= opening + VIS_EPSILON)
        .collect();

    // the closing edge comes last even when other vertices share its angle
    candidates.sort_by(|a, b| a.1.total_cmp(&b.1).then((a.0 == kp).cmp(&(b.0 == kp))));

    // vertices exactly on one ray form one group
    let same_ray = |r: &Point2<Real>, p: &Point2<Real>| orient(&x, r, p) == 0.0 && (*r - x).dot(&(*p - x)) > 0.0;
    let mut rays: Vec<Vec<usize>> = Vec::new();
    for (c, _) in candidates {
        match rays.last_mut() {
            Some(ray) if same_ray(&ring.pt(ray[0]), &ring.pt(c)) => ray.push(c),
            _ => rays.push(vec![c]),
        }
    }

    let mut out = vec![VisPoint { pt: x, id: Some(ind) }];

    for ray in &rays {
        let p = ring.pt(ray[0]);
        let d = p - x;
        let (mut right, mut left) = ring.ray_limits(k, &p);

        // along the edges at the viewpoint the outside starts right away
        let here = Hit { t: 0.0, vertex: Some(k) };
        if ray.contains(&kn) {
            right = Some(here);
        }
        if ray.contains(&kp) {
            left = Some(here);
        }

        let (Some(from), Some(to)) = (right, left) else {
            tracing::warn!(viewpoint = ind, vertex = ring.ids[ray[0]], "ray leaves the polygon");
            continue;
        };

        // hidden vertices: the ray is closed on both sides by one edge
        if from.vertex.is_none() && to.vertex.is_none() && (from.t - to.t).abs() <= VIS_EPSILON {
            continue;
        }

        let (lo, hi) = (from.t.min(to.t), from.t.max(to.t));
        let mut between: Vec<(Real, usize)> = ray
            .iter()
            .map(|&c| ((ring.pt(c) - x).dot(&d) / d.norm_squared(), c))
            .filter(|&(t, _)| t > lo + VIS_EPSILON && t < hi - VIS_EPSILON)
            .collect();
        between.sort_by(|a, b| a.0.total_cmp(&b.0));
        if from.t > to.t {
            between.reverse();
        }

        out.push(ring.point(&x, &d, from));
        out.extend(between.iter().map(|&(t, c)| ring.point(&x, &d, Hit { t, vertex: Some(c) })));
        out.push(ring.point(&x, &d, to));
    }

    out.dedup_by(|b, a| (a.pt - b.pt).norm() < VIS_EPSILON);
    if out.len() > 1 && (out[out.len() - 1].pt - x).norm() < VIS_EPSILON {
        out.pop();
    }

    tracing::debug!(viewpoint = ind, points = out.len(), "visibility polygon");
    Ok(out)
}

/// [`simplify`] the polygon first, then compute the visibility polygon; ids
/// still refer to the unsimplified input.
pub fn visibility_polygon_simplified(
    poly: &[Point2<Real>],
    ind: usize,
) -> Result<Vec<VisPoint>, VisPolyError> {
    if ind >= poly.len() {
        return Err(VisPolyError::IndexOutOfRange {
            index: ind,
            len: poly.len(),
        });
    }

    let kept = simplify(poly, ind);
    let reduced: Vec<Point2<Real>> = kept.iter().map(|&i| poly[i]).collect();
    let local = kept
        .iter()
        .position(|&i| i == ind)
        .ok_or(VisPolyError::DegenerateViewpoint(ind))?;

    let mut vis = visibility_polygon(&reduced, local)?;
    for p in &mut vis {
        p.id = p.id.map(|i| kept[i]);
    }
    Ok(vis)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(Real, Real)]) -> Vec<Point2<Real>> {
        coords.iter().map(|&(x, y)| Point2::new(x, y)).collect()
    }

    fn area_of(vis: &[VisPoint]) -> Real {
        signed_area(&vis.iter().map(|p| p.pt).collect::<Vec<_>>())
    }

    /// L shape, given clockwise.
    fn l_shape() -> Vec<Point2<Real>> {
        let mut ccw = pts(&[(0.0, 0.0), (2.0, 0.0), (2.0, 1.0), (1.0, 1.0), (1.0, 2.0), (0.0, 2.0)]);
        ccw.reverse();
        ccw
    }

    #[test]
    fn orientation() {
        let square = pts(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]);
        assert!(is_clockwise(&square));
        assert!((signed_area(&square) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn convex_polygon_sees_everything() {
        let square = pts(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]);
        for ind in 0..4 {
            let vis = visibility_polygon(&square, ind).unwrap();
            assert_eq!(vis.len(), 4);
            assert_eq!(vis[0].id, Some(ind));
            assert!((area_of(&vis) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn l_shape_hides_the_far_arm() {
        let poly = l_shape();
        // (2, 0) is input vertex 4
        let vis = visibility_polygon(&poly, 4).unwrap();

        let ids: Vec<_> = vis.iter().map(|p| p.id).collect();
        assert_eq!(ids, [Some(4), Some(3), Some(2), Some(0), Some(5)]);
        assert!((area_of(&vis) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn shadow_point_on_edge() {
        let poly = l_shape();
        // from (2, 1) the reflex corner (1, 1) casts along y = 1 onto x = 0
        let vis = visibility_polygon(&poly, 3).unwrap();
        assert!(area_of(&vis) > 0.0);
        assert!(vis.iter().any(|p| p.id.is_none() && (p.pt - Point2::new(0.0, 1.0)).norm() < 1e-9));
        // (1, 2) and (0, 2) lie behind the corner
        assert!(vis.iter().all(|p| p.id != Some(0) && p.id != Some(1)));
    }

    #[test]
    fn reflex_viewpoint_sees_everything() {
        let poly = l_shape();
        // (1, 1) sees the whole L
        let vis = visibility_polygon(&poly, 2).unwrap();
        assert!((area_of(&vis) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn errors() {
        let poly = l_shape();
        assert_eq!(
            visibility_polygon(&poly[..2], 0),
            Err(VisPolyError::TooFewPoints(2))
        );
        assert_eq!(
            visibility_polygon(&poly, 9),
            Err(VisPolyError::IndexOutOfRange { index: 9, len: 6 })
        );

        let spike = pts(&[(0.0, 0.0), (0.0, 0.0), (1.0, 1.0), (1.0, 0.0)]);
        assert_eq!(
            visibility_polygon(&spike, 0),
            Err(VisPolyError::DegenerateViewpoint(0))
        );
    }

    #[test]
    fn simplify_drops_collinear_and_repeated() {
        let poly = pts(&[
            (0.0, 0.0),
            (0.0, 0.5),
            (0.0, 1.0),
            (0.0, 1.0),
            (1.0, 1.0),
            (1.0, 0.0),
        ]);
        assert_eq!(simplify(&poly, 1), vec![0, 1, 2, 4, 5]);
        assert_eq!(simplify(&poly, 0), vec![0, 2, 4, 5]);

        let vis = visibility_polygon_simplified(&poly, 4).unwrap();
        let ids: Vec<_> = vis.iter().map(|p| p.id).collect();
        assert_eq!(ids, [Some(4), Some(2), Some(0), Some(5)]);
    }
}
