//! Intersections of polygon edges with the line along which two polygon
//! planes meet.

use crate::errors::Side;
use crate::float_types::Real;
use crate::polydata::{NOT_SET, PolyData};
use nalgebra::{Matrix3, Point3, Vector3};
use std::collections::BTreeMap;

/// Edges further than this from the line (as a volume measure) are skew.
const SKEW_TOLERANCE: Real = 1e-4;
/// Edges whose direction is this close to the line's are treated as parallel.
const PARALLEL_TOLERANCE: Real = 1e-4;
/// Slack on the edge parameter when deciding hit / end-point hit.
const EDGE_TOLERANCE: Real = 1e-6;
/// Points whose line parameters round to the same multiple of this coincide.
const T_RESOLUTION: Real = 1e5;

/// A point where the intersection line crosses the boundary of one polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct InterPt {
    /// Parameter along the intersection line.
    pub t: Real,
    pub pt: Point3<Real>,
    /// Local index of the polygon vertex the point coincides with.
    pub end: Option<usize>,
    /// Local indices of the edge the point lies on.
    pub edge: [usize; 2],
    pub src: Side,
    /// Input point ids (per side) the point coincides with, or `NOT_SET`.
    pub src_a: i64,
    pub src_b: i64,
}

impl InterPt {
    fn new(t: Real, end: Option<usize>, pt: Point3<Real>) -> Self {
        Self {
            t,
            pt,
            end,
            edge: [0, 0],
            src: Side::A,
            src_a: NOT_SET,
            src_b: NOT_SET,
        }
    }

    pub const fn source(&self, side: Side) -> i64 {
        match side {
            Side::A => self.src_a,
            Side::B => self.src_b,
        }
    }

    const fn source_mut(&mut self, side: Side) -> &mut i64 {
        match side {
            Side::A => &mut self.src_a,
            Side::B => &mut self.src_b,
        }
    }

    /// Take over the source point of `other` (which comes from the other
    /// polygon) when both describe the same location on the line.
    pub fn merge(&mut self, other: &InterPt) {
        if self.src != other.src && (self.t - other.t).abs() < 1.0 / T_RESOLUTION {
            *self.source_mut(other.src) = other.source(other.src);
        }
    }

    fn t_key(&self) -> i64 {
        (self.t * T_RESOLUTION).round() as i64
    }
}

fn det3(a: &Vector3<Real>, b: &Vector3<Real>, c: &Vector3<Real>) -> Real {
    Matrix3::from_columns(&[*a, *b, *c]).determinant()
}

/// Intersect the edge `e_a`–`e_b` with the line `pt + t·r` (`r` unit length).
///
/// A crossing edge yields one point, an edge lying on the line yields both of
/// its ends, skew or distant parallel edges yield nothing. `end` is set to
/// `0`/`1` when the point coincides with `e_a`/`e_b`.
pub fn intersect_edge_line(
    e_a: &Point3<Real>,
    e_b: &Point3<Real>,
    r: &Vector3<Real>,
    pt: &Point3<Real>,
) -> Vec<InterPt> {
    let mut out = Vec::new();

    let mut e = e_b - e_a;
    let l = e.norm();
    if l < Real::EPSILON {
        return out;
    }
    e /= l;

    let p = e_a - pt;

    if det3(r, &e, &p).abs() >= SKEW_TOLERANCE {
        return out;
    }

    let v = r.cross(&e);
    let n = v.norm();

    if n > PARALLEL_TOLERANCE {
        let n2 = n * n;
        let s = det3(&p, r, &v) / n2;

        if s > -EDGE_TOLERANCE && s < l + EDGE_TOLERANCE {
            let t = det3(&p, &e, &v) / n2;

            let end = if s.abs() < EDGE_TOLERANCE {
                Some(0)
            } else if (s - l).abs() < EDGE_TOLERANCE {
                Some(1)
            } else {
                None
            };

            out.push(InterPt::new(t, end, pt + r * t));
        }
    } else {
        // parallel: both ends must lie on the line
        let pt_b = pt + r;

        let dist_a = (e_a - pt).cross(&(e_a - pt_b)).norm();
        let dist_b = (e_b - pt).cross(&(e_b - pt_b)).norm();

        if dist_a < PARALLEL_TOLERANCE || dist_b < PARALLEL_TOLERANCE {
            let t_a = (e_a - pt).dot(r);
            let t_b = (e_b - pt).dot(r);

            tracing::trace!(dist_a, dist_b, t_a, t_b, l, "congruent edge");

            out.push(InterPt::new(t_a, Some(0), pt + r * t_a));
            out.push(InterPt::new(t_b, Some(1), pt + r * t_b));
        }
    }

    out
}

/// All boundary points of polygon `poly` (point ids into `pd`) on the line
/// `pt + t·r`, sorted by `t` and reduced so that consecutive pairs bound the
/// parts of the line inside the polygon. `n` is the polygon normal.
pub fn intersect_poly_line(
    pd: &PolyData,
    poly: &[usize],
    r: &Vector3<Real>,
    pt: &Point3<Real>,
    src: Side,
    n: &Vector3<Real>,
) -> Vec<InterPt> {
    let num = poly.len();
    let mut hits = Vec::new();

    for i in 0..num {
        let j = (i + 1) % num;
        let a = pd.point(poly[i]);
        let b = pd.point(poly[j]);

        for mut p in intersect_edge_line(&a, &b, r, pt) {
            p.src = src;
            p.edge = [i, j];
            p.end = p.end.map(|e| if e == 0 { i } else { j });
            *p.source_mut(src) = p.end.map_or(NOT_SET, |e| poly[e] as i64);
            hits.push(p);
        }
    }

    if hits.is_empty() {
        return hits;
    }

    let mut grouped: BTreeMap<i64, Vec<InterPt>> = BTreeMap::new();
    for p in hits {
        grouped.entry(p.t_key()).or_default().push(p);
    }

    let mut groups: Vec<Vec<InterPt>> = grouped
        .into_values()
        .map(|mut pts| {
            // a vertex hit reported by a single edge still needs its partner
            if pts.len() == 1 && pts[0].end.is_some() {
                let dup = pts[0].clone();
                pts.push(dup);
            }
            pts
        })
        .collect();

    // The outermost points can only enter or leave.
    if let Some(first) = groups.first_mut() {
        if first.len() == 2 {
            first.pop();
        }
    }
    if let Some(last) = groups.last_mut() {
        if last.len() == 2 {
            last.pop();
        }
    }

    let m = n.cross(r);
    let d = m.dot(&pt.coords);
    let side_of = |q: &Point3<Real>| m.dot(&q.coords) - d;

    let mut ends: BTreeMap<usize, Real> = BTreeMap::new();
    for g in &groups {
        if let Some(end) = g.last().and_then(|p| p.end.map(|e| (e, p.t))) {
            ends.entry(end.0).or_insert(end.1);
        }
    }

    for g in &mut groups {
        let Some(dupl) = g.last().cloned() else {
            continue;
        };
        let Some(end) = dupl.end else {
            continue;
        };

        let before = if end == 0 { num - 1 } else { end - 1 };
        let after = if end == num - 1 { 0 } else { end + 1 };

        if g.len() == 2 {
            match (ends.get(&before), ends.get(&after)) {
                (Some(&t), None) => {
                    let e = side_of(&pd.point(poly[after]));
                    if (dupl.t > t && e > 0.0) || (dupl.t < t && e < 0.0) {
                        // pocket
                        g.pop();
                    }
                    continue;
                },
                (None, Some(&t)) => {
                    let e = side_of(&pd.point(poly[before]));
                    if (dupl.t > t && e < 0.0) || (dupl.t < t && e > 0.0) {
                        // pocket
                        g.pop();
                    }
                    continue;
                },
                _ => {},
            }
        }

        if !ends.contains_key(&before) && !ends.contains_key(&after) {
            let p_after = pd.point(poly[after]);
            let p_before = pd.point(poly[before]);

            let d_after = side_of(&p_after);
            let d_before = side_of(&p_before);

            if d_after.is_sign_negative() != d_before.is_sign_negative() {
                // the boundary passes through the vertex
                if g.len() == 2 {
                    g.pop();
                }
            } else {
                let t_after = (p_after - pt).dot(r);
                let t_before = (p_before - pt).dot(r);

                if (t_before > t_after) == d_after.is_sign_negative() {
                    // the line only grazes the vertex from outside
                    g.clear();
                }
            }
        }
    }

    groups.into_iter().flatten().collect()
}
