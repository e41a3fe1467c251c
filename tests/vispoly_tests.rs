use meshbool::vispoly::{VisPoint, signed_area, simplify, visibility_polygon, visibility_polygon_simplified};
use nalgebra::Point2;

fn cw(ccw: &[(f64, f64)]) -> Vec<Point2<f64>> {
    ccw.iter().rev().map(|&(x, y)| Point2::new(x, y)).collect()
}

fn area(vis: &[VisPoint]) -> f64 {
    signed_area(&vis.iter().map(|p| p.pt).collect::<Vec<_>>())
}

/// U shape opening upwards, notch over [1, 2] x [1, 2].
fn u_shape() -> Vec<Point2<f64>> {
    cw(&[
        (0.0, 0.0),
        (3.0, 0.0),
        (3.0, 2.0),
        (2.0, 2.0),
        (2.0, 1.0),
        (1.0, 1.0),
        (1.0, 2.0),
        (0.0, 2.0),
    ])
}

#[test]
fn u_shape_from_lower_left_corner() {
    let poly = u_shape();
    assert!((signed_area(&poly) + 5.0).abs() < 1e-12);

    // (0, 0) is the last input vertex
    let vis = visibility_polygon(&poly, 7).unwrap();
    let ids: Vec<_> = vis.iter().map(|p| p.id).collect();
    assert_eq!(ids, [Some(7), Some(6), None, Some(3), Some(2), Some(1), Some(0)]);

    // the ray over the inner corner ends on the right wall
    assert!((vis[2].pt - Point2::new(3.0, 1.5)).norm() < 1e-12);
    assert!((area(&vis) - 4.25).abs() < 1e-12);
}

#[test]
fn every_vertex_sees_a_part_of_the_polygon() {
    let poly = u_shape();
    for ind in 0..poly.len() {
        let vis = visibility_polygon(&poly, ind).unwrap();
        assert_eq!(vis[0].id, Some(ind));
        let a = area(&vis);
        assert!(a > 0.0 && a <= 5.0 + 1e-12, "vertex {ind}: area {a}");
        for p in vis.iter().filter(|p| p.id.is_some()) {
            assert_eq!(Some(p.pt), p.id.map(|i| poly[i]));
        }
    }
}

#[test]
fn simplified_keeps_original_ids() {
    // the U with an extra point in the middle of its bottom edge
    let mut ccw = vec![
        (0.0, 0.0),
        (1.5, 0.0),
        (3.0, 0.0),
        (3.0, 2.0),
        (2.0, 2.0),
        (2.0, 1.0),
        (1.0, 1.0),
        (1.0, 2.0),
        (0.0, 2.0),
    ];
    let poly = cw(&ccw);
    // input index 7 is the midpoint, dropped unless it is the viewpoint
    assert_eq!(simplify(&poly, 0).len(), 8);
    assert_eq!(simplify(&poly, 7).len(), 9);

    let vis = visibility_polygon_simplified(&poly, 8).unwrap();
    let ids: Vec<_> = vis.iter().map(|p| p.id).collect();
    assert_eq!(ids, [Some(8), Some(6), None, Some(3), Some(2), Some(1), Some(0)]);

    ccw.remove(1);
    let raw = visibility_polygon(&cw(&ccw), 7).unwrap();
    assert!((area(&vis) - area(&raw)).abs() < 1e-12);
}

/// Comb with three teeth standing on a 5 x 1 base.
fn comb() -> Vec<Point2<f64>> {
    cw(&[
        (0.0, 0.0),
        (5.0, 0.0),
        (5.0, 3.0),
        (4.0, 3.0),
        (4.0, 1.0),
        (3.0, 1.0),
        (3.0, 3.0),
        (2.0, 3.0),
        (2.0, 1.0),
        (1.0, 1.0),
        (1.0, 3.0),
        (0.0, 3.0),
    ])
}

/// Square spiral corridor winding inwards.
fn spiral() -> Vec<Point2<f64>> {
    cw(&[
        (0.0, 0.0),
        (5.0, 0.0),
        (5.0, 5.0),
        (1.0, 5.0),
        (1.0, 2.0),
        (3.0, 2.0),
        (3.0, 3.0),
        (2.0, 3.0),
        (2.0, 4.0),
        (4.0, 4.0),
        (4.0, 1.0),
        (0.0, 1.0),
    ])
}

fn turn(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Even-odd point in polygon test.
fn contains(poly: &[Point2<f64>], q: &Point2<f64>) -> bool {
    let mut inside = false;
    for (i, a) in poly.iter().enumerate() {
        let b = &poly[(i + 1) % poly.len()];
        if (a.y > q.y) != (b.y > q.y) && q.x < a.x + (q.y - a.y) * (b.x - a.x) / (b.y - a.y) {
            inside = !inside;
        }
    }
    inside
}

/// No edge crosses the segment from `x` to `q`.
fn line_of_sight(poly: &[Point2<f64>], x: &Point2<f64>, q: &Point2<f64>) -> bool {
    (0..poly.len()).all(|i| {
        let (a, b) = (&poly[i], &poly[(i + 1) % poly.len()]);
        !(turn(x, q, a) * turn(x, q, b) < 0.0 && turn(a, b, x) * turn(a, b, q) < 0.0)
    })
}

/// Compare every output against line of sight on a grid of sample points
/// that avoids all boundary lines.
fn assert_matches_line_of_sight(poly: &[Point2<f64>]) {
    let (lo, hi) = poly.iter().fold(
        (Point2::new(f64::MAX, f64::MAX), Point2::new(f64::MIN, f64::MIN)),
        |(lo, hi), p| (lo.inf(p), hi.sup(p)),
    );

    for ind in 0..poly.len() {
        let vis = visibility_polygon(poly, ind).unwrap();
        let outline: Vec<_> = vis.iter().map(|p| p.pt).collect();
        assert!(signed_area(&outline) > 0.0, "vertex {ind}");

        for i in 0..23 {
            for j in 0..19 {
                let q = Point2::new(
                    lo.x + (hi.x - lo.x) * (i as f64 + 0.3137) / 23.0,
                    lo.y + (hi.y - lo.y) * (j as f64 + 0.4271) / 19.0,
                );
                if !contains(poly, &q) {
                    continue;
                }
                assert_eq!(
                    line_of_sight(poly, &poly[ind], &q),
                    contains(&outline, &q),
                    "vertex {ind}, sample {q:?}, outline {outline:?}"
                );
            }
        }
    }
}

#[test]
fn comb_from_inner_corners() {
    let poly = comb();

    // (1, 1): the teeth ends on y = 1 stay on the boundary, in order
    let vis = visibility_polygon(&poly, 2).unwrap();
    let ids: Vec<_> = vis.iter().map(|p| p.id).collect();
    assert_eq!(
        ids,
        [Some(2), Some(1), Some(0), Some(11), Some(10), None, Some(7), Some(6), Some(3)]
    );
    assert!((vis[5].pt - Point2::new(5.0, 1.0)).norm() < 1e-12);
    assert!((area(&vis) - 7.0).abs() < 1e-12);

    // (2, 1) sees the base and the middle tooth
    let vis = visibility_polygon(&poly, 3).unwrap();
    let ids: Vec<_> = vis.iter().map(|p| p.id).collect();
    assert_eq!(
        ids,
        [Some(3), Some(2), None, Some(11), Some(10), None, Some(7), Some(6), Some(5), Some(4)]
    );
    assert!((area(&vis) - 7.0).abs() < 1e-12);
}

#[test]
fn comb_agrees_with_line_of_sight() {
    assert_matches_line_of_sight(&comb());
}

#[test]
fn spiral_agrees_with_line_of_sight() {
    let poly = spiral();
    assert!((signed_area(&poly) + 15.0).abs() < 1e-12);
    assert_matches_line_of_sight(&poly);

    // from the outer end of the corridor only the first turn is visible
    let vis = visibility_polygon(&poly, 11).unwrap();
    assert!((area(&vis) - 5.125).abs() < 1e-12);
}
