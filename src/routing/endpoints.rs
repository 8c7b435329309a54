//! Snaps routed polylines onto node borders and adds perpendicular stubs.

use tracing::trace;

use crate::geometry::{EPS, Point, Rect, coords_reasonable, simplify_polyline};

use super::anchor::clamp_along;
use super::types::{Axis, Dir};

/// Keeps snapped endpoints away from node corners.
const CORNER_PADDING: f64 = 6.0;

/// Point on the border of `rect` where a path travelling `dir` leaves it.
fn exit_point(rect: &Rect, near: Point, dir: Dir) -> Point {
    match dir {
        Dir::Down => Point::new(clamp_along(near.x, rect.x, rect.right(), CORNER_PADDING), rect.bottom()),
        Dir::Up => Point::new(clamp_along(near.x, rect.x, rect.right(), CORNER_PADDING), rect.y),
        Dir::Right => Point::new(rect.right(), clamp_along(near.y, rect.y, rect.bottom(), CORNER_PADDING)),
        Dir::Left => Point::new(rect.x, clamp_along(near.y, rect.y, rect.bottom(), CORNER_PADDING)),
    }
}

/// Moves the first point onto the border of `rect` and realigns the second
/// so the first segment stays axis-aligned. Needs at least three points.
fn snap_start(points: &mut [Point], rect: &Rect) -> Option<Dir> {
    let dir = Dir::between(points[0], points[1])?;
    let snapped = exit_point(rect, points[0], dir);
    points[0] = snapped;
    match dir.axis() {
        Axis::Vertical => points[1].x = snapped.x,
        Axis::Horizontal => points[1].y = snapped.y,
    }
    Some(dir)
}

/// Makes the first segment run at least `stub` along `dir`.
///
/// With four or more points the first bend moves outward together with the
/// point after it. With three points, or when `pinned` keeps the segment
/// after the first bend where it is, a jog through the middle of that
/// segment leaves the rest of the path in place.
fn extend_start_stub(points: Vec<Point>, dir: Dir, stub: f64, pinned: bool) -> Vec<Point> {
    if points.len() < 3 || stub <= 0.0 {
        return points;
    }
    let start = points[0];
    let next = points[1];
    let (ux, uy) = dir.unit();
    let run = (next.x - start.x) * ux + (next.y - start.y) * uy;
    if run >= stub - EPS {
        return points;
    }
    let reach = dir.step(start, stub);

    if points.len() >= 4 && !pinned {
        let mut points = points;
        match dir.axis() {
            Axis::Vertical => {
                points[1].y = reach.y;
                points[2].y = reach.y;
            }
            Axis::Horizontal => {
                points[1].x = reach.x;
                points[2].x = reach.x;
            }
        }
        return points;
    }

    let far = points[2];
    let mut out = match dir.axis() {
        Axis::Vertical => {
            let mid = (next.x + far.x) / 2.0;
            vec![start, reach, Point::new(mid, reach.y), Point::new(mid, far.y)]
        }
        Axis::Horizontal => {
            let mid = (next.y + far.y) / 2.0;
            vec![start, reach, Point::new(reach.x, mid), Point::new(far.x, mid)]
        }
    };
    out.extend_from_slice(&points[2..]);
    out
}

/// Two-point paths: snap both ends and restore alignment with a jog when
/// the clamped anchors disagree.
fn adjust_straight(start: Point, end: Point, source: &Rect, target: &Rect) -> Option<Vec<Point>> {
    let dir = Dir::between(start, end)?;
    let from = exit_point(source, start, dir);
    let to = exit_point(target, end, dir.opposite());
    let points = match dir.axis() {
        Axis::Vertical if (from.x - to.x).abs() > EPS => {
            let mid = (from.y + to.y) / 2.0;
            vec![from, Point::new(from.x, mid), Point::new(to.x, mid), to]
        }
        Axis::Horizontal if (from.y - to.y).abs() > EPS => {
            let mid = (from.x + to.x) / 2.0;
            vec![from, Point::new(mid, from.y), Point::new(mid, to.y), to]
        }
        _ => vec![from, to],
    };
    Some(points)
}

/// Snaps the first and last points onto the source and target borders that
/// match the travel direction of the end segments, then makes sure the
/// path leaves and enters perpendicular for at least `stub_length`.
///
/// Inputs it cannot work with (fewer than two points, non-finite geometry,
/// diagonal end segments) come back unchanged.
pub fn adjust_endpoints(points: &[Point], source: &Rect, target: &Rect, stub_length: f64) -> Vec<Point> {
    if points.len() < 2 || !coords_reasonable(points) || !source.is_finite() || !target.is_finite() {
        return points.to_vec();
    }
    let stub = if stub_length.is_finite() { stub_length.max(0.0) } else { 0.0 };
    let mut pts = simplify_polyline(points);
    if pts.len() < 2 {
        return points.to_vec();
    }

    if pts.len() == 2 {
        let Some(straight) = adjust_straight(pts[0], pts[1], source, target) else {
            return points.to_vec();
        };
        pts = straight;
    } else {
        let start_dir = snap_start(&mut pts, source);
        pts.reverse();
        let end_dir = snap_start(&mut pts, target);
        pts.reverse();

        if let Some(dir) = start_dir {
            pts = extend_start_stub(pts, dir, stub, false);
        }
        // On four points both stubs would move the same middle segment.
        let shared = pts.len() == 4 && start_dir.is_some();
        if let Some(dir) = end_dir {
            pts.reverse();
            pts = extend_start_stub(pts, dir, stub, shared);
            pts.reverse();
        }
    }

    let out = simplify_polyline(&pts);
    if out.len() < 2 || !coords_reasonable(&out) {
        trace!("endpoint adjustment degenerated, keeping input");
        return points.to_vec();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::is_orthogonal;

    fn pts(raw: &[(f64, f64)]) -> Vec<Point> {
        raw.iter().copied().map(Point::from).collect()
    }

    #[test]
    fn vertical_start_snaps_to_bottom_edge() {
        let source = Rect::new(0.0, 0.0, 100.0, 50.0);
        let target = Rect::new(280.0, 100.0, 100.0, 50.0);
        let path = pts(&[(50.0, 25.0), (50.0, 120.0), (300.0, 120.0)]);
        let out = adjust_endpoints(&path, &source, &target, 16.0);
        assert_eq!(out[0], Point::new(50.0, 50.0));
        assert!(out.iter().any(|p| p.x == 50.0 && p.y >= 66.0));
        assert_eq!(out.last(), Some(&Point::new(280.0, 120.0)));
        assert!(is_orthogonal(&out));
    }

    #[test]
    fn short_first_segment_gets_a_stub() {
        let source = Rect::new(0.0, 0.0, 100.0, 50.0);
        let target = Rect::new(300.0, 30.0, 50.0, 50.0);
        let path = pts(&[(50.0, 25.0), (50.0, 55.0), (300.0, 55.0)]);
        let out = adjust_endpoints(&path, &source, &target, 16.0);
        assert_eq!(out[0], Point::new(50.0, 50.0));
        assert_eq!(out[1], Point::new(50.0, 66.0));
        assert_eq!(out.last(), Some(&Point::new(300.0, 55.0)));
        assert!(is_orthogonal(&out));
    }

    #[test]
    fn interior_bend_is_pushed_out() {
        let source = Rect::new(0.0, 0.0, 100.0, 50.0);
        let target = Rect::new(200.0, 200.0, 100.0, 50.0);
        let path = pts(&[(40.0, 0.0), (40.0, -5.0), (250.0, -5.0), (250.0, 200.0)]);
        let out = adjust_endpoints(&path, &source, &target, 16.0);
        assert_eq!(out[0], Point::new(40.0, 0.0));
        assert_eq!(out[1], Point::new(40.0, -16.0));
        assert_eq!(out[2], Point::new(250.0, -16.0));
        assert_eq!(out[3], Point::new(250.0, 200.0));
    }

    #[test]
    fn straight_paths_snap_both_ends() {
        let source = Rect::new(0.0, 0.0, 100.0, 50.0);
        let target = Rect::new(0.0, 250.0, 100.0, 50.0);
        let out = adjust_endpoints(&pts(&[(50.0, 25.0), (50.0, 300.0)]), &source, &target, 16.0);
        assert_eq!(out, pts(&[(50.0, 50.0), (50.0, 250.0)]));
    }

    #[test]
    fn misaligned_straight_path_gains_a_jog() {
        let source = Rect::new(0.0, 0.0, 100.0, 50.0);
        let target = Rect::new(150.0, 250.0, 100.0, 50.0);
        let out = adjust_endpoints(&pts(&[(90.0, 25.0), (90.0, 300.0)]), &source, &target, 16.0);
        assert!(is_orthogonal(&out));
        assert_eq!(out[0], Point::new(90.0, 50.0));
        assert_eq!(out.last(), Some(&Point::new(156.0, 250.0)));
    }

    #[test]
    fn tolerates_short_and_degenerate_input() {
        let source = Rect::new(0.0, 0.0, 10.0, 10.0);
        let single = pts(&[(5.0, 5.0)]);
        assert_eq!(adjust_endpoints(&single, &source, &source, 8.0), single);
        let stacked = pts(&[(5.0, 5.0), (5.0, 5.0)]);
        assert_eq!(adjust_endpoints(&stacked, &source, &source, 8.0), stacked);
        let bad = pts(&[(f64::NAN, 0.0), (5.0, 5.0)]);
        let out = adjust_endpoints(&bad, &source, &source, 8.0);
        assert_eq!(out.len(), 2);
        assert!(out[0].x.is_nan());
    }

    #[test]
    fn overlapping_rects_stay_finite() {
        let source = Rect::new(0.0, 0.0, 100.0, 100.0);
        let target = Rect::new(50.0, 50.0, 100.0, 100.0);
        let path = pts(&[(50.0, 50.0), (50.0, 80.0), (100.0, 80.0), (100.0, 100.0)]);
        let out = adjust_endpoints(&path, &source, &target, 12.0);
        assert!(out.len() >= 2);
        assert!(out.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn stubs_sharing_a_middle_segment_jog_instead_of_undoing_each_other() {
        let source = Rect::new(0.0, 0.0, 100.0, 50.0);
        let target = Rect::new(250.0, 60.0, 100.0, 50.0);
        let path = pts(&[(50.0, 50.0), (50.0, 55.0), (300.0, 55.0), (300.0, 60.0)]);
        let out = adjust_endpoints(&path, &source, &target, 16.0);
        assert_eq!(
            out,
            pts(&[(50.0, 50.0), (50.0, 66.0), (175.0, 66.0), (175.0, 44.0), (300.0, 44.0), (300.0, 60.0)])
        );
        assert_eq!(Dir::between(out[0], out[1]), Some(Dir::Down));
        assert_eq!(Dir::between(out[4], out[5]), Some(Dir::Down));
        assert!(is_orthogonal(&out));
    }
}
