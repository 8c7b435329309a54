use proptest::prelude::*;

use ortho_router::geometry::{
    Point, Rect, distance_point_to_polyline, distance_point_to_segment, is_orthogonal, polyline_mid_point,
    segment_intersects_rect, simplify_polyline, unit_perp,
};
use ortho_router::routing::{
    Axis, LaneItem, LaneOptions, PathfinderOptions, RoutingHints, adjust_endpoints, apply_lane_offsets,
    find_best_orthogonal_route, orthogonal_auto_polyline, route_edge,
};

fn grid_point() -> impl Strategy<Value = Point> {
    (-50i32..50, -50i32..50).prop_map(|(x, y)| Point::new(x as f64 * 10.0, y as f64 * 10.0))
}

fn rough_point() -> impl Strategy<Value = Point> {
    (-8i32..8, -8i32..8).prop_map(|(x, y)| Point::new(x as f64, y as f64))
}

fn rect() -> impl Strategy<Value = Rect> {
    (-30i32..30, -30i32..30, 2i32..12, 2i32..8)
        .prop_map(|(x, y, w, h)| Rect::new(x as f64 * 10.0, y as f64 * 10.0, w as f64 * 10.0, h as f64 * 10.0))
}

fn axis_hint() -> impl Strategy<Value = Option<Axis>> {
    prop_oneof![Just(None), Just(Some(Axis::Horizontal)), Just(Some(Axis::Vertical))]
}

/// Source rect plus a target placed clear of it to the right or below.
fn separated_pair() -> impl Strategy<Value = (Rect, Rect)> {
    (rect(), 3i32..30, -20i32..20, 2i32..12, 2i32..8, any::<bool>()).prop_map(|(source, gap, shift, w, h, beside)| {
        let (w, h) = (w as f64 * 10.0, h as f64 * 10.0);
        let target = if beside {
            Rect::new(source.right() + gap as f64 * 10.0, source.y + shift as f64 * 10.0, w, h)
        } else {
            Rect::new(source.x + shift as f64 * 10.0, source.bottom() + gap as f64 * 10.0, w, h)
        };
        (source, target)
    })
}

/// Orthogonal polyline on a coarse grid: alternating horizontal and vertical
/// runs of non-zero length.
fn orthogonal_polyline() -> impl Strategy<Value = Vec<Point>> {
    (
        grid_point(),
        any::<bool>(),
        prop::collection::vec(prop_oneof![-6i32..0, 1i32..7], 1..6),
    )
        .prop_map(|(start, horizontal_first, runs)| {
            let mut points = vec![start];
            let mut horizontal = horizontal_first;
            for run in runs {
                let last = points[points.len() - 1];
                let step = run as f64 * 10.0;
                points.push(if horizontal {
                    Point::new(last.x + step, last.y)
                } else {
                    Point::new(last.x, last.y + step)
                });
                horizontal = !horizontal;
            }
            points
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn simplify_is_idempotent(points in prop::collection::vec(rough_point(), 0..16)) {
        let once = simplify_polyline(&points);
        prop_assert_eq!(simplify_polyline(&once), once);
    }

    #[test]
    fn simplify_keeps_orthogonal_paths_orthogonal(points in orthogonal_polyline()) {
        let simplified = simplify_polyline(&points);
        prop_assert!(simplified.len() < 2 || is_orthogonal(&simplified));
    }

    #[test]
    fn heuristic_router_is_orthogonal(
        a in grid_point(),
        b in grid_point(),
        start in axis_hint(),
        end in axis_hint(),
        obstacles in prop::collection::vec(rect(), 0..4),
    ) {
        prop_assume!(a != b);
        let hints = RoutingHints {
            prefer_start_axis: start,
            prefer_end_axis: end,
            obstacles,
            ..RoutingHints::default()
        };
        let route = orthogonal_auto_polyline(a, b, &hints);
        prop_assert!(is_orthogonal(&route), "{:?}", route);
        prop_assert_eq!(route.first(), Some(&a));
        prop_assert_eq!(route.last(), Some(&b));
    }

    #[test]
    fn pathfinder_routes_are_orthogonal_and_clear(
        (source, target) in separated_pair(),
        obstacles in prop::collection::vec(rect(), 0..3),
    ) {
        if let Some(route) = find_best_orthogonal_route(&source, &target, &obstacles, &PathfinderOptions::default()) {
            prop_assert!(is_orthogonal(&route.points), "{:?}", route.points);
            for obstacle in obstacles.iter().filter(|r| !r.approx_eq(&source) && !r.approx_eq(&target)) {
                for seg in route.points.windows(2) {
                    prop_assert!(!segment_intersects_rect(seg[0], seg[1], obstacle));
                }
            }
        }
    }

    #[test]
    fn open_pathfinder_and_heuristic_routes_adjust_orthogonally(
        (source, target) in separated_pair(),
        start in axis_hint(),
    ) {
        let hints = RoutingHints { prefer_start_axis: start, ..RoutingHints::default() };
        let heuristic = route_edge(&source, &target, &[], &hints);
        let adjusted = adjust_endpoints(&heuristic, &source, &target, 16.0);
        prop_assert!(is_orthogonal(&adjusted), "{:?} -> {:?}", heuristic, adjusted);

        let committed = find_best_orthogonal_route(&source, &target, &[], &PathfinderOptions::default());
        prop_assert!(committed.is_some());
        if let Some(route) = committed {
            let adjusted = adjust_endpoints(&route.points, &source, &target, 16.0);
            prop_assert!(is_orthogonal(&adjusted));
        }
    }

    #[test]
    fn lane_offsets_preserve_shape_and_order(
        paths in prop::collection::vec(orthogonal_polyline(), 1..5),
    ) {
        let items: Vec<LaneItem> = paths
            .into_iter()
            .enumerate()
            .map(|(idx, points)| LaneItem { id: format!("edge-{idx}"), points, obstacles: Vec::new() })
            .collect();
        let out = apply_lane_offsets(&items, &LaneOptions::default());
        prop_assert_eq!(out.len(), items.len());
        for (before, after) in items.iter().zip(&out) {
            prop_assert_eq!(&before.id, &after.id);
            prop_assert_eq!(before.points.first(), after.points.first());
            prop_assert_eq!(before.points.last(), after.points.last());
            prop_assert!(is_orthogonal(&after.points), "{:?}", after.points);
        }
    }

    #[test]
    fn geometry_primitives_are_total(
        px in any::<f64>(), py in any::<f64>(),
        ax in any::<f64>(), ay in any::<f64>(),
        bx in any::<f64>(), by in any::<f64>(),
    ) {
        let (p, a, b) = (Point::new(px, py), Point::new(ax, ay), Point::new(bx, by));
        let _ = distance_point_to_segment(p, a, b);
        let _ = distance_point_to_polyline(p, &[a, b, p]);
        let _ = unit_perp(a, b);
        let _ = polyline_mid_point(&[a, b, p]);
        let _ = simplify_polyline(&[a, b, p, a]);
    }

    #[test]
    fn unit_perp_has_unit_length(a in grid_point(), b in grid_point()) {
        let n = unit_perp(a, b);
        prop_assert!((n.x.hypot(n.y) - 1.0).abs() < 1e-9);
        if a != b {
            let dot = n.x * (b.x - a.x) + n.y * (b.y - a.y);
            prop_assert!(dot.abs() < 1e-6);
        }
    }

    #[test]
    fn distances_are_non_negative(p in grid_point(), a in grid_point(), b in grid_point()) {
        let d = distance_point_to_segment(p, a, b);
        prop_assert!(d >= 0.0);
        prop_assert!(d <= p.distance_to(a) + 1e-9);
        prop_assert!(distance_point_to_polyline(p, &[a, b]) <= d + 1e-9);
    }
}
