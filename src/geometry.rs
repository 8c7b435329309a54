//! Point/rectangle primitives and the polyline helpers every router builds on.
//!
//! All functions are total: degenerate or non-finite input yields a safe
//! default instead of propagating `NaN` through the routing passes.

use serde::{Deserialize, Serialize};

/// Tolerance for coordinate equality and axis tests.
pub const EPS: f64 = 1e-6;
/// Coordinates beyond this magnitude are treated as a runaway route.
const COORD_LIMIT: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn approx_eq(self, other: Point) -> bool {
        (self.x - other.x).abs() <= EPS && (self.y - other.y).abs() <= EPS
    }

    pub fn manhattan_to(self, other: Point) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle. `x`/`y` is the top-left corner, y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    #[serde(alias = "w")]
    pub width: f64,
    #[serde(alias = "h")]
    pub height: f64,
}

impl Rect {
    /// Negative sizes are clamped to zero; zero-area rects are legal.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    pub fn inflate(&self, margin: f64) -> Rect {
        let margin = if margin.is_finite() { margin.max(0.0) } else { 0.0 };
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.width + margin * 2.0,
            self.height + margin * 2.0,
        )
    }

    /// Inclusive containment: points on the border count as inside.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Strict interior containment with a small tolerance at the border.
    pub fn contains_strict(&self, p: Point) -> bool {
        p.x > self.x + EPS && p.x < self.right() - EPS && p.y > self.y + EPS && p.y < self.bottom() - EPS
    }

    pub fn approx_eq(&self, other: &Rect) -> bool {
        (self.x - other.x).abs() <= EPS
            && (self.y - other.y).abs() <= EPS
            && (self.width - other.width).abs() <= EPS
            && (self.height - other.height).abs() <= EPS
    }

    /// Whether an axis-aligned segment passes through the open interior.
    /// Running along the border is allowed.
    pub fn blocks_segment(&self, a: Point, b: Point) -> bool {
        let (min_x, max_x) = (a.x.min(b.x), a.x.max(b.x));
        let (min_y, max_y) = (a.y.min(b.y), a.y.max(b.y));
        if (a.y - b.y).abs() <= EPS {
            return a.y > self.y + EPS
                && a.y < self.bottom() - EPS
                && max_x > self.x + EPS
                && min_x < self.right() - EPS;
        }
        if (a.x - b.x).abs() <= EPS {
            return a.x > self.x + EPS
                && a.x < self.right() - EPS
                && max_y > self.y + EPS
                && min_y < self.bottom() - EPS;
        }
        segment_intersects_rect(a, b, self)
    }
}

/// Rounds `value` to the nearest multiple of `grid`. A non-positive or
/// non-finite grid disables quantization.
pub fn round_to_grid(value: f64, grid: f64) -> f64 {
    if grid.is_finite() && grid > 0.0 && value.is_finite() {
        (value / grid).round() * grid
    } else {
        value
    }
}

pub fn distance_point_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if !len_sq.is_finite() || len_sq < EPS * EPS {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance_to(Point::new(a.x + t * dx, a.y + t * dy))
}

pub fn distance_point_to_polyline(p: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => p.distance_to(*only),
        _ => points
            .windows(2)
            .map(|seg| distance_point_to_segment(p, seg[0], seg[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Unit vector perpendicular to `to - from`, rotated counter-clockwise in
/// screen space. Falls back to `(0, -1)` for degenerate input.
pub fn unit_perp(from: Point, to: Point) -> Point {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let len = dx.hypot(dy);
    if !len.is_finite() || len < EPS {
        return Point::new(0.0, -1.0);
    }
    Point::new(-dy / len, dx / len)
}

/// Point at half the Euclidean arc length of the polyline.
pub fn polyline_mid_point(points: &[Point]) -> Point {
    let Some(&first) = points.first() else {
        return Point::ORIGIN;
    };
    let total = path_length(points);
    if !total.is_finite() || total < EPS {
        return first;
    }
    let half = total / 2.0;
    let mut walked = 0.0;
    for seg in points.windows(2) {
        let len = seg[0].distance_to(seg[1]);
        if len > 0.0 && walked + len >= half {
            let t = ((half - walked) / len).clamp(0.0, 1.0);
            return Point::new(
                seg[0].x + (seg[1].x - seg[0].x) * t,
                seg[0].y + (seg[1].y - seg[0].y) * t,
            );
        }
        walked += len;
    }
    points[points.len() - 1]
}

fn same_axis(a: Point, b: Point, c: Point) -> bool {
    ((a.x - b.x).abs() <= EPS && (b.x - c.x).abs() <= EPS)
        || ((a.y - b.y).abs() <= EPS && (b.y - c.y).abs() <= EPS)
}

/// Drops consecutive duplicates and points that sit on a straight
/// horizontal or vertical run between their neighbors.
///
/// Works as a single stack pass, so the output never contains a pair or a
/// triple the pass would remove again.
pub fn simplify_polyline(points: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last().is_some_and(|last| last.approx_eq(p)) {
            continue;
        }
        while out.len() >= 2 && same_axis(out[out.len() - 2], out[out.len() - 1], p) {
            out.pop();
        }
        if out.last().is_some_and(|last| last.approx_eq(p)) {
            continue;
        }
        out.push(p);
    }
    out
}

/// Euclidean length.
pub fn path_length(points: &[Point]) -> f64 {
    points.windows(2).map(|seg| seg[0].distance_to(seg[1])).sum()
}

pub fn manhattan_length(points: &[Point]) -> f64 {
    points.windows(2).map(|seg| seg[0].manhattan_to(seg[1])).sum()
}

pub fn path_bend_count(points: &[Point]) -> usize {
    if points.len() < 3 {
        return 0;
    }
    let mut bends = 0usize;
    for idx in 1..points.len() - 1 {
        let (p0, p1, p2) = (points[idx - 1], points[idx], points[idx + 1]);
        if p0.approx_eq(p1) || p1.approx_eq(p2) {
            continue;
        }
        let cross = (p1.x - p0.x) * (p2.y - p1.y) - (p1.y - p0.y) * (p2.x - p1.x);
        if cross.abs() > 1e-4 {
            bends += 1;
        }
    }
    bends
}

/// Every segment is purely horizontal or purely vertical.
pub fn is_orthogonal(points: &[Point]) -> bool {
    points.len() >= 2
        && points.windows(2).all(|seg| {
            let flat_x = (seg[0].x - seg[1].x).abs() <= EPS;
            let flat_y = (seg[0].y - seg[1].y).abs() <= EPS;
            flat_x != flat_y
        })
}

pub fn coords_reasonable(points: &[Point]) -> bool {
    points
        .iter()
        .all(|p| p.is_finite() && p.x.abs() <= COORD_LIMIT && p.y.abs() <= COORD_LIMIT)
}

pub fn segment_intersects_rect(a: Point, b: Point, rect: &Rect) -> bool {
    let (min_x, max_x) = (a.x.min(b.x), a.x.max(b.x));
    let (min_y, max_y) = (a.y.min(b.y), a.y.max(b.y));
    if max_x < rect.x || min_x > rect.right() || max_y < rect.y || min_y > rect.bottom() {
        return false;
    }
    if rect.contains(a) || rect.contains(b) {
        return true;
    }
    let corners = [
        Point::new(rect.x, rect.y),
        Point::new(rect.right(), rect.y),
        Point::new(rect.right(), rect.bottom()),
        Point::new(rect.x, rect.bottom()),
    ];
    (0..4).any(|i| segments_intersect(a, b, corners[i], corners[(i + 1) % 4]))
}

pub fn segments_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    fn orient(a: Point, b: Point, c: Point) -> f64 {
        (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
    }
    fn on_segment(a: Point, b: Point, c: Point) -> bool {
        c.x >= a.x.min(b.x) - EPS
            && c.x <= a.x.max(b.x) + EPS
            && c.y >= a.y.min(b.y) - EPS
            && c.y <= a.y.max(b.y) + EPS
    }
    let o1 = orient(a, b, c);
    let o2 = orient(a, b, d);
    let o3 = orient(c, d, a);
    let o4 = orient(c, d, b);
    if (o1 > 0.0 && o2 < 0.0 || o1 < 0.0 && o2 > 0.0) && (o3 > 0.0 && o4 < 0.0 || o3 < 0.0 && o4 > 0.0) {
        return true;
    }
    (o1.abs() <= EPS && on_segment(a, b, c))
        || (o2.abs() <= EPS && on_segment(a, b, d))
        || (o3.abs() <= EPS && on_segment(c, d, a))
        || (o4.abs() <= EPS && on_segment(c, d, b))
}

/// Number of (segment, obstacle) pairs that touch.
pub fn path_obstacle_hits(points: &[Point], obstacles: &[Rect]) -> usize {
    points
        .windows(2)
        .map(|seg| {
            obstacles
                .iter()
                .filter(|rect| segment_intersects_rect(seg[0], seg[1], rect))
                .count()
        })
        .sum()
}
