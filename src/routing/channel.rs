//! Heuristic channel router used while dragging.
//!
//! Builds a handful of L/Z candidates between two anchors, scores them and
//! keeps the cheapest. Latency matters more than optimality here; the full
//! pathfinder handles committed routes.

use tracing::{debug, trace};

use crate::geometry::{
    EPS, Point, Rect, manhattan_length, path_obstacle_hits, round_to_grid, simplify_polyline,
};

use super::anchor::{anchor_pair, facing_sides};
use super::types::{Axis, Dir, RoutingHints};

/// Upper bound on lane-shift steps regardless of hints.
const MAX_SHIFT_STEPS_CAP: usize = 64;
/// Lane spacing used when neither the hint nor the grid provides one.
const DEFAULT_LANE_SPACING: f64 = 10.0;

#[derive(Debug, Clone)]
struct Candidate {
    points: Vec<Point>,
    /// Lane step and the axis of the first segment for channel candidates.
    lane: Option<(i64, Axis)>,
}

impl Candidate {
    fn base(points: Vec<Point>) -> Self {
        Self {
            points: simplify_polyline(&points),
            lane: None,
        }
    }

    fn lane(points: Vec<Point>, step: i64, orientation: Axis) -> Self {
        Self {
            points: simplify_polyline(&points),
            lane: Some((step, orientation)),
        }
    }
}

/// Lane steps ordered center first: 0, +1, -1, +2, -2, ...
fn spiral_steps(max_steps: usize) -> Vec<i64> {
    let max_steps = max_steps.min(MAX_SHIFT_STEPS_CAP) as i64;
    let mut steps = vec![0];
    for step in 1..=max_steps {
        steps.push(step);
        steps.push(-step);
    }
    steps
}

fn lane_spacing(hints: &RoutingHints) -> f64 {
    if hints.lane_spacing.is_finite() && hints.lane_spacing > 0.0 {
        hints.lane_spacing
    } else if hints.grid_size.is_finite() && hints.grid_size > 0.0 {
        hints.grid_size
    } else {
        DEFAULT_LANE_SPACING
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

fn end_axes(points: &[Point]) -> (Option<Axis>, Option<Axis>) {
    let first = points
        .windows(2)
        .find_map(|seg| Dir::between(seg[0], seg[1]))
        .map(Dir::axis);
    let last = points
        .windows(2)
        .rev()
        .find_map(|seg| Dir::between(seg[0], seg[1]))
        .map(Dir::axis);
    (first, last)
}

fn score_candidate(candidate: &Candidate, hints: &RoutingHints, obstacles: &[Rect]) -> f64 {
    let weights = &hints.scoring;
    let points = &candidate.points;
    let segments = points.len().saturating_sub(1) as f64;
    let mut score = manhattan_length(points) + weights.segment_weight * (segments - 2.0);

    let (start_axis, end_axis) = end_axes(points);
    let mismatches = [(hints.prefer_start_axis, start_axis), (hints.prefer_end_axis, end_axis)]
        .into_iter()
        .filter(|(wanted, actual)| matches!((wanted, actual), (Some(w), Some(a)) if w != a))
        .count();
    score += weights.axis_mismatch_penalty * mismatches as f64;
    score += weights.obstacle_hit_penalty * path_obstacle_hits(points, obstacles) as f64;

    if let Some((step, orientation)) = candidate.lane {
        let preferred = hints.prefer_start_axis.or(hints.prefer_end_axis);
        let bias = match preferred {
            Some(axis) if axis != orientation => weights.channel_bias_mismatch,
            _ => weights.channel_bias_match,
        };
        score += weights.lane_step_penalty * step.unsigned_abs() as f64 + bias;
    }
    score
}

/// Z route whose middle channel runs perpendicular to `end_axis` through the
/// grid-rounded midpoint. `None` when the channel collapses onto an endpoint.
fn z_candidate(a: Point, b: Point, end_axis: Axis, hints: &RoutingHints) -> Option<Candidate> {
    let shift = finite_or_zero(hints.lane_offset);
    let points = match end_axis {
        Axis::Horizontal => {
            let x = round_to_grid((a.x + b.x) / 2.0 + shift, hints.grid_size);
            if (x - a.x).abs() <= EPS || (x - b.x).abs() <= EPS {
                return None;
            }
            vec![a, Point::new(x, a.y), Point::new(x, b.y), b]
        }
        Axis::Vertical => {
            let y = round_to_grid((a.y + b.y) / 2.0 + shift, hints.grid_size);
            if (y - a.y).abs() <= EPS || (y - b.y).abs() <= EPS {
                return None;
            }
            vec![a, Point::new(a.x, y), Point::new(b.x, y), b]
        }
    };
    Some(Candidate::base(points))
}

fn lane_candidates(a: Point, b: Point, hints: &RoutingHints) -> Vec<Candidate> {
    let spacing = lane_spacing(hints);
    let shift = finite_or_zero(hints.lane_offset);
    let mid_x = (a.x + b.x) / 2.0 + shift;
    let mid_y = (a.y + b.y) / 2.0 + shift;
    let mut out = Vec::new();
    for step in spiral_steps(hints.max_shift_steps) {
        let offset = step as f64 * spacing;
        let x = round_to_grid(mid_x + offset, hints.grid_size);
        out.push(Candidate::lane(
            vec![a, Point::new(x, a.y), Point::new(x, b.y), b],
            step,
            Axis::Horizontal,
        ));
        let y = round_to_grid(mid_y + offset, hints.grid_size);
        out.push(Candidate::lane(
            vec![a, Point::new(a.x, y), Point::new(b.x, y), b],
            step,
            Axis::Vertical,
        ));
    }
    out
}

/// Orthogonal polyline between two anchors already placed on node borders.
pub fn orthogonal_auto_polyline(a: Point, b: Point, hints: &RoutingHints) -> Vec<Point> {
    if !a.is_finite() || !b.is_finite() {
        return vec![a, b];
    }
    let aligned = (a.x - b.x).abs() <= EPS || (a.y - b.y).abs() <= EPS;
    if aligned && hints.obstacles.is_empty() {
        return vec![a, b];
    }

    let obstacles: Vec<Rect> = hints
        .obstacles
        .iter()
        .filter(|rect| rect.is_finite())
        .map(|rect| rect.inflate(hints.obstacle_margin))
        .collect();

    let mut candidates = vec![
        Candidate::base(vec![a, Point::new(a.x, b.y), b]),
        Candidate::base(vec![a, Point::new(b.x, a.y), b]),
    ];
    if let (Some(start), Some(end)) = (hints.prefer_start_axis, hints.prefer_end_axis)
        && start == end
        && let Some(z) = z_candidate(a, b, end, hints)
    {
        candidates.push(z);
    }
    if !obstacles.is_empty()
        && candidates[..2]
            .iter()
            .all(|c| path_obstacle_hits(&c.points, &obstacles) > 0)
    {
        candidates.extend(lane_candidates(a, b, hints));
    }

    let mut best: Option<(f64, usize)> = None;
    for (idx, candidate) in candidates.iter().enumerate() {
        if candidate.points.len() < 2 {
            continue;
        }
        let score = score_candidate(candidate, hints, &obstacles);
        if !score.is_finite() {
            continue;
        }
        if best.is_none_or(|(best_score, _)| score < best_score) {
            best = Some((score, idx));
        }
    }
    trace!(candidates = candidates.len(), "scored channel candidates");

    match best {
        Some((score, idx)) => {
            debug!(score, points = candidates[idx].points.len(), "channel route chosen");
            candidates.swap_remove(idx).points
        }
        None => {
            let fallback = simplify_polyline(&[a, Point::new(a.x, b.y), b]);
            if fallback.len() >= 2 { fallback } else { vec![a, b] }
        }
    }
}

/// Heuristic rect-to-rect route: resolves center-facing anchors and runs the
/// channel router. Obstacles equal to either endpoint rect are ignored.
pub fn route_edge(source: &Rect, target: &Rect, obstacles: &[Rect], hints: &RoutingHints) -> Vec<Point> {
    let (source_side, target_side) = facing_sides(source, target, hints);
    let (a, b) = anchor_pair(source, source_side, target, target_side, hints.corner_padding);
    let mut hints = hints.clone();
    hints.obstacles.extend(
        obstacles
            .iter()
            .filter(|rect| !rect.approx_eq(source) && !rect.approx_eq(target))
            .copied(),
    );
    hints
        .obstacles
        .retain(|rect| !rect.approx_eq(source) && !rect.approx_eq(target));
    trace!(?source_side, ?target_side, obstacles = hints.obstacles.len(), "route_edge");
    orthogonal_auto_polyline(a, b, &hints)
}
