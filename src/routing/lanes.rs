//! Separates coincident segments of different edges into parallel lanes, and
//! spreads edges that join the same two nodes into side-by-side copies.

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::geometry::{EPS, Point, Rect, coords_reasonable, path_obstacle_hits, simplify_polyline, unit_perp};

use super::types::{Axis, Dir, LaneItem, LaneOptions};

/// Segments whose fixed coordinates differ by less than this share a line.
const SAME_LINE_TOLERANCE: f64 = 0.5;
/// Lane spacing used when neither the options nor the grid provide one.
const DEFAULT_LANE_SPACING: f64 = 10.0;

#[derive(Debug, Clone, Copy)]
struct SegmentRef {
    /// Rank of the owning item in id order.
    rank: usize,
    item: usize,
    /// Segment `index` runs from `points[index]` to `points[index + 1]`.
    index: usize,
    axis: Axis,
    fixed: f64,
    lo: f64,
    hi: f64,
}

#[derive(Debug, Clone, Copy)]
struct Nudge {
    index: usize,
    axis: Axis,
    offset: f64,
}

fn lane_spacing(options: &LaneOptions) -> f64 {
    if options.lane_spacing.is_finite() && options.lane_spacing > 0.0 {
        options.lane_spacing
    } else if options.grid_size.is_finite() && options.grid_size > 0.0 {
        options.grid_size
    } else {
        DEFAULT_LANE_SPACING
    }
}

/// Interior segments only: the first and last stay attached to their nodes.
fn interior_segments(rank: usize, item: usize, points: &[Point]) -> Vec<SegmentRef> {
    if points.len() < 4 {
        return Vec::new();
    }
    (1..points.len() - 2)
        .filter_map(|index| {
            let (a, b) = (points[index], points[index + 1]);
            let dir = Dir::between(a, b)?;
            let (fixed, lo, hi) = match dir.axis() {
                Axis::Horizontal => (a.y, a.x.min(b.x), a.x.max(b.x)),
                Axis::Vertical => (a.x, a.y.min(b.y), a.y.max(b.y)),
            };
            Some(SegmentRef {
                rank,
                item,
                index,
                axis: dir.axis(),
                fixed,
                lo,
                hi,
            })
        })
        .collect()
}

/// Splits segments into groups that share an axis and a line and whose spans
/// overlap transitively.
fn coincident_groups(mut segments: Vec<SegmentRef>) -> Vec<Vec<SegmentRef>> {
    segments.sort_by(|a, b| {
        (a.axis as u8)
            .cmp(&(b.axis as u8))
            .then(a.fixed.total_cmp(&b.fixed))
            .then(a.lo.total_cmp(&b.lo))
    });

    let mut lines: Vec<Vec<SegmentRef>> = Vec::new();
    for seg in segments {
        match lines.last_mut() {
            Some(line)
                if line[0].axis == seg.axis && (seg.fixed - line[0].fixed).abs() <= SAME_LINE_TOLERANCE =>
            {
                line.push(seg)
            }
            _ => lines.push(vec![seg]),
        }
    }

    let mut groups = Vec::new();
    for mut line in lines {
        line.sort_by(|a, b| a.lo.total_cmp(&b.lo).then(a.rank.cmp(&b.rank)));
        let mut current: Vec<SegmentRef> = Vec::new();
        let mut reach = f64::NEG_INFINITY;
        for seg in line {
            if !current.is_empty() && seg.lo >= reach - EPS {
                groups.push(std::mem::take(&mut current));
                reach = f64::NEG_INFINITY;
            }
            reach = reach.max(seg.hi);
            current.push(seg);
        }
        if !current.is_empty() {
            groups.push(current);
        }
    }
    groups
}

/// Shifts segment `index` perpendicular to itself. `None` if a neighboring
/// segment would vanish or flip direction.
fn nudge_segment(points: &[Point], nudge: Nudge) -> Option<Vec<Point>> {
    let idx = nudge.index;
    if idx == 0 || idx + 2 >= points.len() {
        return None;
    }
    let mut out = points.to_vec();
    match nudge.axis {
        Axis::Horizontal => {
            out[idx].y += nudge.offset;
            out[idx + 1].y += nudge.offset;
        }
        Axis::Vertical => {
            out[idx].x += nudge.offset;
            out[idx + 1].x += nudge.offset;
        }
    }
    let before = Dir::between(points[idx - 1], points[idx]);
    let after = Dir::between(points[idx + 1], points[idx + 2]);
    let keeps_shape = before.is_some()
        && after.is_some()
        && Dir::between(out[idx - 1], out[idx]) == before
        && Dir::between(out[idx + 1], out[idx + 2]) == after;
    keeps_shape.then_some(out)
}

/// Nudges coincident interior segments of different items apart.
///
/// Lane assignment follows item id order, so identical input always
/// produces identical output. A nudge that would make an item touch more
/// of its obstacles than before is dropped.
pub fn apply_lane_offsets(items: &[LaneItem], options: &LaneOptions) -> Vec<LaneItem> {
    let spacing = lane_spacing(options);
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| items[a].id.cmp(&items[b].id));

    let simplified: Vec<Vec<Point>> = items
        .iter()
        .map(|item| {
            if coords_reasonable(&item.points) {
                simplify_polyline(&item.points)
            } else {
                Vec::new()
            }
        })
        .collect();

    let segments: Vec<SegmentRef> = order
        .iter()
        .enumerate()
        .flat_map(|(rank, &item)| interior_segments(rank, item, &simplified[item]))
        .collect();

    let mut nudges: Vec<Vec<Nudge>> = vec![Vec::new(); items.len()];
    for mut group in coincident_groups(segments) {
        let distinct: BTreeSet<usize> = group.iter().map(|seg| seg.item).collect();
        if distinct.len() < 2 {
            continue;
        }
        group.sort_by(|a, b| a.rank.cmp(&b.rank).then(a.index.cmp(&b.index)));
        let center = (group.len() as f64 - 1.0) / 2.0;
        for (lane, seg) in group.iter().enumerate() {
            let offset = (lane as f64 - center) * spacing;
            if offset.abs() <= EPS {
                continue;
            }
            nudges[seg.item].push(Nudge {
                index: seg.index,
                axis: seg.axis,
                offset,
            });
        }
        trace!(members = group.len(), fixed = group[0].fixed, "lane group");
    }

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let planned = &nudges[idx];
            if planned.is_empty() {
                return item.clone();
            }
            let obstacles: Vec<Rect> = item
                .obstacles
                .iter()
                .filter(|rect| rect.is_finite())
                .map(|rect| rect.inflate(options.obstacle_margin))
                .collect();
            let mut points = simplified[idx].clone();
            let mut hits = path_obstacle_hits(&points, &obstacles);
            let mut applied = 0usize;
            for nudge in planned {
                let Some(candidate) = nudge_segment(&points, *nudge) else {
                    continue;
                };
                let candidate_hits = path_obstacle_hits(&candidate, &obstacles);
                if candidate_hits > hits {
                    debug!(id = %item.id, segment = nudge.index, "lane offset skipped, would collide");
                    continue;
                }
                points = candidate;
                hits = candidate_hits;
                applied += 1;
            }
            if applied == 0 {
                return item.clone();
            }
            LaneItem {
                id: item.id.clone(),
                points,
                obstacles: item.obstacles.clone(),
            }
        })
        .collect()
}

/// Shift range along `normal` over which a route end stays on its border and
/// clear of the corners. `None` when the end is not on the border its segment
/// leaves through.
fn border_slide(end: Point, normal: Point, rect: &Rect, corner_padding: f64) -> Option<(f64, f64)> {
    let (value, fixed, lo, hi, n) = if normal.x.abs() > normal.y.abs() {
        (end.x, end.y, rect.x, rect.right(), normal.x)
    } else {
        (end.y, end.x, rect.y, rect.bottom(), normal.y)
    };
    let on_border = if normal.x.abs() > normal.y.abs() {
        (fixed - rect.y).abs() <= EPS || (fixed - rect.bottom()).abs() <= EPS
    } else {
        (fixed - rect.x).abs() <= EPS || (fixed - rect.right()).abs() <= EPS
    };
    if !on_border || n.abs() <= EPS {
        return None;
    }
    let pad = if corner_padding.is_finite() { corner_padding.max(0.0) } else { 0.0 };
    let (lo, hi) = if hi - lo <= pad * 2.0 {
        let mid = (lo + hi) / 2.0;
        (mid, mid)
    } else {
        (lo + pad, hi - pad)
    };
    let (a, b) = ((lo - value) / n, (hi - value) / n);
    Some((a.min(b), a.max(b)))
}

/// Offsets both ends of a route may take together.
fn slide_range(points: &[Point], source: &Rect, target: &Rect, corner_padding: f64) -> Option<(f64, f64)> {
    let n = points.len();
    if n < 2 {
        return None;
    }
    let (first_lo, first_hi) = border_slide(points[0], unit_perp(points[0], points[1]), source, corner_padding)?;
    let (last_lo, last_hi) =
        border_slide(points[n - 1], unit_perp(points[n - 2], points[n - 1]), target, corner_padding)?;
    let range = (first_lo.max(last_lo), first_hi.min(last_hi));
    (range.0 <= range.1 + EPS).then_some(range)
}

/// Moves every segment sideways by `offset` along its left-hand normal.
/// Corners follow both of their segments, the two ends only their own.
/// `None` if the route is not orthogonal or a segment would fold over.
fn offset_route(points: &[Point], offset: f64) -> Option<Vec<Point>> {
    let dirs: Vec<Dir> = points
        .windows(2)
        .map(|seg| Dir::between(seg[0], seg[1]))
        .collect::<Option<_>>()?;
    if dirs.is_empty() || dirs.windows(2).any(|pair| pair[0].axis() == pair[1].axis()) {
        return None;
    }
    let mut out = points.to_vec();
    for (idx, seg) in points.windows(2).enumerate() {
        let normal = unit_perp(seg[0], seg[1]);
        for p in &mut out[idx..idx + 2] {
            p.x += normal.x * offset;
            p.y += normal.y * offset;
        }
    }
    let keeps_shape = out
        .windows(2)
        .zip(&dirs)
        .all(|(seg, dir)| Dir::between(seg[0], seg[1]) == Some(*dir));
    keeps_shape.then_some(out)
}

/// Spreads routes between the same two nodes into parallel lanes.
///
/// Every route runs from `source` to `target` and `routes` is already in lane
/// order. Lane `k` of `n` moves sideways by `(k - (n - 1) / 2) * spacing`,
/// with its ends sliding along the node borders. When the centered bundle
/// would push an end into a corner, the whole bundle shifts to fit. A route
/// whose copy still leaves its border range, folds a segment or touches more
/// `obstacles` than before keeps its original points.
pub fn spread_parallel_routes(
    routes: &[Vec<Point>],
    source: &Rect,
    target: &Rect,
    obstacles: &[Rect],
    options: &LaneOptions,
    corner_padding: f64,
) -> Vec<Vec<Point>> {
    if routes.len() < 2 || !source.is_finite() || !target.is_finite() {
        return routes.to_vec();
    }
    let spacing = lane_spacing(options);
    let center = (routes.len() as f64 - 1.0) / 2.0;
    let lane_offset = |lane: usize| (lane as f64 - center) * spacing;

    let simplified: Vec<Vec<Point>> = routes
        .iter()
        .map(|points| {
            if coords_reasonable(points) {
                simplify_polyline(points)
            } else {
                Vec::new()
            }
        })
        .collect();
    let ranges: Vec<Option<(f64, f64)>> = simplified
        .iter()
        .map(|points| slide_range(points, source, target, corner_padding))
        .collect();

    let (mut lo, mut hi) = (f64::NEG_INFINITY, f64::INFINITY);
    for (lane, range) in ranges.iter().enumerate() {
        if let Some((range_lo, range_hi)) = range {
            lo = lo.max(range_lo - lane_offset(lane));
            hi = hi.min(range_hi - lane_offset(lane));
        }
    }
    let shift = if lo <= hi { 0.0_f64.max(lo).min(hi) } else { 0.0 };
    trace!(routes = routes.len(), shift, "parallel bundle");

    let obstacles: Vec<Rect> = obstacles
        .iter()
        .filter(|rect| rect.is_finite())
        .map(|rect| rect.inflate(options.obstacle_margin))
        .collect();

    routes
        .iter()
        .zip(simplified.iter().zip(&ranges))
        .enumerate()
        .map(|(lane, (original, (points, range)))| {
            let offset = lane_offset(lane) + shift;
            if offset.abs() <= EPS {
                return original.clone();
            }
            let Some((range_lo, range_hi)) = *range else {
                return original.clone();
            };
            if offset < range_lo - EPS || offset > range_hi + EPS {
                debug!(lane, offset, "parallel lane skipped, end would leave its border");
                return original.clone();
            }
            let Some(moved) = offset_route(points, offset) else {
                return original.clone();
            };
            if path_obstacle_hits(&moved, &obstacles) > path_obstacle_hits(points, &obstacles) {
                debug!(lane, offset, "parallel lane skipped, would collide");
                return original.clone();
            }
            moved
        })
        .collect()
}
