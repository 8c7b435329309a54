use crate::geometry::{Point, Rect};

use super::types::{Axis, RoutingHints, Side};

// ── Side selection ──────────────────────────────────────────────────
/// Center-delta ratio above which the horizontal sides win outright.
const DIRECTION_PREF_RATIO: f64 = 1.35;

fn sanitize_pad(pad: f64) -> f64 {
    if pad.is_finite() { pad.max(0.0) } else { 0.0 }
}

/// Clamps `value` into `[lo + pad, hi - pad]`. Sides too short for the
/// padding collapse to their midpoint.
pub(super) fn clamp_along(value: f64, lo: f64, hi: f64, pad: f64) -> f64 {
    let pad = sanitize_pad(pad);
    if hi - lo <= pad * 2.0 || !value.is_finite() {
        return (lo + hi) / 2.0;
    }
    value.clamp(lo + pad, hi - pad)
}

/// Anchor on `side` of `rect`, aligned with `toward` and kept away from the
/// corners by `corner_padding`.
pub fn anchor_on_side(rect: &Rect, side: Side, toward: Point, corner_padding: f64) -> Point {
    match side {
        Side::Left | Side::Right => {
            let x = if side == Side::Left { rect.x } else { rect.right() };
            Point::new(x, clamp_along(toward.y, rect.y, rect.bottom(), corner_padding))
        }
        Side::Top | Side::Bottom => {
            let y = if side == Side::Top { rect.y } else { rect.bottom() };
            Point::new(clamp_along(toward.x, rect.x, rect.right(), corner_padding), y)
        }
    }
}

/// Anchors for a side pair. When both sides leave along the same axis and
/// the rectangles overlap across it, both anchors share the middle of the
/// overlap so the connection can run straight.
pub fn anchor_pair(
    source: &Rect,
    source_side: Side,
    target: &Rect,
    target_side: Side,
    corner_padding: f64,
) -> (Point, Point) {
    let pad = sanitize_pad(corner_padding);
    let mut from = anchor_on_side(source, source_side, target.center(), pad);
    let mut to = anchor_on_side(target, target_side, source.center(), pad);
    if source_side.exit_axis() == target_side.exit_axis() {
        match source_side.exit_axis() {
            Axis::Horizontal => {
                let lo = source.y.max(target.y) + pad;
                let hi = source.bottom().min(target.bottom()) - pad;
                if lo <= hi {
                    let y = (lo + hi) / 2.0;
                    from.y = y;
                    to.y = y;
                }
            }
            Axis::Vertical => {
                let lo = source.x.max(target.x) + pad;
                let hi = source.right().min(target.right()) - pad;
                if lo <= hi {
                    let x = (lo + hi) / 2.0;
                    from.x = x;
                    to.x = x;
                }
            }
        }
    }
    (from, to)
}

fn side_toward(axis: Axis, delta: f64) -> Side {
    match (axis, delta >= 0.0) {
        (Axis::Horizontal, true) => Side::Right,
        (Axis::Horizontal, false) => Side::Left,
        (Axis::Vertical, true) => Side::Bottom,
        (Axis::Vertical, false) => Side::Top,
    }
}

/// Picks the facing sides for a heuristic route. Axis hints win; otherwise
/// the dominant center offset decides, with overlap along one axis tipping
/// the balance toward the other.
pub fn facing_sides(source: &Rect, target: &Rect, hints: &RoutingHints) -> (Side, Side) {
    let from = source.center();
    let to = target.center();
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let x_overlap = source.x < target.right() && target.x < source.right();
    let y_overlap = source.y < target.bottom() && target.y < source.bottom();

    let ratio = dx.abs() / dy.abs().max(1e-3);
    let horiz_pref = ratio > DIRECTION_PREF_RATIO || (y_overlap && ratio > 0.9);
    let vert_pref = ratio < 1.0 / DIRECTION_PREF_RATIO || (x_overlap && ratio < 1.1);
    let dominant = if vert_pref && !horiz_pref {
        Axis::Vertical
    } else if horiz_pref && !vert_pref {
        Axis::Horizontal
    } else if dx.abs() >= dy.abs() {
        Axis::Horizontal
    } else {
        Axis::Vertical
    };

    let start_axis = hints.prefer_start_axis.unwrap_or(dominant);
    let end_axis = hints.prefer_end_axis.unwrap_or(dominant);
    let start = side_toward(start_axis, if start_axis == Axis::Horizontal { dx } else { dy });
    let end = side_toward(end_axis, if end_axis == Axis::Horizontal { -dx } else { -dy });
    (start, end)
}
