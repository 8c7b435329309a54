use crate::geometry::{Point, Rect, manhattan_length, path_obstacle_hits};

/// The eight corner loops around `rect`: out of one side, around a corner at
/// distance `pad`, back in through the adjacent side.
pub fn self_loop_candidates(rect: &Rect, pad: f64) -> Vec<Vec<Point>> {
    let c = rect.center();
    let left = Point::new(rect.x, c.y);
    let right = Point::new(rect.right(), c.y);
    let top = Point::new(c.x, rect.y);
    let bottom = Point::new(c.x, rect.bottom());
    let left_x = rect.x - pad;
    let right_x = rect.right() + pad;
    let top_y = rect.y - pad;
    let bottom_y = rect.bottom() + pad;
    let p = Point::new;

    vec![
        vec![right, p(right_x, c.y), p(right_x, top_y), p(c.x, top_y), top],
        vec![right, p(right_x, c.y), p(right_x, bottom_y), p(c.x, bottom_y), bottom],
        vec![left, p(left_x, c.y), p(left_x, top_y), p(c.x, top_y), top],
        vec![left, p(left_x, c.y), p(left_x, bottom_y), p(c.x, bottom_y), bottom],
        vec![top, p(c.x, top_y), p(right_x, top_y), p(right_x, c.y), right],
        vec![top, p(c.x, top_y), p(left_x, top_y), p(left_x, c.y), left],
        vec![bottom, p(c.x, bottom_y), p(right_x, bottom_y), p(right_x, c.y), right],
        vec![bottom, p(c.x, bottom_y), p(left_x, bottom_y), p(left_x, c.y), left],
    ]
}

/// Self-loop touching the fewest obstacles, then the shortest. Earlier
/// candidates win ties, so an unobstructed node loops out of its right side
/// over the top.
pub fn self_loop_polyline(rect: &Rect, pad: f64, obstacles: &[Rect]) -> Vec<Point> {
    let pad = if pad.is_finite() { pad.max(1.0) } else { 1.0 };
    let mut best: Option<(usize, f64, Vec<Point>)> = None;
    for candidate in self_loop_candidates(rect, pad) {
        let hits = path_obstacle_hits(&candidate, obstacles);
        let len = manhattan_length(&candidate);
        let better = match &best {
            None => true,
            Some((best_hits, best_len, _)) => hits < *best_hits || (hits == *best_hits && len < *best_len),
        };
        if better {
            best = Some((hits, len, candidate));
        }
    }
    best.map(|(_, _, points)| points).unwrap_or_default()
}
