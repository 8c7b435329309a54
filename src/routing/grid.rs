//! Sparse visibility grid built fresh for every pathfinder call.

use crate::geometry::{EPS, Point, Rect, round_to_grid};

use super::types::Dir;

// ── Graph sizing ────────────────────────────────────────────────────
/// Hard cap on expansion steps around each blocker boundary.
pub const MAX_COORD_PADDING_STEPS: usize = 8;
/// Per-axis coordinate budget; expansion steps shrink until it fits.
pub const MAX_AXIS_COORDS: usize = 512;
/// Integer cost multiplier so the search orders distances exactly.
pub const COST_SCALE: f64 = 1000.0;

/// Scaled edge cost. Non-finite or negative lengths cost nothing.
pub fn scale_cost(length: f64) -> u64 {
    let scaled = (length * COST_SCALE).round();
    if scaled.is_finite() && scaled > 0.0 { scaled as u64 } else { 0 }
}

#[derive(Debug, Clone)]
pub struct SparseGrid {
    xs: Vec<f64>,
    ys: Vec<f64>,
    alive: Vec<bool>,
    /// Nearest reachable neighbor per direction with its scaled cost.
    links: Vec<[Option<(usize, u64)>; 4]>,
}

fn axis_coords(anchors: &[f64], bounds: &[(f64, f64)], grid: f64, steps: usize) -> Vec<f64> {
    let mut coords: Vec<f64> = anchors.iter().copied().filter(|v| v.is_finite()).collect();
    for &(lo, hi) in bounds {
        coords.push(lo);
        coords.push(hi);
        for k in 1..=steps {
            let pad = grid * k as f64;
            coords.push(round_to_grid(lo - pad, grid));
            coords.push(round_to_grid(hi + pad, grid));
        }
    }
    coords.retain(|v| v.is_finite());
    coords.sort_by(f64::total_cmp);
    coords.dedup_by(|a, b| (*a - *b).abs() <= EPS);
    coords
}

impl SparseGrid {
    /// Builds the graph from the two stub points and the hard blockers.
    /// Soft obstacles only add `soft_penalty` to edges crossing them.
    pub fn build(
        stubs: [Point; 2],
        blockers: &[Rect],
        soft: &[Rect],
        soft_penalty: f64,
        grid: f64,
        padding_steps: usize,
    ) -> Self {
        let mid = Point::new(
            round_to_grid((stubs[0].x + stubs[1].x) / 2.0, grid),
            round_to_grid((stubs[0].y + stubs[1].y) / 2.0, grid),
        );
        let x_bounds: Vec<(f64, f64)> = blockers.iter().map(|r| (r.x, r.right())).collect();
        let y_bounds: Vec<(f64, f64)> = blockers.iter().map(|r| (r.y, r.bottom())).collect();

        let mut steps = padding_steps.min(MAX_COORD_PADDING_STEPS);
        let (xs, ys) = loop {
            let xs = axis_coords(&[stubs[0].x, stubs[1].x, mid.x], &x_bounds, grid, steps);
            let ys = axis_coords(&[stubs[0].y, stubs[1].y, mid.y], &y_bounds, grid, steps);
            if steps == 0 || (xs.len() <= MAX_AXIS_COORDS && ys.len() <= MAX_AXIS_COORDS) {
                break (xs, ys);
            }
            steps -= 1;
        };

        let nx = xs.len();
        let ny = ys.len();
        let mut alive = vec![false; nx * ny];
        for (yi, &y) in ys.iter().enumerate() {
            for (xi, &x) in xs.iter().enumerate() {
                let p = Point::new(x, y);
                alive[yi * nx + xi] = !blockers.iter().any(|r| r.contains_strict(p));
            }
        }

        let mut graph = Self {
            xs,
            ys,
            alive,
            links: vec![[None; 4]; nx * ny],
        };
        graph.link_neighbors(blockers, soft, soft_penalty);
        graph
    }

    fn link_neighbors(&mut self, blockers: &[Rect], soft: &[Rect], soft_penalty: f64) {
        let nx = self.xs.len();
        let ny = self.ys.len();
        let penalty = if soft_penalty.is_finite() { soft_penalty.max(0.0) } else { 0.0 };
        let edge_cost = |a: Point, b: Point| -> Option<u64> {
            if blockers.iter().any(|r| r.blocks_segment(a, b)) {
                return None;
            }
            let crossings = soft.iter().filter(|r| r.blocks_segment(a, b)).count();
            Some(scale_cost(a.manhattan_to(b) + penalty * crossings as f64))
        };

        for yi in 0..ny {
            let mut last: Option<usize> = None;
            for xi in 0..nx {
                let id = yi * nx + xi;
                if !self.alive[id] {
                    continue;
                }
                if let Some(prev) = last
                    && let Some(cost) = edge_cost(self.point(prev), self.point(id))
                {
                    self.links[prev][Dir::Right.index()] = Some((id, cost));
                    self.links[id][Dir::Left.index()] = Some((prev, cost));
                }
                last = Some(id);
            }
        }
        for xi in 0..nx {
            let mut last: Option<usize> = None;
            for yi in 0..ny {
                let id = yi * nx + xi;
                if !self.alive[id] {
                    continue;
                }
                if let Some(prev) = last
                    && let Some(cost) = edge_cost(self.point(prev), self.point(id))
                {
                    self.links[prev][Dir::Down.index()] = Some((id, cost));
                    self.links[id][Dir::Up.index()] = Some((prev, cost));
                }
                last = Some(id);
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.alive.len()
    }

    pub fn point(&self, id: usize) -> Point {
        let nx = self.xs.len();
        Point::new(self.xs[id % nx], self.ys[id / nx])
    }

    /// Live node sitting exactly on `p`, if any.
    pub fn node_at(&self, p: Point) -> Option<usize> {
        let find = |coords: &[f64], v: f64| coords.iter().position(|c| (c - v).abs() <= EPS);
        let xi = find(&self.xs, p.x)?;
        let yi = find(&self.ys, p.y)?;
        let id = yi * self.xs.len() + xi;
        self.alive[id].then_some(id)
    }

    pub fn neighbor(&self, id: usize, dir: Dir) -> Option<(usize, u64)> {
        self.links.get(id).and_then(|links| links[dir.index()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nodes_inside_blockers_are_dropped() {
        let blocker = Rect::new(40.0, 40.0, 20.0, 20.0);
        let grid = SparseGrid::build(
            [Point::new(0.0, 50.0), Point::new(100.0, 50.0)],
            &[blocker],
            &[],
            0.0,
            10.0,
            1,
        );
        assert!(grid.node_at(Point::new(50.0, 50.0)).is_none());
        let start = grid.node_at(Point::new(0.0, 50.0)).expect("stub node");
        // The row through the blocker stops at its left border.
        let (next, _) = grid.neighbor(start, Dir::Right).expect("right neighbor");
        assert_eq!(grid.point(next), Point::new(30.0, 50.0));
        let (border, _) = grid.neighbor(next, Dir::Right).expect("border node");
        assert_eq!(grid.point(border), Point::new(40.0, 50.0));
        assert!(grid.neighbor(border, Dir::Right).is_none());
    }

    #[test]
    fn soft_obstacles_raise_edge_cost_without_blocking() {
        let soft = Rect::new(40.0, -10.0, 20.0, 20.0);
        let stubs = [Point::new(0.0, 0.0), Point::new(100.0, 0.0)];
        let plain = SparseGrid::build(stubs, &[], &[], 0.0, 10.0, 0);
        let weighted = SparseGrid::build(stubs, &[], &[soft], 500.0, 10.0, 0);
        let start = plain.node_at(stubs[0]).expect("start");
        let (_, plain_cost) = plain.neighbor(start, Dir::Right).expect("edge");
        let start = weighted.node_at(stubs[0]).expect("start");
        let (_, soft_cost) = weighted.neighbor(start, Dir::Right).expect("edge");
        assert!(soft_cost > plain_cost);
    }

    #[test]
    fn degenerate_blockers_do_not_break_construction() {
        let grid = SparseGrid::build(
            [Point::new(0.0, 0.0), Point::new(20.0, 20.0)],
            &[Rect::new(10.0, 10.0, 0.0, 0.0)],
            &[],
            0.0,
            0.0,
            2,
        );
        assert!(grid.node_count() > 0);
        assert!(grid.node_at(Point::new(10.0, 10.0)).is_some());
    }
}
