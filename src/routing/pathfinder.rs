//! Full grid-graph pathfinder for committed connections.
//!
//! Every `(source side, target side)` pair gets its own sparse graph and a
//! bend-first shortest path search. The cheapest feasible pair wins.

use tracing::{debug, debug_span, trace, warn};

use crate::geometry::{
    EPS, Rect, coords_reasonable, manhattan_length, path_bend_count, segment_intersects_rect,
    simplify_polyline,
};

use super::anchor::anchor_pair;
use super::grid::SparseGrid;
use super::search::{Cost, explore};
use super::types::{Dir, PathfinderOptions, Route, Side};

/// Grid unit used when the options carry a non-positive one.
const DEFAULT_GRID: f64 = 10.0;
const DEFAULT_STUB: f64 = 16.0;
/// Minimum distance a stub clears the inflated node by.
const STUB_CLEARANCE_SLACK: f64 = 1.0;

fn positive_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { fallback }
}

/// Per-call routing context shared by all side pairs.
struct RouteContext<'a> {
    source: &'a Rect,
    target: &'a Rect,
    /// Raw obstacles other than source and target.
    others: Vec<Rect>,
    /// Inflated obstacles plus the inflated source and target.
    blockers: Vec<Rect>,
    soft: Vec<Rect>,
    soft_penalty: f64,
    grid: f64,
    stub: f64,
    corner_padding: f64,
    padding_steps: usize,
}

impl RouteContext<'_> {
    fn route_for_sides(&self, source_side: Side, target_side: Side) -> Option<Route> {
        let (from, to) = anchor_pair(
            self.source,
            source_side,
            self.target,
            target_side,
            self.corner_padding,
        );
        let stub_from = source_side.stub_point(from, self.stub);
        let stub_to = target_side.stub_point(to, self.stub);
        if self
            .blockers
            .iter()
            .any(|r| r.contains_strict(stub_from) || r.contains_strict(stub_to))
        {
            trace!(?source_side, ?target_side, "stub blocked");
            return None;
        }

        let graph = SparseGrid::build(
            [stub_from, stub_to],
            &self.blockers,
            &self.soft,
            self.soft_penalty,
            self.grid,
            self.padding_steps,
        );
        let start = graph.node_at(stub_from)?;
        let goal = graph.node_at(stub_to)?;
        let tree = explore(&graph, start, source_side.outward());

        // The last hop runs from the target stub into the node.
        let inward = target_side.outward().opposite();
        let mut arrival: Option<(Cost, Dir)> = None;
        for dir in Dir::ALL {
            if dir == target_side.outward() {
                continue;
            }
            let Some(cost) = tree.cost(goal, dir) else {
                continue;
            };
            let cost = cost.with_extra_bend(dir != inward);
            if arrival.is_none_or(|(known, _)| cost < known) {
                arrival = Some((cost, dir));
            }
        }
        let (_, arrive_dir) = arrival?;

        let nodes = tree.path_to(goal, arrive_dir);
        let mut raw = Vec::with_capacity(nodes.len() + 2);
        raw.push(from);
        raw.extend(nodes.into_iter().map(|id| graph.point(id)));
        raw.push(to);
        let points = simplify_polyline(&raw);
        if points.len() < 2 || !coords_reasonable(&points) {
            return None;
        }
        let collides = points.windows(2).any(|seg| {
            self.others
                .iter()
                .any(|rect| segment_intersects_rect(seg[0], seg[1], rect))
        });
        if collides {
            trace!(?source_side, ?target_side, "route rejected by obstacle check");
            return None;
        }

        Some(Route {
            bends: path_bend_count(&points),
            length: manhattan_length(&points),
            points,
            source_side,
            target_side,
        })
    }

    /// Length plus the soft penalty for every segment crossing a soft
    /// obstacle, the same weight the search charges.
    fn weight(&self, route: &Route) -> f64 {
        let crossings: usize = route
            .points
            .windows(2)
            .map(|seg| self.soft.iter().filter(|r| r.blocks_segment(seg[0], seg[1])).count())
            .sum();
        route.length + self.soft_penalty * crossings as f64
    }
}

fn is_better(candidate: (&Route, f64), best: (&Route, f64)) -> bool {
    let ((route, weight), (known, known_weight)) = (candidate, best);
    route.bends < known.bends || (route.bends == known.bends && weight < known_weight - EPS)
}

/// Best orthogonal route between two rectangles, or `None` when no side
/// pair admits a collision-free path.
///
/// Obstacles equal to the source or target rect are ignored, so callers may
/// pass every node of a diagram.
pub fn find_best_orthogonal_route(
    source: &Rect,
    target: &Rect,
    obstacles: &[Rect],
    options: &PathfinderOptions,
) -> Option<Route> {
    let _span = debug_span!("find_best_orthogonal_route", obstacles = obstacles.len()).entered();
    if !source.is_finite() || !target.is_finite() {
        warn!("non-finite endpoint rect, skipping pathfinder");
        return None;
    }

    let clearance = if options.clearance.is_finite() { options.clearance.max(0.0) } else { 0.0 };
    let others: Vec<Rect> = obstacles
        .iter()
        .filter(|rect| rect.is_finite() && !rect.approx_eq(source) && !rect.approx_eq(target))
        .copied()
        .collect();
    let mut blockers: Vec<Rect> = others.iter().map(|rect| rect.inflate(clearance)).collect();
    blockers.push(source.inflate(clearance));
    blockers.push(target.inflate(clearance));

    let ctx = RouteContext {
        source,
        target,
        blockers,
        others,
        soft: options
            .soft_obstacles
            .iter()
            .filter(|rect| rect.is_finite())
            .copied()
            .collect(),
        soft_penalty: if options.soft_penalty.is_finite() { options.soft_penalty.max(0.0) } else { 0.0 },
        grid: positive_or(options.grid_size, DEFAULT_GRID),
        stub: positive_or(options.stub_length, DEFAULT_STUB).max(clearance + STUB_CLEARANCE_SLACK),
        corner_padding: options.corner_padding,
        padding_steps: options.coord_padding_steps,
    };

    let mut best: Option<(Route, f64)> = None;
    for source_side in Side::ALL {
        for target_side in Side::ALL {
            let Some(route) = ctx.route_for_sides(source_side, target_side) else {
                continue;
            };
            let weight = ctx.weight(&route);
            trace!(?source_side, ?target_side, bends = route.bends, weight, "feasible pair");
            if best
                .as_ref()
                .is_none_or(|(known, known_weight)| is_better((&route, weight), (known, *known_weight)))
            {
                best = Some((route, weight));
            }
        }
    }
    let best = best.map(|(route, _)| route);

    match &best {
        Some(route) => debug!(
            source_side = ?route.source_side,
            target_side = ?route.target_side,
            bends = route.bends,
            length = route.length,
            "pathfinder route chosen"
        ),
        None => debug!("no feasible side pair"),
    }
    best
}
