//! Orthogonal connection routing.
//!
//! Two routers share the same anchor and geometry helpers:
//!
//! - [`route_edge`] / [`orthogonal_auto_polyline`]: a cheap candidate-scoring
//!   router for interactive previews.
//! - [`find_best_orthogonal_route`]: a sparse grid graph searched for every
//!   side pair, minimizing bends first and length second.
//!
//! Routed polylines are finished with [`adjust_endpoints`] and, across a
//! whole diagram, [`spread_parallel_routes`] and [`apply_lane_offsets`].

mod anchor;
mod channel;
mod endpoints;
mod grid;
mod lanes;
mod pathfinder;
mod search;
mod self_loop;
mod types;

pub use anchor::{anchor_on_side, anchor_pair, facing_sides};
pub use channel::{orthogonal_auto_polyline, route_edge};
pub use endpoints::adjust_endpoints;
pub use grid::{MAX_AXIS_COORDS, MAX_COORD_PADDING_STEPS};
pub use lanes::{apply_lane_offsets, spread_parallel_routes};
pub use pathfinder::find_best_orthogonal_route;
pub use self_loop::{self_loop_candidates, self_loop_polyline};
pub use types::{
    Axis, ChannelScoring, Dir, LaneItem, LaneOptions, PathfinderOptions, Route, RoutingHints, Side,
};
