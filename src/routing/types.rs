use serde::{Deserialize, Serialize};

use crate::geometry::{EPS, Point, Rect};

/// Rectangle edge an anchor sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Top, Side::Bottom];

    /// Direction of travel when leaving the rectangle through this side.
    pub fn outward(self) -> Dir {
        match self {
            Side::Left => Dir::Left,
            Side::Right => Dir::Right,
            Side::Top => Dir::Up,
            Side::Bottom => Dir::Down,
        }
    }

    /// Axis of a segment that leaves perpendicular to this side.
    pub fn exit_axis(self) -> Axis {
        self.outward().axis()
    }

    pub fn stub_point(self, anchor: Point, length: f64) -> Point {
        self.outward().step(anchor, length)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    #[serde(rename = "h", alias = "horizontal")]
    Horizontal,
    #[serde(rename = "v", alias = "vertical")]
    Vertical,
}

/// Travel direction along an orthogonal segment. Screen space, y down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dir {
    Right,
    Left,
    Down,
    Up,
}

impl Dir {
    pub const ALL: [Dir; 4] = [Dir::Right, Dir::Left, Dir::Down, Dir::Up];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn opposite(self) -> Dir {
        match self {
            Dir::Right => Dir::Left,
            Dir::Left => Dir::Right,
            Dir::Down => Dir::Up,
            Dir::Up => Dir::Down,
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Dir::Right | Dir::Left => Axis::Horizontal,
            Dir::Down | Dir::Up => Axis::Vertical,
        }
    }

    pub fn unit(self) -> (f64, f64) {
        match self {
            Dir::Right => (1.0, 0.0),
            Dir::Left => (-1.0, 0.0),
            Dir::Down => (0.0, 1.0),
            Dir::Up => (0.0, -1.0),
        }
    }

    pub fn step(self, from: Point, distance: f64) -> Point {
        let (ux, uy) = self.unit();
        Point::new(from.x + ux * distance, from.y + uy * distance)
    }

    /// Direction of an axis-aligned segment, `None` for diagonal or
    /// zero-length ones.
    pub fn between(a: Point, b: Point) -> Option<Dir> {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let flat_x = dx.abs() <= EPS;
        let flat_y = dy.abs() <= EPS;
        match (flat_x, flat_y) {
            (false, true) if dx > 0.0 => Some(Dir::Right),
            (false, true) => Some(Dir::Left),
            (true, false) if dy > 0.0 => Some(Dir::Down),
            (true, false) => Some(Dir::Up),
            _ => None,
        }
    }
}

/// Penalty weights of the channel router's candidate scoring.
///
/// Only the ordering matters: obstacle hits dominate axis mismatches, which
/// dominate segment count, which dominates lane-shift distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChannelScoring {
    pub segment_weight: f64,
    pub axis_mismatch_penalty: f64,
    pub obstacle_hit_penalty: f64,
    pub lane_step_penalty: f64,
    pub channel_bias_match: f64,
    pub channel_bias_mismatch: f64,
}

impl Default for ChannelScoring {
    fn default() -> Self {
        Self {
            segment_weight: 5.0,
            axis_mismatch_penalty: 10_000.0,
            obstacle_hit_penalty: 100_000.0,
            lane_step_penalty: 50.0,
            channel_bias_match: 200.0,
            channel_bias_mismatch: 450.0,
        }
    }
}

/// Per-edge tuning for the heuristic channel router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoutingHints {
    pub prefer_start_axis: Option<Axis>,
    pub prefer_end_axis: Option<Axis>,
    /// Quantization unit for channel coordinates; non-positive disables it.
    pub grid_size: f64,
    pub obstacles: Vec<Rect>,
    pub obstacle_margin: f64,
    pub lane_spacing: f64,
    pub max_shift_steps: usize,
    pub lane_offset: f64,
    pub corner_padding: f64,
    pub scoring: ChannelScoring,
}

impl Default for RoutingHints {
    fn default() -> Self {
        Self {
            prefer_start_axis: None,
            prefer_end_axis: None,
            grid_size: 10.0,
            obstacles: Vec::new(),
            obstacle_margin: 4.0,
            lane_spacing: 20.0,
            max_shift_steps: 6,
            lane_offset: 0.0,
            corner_padding: 6.0,
            scoring: ChannelScoring::default(),
        }
    }
}

/// Options for the full grid-graph pathfinder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PathfinderOptions {
    pub grid_size: f64,
    pub clearance: f64,
    pub stub_length: f64,
    pub coord_padding_steps: usize,
    pub corner_padding: f64,
    /// Rectangles that add cost when crossed but never block.
    pub soft_obstacles: Vec<Rect>,
    pub soft_penalty: f64,
}

impl Default for PathfinderOptions {
    fn default() -> Self {
        Self {
            grid_size: 10.0,
            clearance: 8.0,
            stub_length: 16.0,
            coord_padding_steps: 2,
            corner_padding: 6.0,
            soft_obstacles: Vec::new(),
            soft_penalty: 0.0,
        }
    }
}

/// Best route found by the pathfinder together with its quality metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub points: Vec<Point>,
    pub source_side: Side,
    pub target_side: Side,
    pub bends: usize,
    pub length: f64,
}

/// An already-routed edge handed to the lane offsetter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneItem {
    pub id: String,
    pub points: Vec<Point>,
    #[serde(default)]
    pub obstacles: Vec<Rect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LaneOptions {
    pub grid_size: f64,
    pub obstacle_margin: f64,
    /// Distance between neighboring lanes; falls back to `grid_size` when
    /// non-positive.
    pub lane_spacing: f64,
}

impl Default for LaneOptions {
    fn default() -> Self {
        Self {
            grid_size: 10.0,
            obstacle_margin: 4.0,
            lane_spacing: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_between_reads_axis_aligned_segments() {
        let o = Point::ORIGIN;
        assert_eq!(Dir::between(o, Point::new(5.0, 0.0)), Some(Dir::Right));
        assert_eq!(Dir::between(o, Point::new(0.0, -5.0)), Some(Dir::Up));
        assert_eq!(Dir::between(o, Point::new(5.0, 5.0)), None);
        assert_eq!(Dir::between(o, o), None);
    }

    #[test]
    fn side_stub_moves_outward() {
        let anchor = Point::new(10.0, 10.0);
        assert_eq!(Side::Top.stub_point(anchor, 4.0), Point::new(10.0, 6.0));
        assert_eq!(Side::Right.stub_point(anchor, 4.0), Point::new(14.0, 10.0));
        assert_eq!(Side::Bottom.exit_axis(), Axis::Vertical);
    }

    #[test]
    fn hints_deserialize_from_partial_camel_case() {
        let hints: RoutingHints =
            serde_json::from_str(r#"{"preferStartAxis":"h","gridSize":0}"#).expect("hints parse");
        assert_eq!(hints.prefer_start_axis, Some(Axis::Horizontal));
        assert_eq!(hints.grid_size, 0.0);
        assert_eq!(hints.max_shift_steps, RoutingHints::default().max_shift_steps);
    }
}
