//! Whole-diagram routing: every edge of a scene is routed against the other
//! nodes, then parallel edges and coincident segments are spread into lanes.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, warn};

use crate::config::RoutingConfig;
use crate::error::SceneError;
use crate::geometry::{Point, Rect, path_bend_count, path_length};
use crate::render::{label_anchor, path_data};
use crate::routing::{
    Axis, Dir, LaneItem, Side, adjust_endpoints, apply_lane_offsets, find_best_orthogonal_route,
    route_edge, self_loop_polyline, spread_parallel_routes,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SceneNode {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefer_start_axis: Option<Axis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefer_end_axis: Option<Axis>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub nodes: Vec<SceneNode>,
    #[serde(default)]
    pub edges: Vec<SceneEdge>,
}

impl Scene {
    pub fn from_json(input: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Reports the first structural problem: duplicate ids, edges pointing at
    /// missing nodes, or nodes with non-finite geometry.
    pub fn validate(&self) -> Result<(), SceneError> {
        let mut node_ids = HashSet::new();
        for node in &self.nodes {
            if !node_ids.insert(node.id.as_str()) {
                return Err(SceneError::DuplicateNode { id: node.id.clone() });
            }
            let finite = [node.x, node.y, node.width, node.height]
                .iter()
                .all(|v| v.is_finite());
            if !finite {
                return Err(SceneError::InvalidGeometry { id: node.id.clone() });
            }
        }

        let mut edge_ids = HashSet::new();
        for edge in &self.edges {
            if !edge_ids.insert(edge.id.as_str()) {
                return Err(SceneError::DuplicateEdge { id: edge.id.clone() });
            }
            for endpoint in [&edge.source, &edge.target] {
                if !node_ids.contains(endpoint.as_str()) {
                    return Err(SceneError::unknown_node(&edge.id, endpoint));
                }
            }
        }
        Ok(())
    }
}

pub fn load_scene(path: &Path) -> anyhow::Result<Scene> {
    let contents = std::fs::read_to_string(path)?;
    Scene::from_json(&contents)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    /// Full side-pair search, heuristic route when no pair is feasible.
    #[default]
    Committed,
    /// Heuristic channel router only.
    Interactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutedBy {
    Pathfinder,
    Heuristic,
    SelfLoop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutedEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub points: Vec<Point>,
    pub source_side: Option<Side>,
    pub target_side: Option<Side>,
    pub bends: usize,
    pub length: f64,
    pub label_anchor: Point,
    pub path: String,
    pub routed_by: RoutedBy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutedScene {
    pub nodes: Vec<SceneNode>,
    pub edges: Vec<RoutedEdge>,
}

impl RoutedScene {
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

struct EdgeDraft {
    points: Vec<Point>,
    obstacles: Vec<Rect>,
    routed_by: RoutedBy,
}

fn side_from_exit(a: Point, b: Point) -> Option<Side> {
    let dir = Dir::between(a, b)?;
    Side::ALL.into_iter().find(|side| side.outward() == dir)
}

fn end_sides(points: &[Point]) -> (Option<Side>, Option<Side>) {
    if points.len() < 2 {
        return (None, None);
    }
    let n = points.len();
    (
        side_from_exit(points[0], points[1]),
        side_from_exit(points[n - 1], points[n - 2]),
    )
}

fn route_one(
    edge: &SceneEdge,
    rects: &HashMap<&str, Rect>,
    nodes: &[SceneNode],
    config: &RoutingConfig,
    mode: RouteMode,
) -> EdgeDraft {
    let (Some(&source), Some(&target)) = (rects.get(edge.source.as_str()), rects.get(edge.target.as_str()))
    else {
        return EdgeDraft {
            points: Vec::new(),
            obstacles: Vec::new(),
            routed_by: RoutedBy::Heuristic,
        };
    };
    let obstacles: Vec<Rect> = nodes
        .iter()
        .filter(|node| node.id != edge.source && node.id != edge.target)
        .map(SceneNode::rect)
        .collect();

    if edge.source == edge.target {
        let points = self_loop_polyline(&source, config.self_loop_pad, &obstacles);
        return EdgeDraft {
            points,
            obstacles,
            routed_by: RoutedBy::SelfLoop,
        };
    }

    let committed = match mode {
        RouteMode::Committed => find_best_orthogonal_route(&source, &target, &obstacles, &config.pathfinder),
        RouteMode::Interactive => None,
    };
    let (raw, routed_by) = match committed {
        Some(route) => (route.points, RoutedBy::Pathfinder),
        None => {
            if mode == RouteMode::Committed {
                warn!(edge = %edge.id, "no collision-free route, using heuristic route");
            }
            let hints = config.hints(edge.prefer_start_axis, edge.prefer_end_axis, Vec::new());
            (route_edge(&source, &target, &obstacles, &hints), RoutedBy::Heuristic)
        }
    };
    let points = adjust_endpoints(&raw, &source, &target, config.stub_length);
    debug!(edge = %edge.id, ?routed_by, points = points.len(), "edge routed");
    EdgeDraft {
        points,
        obstacles,
        routed_by,
    }
}

/// Node pair of an edge, smaller id first.
fn pair_key(edge: &SceneEdge) -> (&str, &str) {
    if edge.source <= edge.target {
        (edge.source.as_str(), edge.target.as_str())
    } else {
        (edge.target.as_str(), edge.source.as_str())
    }
}

/// Indices of edges joining the same two distinct nodes, in either
/// direction. Groups come out in pair order, members in id order.
fn parallel_groups(edges: &[SceneEdge]) -> Vec<Vec<usize>> {
    let mut groups: BTreeMap<(&str, &str), Vec<usize>> = BTreeMap::new();
    for (idx, edge) in edges.iter().enumerate() {
        if edge.source != edge.target {
            groups.entry(pair_key(edge)).or_default().push(idx);
        }
    }
    groups
        .into_values()
        .filter(|group| group.len() > 1)
        .map(|mut group| {
            group.sort_by(|&a, &b| edges[a].id.cmp(&edges[b].id));
            group
        })
        .collect()
}

fn spread_parallel_edges(
    edges: &[SceneEdge],
    rects: &HashMap<&str, Rect>,
    drafts: &mut [EdgeDraft],
    config: &RoutingConfig,
) {
    for group in parallel_groups(edges) {
        let (first, second) = pair_key(&edges[group[0]]);
        let (Some(&source), Some(&target)) = (rects.get(first), rects.get(second)) else {
            continue;
        };
        // Reverse edges run the other way round; flip them so every route
        // shares the same normals.
        let oriented: Vec<Vec<Point>> = group
            .iter()
            .map(|&idx| {
                let mut points = drafts[idx].points.clone();
                if edges[idx].source != first {
                    points.reverse();
                }
                points
            })
            .collect();
        let spread = spread_parallel_routes(
            &oriented,
            &source,
            &target,
            &drafts[group[0]].obstacles,
            &config.lanes,
            config.corner_padding,
        );
        for (&idx, mut points) in group.iter().zip(spread) {
            if edges[idx].source != first {
                points.reverse();
            }
            drafts[idx].points = points;
        }
        debug!(source = first, target = second, edges = group.len(), "parallel edges spread");
    }
}

/// Routes every edge of a validated scene. Edges are routed in parallel;
/// parallel edges and shared corridors are separated once all are routed.
pub fn route_scene(scene: &Scene, config: &RoutingConfig, mode: RouteMode) -> Result<RoutedScene, SceneError> {
    let _span = debug_span!("route_scene", nodes = scene.nodes.len(), edges = scene.edges.len(), ?mode).entered();
    scene.validate()?;

    let rects: HashMap<&str, Rect> = scene
        .nodes
        .iter()
        .map(|node| (node.id.as_str(), node.rect()))
        .collect();

    let mut drafts: Vec<EdgeDraft> = scene
        .edges
        .par_iter()
        .map(|edge| route_one(edge, &rects, &scene.nodes, config, mode))
        .collect();
    spread_parallel_edges(&scene.edges, &rects, &mut drafts, config);

    let items: Vec<LaneItem> = scene
        .edges
        .iter()
        .zip(&drafts)
        .map(|(edge, draft)| LaneItem {
            id: edge.id.clone(),
            points: draft.points.clone(),
            obstacles: draft.obstacles.clone(),
        })
        .collect();
    let laned = apply_lane_offsets(&items, &config.lanes);

    let edges = scene
        .edges
        .iter()
        .zip(drafts)
        .zip(laned)
        .map(|((edge, draft), item)| {
            let points = item.points;
            let (source_side, target_side) = end_sides(&points);
            RoutedEdge {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                source_side,
                target_side,
                bends: path_bend_count(&points),
                length: path_length(&points),
                label_anchor: label_anchor(&points),
                path: path_data(&points),
                routed_by: draft.routed_by,
                points,
            }
        })
        .collect();

    Ok(RoutedScene {
        nodes: scene.nodes.clone(),
        edges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, x: f64, y: f64) -> SceneNode {
        SceneNode {
            id: id.to_string(),
            x,
            y,
            width: 100.0,
            height: 50.0,
        }
    }

    fn edge(id: &str, source: &str, target: &str) -> SceneEdge {
        SceneEdge {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            prefer_start_axis: None,
            prefer_end_axis: None,
        }
    }

    fn pair_scene() -> Scene {
        Scene {
            nodes: vec![node("A", 0.0, 0.0), node("B", 300.0, 0.0)],
            edges: vec![edge("e1", "A", "B")],
        }
    }

    #[test]
    fn validate_reports_structural_problems() {
        let mut scene = pair_scene();
        assert_eq!(scene.validate(), Ok(()));

        scene.edges.push(edge("e2", "A", "ghost"));
        assert_eq!(scene.validate(), Err(SceneError::unknown_node("e2", "ghost")));

        let mut scene = pair_scene();
        scene.nodes.push(node("A", 10.0, 10.0));
        assert_eq!(scene.validate(), Err(SceneError::DuplicateNode { id: "A".into() }));

        let mut scene = pair_scene();
        scene.nodes[1].width = f64::NAN;
        assert_eq!(scene.validate(), Err(SceneError::InvalidGeometry { id: "B".into() }));
    }

    #[test]
    fn committed_mode_routes_straight_between_aligned_nodes() {
        let routed = route_scene(&pair_scene(), &RoutingConfig::default(), RouteMode::Committed).expect("routes");
        let e = &routed.edges[0];
        assert_eq!(e.points, vec![Point::new(100.0, 25.0), Point::new(300.0, 25.0)]);
        assert_eq!(e.source_side, Some(Side::Right));
        assert_eq!(e.target_side, Some(Side::Left));
        assert_eq!(e.bends, 0);
        assert_eq!(e.length, 200.0);
        assert_eq!(e.label_anchor, Point::new(200.0, 25.0));
        assert_eq!(e.path, "M 100.00 25.00 L 300.00 25.00");
        assert_eq!(e.routed_by, RoutedBy::Pathfinder);
    }

    #[test]
    fn interactive_mode_uses_heuristic_router() {
        let routed = route_scene(&pair_scene(), &RoutingConfig::default(), RouteMode::Interactive).expect("routes");
        let e = &routed.edges[0];
        assert_eq!(e.routed_by, RoutedBy::Heuristic);
        assert!(e.points.iter().all(|p| p.y == 25.0));
        assert_eq!(e.points.first().map(|p| p.x), Some(100.0));
        assert_eq!(e.points.last().map(|p| p.x), Some(300.0));
    }

    #[test]
    fn self_loop_leaves_right_and_returns_top() {
        let scene = Scene {
            nodes: vec![node("A", 0.0, 0.0)],
            edges: vec![edge("loop", "A", "A")],
        };
        let routed = route_scene(&scene, &RoutingConfig::default(), RouteMode::Committed).expect("routes");
        let e = &routed.edges[0];
        assert_eq!(e.routed_by, RoutedBy::SelfLoop);
        assert_eq!(e.source_side, Some(Side::Right));
        assert_eq!(e.target_side, Some(Side::Top));
    }

    #[test]
    fn invalid_scene_is_rejected_before_routing() {
        let mut scene = pair_scene();
        scene.edges.push(edge("e2", "B", "C"));
        let err = route_scene(&scene, &RoutingConfig::default(), RouteMode::Committed).unwrap_err();
        assert_eq!(err, SceneError::unknown_node("e2", "C"));
    }

    #[test]
    fn scene_json_uses_camel_case_axis_hints() {
        let scene = Scene::from_json(
            r#"{"nodes":[{"id":"A","x":0,"y":0,"width":10,"height":10}],
                "edges":[{"id":"e","source":"A","target":"A","preferStartAxis":"v"}]}"#,
        )
        .expect("scene parses");
        assert_eq!(scene.edges[0].prefer_start_axis, Some(Axis::Vertical));
        assert_eq!(scene.edges[0].prefer_end_axis, None);
    }

    #[test]
    fn parallel_edges_between_facing_nodes_get_separate_lanes() {
        let mut scene = pair_scene();
        scene.edges.push(edge("e2", "A", "B"));
        for mode in [RouteMode::Committed, RouteMode::Interactive] {
            let routed = route_scene(&scene, &RoutingConfig::default(), mode).expect("routes");
            let (e1, e2) = (&routed.edges[0], &routed.edges[1]);
            assert_ne!(e1.points, e2.points, "{mode:?}");
            assert_eq!(e1.points, vec![Point::new(100.0, 20.0), Point::new(300.0, 20.0)], "{mode:?}");
            assert_eq!(e2.points, vec![Point::new(100.0, 30.0), Point::new(300.0, 30.0)], "{mode:?}");
            assert_eq!(e2.source_side, Some(Side::Right));
            assert_eq!(e2.target_side, Some(Side::Left));
        }
    }

    #[test]
    fn parallel_l_routes_nest_inside_the_border_range() {
        let scene = Scene {
            nodes: vec![node("A", 0.0, 0.0), node("B", 300.0, 200.0)],
            edges: vec![edge("e1", "A", "B"), edge("e2", "A", "B")],
        };
        let routed = route_scene(&scene, &RoutingConfig::default(), RouteMode::Committed).expect("routes");
        let (e1, e2) = (&routed.edges[0], &routed.edges[1]);
        assert_eq!(
            e1.points,
            vec![Point::new(100.0, 34.0), Point::new(316.0, 34.0), Point::new(316.0, 200.0)]
        );
        assert_eq!(
            e2.points,
            vec![Point::new(100.0, 44.0), Point::new(306.0, 44.0), Point::new(306.0, 200.0)]
        );
    }

    #[test]
    fn reverse_edges_count_as_parallel() {
        let mut scene = pair_scene();
        scene.edges.push(edge("e2", "B", "A"));
        let routed = route_scene(&scene, &RoutingConfig::default(), RouteMode::Committed).expect("routes");
        let (forward, backward) = (&routed.edges[0], &routed.edges[1]);
        assert_eq!(forward.points, vec![Point::new(100.0, 20.0), Point::new(300.0, 20.0)]);
        assert_eq!(backward.points, vec![Point::new(300.0, 30.0), Point::new(100.0, 30.0)]);
        assert_eq!(backward.source_side, Some(Side::Left));
    }
}
