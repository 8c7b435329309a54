use crate::geometry::{EPS, Point, polyline_mid_point};
use crate::scene::RoutedScene;
use anyhow::Result;
use std::path::Path;

const CANVAS_MARGIN: f64 = 20.0;
const NODE_FILL: &str = "#ECECFF";
const NODE_STROKE: &str = "#9370DB";
const EDGE_STROKE: &str = "#333333";
const TEXT_COLOR: &str = "#131300";
const FONT_FAMILY: &str = "sans-serif";
const FONT_SIZE: f64 = 12.0;

/// SVG path data for a polyline, two decimals per coordinate.
pub fn path_data(points: &[Point]) -> String {
    let Some(first) = points.first() else {
        return String::new();
    };
    let mut d = format!("M {:.2} {:.2}", first.x, first.y);
    for point in &points[1..] {
        d.push_str(&format!(" L {:.2} {:.2}", point.x, point.y));
    }
    d
}

fn unit_between(from: Point, to: Point) -> Option<Point> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let len = dx.hypot(dy);
    (len.is_finite() && len > EPS).then(|| Point::new(dx / len, dy / len))
}

/// Unit directions at both ends of a polyline: the start tangent points back
/// out of the first segment (where a start marker faces), the end tangent
/// along the last segment. Zero-length end segments are skipped.
pub fn end_tangents(points: &[Point]) -> Option<(Point, Point)> {
    let start = points
        .windows(2)
        .find_map(|seg| unit_between(seg[1], seg[0]))?;
    let end = points
        .windows(2)
        .rev()
        .find_map(|seg| unit_between(seg[0], seg[1]))?;
    Some((start, end))
}

pub fn label_anchor(points: &[Point]) -> Point {
    polyline_mid_point(points)
}

fn canvas_bounds(routed: &RoutedScene) -> (f64, f64, f64, f64) {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    let mut include = |x: f64, y: f64| {
        if x.is_finite() && y.is_finite() {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    };
    for node in &routed.nodes {
        let rect = node.rect();
        include(rect.x, rect.y);
        include(rect.right(), rect.bottom());
    }
    for edge in &routed.edges {
        for p in &edge.points {
            include(p.x, p.y);
        }
    }
    if min_x > max_x || min_y > max_y {
        return (0.0, 0.0, 200.0, 200.0);
    }
    (
        min_x - CANVAS_MARGIN,
        min_y - CANVAS_MARGIN,
        max_x - min_x + 2.0 * CANVAS_MARGIN,
        max_y - min_y + 2.0 * CANVAS_MARGIN,
    )
}

/// Debug rendering of a routed scene: node boxes, routed edges with arrow
/// heads, and edge ids at their label anchors.
pub fn render_svg(routed: &RoutedScene) -> String {
    let (x, y, width, height) = canvas_bounds(routed);
    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"{x:.2} {y:.2} {width:.2} {height:.2}\">",
    ));
    svg.push_str("<defs>");
    svg.push_str(&format!(
        "<marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{EDGE_STROKE}\"/></marker>",
    ));
    svg.push_str("</defs>");

    for node in &routed.nodes {
        let rect = node.rect();
        let center = rect.center();
        svg.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"4\" ry=\"4\" fill=\"{NODE_FILL}\" stroke=\"{NODE_STROKE}\" stroke-width=\"1\"/>",
            rect.x, rect.y, rect.width, rect.height
        ));
        svg.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" dominant-baseline=\"central\" font-family=\"{FONT_FAMILY}\" font-size=\"{FONT_SIZE}\" fill=\"{TEXT_COLOR}\">{}</text>",
            center.x,
            center.y,
            escape_xml(&node.id)
        ));
    }

    for edge in &routed.edges {
        if edge.points.len() < 2 {
            continue;
        }
        svg.push_str(&format!(
            "<path d=\"{}\" fill=\"none\" stroke=\"{EDGE_STROKE}\" stroke-width=\"1.5\" marker-end=\"url(#arrow)\"/>",
            edge.path
        ));
        svg.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-family=\"{FONT_FAMILY}\" font-size=\"{}\" fill=\"{TEXT_COLOR}\">{}</text>",
            edge.label_anchor.x,
            edge.label_anchor.y - 4.0,
            FONT_SIZE - 2.0,
            escape_xml(&edge.id)
        ));
    }

    svg.push_str("</svg>");
    svg
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, svg)?,
        None => print!("{svg}"),
    }
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoutingConfig;
    use crate::scene::{RouteMode, Scene, route_scene};

    #[test]
    fn path_data_uses_two_decimals() {
        let d = path_data(&[Point::new(0.0, 0.0), Point::new(10.5, 0.0), Point::new(10.5, 3.333)]);
        assert_eq!(d, "M 0.00 0.00 L 10.50 0.00 L 10.50 3.33");
        assert_eq!(path_data(&[]), "");
    }

    #[test]
    fn end_tangents_skip_zero_length_segments() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 20.0),
            Point::new(10.0, 20.0),
        ];
        let (start, end) = end_tangents(&points).expect("tangents");
        assert_eq!(start, Point::new(-1.0, 0.0));
        assert_eq!(end, Point::new(0.0, 1.0));
        assert_eq!(end_tangents(&[Point::new(1.0, 1.0)]), None);
    }

    #[test]
    fn label_anchor_sits_at_half_length() {
        let points = [Point::new(0.0, 0.0), Point::new(0.0, 10.0), Point::new(10.0, 10.0)];
        assert_eq!(label_anchor(&points), Point::new(0.0, 10.0));
    }

    #[test]
    fn render_svg_draws_nodes_edges_and_escaped_labels() {
        let scene = Scene::from_json(
            r#"{"nodes":[{"id":"A&B","x":0,"y":0,"width":100,"height":50},
                         {"id":"C","x":300,"y":0,"width":100,"height":50}],
                "edges":[{"id":"e<1>","source":"A&B","target":"C"}]}"#,
        )
        .expect("scene parses");
        let routed = route_scene(&scene, &RoutingConfig::default(), RouteMode::Committed).expect("routes");
        let svg = render_svg(&routed);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("marker id=\"arrow\""));
        assert!(svg.contains("d=\"M 100.00 25.00 L 300.00 25.00\""));
        assert!(svg.contains("A&amp;B"));
        assert!(svg.contains("e&lt;1&gt;"));
        assert_eq!(svg.matches("<rect").count(), 2);
    }
}
