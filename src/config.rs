use crate::geometry::Rect;
use crate::routing::{Axis, ChannelScoring, LaneOptions, PathfinderOptions, RoutingHints};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Every tunable the scene router uses, with the defaults the routing
/// modules ship with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoutingConfig {
    pub channel: ChannelScoring,
    pub grid_size: f64,
    pub obstacle_margin: f64,
    pub lane_spacing: f64,
    pub max_shift_steps: usize,
    pub corner_padding: f64,
    pub pathfinder: PathfinderOptions,
    pub lanes: LaneOptions,
    /// Stub length handed to the endpoint adjuster.
    pub stub_length: f64,
    /// Distance a self-loop keeps from its node.
    pub self_loop_pad: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        let hints = RoutingHints::default();
        let pathfinder = PathfinderOptions::default();
        Self {
            channel: ChannelScoring::default(),
            grid_size: hints.grid_size,
            obstacle_margin: hints.obstacle_margin,
            lane_spacing: hints.lane_spacing,
            max_shift_steps: hints.max_shift_steps,
            corner_padding: hints.corner_padding,
            stub_length: pathfinder.stub_length,
            pathfinder,
            lanes: LaneOptions::default(),
            self_loop_pad: 20.0,
        }
    }
}

impl RoutingConfig {
    /// Heuristic-router hints for one edge.
    pub fn hints(
        &self,
        prefer_start_axis: Option<Axis>,
        prefer_end_axis: Option<Axis>,
        obstacles: Vec<Rect>,
    ) -> RoutingHints {
        RoutingHints {
            prefer_start_axis,
            prefer_end_axis,
            grid_size: self.grid_size,
            obstacles,
            obstacle_margin: self.obstacle_margin,
            lane_spacing: self.lane_spacing,
            max_shift_steps: self.max_shift_steps,
            lane_offset: 0.0,
            corner_padding: self.corner_padding,
            scoring: self.channel,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ChannelConfigFile {
    segment_weight: Option<f64>,
    axis_mismatch_penalty: Option<f64>,
    obstacle_hit_penalty: Option<f64>,
    lane_step_penalty: Option<f64>,
    channel_bias_match: Option<f64>,
    channel_bias_mismatch: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PathfinderConfigFile {
    grid_size: Option<f64>,
    clearance: Option<f64>,
    stub_length: Option<f64>,
    coord_padding_steps: Option<usize>,
    corner_padding: Option<f64>,
    soft_obstacles: Option<Vec<Rect>>,
    soft_penalty: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LanesConfigFile {
    grid_size: Option<f64>,
    obstacle_margin: Option<f64>,
    lane_spacing: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    channel: Option<ChannelConfigFile>,
    grid_size: Option<f64>,
    obstacle_margin: Option<f64>,
    lane_spacing: Option<f64>,
    max_shift_steps: Option<usize>,
    corner_padding: Option<f64>,
    pathfinder: Option<PathfinderConfigFile>,
    lanes: Option<LanesConfigFile>,
    stub_length: Option<f64>,
    self_loop_pad: Option<f64>,
}

fn parse_config_file(contents: &str, json5_syntax: bool) -> anyhow::Result<ConfigFile> {
    if json5_syntax {
        Ok(json5::from_str(contents)?)
    } else {
        Ok(serde_json::from_str(contents)?)
    }
}

fn apply_overrides(config: &mut RoutingConfig, parsed: ConfigFile) {
    if let Some(channel) = parsed.channel {
        let scoring = &mut config.channel;
        if let Some(v) = channel.segment_weight {
            scoring.segment_weight = v;
        }
        if let Some(v) = channel.axis_mismatch_penalty {
            scoring.axis_mismatch_penalty = v;
        }
        if let Some(v) = channel.obstacle_hit_penalty {
            scoring.obstacle_hit_penalty = v;
        }
        if let Some(v) = channel.lane_step_penalty {
            scoring.lane_step_penalty = v;
        }
        if let Some(v) = channel.channel_bias_match {
            scoring.channel_bias_match = v;
        }
        if let Some(v) = channel.channel_bias_mismatch {
            scoring.channel_bias_mismatch = v;
        }
    }

    if let Some(v) = parsed.grid_size {
        config.grid_size = v;
    }
    if let Some(v) = parsed.obstacle_margin {
        config.obstacle_margin = v;
    }
    if let Some(v) = parsed.lane_spacing {
        config.lane_spacing = v;
    }
    if let Some(v) = parsed.max_shift_steps {
        config.max_shift_steps = v;
    }
    if let Some(v) = parsed.corner_padding {
        config.corner_padding = v;
    }

    if let Some(pathfinder) = parsed.pathfinder {
        let options = &mut config.pathfinder;
        if let Some(v) = pathfinder.grid_size {
            options.grid_size = v;
        }
        if let Some(v) = pathfinder.clearance {
            options.clearance = v;
        }
        if let Some(v) = pathfinder.stub_length {
            options.stub_length = v;
        }
        if let Some(v) = pathfinder.coord_padding_steps {
            options.coord_padding_steps = v;
        }
        if let Some(v) = pathfinder.corner_padding {
            options.corner_padding = v;
        }
        if let Some(v) = pathfinder.soft_obstacles {
            options.soft_obstacles = v;
        }
        if let Some(v) = pathfinder.soft_penalty {
            options.soft_penalty = v;
        }
    }

    if let Some(lanes) = parsed.lanes {
        if let Some(v) = lanes.grid_size {
            config.lanes.grid_size = v;
        }
        if let Some(v) = lanes.obstacle_margin {
            config.lanes.obstacle_margin = v;
        }
        if let Some(v) = lanes.lane_spacing {
            config.lanes.lane_spacing = v;
        }
    }

    if let Some(v) = parsed.stub_length {
        config.stub_length = v;
    }
    if let Some(v) = parsed.self_loop_pad {
        config.self_loop_pad = v;
    }
}

/// Loads a partial camelCase config on top of the defaults. Files ending in
/// `.json5` may use comments and trailing commas.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<RoutingConfig> {
    let mut config = RoutingConfig::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let json5_syntax = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json5"));
    let parsed = parse_config_file(&contents, json5_syntax)?;
    apply_overrides(&mut config, parsed);
    Ok(config)
}
