use crate::config::load_config;
use crate::logging::init_logging;
use crate::render::{render_svg, write_output_svg};
use crate::scene::{RouteMode, RoutedScene, Scene, route_scene};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "orthoroute", version, about = "Orthogonal connector router for box diagrams")]
pub struct Args {
    /// Scene file (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Routing config file (.json or .json5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Router to use
    #[arg(short = 'm', long = "mode", value_enum, default_value = "committed")]
    pub mode: RouteMode,

    /// Log filter, e.g. "debug" or "ortho_router::routing=trace"
    #[arg(long = "logLevel")]
    pub log_level: Option<String>,

    /// Log format: compact, pretty or json
    #[arg(long = "logFormat")]
    pub log_format: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Json,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level.as_deref(), args.log_format.as_deref())?;

    let config = load_config(args.config.as_deref())?;
    let input = read_input(args.input.as_deref())?;
    let scene = Scene::from_json(&input)?;
    let routed = route_scene(&scene, &config, args.mode)?;
    let rendered = render_output(&routed, args.output_format)?;
    write_output_svg(&rendered, args.output.as_deref())
}

fn render_output(routed: &RoutedScene, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Svg => Ok(render_svg(routed)),
        OutputFormat::Json => routed.to_json(),
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => Ok(std::fs::read_to_string(path)?),
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}
