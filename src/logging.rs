//! Tracing subscriber setup for the `orthoroute` binary.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the binary (or any embedding application).
//!
//! Level comes from the argument, then `ORTHOROUTE_LOG_LEVEL`, then
//! `RUST_LOG`, and defaults to `warn`. Format comes from the argument or
//! `ORTHOROUTE_LOG_FORMAT` and defaults to `compact`.
//!
//! ```bash
//! RUST_LOG="ortho_router::routing=trace" orthoroute -i scene.json
//! ```

use std::str::FromStr;

use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("unknown log format: {s}")),
        }
    }
}

pub fn init_logging(level: Option<&str>, format: Option<&str>) -> anyhow::Result<()> {
    let log_level = level
        .map(str::to_string)
        .or_else(|| std::env::var("ORTHOROUTE_LOG_LEVEL").ok())
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "warn".to_string());
    let log_format = format
        .map(str::to_string)
        .or_else(|| std::env::var("ORTHOROUTE_LOG_FORMAT").ok())
        .unwrap_or_else(|| "compact".to_string());

    let filter = EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    let format = LogFormat::from_str(&log_format).map_err(anyhow::Error::msg)?;

    // Events go to stderr so SVG/JSON on stdout stays clean.
    match format {
        LogFormat::Compact => Registry::default()
            .with(filter)
            .with(
                fmt::Layer::default()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_span_events(FmtSpan::NONE),
            )
            .try_init()?,
        LogFormat::Pretty => Registry::default()
            .with(filter)
            .with(
                fmt::Layer::default()
                    .with_writer(std::io::stderr)
                    .with_file(true)
                    .with_line_number(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .pretty(),
            )
            .try_init()?,
        LogFormat::Json => Registry::default()
            .with(filter)
            .with(
                fmt::Layer::default()
                    .with_writer(std::io::stderr)
                    .with_span_events(FmtSpan::CLOSE)
                    .json(),
            )
            .try_init()?,
    }
    Ok(())
}
