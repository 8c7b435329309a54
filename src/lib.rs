#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod render;
pub mod routing;
pub mod scene;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{RoutingConfig, load_config};
pub use error::SceneError;
pub use geometry::{Point, Rect};
pub use scene::{RouteMode, RoutedScene, Scene, route_scene};
