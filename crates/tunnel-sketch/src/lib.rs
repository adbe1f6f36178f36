//! Infinite cube tunnel sketch.
//!
//! Nested shells of a cube-of-cubes fly toward the viewer, the six face
//! centers carry text labels, and an animated nebula fills the backdrop.

pub mod app;
pub mod background;
pub mod camera;
pub mod config;
pub mod grid;
pub mod labels;
pub mod scene;

pub use app::Sketch;
pub use config::{BackgroundVariant, ConfigError, SketchConfig};
