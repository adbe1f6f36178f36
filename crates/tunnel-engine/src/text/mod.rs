//! Font loading, measurement and CPU rasterization.
//!
//! Text is rendered once into image buffers (label textures) rather than
//! through a per-frame glyph atlas; the cube renderer samples those images.

mod font_system;
mod measure;

pub use font_system::{FontId, FontLoadError, FontSystem, TextBlock};
pub use measure::{AdvanceEstimate, FontMeasure, TextMeasure};
