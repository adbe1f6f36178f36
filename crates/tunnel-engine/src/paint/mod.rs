//! Color model shared between renderers and the sketch.
//!
//! Scope:
//! - GPU-facing color (linear, premultiplied alpha)
//! - HSB authoring colors converted to sRGB for CPU-side image buffers
//! - source-over compositing into RGBA8 buffers

pub mod blend;
pub mod color;
pub mod hsb;

pub use blend::blend_over;

pub use color::Color;
pub use hsb::Hsb;
