//! Coordinate types shared between the runtime, renderers and the sketch.
//!
//! Canonical CPU space for 2D buffers:
//! - Logical pixels (DPI-aware)
//! - Origin top-left
//! - +X right, +Y down
//!
//! 3D geometry uses `glam` types directly (right-handed, +Y up, camera on +Z).

mod viewport;

pub use viewport::Viewport;
