//! GPU rendering subsystem.
//!
//! Each renderer owns its GPU resources (pipelines, buffers, textures) and
//! creates them lazily on first use, recreating pipelines when the surface
//! format changes.
//!
//! Convention:
//! - World space is right-handed, +Y up, camera looking down -Z.
//! - Callers pass complete view-projection matrices (wgpu depth range 0..1).
//! - Colors reaching the GPU are linear premultiplied.

mod backdrop;
mod common;
mod ctx;
mod cubes;

pub use backdrop::BackdropRenderer;
pub use ctx::{RenderCtx, RenderTarget};
pub use cubes::{CubeInstance, CubeRenderer};
