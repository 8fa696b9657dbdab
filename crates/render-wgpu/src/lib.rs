//! wgpu render backend.
//!
//! Draws every visible scene object as an instance of a unit sphere or unit
//! cube, plus a world axes gizmo, lit by the scene's hemisphere and
//! directional lights.
//!
//! # Invariants
//! - The backend reads the scene; it never writes to it.
//! - Opaque objects are drawn before transparent ones.

mod gpu;
mod mesh;
mod shaders;

pub use gpu::{DrawStats, WgpuFrame, WgpuRenderer};
pub use mesh::{Batch, InstanceData, MeshKind, build_batches};
