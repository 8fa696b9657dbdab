//! Render side: a renderer-agnostic scene graph and the `Renderer` trait.
//!
//! # Invariants
//! - Renderers never mutate the scene.
//! - Visual handles are never reused within one scene.
//! - Object iteration order is handle order.

mod camera;
mod renderer;
mod scene;

pub use camera::Camera;
pub use renderer::{DebugTextRenderer, Renderer};
pub use scene::{Color, Geometry, Light, MeshMaterial, Scene, VisualObject};
