//! Rigid-body physics world on top of rapier3d: bodies, shapes, contact
//! materials, and fixed-step stepping addressed by stable handles.
//!
//! # Invariants
//! - Bodies are inserted into rapier in handle order; two worlds built by the
//!   same sequence of calls stay bit-identical step for step.
//! - Static bodies (mass 0) are rapier fixed bodies and never move.
//! - Friction and restitution of every contact come from the material pair
//!   rule, or the world's default contact when no rule is registered.
//! - Configuration problems are reported when bodies or worlds are created,
//!   never from inside a step.

mod body;
mod convert;
mod error;
mod material;
mod shape;
mod world;

pub use body::{BodyDesc, BodyKind, BodyState, DEFAULT_DAMPING};
pub use error::PhysicsError;
pub use material::{ContactMaterial, MaterialId};
pub use shape::Shape;
pub use world::{DEFAULT_GRAVITY, SolverConfig, StepStats, World, WorldConfig};
