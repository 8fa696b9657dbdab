use glam::Vec3;
use physync_common::BodyHandle;

use crate::MaterialId;

/// Errors from physics world operations.
///
/// All of these are configuration errors: they surface while a scene is
/// being built, never in the middle of a step.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PhysicsError {
    #[error("invalid mass {0}: must be finite and >= 0")]
    InvalidMass(f32),
    #[error("invalid damping {0}: must be within [0, 1]")]
    InvalidDamping(f32),
    #[error("invalid shape: {0}")]
    InvalidShape(String),
    #[error("invalid velocity {0}: must be finite")]
    InvalidVelocity(Vec3),
    #[error("invalid timestep {0}: must be finite and > 0")]
    InvalidTimestep(f32),
    #[error("invalid solver settings: {0}")]
    InvalidSolver(String),
    #[error("{0} not found")]
    UnknownBody(BodyHandle),
    #[error("material {0:?} not found")]
    UnknownMaterial(MaterialId),
}
