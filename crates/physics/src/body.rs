use glam::{Quat, Vec3};
use physync_common::Pose;
use rapier3d::prelude::{ActiveHooks, Collider, RigidBodyBuilder};
use serde::{Deserialize, Serialize};

use crate::convert::{pose_to_isometry, vec3_to_rapier};
use crate::{MaterialId, PhysicsError, Shape};

/// Linear and angular damping used when a description leaves them unset.
pub const DEFAULT_DAMPING: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyKind {
    /// Mass 0. Never moved by the solver.
    Static,
    Dynamic,
}

/// Description of a body to add to a world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyDesc {
    pub mass: f32,
    pub shape: Shape,
    pub material: Option<MaterialId>,
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl Default for BodyDesc {
    fn default() -> Self {
        Self {
            mass: 0.0,
            shape: Shape::sphere(1.0),
            material: None,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            linear_damping: DEFAULT_DAMPING,
            angular_damping: DEFAULT_DAMPING,
        }
    }
}

impl BodyDesc {
    /// A static (mass 0) body.
    pub fn fixed(shape: Shape) -> Self {
        Self {
            shape,
            ..Self::default()
        }
    }

    pub fn dynamic(shape: Shape, mass: f32) -> Self {
        Self {
            shape,
            mass,
            ..Self::default()
        }
    }

    pub fn with_material(mut self, material: MaterialId) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_linear_velocity(mut self, velocity: Vec3) -> Self {
        self.linear_velocity = velocity;
        self
    }

    pub fn with_angular_velocity(mut self, velocity: Vec3) -> Self {
        self.angular_velocity = velocity;
        self
    }

    pub fn with_linear_damping(mut self, damping: f32) -> Self {
        self.linear_damping = damping;
        self
    }

    pub fn with_angular_damping(mut self, damping: f32) -> Self {
        self.angular_damping = damping;
        self
    }

    pub fn validate(&self) -> Result<(), PhysicsError> {
        if !(self.mass.is_finite() && self.mass >= 0.0) {
            return Err(PhysicsError::InvalidMass(self.mass));
        }
        self.shape.validate()?;
        if self.shape.is_plane() && self.mass > 0.0 {
            return Err(PhysicsError::InvalidShape(
                "plane bodies must be static (mass 0)".into(),
            ));
        }
        for damping in [self.linear_damping, self.angular_damping] {
            if !(0.0..=1.0).contains(&damping) {
                return Err(PhysicsError::InvalidDamping(damping));
            }
        }
        if !(self.position.is_finite() && self.orientation.is_finite()) {
            return Err(PhysicsError::InvalidShape("non-finite initial pose".into()));
        }
        if self.orientation.length_squared() < 1e-12 {
            return Err(PhysicsError::InvalidShape("zero initial orientation".into()));
        }
        for v in [self.linear_velocity, self.angular_velocity] {
            if !v.is_finite() {
                return Err(PhysicsError::InvalidVelocity(v));
            }
        }
        Ok(())
    }

    pub fn kind(&self) -> BodyKind {
        if self.mass > 0.0 {
            BodyKind::Dynamic
        } else {
            BodyKind::Static
        }
    }

    /// Rapier body for a validated description. Static bodies drop their
    /// initial velocities.
    pub(crate) fn rigid_body(&self, ccd: bool) -> rapier3d::prelude::RigidBody {
        let pose = pose_to_isometry(Pose::new(self.position, self.orientation));
        match self.kind() {
            BodyKind::Static => RigidBodyBuilder::fixed().position(pose).build(),
            BodyKind::Dynamic => RigidBodyBuilder::dynamic()
                .position(pose)
                .linvel(vec3_to_rapier(self.linear_velocity))
                .angvel(vec3_to_rapier(self.angular_velocity))
                .linear_damping(self.linear_damping)
                .angular_damping(self.angular_damping)
                .ccd_enabled(ccd)
                .build(),
        }
    }

    /// Collider carrying the shape, the mass, and the material tag that
    /// contact hooks resolve friction and restitution from.
    pub(crate) fn collider(&self) -> Collider {
        let mut builder = self
            .shape
            .collider()
            .user_data(material_tag(self.material))
            .active_hooks(ActiveHooks::MODIFY_SOLVER_CONTACTS);
        if self.kind() == BodyKind::Dynamic {
            builder = builder.mass(self.mass);
        }
        builder.build()
    }
}

/// Collider user data: 0 for no material, otherwise id + 1.
pub(crate) fn material_tag(material: Option<MaterialId>) -> u128 {
    material.map_or(0, |m| u128::from(m.0) + 1)
}

pub(crate) fn material_from_tag(tag: u128) -> Option<MaterialId> {
    tag.checked_sub(1)
        .and_then(|id| u32::try_from(id).ok())
        .map(MaterialId)
}

/// Snapshot of a body's state after the last step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub(crate) kind: BodyKind,
    pub(crate) mass: f32,
    pub(crate) shape: Shape,
    pub(crate) material: Option<MaterialId>,
    pub(crate) pose: Pose,
    pub(crate) linear_velocity: Vec3,
    pub(crate) angular_velocity: Vec3,
}

impl BodyState {
    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    pub fn is_static(&self) -> bool {
        self.kind == BodyKind::Static
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn material(&self) -> Option<MaterialId> {
        self.material
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn position(&self) -> Vec3 {
        self.pose.position
    }

    pub fn orientation(&self) -> Quat {
        self.pose.orientation
    }

    pub fn linear_velocity(&self) -> Vec3 {
        self.linear_velocity
    }

    pub fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }
}
