use glam::Vec3;
use rapier3d::prelude::{ColliderBuilder, Vector};
use serde::{Deserialize, Serialize};

use crate::PhysicsError;

/// Collision shape attached to a rigid body, expressed in the body's local frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Sphere { radius: f32 },
    /// Box given by half extents along the local axes.
    Cuboid { half_extents: Vec3 },
    /// Infinite plane through the body origin. Normal is the body's local +Y.
    Plane,
}

impl Shape {
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    pub fn cuboid(half_extents: Vec3) -> Self {
        Self::Cuboid { half_extents }
    }

    pub fn plane() -> Self {
        Self::Plane
    }

    pub fn validate(&self) -> Result<(), PhysicsError> {
        match *self {
            Self::Sphere { radius } => {
                if !(radius.is_finite() && radius > 0.0) {
                    return Err(PhysicsError::InvalidShape(format!(
                        "sphere radius {radius} must be finite and > 0"
                    )));
                }
            }
            Self::Cuboid { half_extents } => {
                if !(half_extents.is_finite() && half_extents.min_element() > 0.0) {
                    return Err(PhysicsError::InvalidShape(format!(
                        "cuboid half extents {half_extents} must be finite and > 0"
                    )));
                }
            }
            Self::Plane => {}
        }
        Ok(())
    }

    pub fn is_plane(&self) -> bool {
        matches!(self, Self::Plane)
    }

    /// Rapier collider for this shape, before material and mass settings.
    pub(crate) fn collider(&self) -> ColliderBuilder {
        match *self {
            Self::Sphere { radius } => ColliderBuilder::ball(radius),
            Self::Cuboid { half_extents: h } => ColliderBuilder::cuboid(h.x, h.y, h.z),
            Self::Plane => ColliderBuilder::halfspace(Vector::y_axis()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapier3d::na::vector;

    #[test]
    fn rejects_degenerate_shapes() {
        assert!(Shape::sphere(0.0).validate().is_err());
        assert!(Shape::sphere(f32::NAN).validate().is_err());
        assert!(Shape::cuboid(Vec3::new(1.0, 0.0, 1.0)).validate().is_err());
        assert!(Shape::sphere(4.0).validate().is_ok());
        assert!(Shape::plane().validate().is_ok());
    }

    #[test]
    fn colliders_match_shape_dimensions() {
        let ball = Shape::sphere(4.0).collider().build();
        assert_eq!(ball.shape().as_ball().map(|b| b.radius), Some(4.0));
        let slab = Shape::cuboid(Vec3::new(100.0, 0.5, 100.0)).collider().build();
        let half = slab.shape().as_cuboid().map(|c| c.half_extents);
        assert_eq!(half, Some(vector![100.0, 0.5, 100.0]));
        let plane = Shape::plane().collider().build();
        let normal = plane.shape().as_halfspace().map(|h| h.normal.into_inner());
        assert_eq!(normal, Some(Vector::y()));
    }

    #[test]
    fn shape_yaml_tagging() {
        let s: Shape = serde_yaml::from_str("type: sphere\nradius: 4.0\n").unwrap();
        assert_eq!(s, Shape::sphere(4.0));
    }
}
