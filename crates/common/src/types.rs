use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Handle to a rigid body owned by a physics world.
///
/// Issued sequentially by the world and never reused, so two worlds built
/// with the same sequence of operations hand out identical handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u64);

/// Handle to a visual object owned by a scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VisualHandle(pub u64);

impl std::fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

impl std::fmt::Display for VisualHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "visual#{}", self.0)
    }
}

/// Monotonic handle allocator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HandleAllocator {
    next: u64,
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the next raw id and advance.
    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.next
    }
}

/// Position and orientation. The unit of physics-to-render synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            orientation: Quat::IDENTITY,
        }
    }

    /// Transform a point from local space into world space.
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.orientation * local
    }

    /// Transform a world-space point into local space.
    pub fn inverse_transform_point(&self, world: Vec3) -> Vec3 {
        self.orientation.inverse() * (world - self.position)
    }

    /// Bitwise equality of all seven scalars.
    pub fn bits_eq(&self, other: &Pose) -> bool {
        let a = self.position.to_array();
        let b = other.position.to_array();
        let qa = self.orientation.to_array();
        let qb = other.orientation.to_array();
        a.iter().zip(b.iter()).all(|(x, y)| x.to_bits() == y.to_bits())
            && qa.iter().zip(qb.iter()).all(|(x, y)| x.to_bits() == y.to_bits())
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Spatial transform of a visual object: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.rotation)
    }

    /// Overwrite position and rotation, leaving scale untouched.
    pub fn set_pose(&mut self, pose: Pose) {
        self.position = pose.position;
        self.rotation = pose.orientation;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_is_sequential() {
        let mut alloc = HandleAllocator::new();
        assert_eq!(alloc.next_id(), 0);
        assert_eq!(alloc.next_id(), 1);
        assert_eq!(alloc.issued(), 2);
    }

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
    }

    #[test]
    fn set_pose_keeps_scale() {
        let mut t = Transform {
            scale: Vec3::splat(2.0),
            ..Transform::default()
        };
        let pose = Pose::new(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_x(0.5));
        t.set_pose(pose);
        assert_eq!(t.pose(), pose);
        assert_eq!(t.scale, Vec3::splat(2.0));
    }

    #[test]
    fn pose_point_round_trip() {
        let pose = Pose::new(Vec3::new(0.0, 5.0, 0.0), Quat::from_rotation_y(1.0));
        let p = Vec3::new(1.0, 2.0, 3.0);
        let back = pose.inverse_transform_point(pose.transform_point(p));
        assert!((back - p).length() < 1e-5);
    }

    #[test]
    fn bits_eq_distinguishes_signed_zero() {
        let a = Pose::from_position(Vec3::new(0.0, 0.0, 0.0));
        let b = Pose::from_position(Vec3::new(-0.0, 0.0, 0.0));
        assert_eq!(a, b);
        assert!(!a.bits_eq(&b));
        assert!(a.bits_eq(&a));
    }
}
