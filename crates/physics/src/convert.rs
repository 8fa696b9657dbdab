//! glam <-> nalgebra conversions at the rapier boundary.

use glam::{Quat, Vec3};
use physync_common::Pose;
use rapier3d::na::{Quaternion, UnitQuaternion};
use rapier3d::prelude::*;

pub(crate) fn vec3_to_rapier(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

pub(crate) fn rapier_to_vec3(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub(crate) fn pose_to_isometry(pose: Pose) -> Isometry<Real> {
    let q = pose.orientation;
    Isometry::from_parts(
        Translation::from(vec3_to_rapier(pose.position)),
        UnitQuaternion::new_normalize(Quaternion::new(q.w, q.x, q.y, q.z)),
    )
}

pub(crate) fn isometry_to_pose(iso: &Isometry<Real>) -> Pose {
    let q = iso.rotation.coords;
    Pose::new(
        rapier_to_vec3(&iso.translation.vector),
        Quat::from_xyzw(q.x, q.y, q.z, q.w),
    )
}
