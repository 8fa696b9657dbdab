use physync_common::{BodyHandle, Pose, VisualHandle};
use physync_physics::{PhysicsError, World};
use physync_render::Scene;

/// What the synchronizer needs from a physics engine.
pub trait Simulation {
    /// Advance simulated time by exactly `dt` seconds.
    fn advance(&mut self, dt: f32) -> Result<(), PhysicsError>;

    /// Post-step pose of a body, or `None` if the handle is stale.
    fn body_pose(&self, body: BodyHandle) -> Option<Pose>;
}

/// What the synchronizer needs from a scene graph.
pub trait VisualGraph {
    fn object_pose(&self, visual: VisualHandle) -> Option<Pose>;

    /// Overwrite position and orientation. Returns false if the handle is
    /// stale.
    fn set_object_pose(&mut self, visual: VisualHandle, pose: Pose) -> bool;
}

impl Simulation for World {
    fn advance(&mut self, dt: f32) -> Result<(), PhysicsError> {
        self.step(dt).map(|_| ())
    }

    fn body_pose(&self, body: BodyHandle) -> Option<Pose> {
        self.pose(body)
    }
}

impl VisualGraph for Scene {
    fn object_pose(&self, visual: VisualHandle) -> Option<Pose> {
        self.get(visual).map(|o| o.pose())
    }

    fn set_object_pose(&mut self, visual: VisualHandle, pose: Pose) -> bool {
        self.set_pose(visual, pose)
    }
}
