use crate::{PairingSet, Simulation, SyncError, VisualGraph};
use glam::Vec2;
use physync_common::BodyHandle;
use physync_render::{Camera, Renderer, Scene};

/// Fixed physics step used by every runner unless configured otherwise.
pub const DEFAULT_TIMESTEP: f32 = 1.0 / 60.0;

/// The per-frame physics-to-render loop. Holds no state of its own.
pub struct Synchronizer;

impl Synchronizer {
    /// Advance `world` by `dt`, then copy every paired body's pose onto its
    /// visual object, in pairing order.
    ///
    /// All pairs are checked before the world moves. A stale handle aborts
    /// the frame with simulated time unchanged and no visual touched.
    pub fn step<S, V>(
        world: &mut S,
        scene: &mut V,
        pairs: &PairingSet,
        dt: f32,
    ) -> Result<(), SyncError>
    where
        S: Simulation + ?Sized,
        V: VisualGraph + ?Sized,
    {
        let _span = tracing::info_span!("sync_step", pairs = pairs.len()).entered();

        for pair in pairs {
            if world.body_pose(pair.body).is_none() {
                return Err(SyncError::StaleBody {
                    body: pair.body,
                    visual: pair.visual,
                });
            }
            if scene.object_pose(pair.visual).is_none() {
                return Err(SyncError::StaleVisual {
                    body: pair.body,
                    visual: pair.visual,
                });
            }
        }

        world.advance(dt)?;

        for pair in pairs {
            let pose = world.body_pose(pair.body).ok_or(SyncError::StaleBody {
                body: pair.body,
                visual: pair.visual,
            })?;
            if !scene.set_object_pose(pair.visual, pose) {
                return Err(SyncError::StaleVisual {
                    body: pair.body,
                    visual: pair.visual,
                });
            }
            tracing::trace!(body = %pair.body, visual = %pair.visual, y = pose.position.y, "pose copied");
        }
        tracing::debug!(dt, pairs = pairs.len(), "frame synchronized");
        Ok(())
    }

    /// Render the scene as it stands. Touches neither world nor scene.
    pub fn draw<R: Renderer + ?Sized>(renderer: &R, scene: &Scene, camera: &Camera) -> R::Output {
        renderer.render(scene, camera)
    }

    /// Tilt angle the pointer asks of `body`, in radians: `-asin(pointer.y)`.
    ///
    /// Advisory only. The body is not modified.
    pub fn apply_pointer_tilt(body: BodyHandle, pointer: Vec2) -> f32 {
        let angle = physync_input::pointer_tilt_angle(pointer);
        tracing::trace!(%body, angle, "pointer tilt");
        angle
    }
}
