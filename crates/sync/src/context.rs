use crate::{DEFAULT_TIMESTEP, PairingSet, SyncError, Synchronizer};
use glam::Vec2;
use physync_common::BodyHandle;
use physync_physics::World;
use physync_render::{Camera, Renderer, Scene};

/// Everything one running scene owns: the physics world, the scene graph,
/// the camera, and the fixed pairing between them.
#[derive(Debug)]
pub struct SceneContext {
    pub world: World,
    pub scene: Scene,
    pub camera: Camera,
    pairs: PairingSet,
    dt: f32,
    tilt_target: Option<BodyHandle>,
    tilt: f32,
}

impl SceneContext {
    pub fn new(world: World, scene: Scene, camera: Camera, pairs: PairingSet) -> Self {
        Self {
            world,
            scene,
            camera,
            pairs,
            dt: DEFAULT_TIMESTEP,
            tilt_target: None,
            tilt: 0.0,
        }
    }

    pub fn with_timestep(mut self, dt: f32) -> Self {
        self.dt = dt;
        self
    }

    /// Body that pointer tilt is reported for.
    pub fn with_tilt_target(mut self, body: BodyHandle) -> Self {
        self.tilt_target = Some(body);
        self
    }

    pub fn pairs(&self) -> &PairingSet {
        &self.pairs
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Physics steps taken so far.
    pub fn tick(&self) -> u64 {
        self.world.tick()
    }

    /// Synchronize one frame without drawing.
    pub fn step(&mut self) -> Result<(), SyncError> {
        Synchronizer::step(&mut self.world, &mut self.scene, &self.pairs, self.dt)
    }

    pub fn draw<R: Renderer + ?Sized>(&self, renderer: &R) -> R::Output {
        Synchronizer::draw(renderer, &self.scene, &self.camera)
    }

    /// Step, then draw. A failed step skips the draw.
    pub fn frame<R: Renderer + ?Sized>(&mut self, renderer: &R) -> Result<R::Output, SyncError> {
        self.step()?;
        Ok(self.draw(renderer))
    }

    /// Feed a normalized pointer position. Returns the tilt angle when a
    /// tilt target is set.
    pub fn pointer_moved(&mut self, pointer: Vec2) -> Option<f32> {
        let body = self.tilt_target?;
        self.tilt = Synchronizer::apply_pointer_tilt(body, pointer);
        Some(self.tilt)
    }

    /// Last tilt angle reported, in radians.
    pub fn tilt(&self) -> f32 {
        self.tilt
    }
}
