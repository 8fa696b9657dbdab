use glam::Vec3;
use physync_common::{BodyHandle, HandleAllocator, Pose};
use rapier3d::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use crate::body::{BodyState, material_from_tag};
use crate::convert::{isometry_to_pose, rapier_to_vec3, vec3_to_rapier};
use crate::material::MaterialTable;
use crate::{BodyDesc, ContactMaterial, MaterialId, PhysicsError};

/// Standard gravity used by the demo scenes.
pub const DEFAULT_GRAVITY: Vec3 = Vec3::new(0.0, -9.82, 0.0);

/// Solver settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Velocity iterations per step. Fixed; the solver never stops early.
    pub iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self { iterations: 8 }
    }
}

impl SolverConfig {
    fn solver_iterations(&self) -> Result<NonZeroUsize, PhysicsError> {
        NonZeroUsize::new(self.iterations as usize).ok_or_else(|| {
            PhysicsError::InvalidSolver(format!("iterations {} must be >= 1", self.iterations))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub gravity: Vec3,
    pub solver: SolverConfig,
    /// Rule for material pairs without a registered contact material.
    pub default_contact: ContactMaterial,
    /// Sweep fast dynamic bodies so they cannot pass through thin geometry
    /// within one step.
    pub continuous_collision: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            solver: SolverConfig::default(),
            default_contact: ContactMaterial::default(),
            continuous_collision: true,
        }
    }
}

/// Diagnostics from the most recent step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Collider pairs whose bounding volumes overlap.
    pub candidate_pairs: usize,
    /// Pairs with at least one active contact point.
    pub contacts: usize,
    pub solver_iterations: u32,
}

/// Mapping from one of our handles to the rapier objects behind it.
#[derive(Debug, Clone, Copy)]
struct BodyEntry {
    body: RigidBodyHandle,
    collider: ColliderHandle,
    desc: BodyDesc,
}

/// The physics world: owns every rigid body and advances them in time.
///
/// Bodies are inserted into rapier in handle order and listed from a
/// BTreeMap, so two worlds built by the same sequence of calls step to
/// bit-identical states.
pub struct World {
    config: WorldConfig,
    entries: BTreeMap<BodyHandle, BodyEntry>,
    handles: HandleAllocator,
    materials: MaterialTable,
    tick: u64,
    elapsed: f64,
    last_step: StepStats,

    pipeline: PhysicsPipeline,
    params: IntegrationParameters,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("config", &self.config)
            .field("bodies", &self.entries.len())
            .field("materials", &self.materials.len())
            .field("tick", &self.tick)
            .field("elapsed", &self.elapsed)
            .field("last_step", &self.last_step)
            .finish_non_exhaustive()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::build(WorldConfig::default())
    }
}

impl World {
    /// Create an empty world. Fails if the solver settings or gravity are
    /// unusable.
    pub fn new(config: WorldConfig) -> Result<Self, PhysicsError> {
        config.solver.solver_iterations()?;
        check_gravity(config.gravity)?;
        Ok(Self::build(config))
    }

    fn build(config: WorldConfig) -> Self {
        let params = IntegrationParameters {
            num_solver_iterations: config
                .solver
                .solver_iterations()
                .unwrap_or(NonZeroUsize::MIN),
            ..IntegrationParameters::default()
        };
        Self {
            config,
            entries: BTreeMap::new(),
            handles: HandleAllocator::new(),
            materials: MaterialTable::new(config.default_contact),
            tick: 0,
            elapsed: 0.0,
            last_step: StepStats::default(),
            pipeline: PhysicsPipeline::new(),
            params,
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn gravity(&self) -> Vec3 {
        self.config.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec3) -> Result<(), PhysicsError> {
        check_gravity(gravity)?;
        self.config.gravity = gravity;
        for (_, rb) in self.bodies.iter_mut() {
            rb.wake_up(true);
        }
        Ok(())
    }

    /// Number of completed steps.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn last_step(&self) -> StepStats {
        self.last_step
    }

    pub fn body_count(&self) -> usize {
        self.entries.len()
    }

    pub fn create_material(&mut self, name: impl Into<String>) -> MaterialId {
        self.materials.create(name)
    }

    /// Register the friction/restitution rule for a material pair.
    pub fn add_contact_material(
        &mut self,
        a: MaterialId,
        b: MaterialId,
        rule: ContactMaterial,
    ) -> Result<(), PhysicsError> {
        for id in [a, b] {
            if !self.materials.contains(id) {
                return Err(PhysicsError::UnknownMaterial(id));
            }
        }
        self.materials.set_rule(a, b, rule);
        Ok(())
    }

    pub fn add_body(&mut self, desc: BodyDesc) -> Result<BodyHandle, PhysicsError> {
        desc.validate()?;
        if let Some(material) = desc.material {
            if !self.materials.contains(material) {
                return Err(PhysicsError::UnknownMaterial(material));
            }
        }
        let body = self
            .bodies
            .insert(desc.rigid_body(self.config.continuous_collision));
        let collider = self
            .colliders
            .insert_with_parent(desc.collider(), body, &mut self.bodies);
        let handle = BodyHandle(self.handles.next_id());
        tracing::debug!(%handle, mass = desc.mass, shape = ?desc.shape, "body added");
        self.entries.insert(
            handle,
            BodyEntry {
                body,
                collider,
                desc,
            },
        );
        Ok(handle)
    }

    /// Destroy a body and its collider. The handle is never reissued.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Option<BodyState> {
        let state = self.body(handle)?;
        let entry = self.entries.remove(&handle)?;
        self.bodies.remove(
            entry.body,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        tracing::debug!(%handle, "body removed");
        Some(state)
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    pub fn body(&self, handle: BodyHandle) -> Option<BodyState> {
        let entry = self.entries.get(&handle)?;
        let rb = self.bodies.get(entry.body)?;
        let material = self
            .colliders
            .get(entry.collider)
            .and_then(|c| material_from_tag(c.user_data));
        Some(BodyState {
            kind: entry.desc.kind(),
            mass: entry.desc.mass,
            shape: entry.desc.shape,
            material,
            pose: isometry_to_pose(rb.position()),
            linear_velocity: rapier_to_vec3(rb.linvel()),
            angular_velocity: rapier_to_vec3(rb.angvel()),
        })
    }

    pub fn pose(&self, handle: BodyHandle) -> Option<Pose> {
        let entry = self.entries.get(&handle)?;
        self.bodies
            .get(entry.body)
            .map(|rb| isometry_to_pose(rb.position()))
    }

    /// Advance the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) -> Result<StepStats, PhysicsError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(PhysicsError::InvalidTimestep(dt));
        }
        let _span = tracing::trace_span!("physics_step", tick = self.tick + 1).entered();

        self.params.dt = dt;
        let gravity = vec3_to_rapier(self.config.gravity);
        self.pipeline.step(
            &gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &self.materials,
            &(),
        );

        let mut stats = StepStats {
            solver_iterations: self.config.solver.iterations,
            ..StepStats::default()
        };
        for pair in self.narrow_phase.contact_pairs() {
            stats.candidate_pairs += 1;
            if pair.has_any_active_contact {
                stats.contacts += 1;
            }
        }

        self.tick += 1;
        self.elapsed += f64::from(dt);
        self.last_step = stats;
        tracing::trace!(
            tick = self.tick,
            pairs = stats.candidate_pairs,
            contacts = stats.contacts,
            "physics step complete"
        );
        Ok(stats)
    }

    /// Deterministic hash of every body's pose and velocity, in handle order.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(&mut h, &self.tick.to_le_bytes());
        for (handle, entry) in &self.entries {
            let Some(rb) = self.bodies.get(entry.body) else {
                continue;
            };
            mix(&mut h, &handle.0.to_le_bytes());
            let pose = isometry_to_pose(rb.position());
            for v in pose
                .position
                .to_array()
                .into_iter()
                .chain(pose.orientation.to_array())
                .chain(rapier_to_vec3(rb.linvel()).to_array())
                .chain(rapier_to_vec3(rb.angvel()).to_array())
            {
                mix(&mut h, &v.to_le_bytes());
            }
        }
        h
    }
}

fn check_gravity(gravity: Vec3) -> Result<(), PhysicsError> {
    if gravity.is_finite() {
        Ok(())
    } else {
        Err(PhysicsError::InvalidSolver(format!(
            "gravity {gravity} must be finite"
        )))
    }
}
