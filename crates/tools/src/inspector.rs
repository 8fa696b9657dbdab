use glam::{Quat, Vec3};
use physync_common::{BodyHandle, VisualHandle};
use physync_sync::SceneContext;

/// Frame inspector for developer tooling.
///
/// Provides read-only queries against a scene context for the CLI, logs,
/// and the desktop HUD.
pub struct FrameInspector;

impl FrameInspector {
    /// Produce a summary of the current frame.
    pub fn summary(ctx: &SceneContext) -> FrameSummary {
        let stats = ctx.world.last_step();
        FrameSummary {
            tick: ctx.tick(),
            elapsed: ctx.world.elapsed(),
            body_count: ctx.world.body_count(),
            object_count: ctx.scene.object_count(),
            pair_count: ctx.pairs().len(),
            contacts: stats.contacts,
            solver_iterations: stats.solver_iterations,
            tilt: ctx.tilt(),
        }
    }

    /// Details of every tracked pair, in pairing order. Pairs whose handles
    /// have gone stale are skipped.
    pub fn pairs(ctx: &SceneContext) -> Vec<PairInfo> {
        ctx.pairs()
            .iter()
            .filter_map(|pair| {
                let body = ctx.world.body(pair.body)?;
                let object = ctx.scene.get(pair.visual)?;
                Some(PairInfo {
                    body: pair.body,
                    visual: pair.visual,
                    name: object.name.clone(),
                    position: body.position(),
                    orientation: body.orientation(),
                    speed: body.linear_velocity().length(),
                    is_static: body.is_static(),
                    in_sync: object.pose().bits_eq(&body.pose()),
                })
            })
            .collect()
    }

    /// Look up one pair by visual name.
    pub fn find_pair(ctx: &SceneContext, name: &str) -> Option<PairInfo> {
        Self::pairs(ctx).into_iter().find(|p| p.name == name)
    }
}

/// Summary of a scene context for the inspector.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSummary {
    pub tick: u64,
    pub elapsed: f64,
    pub body_count: usize,
    pub object_count: usize,
    pub pair_count: usize,
    pub contacts: usize,
    pub solver_iterations: u32,
    pub tilt: f32,
}

impl std::fmt::Display for FrameSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Frame: tick={} t={:.3}s bodies={} objects={} pairs={} contacts={} iterations={}",
            self.tick,
            self.elapsed,
            self.body_count,
            self.object_count,
            self.pair_count,
            self.contacts,
            self.solver_iterations
        )
    }
}

/// Detailed info about a single tracked pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PairInfo {
    pub body: BodyHandle,
    pub visual: VisualHandle,
    pub name: String,
    pub position: Vec3,
    pub orientation: Quat,
    pub speed: f32,
    pub is_static: bool,
    /// Whether the visual currently shows the body's exact pose.
    pub in_sync: bool,
}

impl std::fmt::Display for PairInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{} <- {}] pos=({:.3}, {:.3}, {:.3}) speed={:.3}{}",
            self.name,
            self.visual,
            self.body,
            self.position.x,
            self.position.y,
            self.position.z,
            self.speed,
            if self.is_static { " static" } else { "" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use physync_physics::{BodyDesc, Shape, World};
    use physync_render::{Camera, Geometry, MeshMaterial, Scene, VisualObject};
    use physync_sync::{PairingSet, TrackedPair};

    fn context() -> SceneContext {
        let mut world = World::default();
        let floor = world.add_body(BodyDesc::fixed(Shape::plane())).unwrap();
        let ball = world
            .add_body(
                BodyDesc::dynamic(Shape::sphere(1.0), 1.0).with_position(Vec3::new(0.0, 4.0, 0.0)),
            )
            .unwrap();
        let mut scene = Scene::default();
        let floor_v = scene.add(VisualObject::new(
            "floor",
            Geometry::Plane {
                width: 10.0,
                depth: 10.0,
            },
            MeshMaterial::default(),
        ));
        let ball_v = scene.add(VisualObject::new(
            "ball",
            Geometry::sphere(1.0),
            MeshMaterial::default(),
        ));
        scene.add(VisualObject::new(
            "marker",
            Geometry::sphere(0.1),
            MeshMaterial::default(),
        ));
        let pairs = PairingSet::new([
            TrackedPair::new(floor, floor_v),
            TrackedPair::new(ball, ball_v),
        ])
        .unwrap();
        SceneContext::new(world, scene, Camera::default(), pairs)
    }

    #[test]
    fn summary_counts() {
        let mut ctx = context();
        let summary = FrameInspector::summary(&ctx);
        assert_eq!(summary.tick, 0);
        assert_eq!(summary.body_count, 2);
        assert_eq!(summary.object_count, 3);
        assert_eq!(summary.pair_count, 2);

        ctx.step().unwrap();
        let summary = FrameInspector::summary(&ctx);
        assert_eq!(summary.tick, 1);
        assert!(summary.to_string().contains("tick=1"));
    }

    #[test]
    fn pairs_report_sync_state() {
        let mut ctx = context();
        let before = FrameInspector::pairs(&ctx);
        assert_eq!(before.len(), 2);
        assert!(before[0].is_static);
        // Visuals start at the origin, the ball body does not.
        assert!(!before[1].in_sync);

        ctx.step().unwrap();
        let after = FrameInspector::pairs(&ctx);
        assert!(after.iter().all(|p| p.in_sync));
        assert!(after[1].speed > 0.0);
    }

    #[test]
    fn find_pair_by_name() {
        let ctx = context();
        let ball = FrameInspector::find_pair(&ctx, "ball").unwrap();
        assert_eq!(ball.position, Vec3::new(0.0, 4.0, 0.0));
        assert!(ball.to_string().starts_with("ball [visual#1 <- body#1]"));
        assert!(FrameInspector::find_pair(&ctx, "marker").is_none());
    }

    #[test]
    fn stale_pairs_are_skipped() {
        let mut ctx = context();
        let ball_v = ctx.scene.find("ball").unwrap();
        ctx.scene.remove(ball_v);
        assert_eq!(FrameInspector::pairs(&ctx).len(), 1);
    }
}
