//! End-to-end frames over a real physics world and scene graph.

use glam::{Vec2, Vec3};
use physync_common::{BodyHandle, VisualHandle};
use physync_physics::{BodyDesc, ContactMaterial, Shape, World};
use physync_render::{
    Camera, Color, DebugTextRenderer, Geometry, MeshMaterial, Scene, VisualObject,
};
use physync_sync::{
    FrameDriver, PairingSet, SceneContext, SyncError, Synchronizer, TrackedPair,
};

const RADIUS: f32 = 4.0;
const GROUND_TOP: f32 = 0.5;
/// Penetration accepted on the step a falling body reaches the ground.
const PENETRATION_TOLERANCE: f32 = 0.1;

struct Demo {
    ctx: SceneContext,
    ground: BodyHandle,
    ball: BodyHandle,
    ball_visual: VisualHandle,
    wall: VisualHandle,
}

/// Ground slab, cover slab, one bouncing sphere, and an unpaired wall.
fn demo() -> Demo {
    let mut world = World::default();
    let ground_mat = world.create_material("ground");
    let cover_mat = world.create_material("cover");
    let ball_mat = world.create_material("sphere");
    let bouncy = ContactMaterial {
        friction: 0.0,
        restitution: 0.5,
    };
    world.add_contact_material(ground_mat, ball_mat, bouncy).unwrap();
    world.add_contact_material(cover_mat, ball_mat, bouncy).unwrap();

    let slab = Shape::cuboid(Vec3::new(100.0, 0.5, 100.0));
    let ground = world
        .add_body(BodyDesc::fixed(slab).with_material(ground_mat))
        .unwrap();
    let cover = world
        .add_body(
            BodyDesc::fixed(slab)
                .with_material(cover_mat)
                .with_position(Vec3::new(0.0, 10.0, 0.0)),
        )
        .unwrap();
    let ball = world
        .add_body(
            BodyDesc::dynamic(Shape::sphere(RADIUS), 10.0)
                .with_material(ball_mat)
                .with_position(Vec3::new(0.0, 5.0, 0.0))
                .with_linear_damping(0.01),
        )
        .unwrap();

    let mut scene = Scene::new(Color(0x8FBCD4));
    let slab_geometry = Geometry::cuboid(200.0, 1.0, 200.0);
    let ground_visual = scene.add(VisualObject::new(
        "ground",
        slab_geometry,
        MeshMaterial::colored(Color(0x2E8B57)),
    ));
    let cover_visual = scene.add(VisualObject::new(
        "cover",
        slab_geometry,
        MeshMaterial::colored(Color(0xB0C4DE)),
    ));
    let ball_visual = scene.add(VisualObject::new(
        "sphere",
        Geometry::sphere(RADIUS),
        MeshMaterial::colored(Color(0xFF4500)),
    ));
    let wall = scene.add(
        VisualObject::new(
            "wall",
            Geometry::cuboid(200.0, 10.0, 3.0),
            MeshMaterial::default(),
        )
        .at(Vec3::new(0.0, 5.0, 100.0)),
    );

    let pairs = PairingSet::new([
        TrackedPair::new(ball, ball_visual),
        TrackedPair::new(ground, ground_visual),
        TrackedPair::new(cover, cover_visual),
    ])
    .unwrap();
    let ctx = SceneContext::new(world, scene, Camera::default(), pairs).with_tilt_target(ground);
    Demo {
        ctx,
        ground,
        ball,
        ball_visual,
        wall,
    }
}

#[test]
fn free_fall_bounces_without_penetrating_then_settles() {
    let Demo {
        mut ctx,
        ball,
        ball_visual,
        ..
    } = demo();
    let rest = GROUND_TOP + RADIUS;
    let mut min_y = f32::INFINITY;
    let mut bounces = 0;
    let mut prev_vy = 0.0;
    let mut still_frames = 0;
    let mut settled_at = None;

    for frame in 0..600 {
        ctx.step().unwrap();
        let body = ctx.world.body(ball).unwrap();
        let vy = body.linear_velocity().y;
        let y = ctx.scene.get(ball_visual).unwrap().transform.position.y;
        min_y = min_y.min(y);
        if prev_vy < -0.5 && vy > 0.5 {
            bounces += 1;
        }
        prev_vy = vy;

        if vy.abs() < 0.05 && (y - rest).abs() < 0.05 {
            still_frames += 1;
            if still_frames == 30 && settled_at.is_none() {
                settled_at = Some(frame);
            }
        } else {
            still_frames = 0;
        }
    }

    assert!(min_y >= rest - PENETRATION_TOLERANCE, "sphere sank to {min_y}");
    assert!(bounces >= 1, "no bounce observed");
    assert!(settled_at.is_some(), "sphere never settled");
    let final_y = ctx.world.pose(ball).unwrap().position.y;
    assert!((final_y - rest).abs() < 0.05, "final y = {final_y}");
}

#[test]
fn small_sphere_bounces_on_infinite_plane() {
    let mut world = World::default();
    let m = world.create_material("any");
    world
        .add_contact_material(
            m,
            m,
            ContactMaterial {
                friction: 0.0,
                restitution: 0.5,
            },
        )
        .unwrap();
    world
        .add_body(BodyDesc::fixed(Shape::plane()).with_material(m))
        .unwrap();
    let ball = world
        .add_body(
            BodyDesc::dynamic(Shape::sphere(1.0), 10.0)
                .with_material(m)
                .with_position(Vec3::new(0.0, 5.0, 0.0)),
        )
        .unwrap();
    let mut scene = Scene::default();
    let visual = scene.add(VisualObject::new(
        "ball",
        Geometry::sphere(1.0),
        MeshMaterial::default(),
    ));
    let pairs = PairingSet::new([TrackedPair::new(ball, visual)]).unwrap();
    let mut ctx = SceneContext::new(world, scene, Camera::default(), pairs);

    // At most one step of motion at impact speed ends up inside the plane.
    let impact_step = (2.0 * 9.82 * 4.0_f32).sqrt() / 60.0;
    let mut peak_after_bounce: f32 = 0.0;
    let mut bounced = false;
    let mut prev_vy = 0.0;
    for _ in 0..240 {
        ctx.step().unwrap();
        let body = ctx.world.body(ball).unwrap();
        let vy = body.linear_velocity().y;
        assert!(
            body.position().y >= 1.0 - impact_step,
            "y = {}",
            body.position().y
        );
        if prev_vy < -1.0 && vy > 1.0 {
            bounced = true;
        }
        if bounced {
            peak_after_bounce = peak_after_bounce.max(body.position().y);
        }
        prev_vy = vy;
    }
    assert!(bounced);
    // Restitution 0.5 returns a quarter of the drop height.
    assert!(
        peak_after_bounce > 1.5 && peak_after_bounce < 2.5,
        "peak {peak_after_bounce}"
    );
}

#[test]
fn every_pair_matches_its_body_after_each_step() {
    let Demo { mut ctx, .. } = demo();
    for _ in 0..120 {
        ctx.step().unwrap();
        for pair in ctx.pairs() {
            let body = ctx.world.pose(pair.body).unwrap();
            let visual = ctx.scene.get(pair.visual).unwrap().pose();
            assert!(visual.bits_eq(&body), "{} drifted from {}", pair.visual, pair.body);
        }
    }
}

#[test]
fn identical_scenes_stay_identical() {
    let mut a = demo().ctx;
    let mut b = demo().ctx;
    let renderer = DebugTextRenderer::new();
    for _ in 0..300 {
        let fa = a.frame(&renderer).unwrap();
        let fb = b.frame(&renderer).unwrap();
        assert_eq!(fa, fb);
    }
    assert_eq!(a.world.state_hash(), b.world.state_hash());
}

#[test]
fn static_bodies_and_their_visuals_never_move() {
    let Demo {
        mut ctx, ground, ..
    } = demo();
    let before = ctx.world.pose(ground).unwrap();
    let visual = ctx
        .pairs()
        .iter()
        .find(|p| p.body == ground)
        .map(|p| p.visual)
        .unwrap();
    FrameDriver::run_frames(&mut ctx, &DebugTextRenderer::new(), 300);
    assert!(ctx.world.pose(ground).unwrap().bits_eq(&before));
    assert!(ctx.scene.get(visual).unwrap().pose().bits_eq(&before));
}

#[test]
fn unpaired_objects_are_untouched() {
    let Demo {
        mut ctx, wall, ..
    } = demo();
    let before = ctx.scene.get(wall).unwrap().clone();
    FrameDriver::run_frames(&mut ctx, &DebugTextRenderer::new(), 60);
    assert_eq!(ctx.scene.get(wall).unwrap(), &before);
}

#[test]
fn draw_is_idempotent_and_read_only() {
    let Demo { mut ctx, .. } = demo();
    let renderer = DebugTextRenderer::new();
    FrameDriver::run_frames(&mut ctx, &renderer, 10);
    let hash = ctx.world.state_hash();
    let first = Synchronizer::draw(&renderer, &ctx.scene, &ctx.camera);
    let second = Synchronizer::draw(&renderer, &ctx.scene, &ctx.camera);
    assert_eq!(first, second);
    assert_eq!(ctx.world.state_hash(), hash);
    assert_eq!(ctx.tick(), 10);
}

#[test]
fn stale_body_fails_frame_without_advancing() {
    let Demo {
        mut ctx,
        ball,
        ball_visual,
        ..
    } = demo();
    ctx.step().unwrap();
    let visual_before = ctx.scene.get(ball_visual).unwrap().pose();
    ctx.world.remove_body(ball);
    let elapsed = ctx.world.elapsed();

    let err = ctx.frame(&DebugTextRenderer::new()).unwrap_err();
    assert_eq!(
        err,
        SyncError::StaleBody {
            body: ball,
            visual: ball_visual
        }
    );
    assert_eq!(ctx.world.elapsed(), elapsed);
    assert_eq!(ctx.tick(), 1);
    assert!(ctx.scene.get(ball_visual).unwrap().pose().bits_eq(&visual_before));
}

#[test]
fn duplicate_visual_is_rejected() {
    let Demo {
        ctx,
        ball,
        ground,
        ball_visual,
        ..
    } = demo();
    let err = PairingSet::new([
        TrackedPair::new(ball, ball_visual),
        TrackedPair::new(ground, ball_visual),
    ])
    .unwrap_err();
    assert_eq!(err, SyncError::DuplicateVisual(ball_visual));
    assert_eq!(ctx.pairs().len(), 3);
}

#[test]
fn pointer_tilt_reference_angles() {
    let Demo { mut ctx, .. } = demo();
    let hash = ctx.world.state_hash();
    let top = ctx.pointer_moved(Vec2::new(0.0, 1.0)).unwrap();
    assert!((top + std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    assert_eq!(ctx.pointer_moved(Vec2::ZERO), Some(0.0));
    assert_eq!(ctx.world.state_hash(), hash);
}
