use crate::{Camera, Scene};
use std::fmt::Write;

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer reads the scene graph and a camera, then produces output. It
/// never mutates the scene, so drawing twice without an intervening step
/// yields the same picture.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame.
    fn render(&self, scene: &Scene, camera: &Camera) -> Self::Output;
}

/// Text renderer for logs, the CLI, and tests.
///
/// Lists every visible object with its pose. Fixed precision keeps output
/// stable across runs.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    pub include_hidden: bool,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &Scene, camera: &Camera) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Scene (objects={}, lights={}, background={}) ===",
            scene.object_count(),
            scene.lights().len(),
            String::from(scene.background)
        );
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}",
            camera.eye.x,
            camera.eye.y,
            camera.eye.z,
            camera.target.x,
            camera.target.y,
            camera.target.z,
            camera.fov_degrees
        );

        for (handle, object) in scene.objects() {
            if !object.visible && !self.include_hidden {
                continue;
            }
            let p = object.transform.position;
            let q = object.transform.rotation;
            let _ = writeln!(
                out,
                "  [{handle}] {} {} pos=({:.3}, {:.3}, {:.3}) rot=({:.3}, {:.3}, {:.3}, {:.3})",
                object.name,
                object.geometry.kind(),
                p.x,
                p.y,
                p.z,
                q.x,
                q.y,
                q.z,
                q.w
            );
        }

        out
    }
}
