use crate::SceneContext;
use physync_render::Renderer;

/// Outcome of a driven run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames attempted.
    pub frames: u64,
    /// Frames whose step failed and were not drawn.
    pub failed: u64,
    /// Whether the stop predicate fired.
    pub stopped: bool,
}

impl std::fmt::Display for FrameStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "frames={} failed={} stopped={}",
            self.frames, self.failed, self.stopped
        )
    }
}

/// Runs frames back to back without a wall clock. Stands in for the window
/// system's redraw loop in the CLI and in tests.
pub struct FrameDriver;

impl FrameDriver {
    pub fn run_frames<R: Renderer + ?Sized>(
        ctx: &mut SceneContext,
        renderer: &R,
        n: u64,
    ) -> FrameStats {
        Self::run_until(ctx, renderer, n, |_, _| false)
    }

    /// Run up to `max_frames` frames, stopping after the first successful
    /// frame for which `predicate` returns true.
    ///
    /// A failing frame is logged and skipped; the next one runs as usual.
    pub fn run_until<R, P>(
        ctx: &mut SceneContext,
        renderer: &R,
        max_frames: u64,
        mut predicate: P,
    ) -> FrameStats
    where
        R: Renderer + ?Sized,
        P: FnMut(&SceneContext, &R::Output) -> bool,
    {
        let mut stats = FrameStats::default();
        while stats.frames < max_frames {
            stats.frames += 1;
            match ctx.frame(renderer) {
                Ok(output) => {
                    if predicate(ctx, &output) {
                        stats.stopped = true;
                        break;
                    }
                }
                Err(e) => {
                    stats.failed += 1;
                    tracing::error!(frame = stats.frames, error = %e, "frame failed");
                }
            }
        }
        tracing::debug!(%stats, "driver finished");
        stats
    }
}
