use physync_common::{BodyHandle, VisualHandle};
use physync_physics::PhysicsError;

/// Errors from the synchronization loop.
///
/// Stale and duplicate handles are contract violations in the caller's
/// pairing: the frame is aborted and nothing is retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyncError {
    #[error("pair {visual} <- {body}: body no longer exists")]
    StaleBody {
        body: BodyHandle,
        visual: VisualHandle,
    },
    #[error("pair {visual} <- {body}: visual object no longer exists")]
    StaleVisual {
        body: BodyHandle,
        visual: VisualHandle,
    },
    #[error("{0} is paired more than once")]
    DuplicateVisual(VisualHandle),
    #[error("physics step failed: {0}")]
    Physics(#[from] PhysicsError),
}
