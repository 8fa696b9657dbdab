//! Physics-to-render synchronization.
//!
//! Each frame advances the physics world by a fixed step, copies every
//! tracked body's position and orientation onto its visual object, then
//! draws. [`Synchronizer`] is the loop itself; [`SceneContext`] bundles one
//! running scene; [`FrameDriver`] runs frames without a window.
//!
//! # Invariants
//! - The physics step completes before any pose is copied.
//! - After a successful step every paired visual's pose is bit-for-bit equal
//!   to its body's. Velocity and scale are never copied.
//! - Only paired visual objects are written; drawing writes nothing.
//! - A stale pairing fails the frame before simulated time advances.

mod context;
mod driver;
mod error;
mod pairing;
mod synchronizer;
mod traits;

pub use context::SceneContext;
pub use driver::{FrameDriver, FrameStats};
pub use error::SyncError;
pub use pairing::{PairingSet, TrackedPair};
pub use synchronizer::{DEFAULT_TIMESTEP, Synchronizer};
pub use traits::{Simulation, VisualGraph};
