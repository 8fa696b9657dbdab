//! Developer tooling: read-only inspection of a running scene.
//!
//! # Invariants
//! - Inspection never mutates the world or the scene.

mod inspector;

pub use inspector::{FrameInspector, FrameSummary, PairInfo};
