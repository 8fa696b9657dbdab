//! Shared handle and transform types used across the physync crates.

mod types;

pub use types::{BodyHandle, HandleAllocator, Pose, Transform, VisualHandle};
