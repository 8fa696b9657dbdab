//! Input boundary: window pointer events reduced to normalized coordinates.
//!
//! # Invariants
//! - Normalized pointers map the viewport onto [-1, 1] on both axes, +y up.
//! - Tilt angles are always finite.

pub mod pointer;

pub use pointer::{PointerState, normalize_pointer, pointer_tilt_angle, rotate_2d};
