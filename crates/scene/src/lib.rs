//! Declarative scene descriptions.
//!
//! A [`SceneConfig`] lists materials, contact rules, lights, camera, and
//! entities. [`SceneConfig::build`] turns it into a ready-to-run
//! [`physync_sync::SceneContext`]; entities with both a body and a visual
//! become tracked pairs.
//!
//! # Invariants
//! - Entities are created in file order, so identical files build identical
//!   worlds.
//! - Every name reference is checked before any engine object is created.

mod build;
mod config;
mod error;

pub use config::{
    BodyConfig, ContactRule, EntityConfig, SCENE_SCHEMA_VERSION, SceneConfig, VisualConfig,
};
pub use error::ConfigError;
