use physync_physics::PhysicsError;
use physync_sync::SyncError;
use std::path::PathBuf;

/// Errors from loading or building a scene. All are fatal to startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported scene file {0:?}: expected .yaml, .yml or .json")]
    UnsupportedFormat(PathBuf),
    #[error("schema version mismatch: file has v{file_version}, expected v{expected_version}")]
    SchemaMismatch {
        file_version: u32,
        expected_version: u32,
    },
    #[error("invalid timestep {0}: must be finite and > 0")]
    InvalidTimestep(f32),
    #[error("material {0:?} declared twice")]
    DuplicateMaterial(String),
    #[error("{context} refers to unknown material {name:?}")]
    UnknownMaterial { context: String, name: String },
    #[error("entity {0:?} declared twice")]
    DuplicateEntity(String),
    #[error("entity {0:?} has neither a body nor a visual")]
    EmptyEntity(String),
    #[error("tilt target {0:?} is not an entity with a body")]
    UnknownTiltTarget(String),
    #[error("entity {entity:?}: {source}")]
    Body {
        entity: String,
        #[source]
        source: PhysicsError,
    },
    #[error("physics: {0}")]
    Physics(#[from] PhysicsError),
    #[error("pairing: {0}")]
    Sync(#[from] SyncError),
}
