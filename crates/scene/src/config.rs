use crate::ConfigError;
use glam::Vec3;
use physync_physics::{ContactMaterial, DEFAULT_DAMPING, Shape, WorldConfig};
use physync_render::{Camera, Color, Geometry, Light, MeshMaterial};
use physync_sync::DEFAULT_TIMESTEP;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current scene file schema version.
pub const SCENE_SCHEMA_VERSION: u32 = 1;

/// A complete scene: physics settings, render settings, and entities.
///
/// Every field has a default, so a file only needs to list what differs
/// from the demo scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub version: u32,
    pub world: WorldConfig,
    /// Fixed physics step in seconds.
    pub timestep: f32,
    pub background: Color,
    /// Axes gizmo length; zero hides it.
    pub axes: f32,
    pub camera: Camera,
    pub lights: Vec<Light>,
    pub materials: Vec<String>,
    pub contact_materials: Vec<ContactRule>,
    pub entities: Vec<EntityConfig>,
    /// Entity whose body the pointer tilt is reported for.
    pub tilt_target: Option<String>,
}

/// Friction and restitution between two named materials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRule {
    pub between: [String; 2],
    #[serde(default)]
    pub friction: f32,
    #[serde(default)]
    pub restitution: f32,
}

impl ContactRule {
    pub fn new(a: &str, b: &str, friction: f32, restitution: f32) -> Self {
        Self {
            between: [a.to_string(), b.to_string()],
            friction,
            restitution,
        }
    }

    pub fn material(&self) -> ContactMaterial {
        ContactMaterial {
            friction: self.friction,
            restitution: self.restitution,
        }
    }
}

/// One named thing in the scene. With both a body and a visual it becomes a
/// tracked pair; with only a visual it is scenery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityConfig {
    pub name: String,
    #[serde(default)]
    pub position: Vec3,
    /// Euler angles in degrees, applied X then Y then Z.
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<BodyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual: Option<VisualConfig>,
}

impl EntityConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            body: None,
            visual: None,
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_body(mut self, body: BodyConfig) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_visual(mut self, visual: VisualConfig) -> Self {
        self.visual = Some(visual);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    pub shape: Shape,
    /// Zero makes the body static.
    #[serde(default)]
    pub mass: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default = "default_damping")]
    pub linear_damping: f32,
    #[serde(default = "default_damping")]
    pub angular_damping: f32,
    #[serde(default)]
    pub linear_velocity: Vec3,
}

fn default_damping() -> f32 {
    DEFAULT_DAMPING
}

impl BodyConfig {
    pub fn new(shape: Shape, mass: f32, material: Option<&str>) -> Self {
        Self {
            shape,
            mass,
            material: material.map(str::to_string),
            linear_damping: DEFAULT_DAMPING,
            angular_damping: DEFAULT_DAMPING,
            linear_velocity: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualConfig {
    pub geometry: Geometry,
    #[serde(default)]
    pub material: MeshMaterial,
    #[serde(default = "visible_by_default")]
    pub visible: bool,
}

fn visible_by_default() -> bool {
    true
}

impl VisualConfig {
    pub fn new(geometry: Geometry, material: MeshMaterial) -> Self {
        Self {
            geometry,
            material,
            visible: true,
        }
    }
}

impl Default for SceneConfig {
    /// The bouncing-sphere demo: a sphere dropped between a ground slab and a
    /// cover slab, with two walls for reference.
    fn default() -> Self {
        let slab = Shape::cuboid(Vec3::new(100.0, 0.5, 100.0));
        let slab_visual = VisualConfig::new(
            Geometry::cuboid(200.0, 1.0, 200.0),
            MeshMaterial {
                color: Color::WHITE,
                opacity: 0.5,
                transparent: true,
                flat_shading: true,
            },
        );
        let wall_visual = VisualConfig::new(
            Geometry::cuboid(200.0, 10.0, 3.0),
            MeshMaterial::colored(Color::WHITE),
        );
        let sphere = BodyConfig::new(Shape::sphere(4.0), 10.0, Some("sphere"));

        Self {
            version: SCENE_SCHEMA_VERSION,
            world: WorldConfig::default(),
            timestep: DEFAULT_TIMESTEP,
            background: Color(0x8FBCD4),
            axes: 50.0,
            camera: Camera::default(),
            lights: vec![
                Light::Hemisphere {
                    sky: Color(0xDDEEFF),
                    ground: Color(0x202020),
                    intensity: 3.0,
                },
                Light::Directional {
                    color: Color::WHITE,
                    intensity: 5.0,
                    position: Vec3::new(40.0, 40.0, -40.0),
                },
            ],
            materials: vec!["ground".into(), "cover".into(), "sphere".into()],
            contact_materials: vec![
                ContactRule::new("ground", "sphere", 0.0, 0.5),
                ContactRule::new("cover", "sphere", 0.0, 0.5),
            ],
            entities: vec![
                EntityConfig::new("ground")
                    .with_body(BodyConfig::new(slab, 0.0, Some("ground")))
                    .with_visual(slab_visual.clone()),
                EntityConfig::new("cover")
                    .at(Vec3::new(0.0, 10.0, 0.0))
                    .with_body(BodyConfig::new(slab, 0.0, Some("cover")))
                    .with_visual(slab_visual),
                EntityConfig::new("sphere")
                    .at(Vec3::new(0.0, 5.0, 0.0))
                    .with_body(sphere)
                    .with_visual(VisualConfig::new(
                        Geometry::sphere(4.0),
                        MeshMaterial::colored(Color::WHITE),
                    )),
                EntityConfig::new("wall_north")
                    .at(Vec3::new(0.0, 5.0, 100.0))
                    .with_visual(wall_visual.clone()),
                EntityConfig::new("wall_south")
                    .at(Vec3::new(0.0, 5.0, -100.0))
                    .with_visual(wall_visual),
            ],
            tilt_target: Some("ground".into()),
        }
    }
}

impl SceneConfig {
    /// Load a scene file, picking the format from its extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = match Format::of(path)? {
            Format::Yaml => serde_yaml::from_str(&text)?,
            Format::Json => serde_json::from_str(&text)?,
        };
        config.check_version()?;
        tracing::info!(path = %path.display(), entities = config.entities.len(), "scene loaded");
        Ok(config)
    }

    /// Write the scene to disk in the format its extension names.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)?;
        match Format::of(path)? {
            Format::Yaml => serde_yaml::to_writer(file, self)?,
            Format::Json => serde_json::to_writer_pretty(file, self)?,
        }
        Ok(())
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.check_version()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    fn check_version(&self) -> Result<(), ConfigError> {
        if self.version != SCENE_SCHEMA_VERSION {
            return Err(ConfigError::SchemaMismatch {
                file_version: self.version,
                expected_version: SCENE_SCHEMA_VERSION,
            });
        }
        Ok(())
    }
}

enum Format {
    Yaml,
    Json,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_demo_scene() {
        let config = SceneConfig::default();
        assert_eq!(config.world.gravity, Vec3::new(0.0, -9.82, 0.0));
        assert_eq!(config.world.solver.iterations, 8);
        assert_eq!(config.timestep, 1.0 / 60.0);
        assert_eq!(config.background, Color(0x8FBCD4));
        assert_eq!(config.camera.eye, Vec3::new(-200.0, 130.0, 0.0));
        assert_eq!(config.entities.len(), 5);
        let paired = config
            .entities
            .iter()
            .filter(|e| e.body.is_some() && e.visual.is_some())
            .count();
        assert_eq!(paired, 3);
    }

    #[test]
    fn yaml_round_trip() {
        let config = SceneConfig::default();
        let text = config.to_yaml().unwrap();
        assert!(text.contains("background: '#8fbcd4'") || text.contains("background: \"#8fbcd4\""));
        let back = SceneConfig::from_yaml_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let text = r#"
timestep: 0.01
materials: [floor]
entities:
  - name: floor
    body:
      shape: { type: plane }
      material: floor
"#;
        let config = SceneConfig::from_yaml_str(text).unwrap();
        assert_eq!(config.timestep, 0.01);
        assert_eq!(config.version, SCENE_SCHEMA_VERSION);
        let body = config.entities[0].body.as_ref().unwrap();
        assert_eq!(body.mass, 0.0);
        assert_eq!(body.linear_damping, DEFAULT_DAMPING);
        assert!(config.entities[0].visual.is_none());
    }

    #[test]
    fn world_settings_from_yaml() {
        let text = r#"
world:
  gravity: [0.0, -1.62, 0.0]
  solver: { iterations: 12, tolerance: 0.1 }
  continuous_collision: false
"#;
        let config = SceneConfig::from_yaml_str(text).unwrap();
        assert_eq!(config.world.gravity, Vec3::new(0.0, -1.62, 0.0));
        assert_eq!(config.world.solver.iterations, 12);
        assert!(!config.world.continuous_collision);
        assert!(config.world.default_contact.friction > 0.0);
    }

    #[test]
    fn rejects_future_schema() {
        let err = SceneConfig::from_yaml_str("version: 7").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::SchemaMismatch {
                file_version: 7,
                expected_version: 1
            }
        ));
    }

    #[test]
    fn save_and_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let config = SceneConfig::default();
        for name in ["scene.yaml", "scene.yml", "scene.json"] {
            let path = dir.path().join(name);
            config.save(&path).unwrap();
            assert_eq!(SceneConfig::load(&path).unwrap(), config);
        }
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.toml");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(
            SceneConfig::load(&path),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SceneConfig::load(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
