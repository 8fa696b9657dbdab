use glam::Vec3;
use physync_common::{HandleAllocator, Pose, Transform, VisualHandle};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An sRGB color stored as `0xRRGGBB`.
///
/// Deserializes from an integer or a `"#rrggbb"` string; serializes as the
/// string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ColorRepr", into = "String")]
pub struct Color(pub u32);

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Hex(u32),
    Text(String),
}

impl TryFrom<ColorRepr> for Color {
    type Error = String;

    fn try_from(repr: ColorRepr) -> Result<Self, Self::Error> {
        match repr {
            ColorRepr::Hex(v) if v <= 0xFF_FFFF => Ok(Self(v)),
            ColorRepr::Hex(v) => Err(format!("color {v:#x} exceeds 0xFFFFFF")),
            ColorRepr::Text(s) => {
                let digits = s
                    .strip_prefix('#')
                    .or_else(|| s.strip_prefix("0x"))
                    .unwrap_or(&s);
                if digits.len() != 6 {
                    return Err(format!("color {s:?} must have six hex digits"));
                }
                u32::from_str_radix(digits, 16)
                    .map(Self)
                    .map_err(|e| format!("color {s:?}: {e}"))
            }
        }
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        format!("#{:06x}", c.0)
    }
}

impl Color {
    pub const WHITE: Self = Self(0xFF_FFFF);
    pub const BLACK: Self = Self(0x00_0000);

    /// Gamma-encoded channels in [0, 1].
    pub fn srgb(&self) -> [f32; 3] {
        let r = ((self.0 >> 16) & 0xFF) as f32 / 255.0;
        let g = ((self.0 >> 8) & 0xFF) as f32 / 255.0;
        let b = (self.0 & 0xFF) as f32 / 255.0;
        [r, g, b]
    }

    /// Linear-light channels, for lighting math.
    pub fn linear(&self) -> [f32; 3] {
        self.srgb().map(srgb_to_linear)
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Shape of a mesh, in local units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geometry {
    Sphere {
        radius: f32,
        #[serde(default = "default_segments")]
        width_segments: u32,
        #[serde(default = "default_segments")]
        height_segments: u32,
    },
    Box {
        width: f32,
        height: f32,
        depth: f32,
    },
    /// Flat rectangle in the local XZ plane.
    Plane { width: f32, depth: f32 },
}

fn default_segments() -> u32 {
    20
}

impl Geometry {
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere {
            radius,
            width_segments: default_segments(),
            height_segments: default_segments(),
        }
    }

    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        Self::Box {
            width,
            height,
            depth,
        }
    }

    /// Full size along each local axis.
    pub fn extents(&self) -> Vec3 {
        match *self {
            Self::Sphere { radius, .. } => Vec3::splat(2.0 * radius),
            Self::Box {
                width,
                height,
                depth,
            } => Vec3::new(width, height, depth),
            Self::Plane { width, depth } => Vec3::new(width, 0.0, depth),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Sphere { .. } => "sphere",
            Self::Box { .. } => "box",
            Self::Plane { .. } => "plane",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshMaterial {
    pub color: Color,
    pub opacity: f32,
    pub transparent: bool,
    pub flat_shading: bool,
}

impl Default for MeshMaterial {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            opacity: 1.0,
            transparent: false,
            flat_shading: true,
        }
    }
}

impl MeshMaterial {
    pub fn colored(color: Color) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Light {
    Hemisphere {
        sky: Color,
        ground: Color,
        intensity: f32,
    },
    Directional {
        color: Color,
        intensity: f32,
        position: Vec3,
    },
    Ambient {
        color: Color,
        intensity: f32,
    },
}

/// A mesh in the scene graph.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualObject {
    pub name: String,
    pub geometry: Geometry,
    pub material: MeshMaterial,
    pub transform: Transform,
    pub visible: bool,
}

impl VisualObject {
    pub fn new(name: impl Into<String>, geometry: Geometry, material: MeshMaterial) -> Self {
        Self {
            name: name.into(),
            geometry,
            material,
            transform: Transform::default(),
            visible: true,
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn pose(&self) -> Pose {
        self.transform.pose()
    }
}

/// Root of the render graph: background, lights, and visual objects.
///
/// The scene owns its objects. Handles are never reused, so a handle kept
/// after `remove` stays stale.
#[derive(Debug, Clone)]
pub struct Scene {
    pub background: Color,
    /// Length of the world axes gizmo; zero hides it.
    pub axes_length: f32,
    objects: BTreeMap<VisualHandle, VisualObject>,
    lights: Vec<Light>,
    handles: HandleAllocator,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(Color::BLACK)
    }
}

impl Scene {
    pub fn new(background: Color) -> Self {
        Self {
            background,
            axes_length: 0.0,
            objects: BTreeMap::new(),
            lights: Vec::new(),
            handles: HandleAllocator::new(),
        }
    }

    pub fn add(&mut self, object: VisualObject) -> VisualHandle {
        let handle = VisualHandle(self.handles.next_id());
        tracing::debug!(%handle, name = %object.name, kind = object.geometry.kind(), "visual added");
        self.objects.insert(handle, object);
        handle
    }

    pub fn remove(&mut self, handle: VisualHandle) -> Option<VisualObject> {
        self.objects.remove(&handle)
    }

    pub fn contains(&self, handle: VisualHandle) -> bool {
        self.objects.contains_key(&handle)
    }

    pub fn get(&self, handle: VisualHandle) -> Option<&VisualObject> {
        self.objects.get(&handle)
    }

    pub fn get_mut(&mut self, handle: VisualHandle) -> Option<&mut VisualObject> {
        self.objects.get_mut(&handle)
    }

    /// Overwrite an object's position and orientation. Returns false if the
    /// handle is stale.
    pub fn set_pose(&mut self, handle: VisualHandle, pose: Pose) -> bool {
        match self.objects.get_mut(&handle) {
            Some(object) => {
                object.transform.set_pose(pose);
                true
            }
            None => false,
        }
    }

    pub fn objects(&self) -> &BTreeMap<VisualHandle, VisualObject> {
        &self.objects
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn find(&self, name: &str) -> Option<VisualHandle> {
        self.objects
            .iter()
            .find(|(_, o)| o.name == name)
            .map(|(h, _)| *h)
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn color_parses_hex_forms() {
        let a: Color = serde_json::from_str("9419988").unwrap();
        let b: Color = serde_json::from_str("\"#8FBCD4\"").unwrap();
        let c: Color = serde_json::from_str("\"0x8fbcd4\"").unwrap();
        assert_eq!(a, Color(0x8FBCD4));
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"#8fbcd4\"");
        assert!(serde_json::from_str::<Color>("\"#fff\"").is_err());
    }

    #[test]
    fn linear_conversion_endpoints() {
        assert_eq!(Color::WHITE.linear(), [1.0, 1.0, 1.0]);
        assert_eq!(Color::BLACK.linear(), [0.0, 0.0, 0.0]);
        let mid = Color(0x808080).linear()[0];
        assert!(mid > 0.2 && mid < 0.23);
    }

    #[test]
    fn add_remove_and_stale_handles() {
        let mut scene = Scene::new(Color(0x8FBCD4));
        let h = scene.add(VisualObject::new(
            "ball",
            Geometry::sphere(4.0),
            MeshMaterial::default(),
        ));
        assert!(scene.contains(h));
        assert_eq!(scene.find("ball"), Some(h));
        assert!(scene.remove(h).is_some());
        assert!(!scene.set_pose(h, Pose::IDENTITY));
        let h2 = scene.add(VisualObject::new(
            "ball",
            Geometry::sphere(4.0),
            MeshMaterial::default(),
        ));
        assert_ne!(h, h2);
    }

    #[test]
    fn set_pose_leaves_scale() {
        let mut scene = Scene::default();
        let h = scene.add(VisualObject::new(
            "crate",
            Geometry::cuboid(1.0, 1.0, 1.0),
            MeshMaterial::default(),
        ));
        scene.get_mut(h).unwrap().transform.scale = Vec3::splat(3.0);
        let pose = Pose::new(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_z(0.3));
        assert!(scene.set_pose(h, pose));
        let object = scene.get(h).unwrap();
        assert_eq!(object.pose(), pose);
        assert_eq!(object.transform.scale, Vec3::splat(3.0));
    }

    #[test]
    fn geometry_extents() {
        assert_eq!(Geometry::sphere(4.0).extents(), Vec3::splat(8.0));
        assert_eq!(
            Geometry::cuboid(200.0, 1.0, 200.0).extents(),
            Vec3::new(200.0, 1.0, 200.0)
        );
        let g: Geometry = serde_json::from_str(r#"{"type":"sphere","radius":2.0}"#).unwrap();
        assert_eq!(g, Geometry::sphere(2.0));
    }
}
