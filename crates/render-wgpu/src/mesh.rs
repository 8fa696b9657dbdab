use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use physync_render::{Geometry, Light, Scene};
use std::f32::consts::{PI, TAU};
use std::ops::Range;

/// Segment count of the shared sphere mesh in both directions.
pub(crate) const SPHERE_SEGMENTS: u32 = 20;

/// Flat geometry is drawn as a box this thin.
const MIN_EXTENT: f32 = 1e-3;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub(crate) struct Uniforms {
    pub view_proj: [[f32; 4]; 4],
    pub light_dir: [f32; 4],
    pub light_color: [f32; 4],
    pub sky_color: [f32; 4],
    pub ground_color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    pub model_0: [f32; 4],
    pub model_1: [f32; 4],
    pub model_2: [f32; 4],
    pub model_3: [f32; 4],
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub(crate) struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

/// Which shared mesh an object is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshKind {
    /// Unit-diameter UV sphere.
    Sphere,
    /// Unit cube; boxes and planes.
    Cube,
}

/// A contiguous run of instances drawn with one mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub mesh: MeshKind,
    pub transparent: bool,
    pub instances: Range<u32>,
}

/// Generate unit cube vertices and indices.
pub(crate) fn cube_mesh() -> (Vec<Vertex>, Vec<u16>) {
    let p = 0.5_f32;
    #[rustfmt::skip]
    let vertices = vec![
        // +Z face
        Vertex { position: [-p, -p,  p], normal: [0.0, 0.0, 1.0] },
        Vertex { position: [ p, -p,  p], normal: [0.0, 0.0, 1.0] },
        Vertex { position: [ p,  p,  p], normal: [0.0, 0.0, 1.0] },
        Vertex { position: [-p,  p,  p], normal: [0.0, 0.0, 1.0] },
        // -Z face
        Vertex { position: [ p, -p, -p], normal: [0.0, 0.0, -1.0] },
        Vertex { position: [-p, -p, -p], normal: [0.0, 0.0, -1.0] },
        Vertex { position: [-p,  p, -p], normal: [0.0, 0.0, -1.0] },
        Vertex { position: [ p,  p, -p], normal: [0.0, 0.0, -1.0] },
        // +X face
        Vertex { position: [ p, -p,  p], normal: [1.0, 0.0, 0.0] },
        Vertex { position: [ p, -p, -p], normal: [1.0, 0.0, 0.0] },
        Vertex { position: [ p,  p, -p], normal: [1.0, 0.0, 0.0] },
        Vertex { position: [ p,  p,  p], normal: [1.0, 0.0, 0.0] },
        // -X face
        Vertex { position: [-p, -p, -p], normal: [-1.0, 0.0, 0.0] },
        Vertex { position: [-p, -p,  p], normal: [-1.0, 0.0, 0.0] },
        Vertex { position: [-p,  p,  p], normal: [-1.0, 0.0, 0.0] },
        Vertex { position: [-p,  p, -p], normal: [-1.0, 0.0, 0.0] },
        // +Y face
        Vertex { position: [-p,  p,  p], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [ p,  p,  p], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [ p,  p, -p], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [-p,  p, -p], normal: [0.0, 1.0, 0.0] },
        // -Y face
        Vertex { position: [-p, -p, -p], normal: [0.0, -1.0, 0.0] },
        Vertex { position: [ p, -p, -p], normal: [0.0, -1.0, 0.0] },
        Vertex { position: [ p, -p,  p], normal: [0.0, -1.0, 0.0] },
        Vertex { position: [-p, -p,  p], normal: [0.0, -1.0, 0.0] },
    ];
    #[rustfmt::skip]
    let indices: Vec<u16> = vec![
        0,1,2, 2,3,0,       // +Z
        4,5,6, 6,7,4,       // -Z
        8,9,10, 10,11,8,    // +X
        12,13,14, 14,15,12, // -X
        16,17,18, 18,19,16, // +Y
        20,21,22, 22,23,20, // -Y
    ];
    (vertices, indices)
}

/// UV sphere of diameter 1, counter-clockwise from outside. Pole rows emit
/// one triangle per quad.
pub(crate) fn sphere_mesh(width_segments: u32, height_segments: u32) -> (Vec<Vertex>, Vec<u16>) {
    let (w, h) = (width_segments.max(3), height_segments.max(2));
    let mut vertices = Vec::with_capacity(((w + 1) * (h + 1)) as usize);
    for iy in 0..=h {
        let theta = iy as f32 / h as f32 * PI;
        for ix in 0..=w {
            let phi = ix as f32 / w as f32 * TAU;
            let normal = Vec3::new(
                -phi.cos() * theta.sin(),
                theta.cos(),
                phi.sin() * theta.sin(),
            );
            vertices.push(Vertex {
                position: (normal * 0.5).to_array(),
                normal: normal.to_array(),
            });
        }
    }

    let row = w + 1;
    let at = |iy: u32, ix: u32| (iy * row + ix) as u16;
    let mut indices = Vec::new();
    for iy in 0..h {
        for ix in 0..w {
            let a = at(iy, ix + 1);
            let b = at(iy, ix);
            let c = at(iy + 1, ix);
            let d = at(iy + 1, ix + 1);
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != h - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }
    (vertices, indices)
}

/// Axes gizmo: X red, Y green, Z blue, each `length` long from the origin.
pub(crate) fn axes_lines(length: f32) -> Vec<LineVertex> {
    let axes = [
        (Vec3::X, [1.0, 0.0, 0.0, 1.0]),
        (Vec3::Y, [0.0, 1.0, 0.0, 1.0]),
        (Vec3::Z, [0.0, 0.0, 1.0, 1.0]),
    ];
    axes.iter()
        .flat_map(|&(dir, color)| {
            [
                LineVertex {
                    position: [0.0; 3],
                    color,
                },
                LineVertex {
                    position: (dir * length).to_array(),
                    color,
                },
            ]
        })
        .collect()
}

/// Per-instance data for every visible object, grouped into batches:
/// opaque spheres, opaque cubes, transparent spheres, transparent cubes.
/// Empty batches are omitted.
pub fn build_batches(scene: &Scene) -> (Vec<InstanceData>, Vec<Batch>) {
    let mut groups: [Vec<InstanceData>; 4] = Default::default();
    for object in scene.objects().values().filter(|o| o.visible) {
        let mesh = mesh_kind(&object.geometry);
        let m = &object.material;
        let transparent = m.transparent && m.opacity < 1.0;
        let t = &object.transform;
        let scale = t.scale * object.geometry.extents().max(Vec3::splat(MIN_EXTENT));
        let cols = Mat4::from_scale_rotation_translation(scale, t.rotation, t.position)
            .to_cols_array_2d();
        let [r, g, b] = m.color.linear();
        let alpha = if transparent { m.opacity.clamp(0.0, 1.0) } else { 1.0 };
        let slot = usize::from(transparent) * 2 + usize::from(mesh == MeshKind::Cube);
        groups[slot].push(InstanceData {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
            color: [r, g, b, alpha],
        });
    }

    let mut instances = Vec::new();
    let mut batches = Vec::new();
    for (slot, group) in groups.into_iter().enumerate() {
        if group.is_empty() {
            continue;
        }
        let start = instances.len() as u32;
        instances.extend(group);
        batches.push(Batch {
            mesh: if slot % 2 == 0 {
                MeshKind::Sphere
            } else {
                MeshKind::Cube
            },
            transparent: slot >= 2,
            instances: start..instances.len() as u32,
        });
    }
    (instances, batches)
}

fn mesh_kind(geometry: &Geometry) -> MeshKind {
    match geometry {
        Geometry::Sphere { .. } => MeshKind::Sphere,
        Geometry::Box { .. } | Geometry::Plane { .. } => MeshKind::Cube,
    }
}

/// Lighting terms for the mesh shader: the first directional light and the
/// first hemisphere light, plus every ambient light. A scene without lights
/// gets a fixed overhead key light.
pub(crate) fn lighting(scene: &Scene) -> ([f32; 4], [f32; 4], [f32; 4], [f32; 4]) {
    if scene.lights().is_empty() {
        return (
            Vec3::new(0.3, 1.0, 0.5).normalize().extend(0.0).to_array(),
            [0.7, 0.7, 0.7, 0.0],
            [0.3, 0.3, 0.3, 0.0],
            [0.3, 0.3, 0.3, 0.0],
        );
    }

    let scaled = |c: [f32; 3], intensity: f32| Vec3::from_array(c) * (intensity / PI);
    let mut dir = Vec3::Y;
    let mut key = Vec3::ZERO;
    let mut sky = Vec3::ZERO;
    let mut ground = Vec3::ZERO;
    let (mut have_key, mut have_hemi) = (false, false);
    for light in scene.lights() {
        match *light {
            Light::Directional {
                color,
                intensity,
                position,
            } if !have_key => {
                dir = position.normalize_or(Vec3::Y);
                key = scaled(color.linear(), intensity);
                have_key = true;
            }
            Light::Hemisphere {
                sky: s,
                ground: g,
                intensity,
            } if !have_hemi => {
                sky += scaled(s.linear(), intensity);
                ground += scaled(g.linear(), intensity);
                have_hemi = true;
            }
            Light::Ambient { color, intensity } => {
                let a = scaled(color.linear(), intensity);
                sky += a;
                ground += a;
            }
            _ => {}
        }
    }
    (
        dir.extend(0.0).to_array(),
        key.extend(0.0).to_array(),
        sky.extend(0.0).to_array(),
        ground.extend(0.0).to_array(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;
    use physync_common::Pose;
    use physync_render::{Color, MeshMaterial, VisualObject};

    fn outward(vertices: &[Vertex], indices: &[u16]) -> bool {
        indices.chunks(3).all(|tri| {
            let [a, b, c] = [0, 1, 2].map(|i| Vec3::from_array(vertices[tri[i] as usize].position));
            let n = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            n.dot(centroid) > -1e-6
        })
    }

    #[test]
    fn cube_faces_point_outward() {
        let (v, i) = cube_mesh();
        assert_eq!(i.len(), 36);
        assert!(outward(&v, &i));
    }

    #[test]
    fn sphere_mesh_is_closed_and_outward() {
        let (v, i) = sphere_mesh(SPHERE_SEGMENTS, SPHERE_SEGMENTS);
        assert_eq!(v.len(), 21 * 21);
        // Two triangles per quad, minus one per quad on each pole row.
        assert_eq!(i.len(), (20 * 20 * 2 - 2 * 20) * 3);
        assert!(i.iter().all(|&idx| (idx as usize) < v.len()));
        assert!(v
            .iter()
            .all(|vx| (Vec3::from_array(vx.position).length() - 0.5).abs() < 1e-5));
        assert!(outward(&v, &i));
    }

    #[test]
    fn axes_have_three_segments() {
        let lines = axes_lines(50.0);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[3].position, [0.0, 50.0, 0.0]);
    }

    #[test]
    fn batches_split_by_mesh_and_transparency() {
        let mut scene = Scene::default();
        let glass = MeshMaterial {
            opacity: 0.5,
            transparent: true,
            ..MeshMaterial::default()
        };
        scene.add(VisualObject::new("slab", Geometry::cuboid(200.0, 1.0, 200.0), glass));
        scene.add(VisualObject::new("ball", Geometry::sphere(4.0), MeshMaterial::default()));
        scene.add(VisualObject::new("wall", Geometry::cuboid(200.0, 10.0, 3.0), MeshMaterial::default()));
        let hidden = scene.add(VisualObject::new("ghost", Geometry::sphere(1.0), MeshMaterial::default()));
        scene.get_mut(hidden).unwrap().visible = false;

        let (instances, batches) = build_batches(&scene);
        assert_eq!(instances.len(), 3);
        assert_eq!(
            batches,
            vec![
                Batch { mesh: MeshKind::Sphere, transparent: false, instances: 0..1 },
                Batch { mesh: MeshKind::Cube, transparent: false, instances: 1..2 },
                Batch { mesh: MeshKind::Cube, transparent: true, instances: 2..3 },
            ]
        );
        assert_eq!(instances[2].color[3], 0.5);
    }

    #[test]
    fn instance_model_carries_pose_and_extents() {
        let mut scene = Scene::default();
        let h = scene.add(VisualObject::new(
            "ball",
            Geometry::sphere(4.0),
            MeshMaterial::colored(Color::WHITE),
        ));
        let pose = Pose::new(Vec3::new(1.0, 5.0, -2.0), Quat::from_rotation_y(0.5));
        scene.set_pose(h, pose);

        let (instances, _) = build_batches(&scene);
        let model = Mat4::from_cols_array_2d(&[
            instances[0].model_0,
            instances[0].model_1,
            instances[0].model_2,
            instances[0].model_3,
        ]);
        let (scale, rotation, translation) = model.to_scale_rotation_translation();
        assert!((scale - Vec3::splat(8.0)).length() < 1e-4);
        assert!(rotation.angle_between(pose.orientation) < 1e-4);
        assert_eq!(translation, pose.position);
        assert_eq!(instances[0].color, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn lighting_uses_scene_lights() {
        let mut scene = Scene::default();
        let (dir, _, sky, _) = lighting(&scene);
        assert!(dir[1] > 0.0 && sky[0] > 0.0);

        scene.add_light(Light::Directional {
            color: Color::WHITE,
            intensity: PI,
            position: Vec3::new(40.0, 40.0, -40.0),
        });
        scene.add_light(Light::Hemisphere {
            sky: Color::WHITE,
            ground: Color::BLACK,
            intensity: PI,
        });
        let (dir, key, sky, ground) = lighting(&scene);
        let d = Vec3::new(dir[0], dir[1], dir[2]);
        assert!((d - Vec3::new(1.0, 1.0, -1.0).normalize()).length() < 1e-5);
        assert!((key[0] - 1.0).abs() < 1e-5);
        assert!((sky[1] - 1.0).abs() < 1e-5);
        assert_eq!(ground[2], 0.0);
    }
}
