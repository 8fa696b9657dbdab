use crate::{ConfigError, SceneConfig};
use glam::{EulerRot, Quat, Vec3};
use physync_common::BodyHandle;
use physync_physics::{BodyDesc, MaterialId, World};
use physync_render::{Scene, VisualObject};
use physync_sync::{PairingSet, SceneContext, TrackedPair};
use std::collections::{BTreeMap, BTreeSet};

fn orientation(degrees: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::XYZ,
        degrees.x.to_radians(),
        degrees.y.to_radians(),
        degrees.z.to_radians(),
    )
}

impl SceneConfig {
    /// Check the parts of the description the engines cannot check
    /// themselves: names, references, and the timestep.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.timestep.is_finite() && self.timestep > 0.0) {
            return Err(ConfigError::InvalidTimestep(self.timestep));
        }
        let mut materials = BTreeSet::new();
        for name in &self.materials {
            if !materials.insert(name.as_str()) {
                return Err(ConfigError::DuplicateMaterial(name.clone()));
            }
        }
        let known = |context: String, name: &str| {
            if materials.contains(name) {
                Ok(())
            } else {
                Err(ConfigError::UnknownMaterial {
                    context,
                    name: name.to_string(),
                })
            }
        };
        for rule in &self.contact_materials {
            for name in &rule.between {
                known("contact rule".into(), name)?;
            }
        }
        let mut entities = BTreeSet::new();
        for entity in &self.entities {
            if !entities.insert(entity.name.as_str()) {
                return Err(ConfigError::DuplicateEntity(entity.name.clone()));
            }
            if entity.body.is_none() && entity.visual.is_none() {
                return Err(ConfigError::EmptyEntity(entity.name.clone()));
            }
            if let Some(name) = entity.body.as_ref().and_then(|b| b.material.as_deref()) {
                known(format!("entity {:?}", entity.name), name)?;
            }
        }
        if let Some(target) = &self.tilt_target {
            let has_body = self
                .entities
                .iter()
                .any(|e| &e.name == target && e.body.is_some());
            if !has_body {
                return Err(ConfigError::UnknownTiltTarget(target.clone()));
            }
        }
        Ok(())
    }

    /// Build the world, the scene graph, and the pairing between them.
    ///
    /// Entities are added in file order, so handles and pairing order follow
    /// the file.
    pub fn build(&self) -> Result<SceneContext, ConfigError> {
        self.validate()?;
        let _span = tracing::info_span!("build_scene", entities = self.entities.len()).entered();

        let mut world = World::new(self.world)?;
        let materials: BTreeMap<&str, MaterialId> = self
            .materials
            .iter()
            .map(|name| (name.as_str(), world.create_material(name.clone())))
            .collect();
        for rule in &self.contact_materials {
            let [a, b] = &rule.between;
            world.add_contact_material(materials[a.as_str()], materials[b.as_str()], rule.material())?;
        }

        let mut scene = Scene::new(self.background);
        scene.axes_length = self.axes;
        for light in &self.lights {
            scene.add_light(*light);
        }

        let mut bodies: BTreeMap<&str, BodyHandle> = BTreeMap::new();
        let mut pairs = Vec::new();
        for entity in &self.entities {
            let rotation = orientation(entity.rotation);
            let body = match &entity.body {
                Some(cfg) => {
                    let mut desc = BodyDesc::dynamic(cfg.shape, cfg.mass)
                        .with_position(entity.position)
                        .with_orientation(rotation)
                        .with_linear_velocity(cfg.linear_velocity)
                        .with_linear_damping(cfg.linear_damping)
                        .with_angular_damping(cfg.angular_damping);
                    if let Some(name) = &cfg.material {
                        desc = desc.with_material(materials[name.as_str()]);
                    }
                    let handle = world.add_body(desc).map_err(|source| ConfigError::Body {
                        entity: entity.name.clone(),
                        source,
                    })?;
                    bodies.insert(entity.name.as_str(), handle);
                    Some(handle)
                }
                None => None,
            };
            let visual = entity.visual.as_ref().map(|cfg| {
                let mut object = VisualObject::new(entity.name.clone(), cfg.geometry, cfg.material)
                    .at(entity.position);
                object.transform.rotation = rotation;
                object.visible = cfg.visible;
                scene.add(object)
            });
            if let (Some(body), Some(visual)) = (body, visual) {
                pairs.push(TrackedPair::new(body, visual));
            }
        }

        let pairs = PairingSet::new(pairs)?;
        tracing::info!(
            bodies = world.body_count(),
            objects = scene.object_count(),
            pairs = pairs.len(),
            "scene built"
        );
        let mut ctx =
            SceneContext::new(world, scene, self.camera, pairs).with_timestep(self.timestep);
        if let Some(body) = self.tilt_target.as_deref().and_then(|t| bodies.get(t)) {
            ctx = ctx.with_tilt_target(*body);
        }
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use crate::{BodyConfig, ConfigError, ContactRule, EntityConfig, SceneConfig, VisualConfig};
    use glam::Vec3;
    use physync_physics::{BodyKind, Shape};
    use physync_render::{Geometry, MeshMaterial};

    #[test]
    fn default_builds_demo_with_three_pairs() {
        let ctx = SceneConfig::default().build().unwrap();
        assert_eq!(ctx.pairs().len(), 3);
        assert_eq!(ctx.world.body_count(), 3);
        assert_eq!(ctx.scene.object_count(), 5);
        assert_eq!(ctx.scene.lights().len(), 2);
        assert_eq!(ctx.scene.axes_length, 50.0);
        assert_eq!(ctx.dt(), 1.0 / 60.0);

        let sphere = ctx.scene.find("sphere").unwrap();
        let body = ctx.pairs().body_for(sphere).unwrap();
        let rb = ctx.world.body(body).unwrap();
        assert_eq!(rb.mass(), 10.0);
        assert_eq!(rb.position(), Vec3::new(0.0, 5.0, 0.0));
        let ground = ctx.pairs().body_for(ctx.scene.find("ground").unwrap()).unwrap();
        assert_eq!(ctx.world.body(ground).unwrap().kind(), BodyKind::Static);
    }

    #[test]
    fn default_scene_sphere_bounces_on_ground() {
        let mut ctx = SceneConfig::default().build().unwrap();
        let sphere = ctx.scene.find("sphere").unwrap();
        let mut rose = false;
        let body = ctx.pairs().body_for(sphere).unwrap();
        for _ in 0..120 {
            ctx.step().unwrap();
            rose |= ctx.world.body(body).unwrap().linear_velocity().y > 0.5;
            assert!(ctx.scene.get(sphere).unwrap().transform.position.y >= 4.4);
        }
        assert!(rose, "sphere never bounced");
    }

    #[test]
    fn visuals_start_at_entity_pose() {
        let mut config = SceneConfig::default();
        config.entities[3].rotation = Vec3::new(0.0, 90.0, 0.0);
        let ctx = config.build().unwrap();
        let wall = ctx.scene.get(ctx.scene.find("wall_north").unwrap()).unwrap();
        assert_eq!(wall.transform.position, Vec3::new(0.0, 5.0, 100.0));
        let turned = wall.transform.rotation * Vec3::X;
        assert!((turned - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn tilt_target_resolves_to_body() {
        let mut ctx = SceneConfig::default().build().unwrap();
        assert!(ctx.pointer_moved(glam::Vec2::new(0.0, 1.0)).is_some());

        let config = SceneConfig {
            tilt_target: Some("wall_north".into()),
            ..SceneConfig::default()
        };
        assert!(matches!(
            config.build(),
            Err(ConfigError::UnknownTiltTarget(_))
        ));
    }

    #[test]
    fn reference_errors() {
        let mut config = SceneConfig::default();
        config.contact_materials.push(ContactRule::new("ice", "sphere", 0.0, 0.0));
        assert!(matches!(
            config.build(),
            Err(ConfigError::UnknownMaterial { .. })
        ));

        let mut config = SceneConfig::default();
        config.materials.push("ground".into());
        assert!(matches!(
            config.build(),
            Err(ConfigError::DuplicateMaterial(_))
        ));

        let mut config = SceneConfig::default();
        config.entities.push(EntityConfig::new("sphere").with_visual(VisualConfig::new(
            Geometry::sphere(1.0),
            MeshMaterial::default(),
        )));
        assert!(matches!(
            config.build(),
            Err(ConfigError::DuplicateEntity(_))
        ));

        let mut config = SceneConfig::default();
        config.entities.push(EntityConfig::new("ghost"));
        assert!(matches!(config.build(), Err(ConfigError::EmptyEntity(_))));
    }

    #[test]
    fn engine_rejection_names_entity() {
        let mut config = SceneConfig::default();
        config.entities.push(
            EntityConfig::new("lead").with_body(BodyConfig::new(Shape::sphere(1.0), -2.0, None)),
        );
        match config.build() {
            Err(ConfigError::Body { entity, .. }) => assert_eq!(entity, "lead"),
            other => panic!("expected body error, got {other:?}"),
        }
    }

    #[test]
    fn bad_timestep() {
        let config = SceneConfig {
            timestep: 0.0,
            ..SceneConfig::default()
        };
        assert!(matches!(config.build(), Err(ConfigError::InvalidTimestep(_))));
    }

    #[test]
    fn body_only_entities_are_not_paired() {
        let mut config = SceneConfig::default();
        config.entities.push(
            EntityConfig::new("hidden_ball")
                .at(Vec3::new(30.0, 20.0, 0.0))
                .with_body(BodyConfig::new(Shape::sphere(1.0), 1.0, Some("sphere"))),
        );
        let ctx = config.build().unwrap();
        assert_eq!(ctx.world.body_count(), 4);
        assert_eq!(ctx.pairs().len(), 3);
    }
}
