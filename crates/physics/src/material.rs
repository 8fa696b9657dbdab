use rapier3d::prelude::{ContactModificationContext, PhysicsHooks};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::body::material_from_tag;

/// Identifier of a physics material registered with a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialId(pub u32);

/// Friction and restitution applied when two specific materials touch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactMaterial {
    pub friction: f32,
    pub restitution: f32,
}

impl Default for ContactMaterial {
    fn default() -> Self {
        Self {
            friction: 0.3,
            restitution: 0.0,
        }
    }
}

/// Registered materials and the contact rules between them.
///
/// Rules are keyed by an unordered material pair.
#[derive(Debug, Clone, Default)]
pub(crate) struct MaterialTable {
    names: Vec<String>,
    rules: BTreeMap<(MaterialId, MaterialId), ContactMaterial>,
    fallback: ContactMaterial,
}

impl MaterialTable {
    pub fn new(fallback: ContactMaterial) -> Self {
        Self {
            fallback,
            ..Self::default()
        }
    }

    pub fn create(&mut self, name: impl Into<String>) -> MaterialId {
        let id = MaterialId(self.names.len() as u32);
        self.names.push(name.into());
        id
    }

    pub fn contains(&self, id: MaterialId) -> bool {
        (id.0 as usize) < self.names.len()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn set_rule(&mut self, a: MaterialId, b: MaterialId, rule: ContactMaterial) {
        self.rules.insert(key(a, b), rule);
    }

    /// Rule for a contact between two (possibly unset) materials.
    pub fn resolve(&self, a: Option<MaterialId>, b: Option<MaterialId>) -> ContactMaterial {
        match (a, b) {
            (Some(a), Some(b)) => self.rules.get(&key(a, b)).copied().unwrap_or(self.fallback),
            _ => self.fallback,
        }
    }
}

/// Contact hook: every solver contact takes friction and restitution from
/// the rule for the two colliders' materials.
impl PhysicsHooks for MaterialTable {
    fn modify_solver_contacts(&self, context: &mut ContactModificationContext) {
        let a = material_from_tag(context.colliders[context.collider1].user_data);
        let b = material_from_tag(context.colliders[context.collider2].user_data);
        let rule = self.resolve(a, b);
        for contact in context.solver_contacts.iter_mut() {
            contact.friction = rule.friction;
            contact.restitution = rule.restitution;
        }
    }
}

fn key(a: MaterialId, b: MaterialId) -> (MaterialId, MaterialId) {
    if a <= b { (a, b) } else { (b, a) }
}
