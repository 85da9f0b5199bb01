//! Object graph the bridge mutates.
//!
//! [`SceneStore`] is the only view the mutation pipeline has of the host:
//! it turns a target identity plus a kind tag into something reflectable.
//! [`InMemoryScene`] is the store used by the host binary and the tests.

pub mod components;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::reflect::Reflect;

use self::components::GameObject;

pub const GAME_OBJECT_KIND: &str = "GameObject";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ids increase monotonically and are never handed out twice.
#[derive(Debug, Default)]
pub struct ObjectIdAllocator {
    next: u64,
}

impl ObjectIdAllocator {
    pub fn allocate(&mut self) -> ObjectId {
        let id = ObjectId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// How a request names its target: a numeric id or an object name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetRef {
    Id(u64),
    Name(String),
}

impl From<ObjectId> for TargetRef {
    fn from(id: ObjectId) -> Self {
        TargetRef::Id(id.0)
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetRef::Id(id) => write!(f, "#{id}"),
            TargetRef::Name(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("no object matches target '{target}'")]
    TargetNotFound { target: String },
    #[error("object '{target}' has no {kind} (available: {})", .available.join(", "))]
    KindNotFound {
        target: String,
        kind: String,
        available: Vec<String>,
    },
}

/// Mutable access to one reflectable part of one object.
#[derive(Debug)]
pub struct TargetHandle<'a> {
    pub id: ObjectId,
    pub kind: String,
    pub object: &'a mut dyn Reflect,
}

#[derive(Debug)]
pub struct TargetView<'a> {
    pub id: ObjectId,
    pub kind: String,
    pub object: &'a dyn Reflect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectSummary {
    pub id: ObjectId,
    pub name: String,
    pub kinds: Vec<String>,
}

pub trait SceneStore {
    fn resolve(&mut self, target: &TargetRef, kind: &str)
        -> Result<TargetHandle<'_>, LookupError>;

    fn resolve_ref(&self, target: &TargetRef, kind: &str) -> Result<TargetView<'_>, LookupError>;

    fn objects(&self) -> Vec<ObjectSummary>;
}

#[derive(Debug)]
pub struct SceneObject {
    id: ObjectId,
    game_object: GameObject,
    components: Vec<Box<dyn Reflect>>,
}

impl SceneObject {
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn game_object(&self) -> &GameObject {
        &self.game_object
    }

    pub fn kinds(&self) -> Vec<String> {
        std::iter::once(GAME_OBJECT_KIND.to_string())
            .chain(self.components.iter().map(|component| component.kind().to_string()))
            .collect()
    }

    pub fn component(&self, kind: &str) -> Option<&dyn Reflect> {
        if kind.eq_ignore_ascii_case(GAME_OBJECT_KIND) {
            return Some(&self.game_object);
        }
        let component = self
            .components
            .iter()
            .find(|component| component.kind().eq_ignore_ascii_case(kind))?;
        Some(component.as_ref())
    }

    pub fn component_mut(&mut self, kind: &str) -> Option<&mut dyn Reflect> {
        if kind.eq_ignore_ascii_case(GAME_OBJECT_KIND) {
            return Some(&mut self.game_object);
        }
        let component = self
            .components
            .iter_mut()
            .find(|component| component.kind().eq_ignore_ascii_case(kind))?;
        Some(component.as_mut())
    }

    fn matches(&self, target: &TargetRef) -> bool {
        match target {
            TargetRef::Id(id) => self.id.0 == *id,
            TargetRef::Name(name) => self.game_object.name == *name,
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryScene {
    allocator: ObjectIdAllocator,
    objects: Vec<SceneObject>,
}

impl InMemoryScene {
    pub fn spawn(&mut self, name: impl Into<String>) -> ObjectId {
        let id = self.allocator.allocate();
        self.objects.push(SceneObject {
            id,
            game_object: GameObject::named(name),
            components: Vec::new(),
        });
        id
    }

    /// Returns false when `id` is unknown or the object already answers to
    /// the component's kind, since kind lookups resolve one component only.
    pub fn attach(&mut self, id: ObjectId, component: impl Reflect + 'static) -> bool {
        let Some(object) = self.objects.iter_mut().find(|object| object.id == id) else {
            return false;
        };
        let kind = component.kind();
        if kind.eq_ignore_ascii_case(GAME_OBJECT_KIND) || object.component(kind).is_some() {
            warn!(object = %id, kind, "scene_duplicate_component_refused");
            return false;
        }
        object.components.push(Box::new(component));
        true
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|object| object.id == id)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    fn find(&self, target: &TargetRef) -> Result<&SceneObject, LookupError> {
        self.objects
            .iter()
            .find(|object| object.matches(target))
            .ok_or_else(|| LookupError::TargetNotFound {
                target: target.to_string(),
            })
    }
}

fn kind_not_found(object: &SceneObject, target: &TargetRef, kind: &str) -> LookupError {
    LookupError::KindNotFound {
        target: target.to_string(),
        kind: kind.to_string(),
        available: object.kinds(),
    }
}

impl SceneStore for InMemoryScene {
    fn resolve(
        &mut self,
        target: &TargetRef,
        kind: &str,
    ) -> Result<TargetHandle<'_>, LookupError> {
        let index = self
            .objects
            .iter()
            .position(|object| object.matches(target))
            .ok_or_else(|| LookupError::TargetNotFound {
                target: target.to_string(),
            })?;
        // Checked up front: the error needs the whole object, which the
        // mutable component borrow below would still hold.
        if self.objects[index].component(kind).is_none() {
            return Err(kind_not_found(&self.objects[index], target, kind));
        }
        let object = &mut self.objects[index];
        let id = object.id;
        let Some(component) = object.component_mut(kind) else {
            return Err(LookupError::TargetNotFound {
                target: target.to_string(),
            });
        };
        Ok(TargetHandle {
            id,
            kind: component.kind().to_string(),
            object: component,
        })
    }

    fn resolve_ref(&self, target: &TargetRef, kind: &str) -> Result<TargetView<'_>, LookupError> {
        let object = self.find(target)?;
        let component = object
            .component(kind)
            .ok_or_else(|| kind_not_found(object, target, kind))?;
        Ok(TargetView {
            id: object.id,
            kind: component.kind().to_string(),
            object: component,
        })
    }

    fn objects(&self) -> Vec<ObjectSummary> {
        self.objects
            .iter()
            .map(|object| ObjectSummary {
                id: object.id,
                name: object.game_object.name.clone(),
                kinds: object.kinds(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::components::{Camera, Light, Transform};
    use super::*;
    use crate::values::{TypedValue, Vec3};

    fn scene_with_lamp() -> (InMemoryScene, ObjectId) {
        let mut scene = InMemoryScene::default();
        let id = scene.spawn("Lamp");
        assert!(scene.attach(id, Transform::default()));
        assert!(scene.attach(id, Light::default()));
        (scene, id)
    }

    #[test]
    fn allocator_ids_are_monotonic() {
        let mut allocator = ObjectIdAllocator::default();
        let first = allocator.allocate();
        let second = allocator.allocate();
        assert_eq!(first.0, 0);
        assert_eq!(second.0, 1);
    }

    #[test]
    fn resolves_by_id_or_name_with_case_insensitive_kind() {
        let (mut scene, id) = scene_with_lamp();
        let handle = scene
            .resolve(&TargetRef::Name("Lamp".to_string()), "transform")
            .expect("resolve by name");
        assert_eq!(handle.id, id);
        assert_eq!(handle.kind, "Transform");
        handle
            .object
            .write("position", TypedValue::Vector3(Vec3::new(1.0, 2.0, 3.0)))
            .expect("write position");

        let view = scene
            .resolve_ref(&TargetRef::from(id), "Transform")
            .expect("resolve by id");
        assert_eq!(
            view.object.read("position"),
            Some(TypedValue::Vector3(Vec3::new(1.0, 2.0, 3.0)))
        );
    }

    #[test]
    fn game_object_kind_resolves_to_the_object_itself() {
        let (scene, id) = scene_with_lamp();
        let view = scene
            .resolve_ref(&TargetRef::from(id), "GameObject")
            .expect("game object");
        assert_eq!(
            view.object.read("name"),
            Some(TypedValue::String("Lamp".to_string()))
        );
    }

    #[test]
    fn lookup_failures_name_the_target_and_available_kinds() {
        let (scene, id) = scene_with_lamp();
        assert_eq!(
            scene
                .resolve_ref(&TargetRef::Id(99), "Transform")
                .map(|view| view.id),
            Err(LookupError::TargetNotFound {
                target: "#99".to_string()
            })
        );
        let err = scene
            .resolve_ref(&TargetRef::from(id), "Camera")
            .map(|view| view.id)
            .expect_err("no camera");
        assert_eq!(
            err,
            LookupError::KindNotFound {
                target: "#0".to_string(),
                kind: "Camera".to_string(),
                available: vec![
                    "GameObject".to_string(),
                    "Transform".to_string(),
                    "Light".to_string()
                ],
            }
        );
    }

    #[test]
    fn objects_lists_every_kind() {
        let (mut scene, _) = scene_with_lamp();
        scene.spawn("Empty");
        let summaries = scene.objects();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[1].kinds, vec!["GameObject".to_string()]);
        assert!(!scene.attach(ObjectId(42), Light::default()));
    }

    #[test]
    fn second_component_of_a_kind_is_refused() {
        let (mut scene, lamp) = scene_with_lamp();
        assert!(!scene.attach(lamp, Light::default()));
        assert!(!scene.attach(lamp, GameObject::named("Impostor")));
        assert!(scene.attach(lamp, Camera::default()));
        let kinds = scene.object(lamp).map(SceneObject::kinds).unwrap_or_default();
        assert_eq!(
            kinds.iter().filter(|kind| kind.as_str() == "Light").count(),
            1
        );
    }
}
