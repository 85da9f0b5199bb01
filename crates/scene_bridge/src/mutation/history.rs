use std::collections::{BTreeMap, VecDeque};

use serde::Serialize;
use tracing::{debug, info};

use crate::reflect::Reflect;
use crate::scene::{LookupError, ObjectId, SceneStore, TargetHandle, TargetRef};
use crate::values::TypedValue;

use super::applier::apply_field;
use super::context::MutationContext;
use super::types::{FieldOutcome, FieldRequest};

/// Every readable member of one target, with owned sub-object members keyed
/// as `child.member`.
pub type Snapshot = BTreeMap<String, TypedValue>;

pub fn capture_snapshot(object: &dyn Reflect) -> Snapshot {
    let mut snapshot = Snapshot::new();
    collect_members(object, None, &mut snapshot);
    for child_name in object.child_names() {
        if let Some(child) = object.child(child_name) {
            collect_members(child, Some(child_name), &mut snapshot);
        }
    }
    snapshot
}

fn collect_members(object: &dyn Reflect, prefix: Option<&str>, snapshot: &mut Snapshot) {
    for member in object.members() {
        if let Some(value) = object.read(&member.name) {
            let key = match prefix {
                Some(prefix) => format!("{prefix}.{}", member.name),
                None => member.name,
            };
            snapshot.insert(key, value);
        }
    }
}

/// Writes back every writable member whose current value differs from the
/// snapshot. Returns how many members were written.
pub fn restore_snapshot(object: &mut dyn Reflect, snapshot: &Snapshot) -> usize {
    let mut restored = 0;
    for (key, value) in snapshot {
        let written = match key.split_once('.') {
            Some((child, member)) => match object.child_mut(child) {
                Some(child) => restore_member(child, member, value),
                None => false,
            },
            None => restore_member(object, key, value),
        };
        if written {
            restored += 1;
        }
    }
    restored
}

fn restore_member(owner: &mut dyn Reflect, member: &str, value: &TypedValue) -> bool {
    let writable = owner
        .member_info(member)
        .is_some_and(|info| info.writable);
    if !writable || owner.read(member).as_ref() == Some(value) {
        return false;
    }
    match owner.write(member, value.clone()) {
        Ok(()) => true,
        Err(err) => {
            debug!(member, error = %err, "snapshot_restore_skipped");
            false
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub object: ObjectId,
    pub kind: String,
    pub field: String,
    pub before: Snapshot,
    pub after: Snapshot,
}

pub trait HistoryRecorder {
    fn record(&mut self, entry: HistoryEntry);
}

/// Applies one field and, when it applied and a recorder is present, records
/// the target's state around it.
pub fn apply_field_recorded(
    target: &mut TargetHandle<'_>,
    field: &FieldRequest,
    ctx: &mut MutationContext<'_>,
) -> FieldOutcome {
    if ctx.history_mut().is_none() {
        return apply_field(target, field, ctx);
    }
    let before = capture_snapshot(target.object);
    let outcome = apply_field(target, field, ctx);
    if outcome.applied {
        let after = capture_snapshot(target.object);
        if let Some(history) = ctx.history_mut() {
            history.record(HistoryEntry {
                object: target.id,
                kind: target.kind.clone(),
                field: field.name.clone(),
                before,
                after,
            });
        }
    }
    outcome
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryStep {
    pub object: ObjectId,
    pub kind: String,
    pub field: String,
    pub restored: usize,
}

/// Bounded undo and redo stacks over recorded field applications.
#[derive(Debug)]
pub struct UndoHistory {
    undo: VecDeque<HistoryEntry>,
    redo: Vec<HistoryEntry>,
    limit: usize,
}

impl UndoHistory {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit,
        }
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Restores the state before the most recent entry. `Ok(None)` when there
    /// is nothing to undo. An entry whose target is gone is dropped.
    pub fn undo(
        &mut self,
        scene: &mut dyn SceneStore,
    ) -> Result<Option<HistoryStep>, LookupError> {
        let Some(entry) = self.undo.pop_back() else {
            return Ok(None);
        };
        let step = restore_entry(scene, &entry, &entry.before)?;
        info!(object = %entry.object, field = %entry.field, "history_undo");
        self.redo.push(entry);
        Ok(Some(step))
    }

    pub fn redo(
        &mut self,
        scene: &mut dyn SceneStore,
    ) -> Result<Option<HistoryStep>, LookupError> {
        let Some(entry) = self.redo.pop() else {
            return Ok(None);
        };
        let step = restore_entry(scene, &entry, &entry.after)?;
        info!(object = %entry.object, field = %entry.field, "history_redo");
        push_bounded(&mut self.undo, entry, self.limit);
        Ok(Some(step))
    }
}

impl HistoryRecorder for UndoHistory {
    fn record(&mut self, entry: HistoryEntry) {
        self.redo.clear();
        push_bounded(&mut self.undo, entry, self.limit);
    }
}

fn restore_entry(
    scene: &mut dyn SceneStore,
    entry: &HistoryEntry,
    snapshot: &Snapshot,
) -> Result<HistoryStep, LookupError> {
    let handle = scene.resolve(&TargetRef::from(entry.object), &entry.kind)?;
    let restored = restore_snapshot(handle.object, snapshot);
    Ok(HistoryStep {
        object: entry.object,
        kind: entry.kind.clone(),
        field: entry.field.clone(),
        restored,
    })
}

fn push_bounded(queue: &mut VecDeque<HistoryEntry>, entry: HistoryEntry, limit: usize) {
    if limit == 0 {
        return;
    }
    if queue.len() == limit {
        queue.pop_front();
    }
    queue.push_back(entry);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::context::Diagnostic;
    use crate::scene::components::{Material, MeshRenderer, Transform};
    use crate::scene::InMemoryScene;
    use crate::values::{Color, Vec3};

    fn set(
        scene: &mut InMemoryScene,
        history: &mut UndoHistory,
        kind: &str,
        name: &str,
        raw: &str,
    ) -> FieldOutcome {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let mut ctx = MutationContext::new(&mut sink).with_history(history);
        let mut handle = scene
            .resolve(&TargetRef::Name("Crate".to_string()), kind)
            .expect("target");
        apply_field_recorded(&mut handle, &FieldRequest::new(name, raw), &mut ctx)
    }

    fn crate_scene() -> InMemoryScene {
        let mut scene = InMemoryScene::default();
        let id = scene.spawn("Crate");
        scene.attach(id, Transform::at(Vec3::new(1.0, 2.0, 3.0)));
        scene.attach(id, MeshRenderer::with_material(Material::named("Wood")));
        scene
    }

    fn position(scene: &InMemoryScene) -> Option<TypedValue> {
        scene
            .resolve_ref(&TargetRef::Name("Crate".to_string()), "Transform")
            .expect("transform")
            .object
            .read("position")
    }

    #[test]
    fn undo_and_redo_round_trip_one_field() {
        let mut scene = crate_scene();
        let mut history = UndoHistory::with_limit(8);
        assert!(set(&mut scene, &mut history, "Transform", "x", "5").applied);
        assert_eq!(
            position(&scene),
            Some(TypedValue::Vector3(Vec3::new(5.0, 2.0, 3.0)))
        );

        let step = history.undo(&mut scene).expect("undo").expect("step");
        assert_eq!(step.restored, 1);
        assert_eq!(
            position(&scene),
            Some(TypedValue::Vector3(Vec3::new(1.0, 2.0, 3.0)))
        );

        history.redo(&mut scene).expect("redo").expect("step");
        assert_eq!(
            position(&scene),
            Some(TypedValue::Vector3(Vec3::new(5.0, 2.0, 3.0)))
        );
        assert!(history.redo(&mut scene).expect("redo").is_none());
    }

    #[test]
    fn failed_fields_are_not_recorded_and_new_records_clear_redo() {
        let mut scene = crate_scene();
        let mut history = UndoHistory::with_limit(8);
        assert!(!set(&mut scene, &mut history, "Transform", "bogus", "1").applied);
        assert_eq!(history.undo_len(), 0);

        set(&mut scene, &mut history, "Transform", "y", "7");
        history.undo(&mut scene).expect("undo");
        assert_eq!(history.redo_len(), 1);
        set(&mut scene, &mut history, "Transform", "z", "7");
        assert_eq!(history.redo_len(), 0);
    }

    #[test]
    fn snapshots_include_child_members() {
        let mut scene = crate_scene();
        let mut history = UndoHistory::with_limit(8);
        assert!(set(&mut scene, &mut history, "MeshRenderer", "color", "red").applied);
        history.undo(&mut scene).expect("undo").expect("step");
        let view = scene
            .resolve_ref(&TargetRef::Name("Crate".to_string()), "MeshRenderer")
            .expect("renderer");
        let color = view
            .object
            .child("material")
            .and_then(|material| material.read("color"));
        assert_eq!(color, Some(TypedValue::Color(Color::WHITE)));
    }

    #[test]
    fn history_is_bounded() {
        let mut scene = crate_scene();
        let mut history = UndoHistory::with_limit(2);
        for raw in ["1", "2", "3"] {
            set(&mut scene, &mut history, "Transform", "x", raw);
        }
        assert_eq!(history.undo_len(), 2);
    }
}
