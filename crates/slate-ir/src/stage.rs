use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use slate_core::{
    AnimationConfig, BoundingBox, FrameSnapshot, MobjectId, ObjectState, SlateResult, Transform2D,
};

use crate::animation::{ActiveAnimation, Animation, Commit, EndEffect, TrackSample};
use crate::layout::{LayoutRelation, LayoutSolver};
use crate::mobject::Mobject;
use crate::store::ObjectStore;
use crate::timeline::{EntryKind, StageOp, TimelineEntry};

/// The mobjects currently on stage, in the order they were staged.
///
/// Only mobjects with no staged ancestor are listed; their subtrees are drawn with them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedSet {
    ids: Vec<MobjectId>,
}

impl StagedSet {
    pub fn contains(&self, id: MobjectId) -> bool {
        self.ids.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = MobjectId> + '_ {
        self.ids.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn to_vec(&self) -> Vec<MobjectId> {
        self.ids.clone()
    }

    fn push(&mut self, id: MobjectId) {
        self.ids.push(id);
    }

    fn remove(&mut self, id: MobjectId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|s| *s != id);
        self.ids.len() != before
    }

    fn retain(&mut self, keep: impl FnMut(&MobjectId) -> bool) {
        self.ids.retain(keep);
    }
}

/// A simulated world: the object model, the staged set and the play group in flight.
///
/// Both finalize-time validation and playback drive the same `Stage`, so anything
/// validation accepts plays back identically.
#[derive(Debug, Clone)]
pub struct Stage {
    store: ObjectStore,
    staged: StagedSet,
    frame: BoundingBox,
    active: Vec<ActiveAnimation>,
    overrides: BTreeMap<MobjectId, TrackSample>,
    ended: Vec<EndEffect>,
}

impl Stage {
    /// An empty stage on a canvas with the given visible region.
    pub fn new(frame: BoundingBox) -> Self {
        Self {
            store: ObjectStore::new(),
            staged: StagedSet::default(),
            frame,
            active: Vec::new(),
            overrides: BTreeMap::new(),
            ended: Vec::new(),
        }
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn staged(&self) -> &StagedSet {
        &self.staged
    }

    pub fn frame(&self) -> &BoundingBox {
        &self.frame
    }

    /// Whether a play group is in flight.
    pub fn is_playing(&self) -> bool {
        !self.active.is_empty()
    }

    /// Create mobjects directly, outside any recorded operation.
    pub(crate) fn instantiate(&mut self, spec: crate::mobject::MobjectSpec) -> Vec<Mobject> {
        self.store.instantiate(spec)
    }

    pub(crate) fn reserve_ids(&mut self, n: usize) -> Vec<MobjectId> {
        self.store.reserve_ids(n)
    }

    /// Apply one operation immediately. Layout relations resolve on their own.
    pub fn apply_op(&mut self, op: &StageOp) -> SlateResult<()> {
        match op {
            StageOp::Insert { mobjects } => self.store.insert_all(mobjects),
            StageOp::Copy { source, ids } => self.store.duplicate(*source, ids).map(|_| ()),
            StageOp::Adopt { parent, child } => {
                self.store.adopt(*parent, *child)?;
                self.staged.remove(*child);
                Ok(())
            }
            StageOp::SetAttribute {
                id,
                attribute,
                value,
            } => self.store.set_attribute(*id, *attribute, value.clone()),
            StageOp::Shift { id, delta } => {
                let local = self.store.parent_world(*id)?.inverse_vector(delta);
                let position = self.store.get(*id)?.transform.position + local;
                self.store.set_position(*id, position)
            }
            StageOp::Layout { relation } => {
                LayoutSolver::apply(&mut self.store, &self.frame, std::slice::from_ref(relation))
            }
            StageOp::Stage { id } => self.stage(*id),
            StageOp::Unstage { id } => {
                self.store.get(*id)?;
                self.staged.remove(*id);
                Ok(())
            }
            StageOp::Destroy { id } => {
                let removed = self.store.destroy(*id)?;
                self.staged.retain(|s| !removed.contains(s));
                Ok(())
            }
        }
    }

    /// Replay the build operations preceding an entry. Consecutive layout relations are
    /// resolved together as one batch, before the next operation that reads or writes
    /// geometry and at the end of the prelude.
    pub fn run_prelude(&mut self, ops: &[StageOp]) -> SlateResult<()> {
        let mut batch: Vec<LayoutRelation> = Vec::new();
        for op in ops {
            match op {
                StageOp::Layout { relation } => batch.push(relation.clone()),
                StageOp::Insert { .. } | StageOp::Stage { .. } | StageOp::Unstage { .. } => {
                    self.apply_op(op)?
                }
                _ => {
                    self.flush_layout(&mut batch)?;
                    self.apply_op(op)?;
                }
            }
        }
        self.flush_layout(&mut batch)
    }

    fn flush_layout(&mut self, batch: &mut Vec<LayoutRelation>) -> SlateResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        LayoutSolver::apply(&mut self.store, &self.frame, batch)?;
        batch.clear();
        Ok(())
    }

    /// Put a mobject on stage. A mobject already drawn through a staged ancestor stays
    /// as it is; staged descendants are absorbed into it.
    pub fn stage(&mut self, id: MobjectId) -> SlateResult<()> {
        if self.staged.contains(id) {
            return Ok(());
        }
        if self.store.ancestors(id)?.iter().any(|a| self.staged.contains(*a)) {
            return Ok(());
        }
        let store = &self.store;
        self.staged.retain(|s| !store.is_ancestor(id, *s));
        self.staged.push(id);
        Ok(())
    }

    /// Take a mobject off stage: unstage it if staged, hide it if it is drawn through a
    /// staged ancestor, otherwise nothing.
    pub fn remove(&mut self, id: MobjectId) -> SlateResult<()> {
        if self.staged.remove(id) {
            return Ok(());
        }
        if self.store.ancestors(id)?.iter().any(|a| self.staged.contains(*a)) {
            self.store.set_visible(id, false)?;
        }
        Ok(())
    }

    fn reveal(&mut self, id: MobjectId, family: bool) -> SlateResult<()> {
        let members = if family {
            self.store.family(id)?
        } else {
            vec![id]
        };
        for member in members {
            self.store.set_visible(member, true)?;
        }
        Ok(())
    }

    /// Stage the subjects of a group that is starting.
    pub fn enter_group(&mut self, animations: &[Animation]) -> SlateResult<()> {
        for animation in animations {
            let appear = animation.is_appear();
            for subject in animation.subjects() {
                self.stage(subject)?;
                self.reveal(subject, appear)?;
            }
        }
        Ok(())
    }

    /// Apply the staging changes of a group that has ended.
    pub fn leave_group(&mut self, animations: &[Animation]) -> SlateResult<()> {
        for animation in animations {
            for effect in animation.end_effects() {
                self.end(effect)?;
            }
        }
        Ok(())
    }

    fn end(&mut self, effect: EndEffect) -> SlateResult<()> {
        match effect {
            EndEffect::Remove(id) => self.remove(id),
            EndEffect::Replace { source, target } => {
                self.remove(source)?;
                self.stage(target)?;
                self.reveal(target, true)
            }
        }
    }

    /// Start an entry: replay its prelude, then capture start and end states of every
    /// member animation and stage their subjects.
    pub fn open_entry(&mut self, entry: &TimelineEntry, config: &AnimationConfig) -> SlateResult<()> {
        self.run_prelude(&entry.prelude)?;
        self.active.clear();
        self.overrides.clear();
        self.ended.clear();
        if let EntryKind::Play { animations, .. } = &entry.kind {
            let mut active = Vec::with_capacity(animations.len());
            for (animation, timing) in animations.iter().zip(entry.timings(config)) {
                active.push(
                    animation
                        .begin(&self.store, &self.frame, timing.duration, config.default_easing)?
                        .starting_at(timing.offset),
                );
            }
            self.enter_group(animations)?;
            self.active = active;
            for animation in animations {
                self.ended.extend(animation.end_effects());
            }
        }
        Ok(())
    }

    /// Evaluate every animation in flight at `t` seconds into the entry.
    pub fn sample(&mut self, t: f64) {
        self.overrides.clear();
        for animation in &self.active {
            for sample in animation.sample(t) {
                self.overrides.insert(sample.id, sample);
            }
        }
    }

    /// Finish the entry in flight: commit end states, then apply end-of-group staging.
    pub fn close_entry(&mut self) -> SlateResult<()> {
        self.overrides.clear();
        let active = std::mem::take(&mut self.active);
        for animation in &active {
            for (sample, commit) in animation.finish() {
                match commit {
                    Commit::Write => {
                        self.store.set_transform(sample.id, sample.state.transform)?;
                        self.store.set_style(sample.id, sample.state.style)?;
                        if let Some(morph) = sample.morph.filter(|m| m.alpha >= 1.0) {
                            self.store.set_shape(sample.id, morph.into)?;
                        }
                    }
                    Commit::Discard => {}
                    Commit::Hide => self.store.set_visible(sample.id, false)?,
                }
            }
        }
        for effect in std::mem::take(&mut self.ended) {
            self.end(effect)?;
        }
        Ok(())
    }

    /// Everything drawn right now, in paint order.
    pub fn snapshot(&self, index: u64, time: f64, entry: Option<usize>) -> SlateResult<FrameSnapshot> {
        let mut objects = Vec::new();
        for root in self.staged.iter() {
            let mobject = self.store.get(root)?;
            let (parent_world, parent_opacity) = match mobject.parent {
                Some(parent) => (
                    self.store.world_transform_with(parent, &|m: &Mobject| self.local(m))?,
                    self.opacity_through(parent)?,
                ),
                None => (Transform2D::identity(), 1.0),
            };
            self.collect(root, parent_world, parent_opacity, &mut objects)?;
        }
        Ok(FrameSnapshot {
            index,
            time,
            entry,
            objects,
        })
    }

    fn local(&self, mobject: &Mobject) -> Transform2D {
        self.overrides
            .get(&mobject.id)
            .map_or(mobject.transform, |o| o.state.transform)
    }

    fn opacity(&self, mobject: &Mobject) -> f64 {
        self.overrides
            .get(&mobject.id)
            .map_or(mobject.style.opacity, |o| o.state.style.opacity)
    }

    /// Product of the opacities of `id` and its ancestors.
    fn opacity_through(&self, id: MobjectId) -> SlateResult<f64> {
        let mut opacity = self.opacity(self.store.get(id)?);
        for ancestor in self.store.ancestors(id)? {
            opacity *= self.opacity(self.store.get(ancestor)?);
        }
        Ok(opacity)
    }

    fn collect(
        &self,
        id: MobjectId,
        parent_world: Transform2D,
        parent_opacity: f64,
        out: &mut Vec<ObjectState>,
    ) -> SlateResult<()> {
        let mobject = self.store.get(id)?;
        if !mobject.visible {
            return Ok(());
        }
        let over = self.overrides.get(&id);
        let style = over.map_or(mobject.style, |o| o.state.style);
        let world = parent_world.then(&self.local(mobject));
        let opacity = parent_opacity * style.opacity;
        out.push(ObjectState {
            id,
            parent: mobject.parent,
            shape: mobject.shape.clone(),
            position: world.position,
            scale: world.scale,
            rotation: world.rotation,
            color: style.color,
            opacity,
            fill_opacity: style.fill_opacity,
            stroke_width: style.stroke_width,
            draw_progress: over.map_or(1.0, |o| o.state.draw_progress),
            morph: over.and_then(|o| o.morph.clone()),
        });
        for child in &mobject.children {
            self.collect(*child, world, opacity, out)?;
        }
        Ok(())
    }
}
