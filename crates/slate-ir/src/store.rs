use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use slate_core::{BoundingBox, MobjectId, Point2D, Shape, SlateError, SlateResult, Transform2D};

use crate::mobject::{AttrValue, Attribute, Mobject, MobjectSpec, Style};

/// Owns every mobject of a scene build and answers geometric queries about them.
///
/// Subtree bounds are computed lazily and cached; any write to a mobject drops the
/// cached bounds of that mobject and all of its ancestors.
#[derive(Debug, Clone, Default)]
pub struct ObjectStore {
    objects: BTreeMap<MobjectId, Mobject>,
    next_id: u64,
    bounds_cache: RefCell<HashMap<MobjectId, Option<BoundingBox>>>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, id: MobjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = MobjectId> + '_ {
        self.objects.keys().copied()
    }

    pub fn get(&self, id: MobjectId) -> SlateResult<&Mobject> {
        self.objects
            .get(&id)
            .ok_or(SlateError::DanglingReference { id })
    }

    /// Fail with a dangling reference error unless every id exists.
    pub fn require(&self, ids: impl IntoIterator<Item = MobjectId>) -> SlateResult<()> {
        for id in ids {
            self.get(id)?;
        }
        Ok(())
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Mobject> {
        self.objects
            .values()
            .find(|m| m.name.as_deref() == Some(name))
    }

    /// Give every node of `spec` a fresh id and insert it. Returns the created
    /// mobjects in pre-order; the first one is the root.
    pub fn instantiate(&mut self, spec: MobjectSpec) -> Vec<Mobject> {
        let mut created = Vec::with_capacity(spec.node_count());
        self.instantiate_node(spec, None, &mut created);
        for mobject in &created {
            self.objects.insert(mobject.id, mobject.clone());
        }
        created
    }

    fn instantiate_node(
        &mut self,
        spec: MobjectSpec,
        parent: Option<MobjectId>,
        out: &mut Vec<Mobject>,
    ) -> MobjectId {
        let id = MobjectId(self.next_id);
        self.next_id += 1;
        let slot = out.len();
        out.push(Mobject {
            name: spec.name,
            transform: spec.transform,
            style: spec.style,
            payload: spec.payload,
            parent,
            ..Mobject::new(id, spec.shape)
        });
        let children: Vec<MobjectId> = spec
            .children
            .into_iter()
            .map(|child| self.instantiate_node(child, Some(id), out))
            .collect();
        out[slot].children = children;
        id
    }

    /// Insert already-built mobjects, parents before children, as produced by
    /// [`ObjectStore::instantiate`].
    pub fn insert_all(&mut self, mobjects: &[Mobject]) -> SlateResult<()> {
        for mobject in mobjects {
            if self.objects.contains_key(&mobject.id) {
                return Err(SlateError::invalid_argument(format!(
                    "mobject {} already exists",
                    mobject.id
                )));
            }
            if let Some(parent) = mobject.parent {
                self.get(parent)?;
            }
            self.next_id = self.next_id.max(mobject.id.0 + 1);
            self.objects.insert(mobject.id, mobject.clone());
            if let Some(parent) = mobject.parent {
                self.invalidate(parent);
            }
        }
        Ok(())
    }

    /// Hand out `n` fresh ids without creating anything.
    pub fn reserve_ids(&mut self, n: usize) -> Vec<MobjectId> {
        let first = self.next_id;
        self.next_id += n as u64;
        (first..self.next_id).map(MobjectId).collect()
    }

    /// Duplicate the subtree of `source` under `ids`, one per member of its family.
    ///
    /// The duplicate is detached: its root takes the source's world transform, so it
    /// sits exactly over the source. Names are not copied.
    pub fn duplicate(&mut self, source: MobjectId, ids: &[MobjectId]) -> SlateResult<MobjectId> {
        let family = self.family(source)?;
        if family.len() != ids.len() {
            return Err(SlateError::invalid_argument(format!(
                "copying {} needs {} ids, got {}",
                source,
                family.len(),
                ids.len()
            )));
        }
        let renamed: HashMap<MobjectId, MobjectId> =
            family.iter().copied().zip(ids.iter().copied()).collect();
        let mut copies = Vec::with_capacity(family.len());
        for member in &family {
            let original = self.get(*member)?;
            let transform = if *member == source {
                self.world_transform(source)?
            } else {
                original.transform
            };
            copies.push(Mobject {
                id: renamed[member],
                name: None,
                transform,
                parent: original.parent.filter(|_| *member != source).map(|p| renamed[&p]),
                children: original.children.iter().map(|c| renamed[c]).collect(),
                version: 0,
                ..original.clone()
            });
        }
        self.insert_all(&copies)?;
        Ok(renamed[&source])
    }

    fn modify<R>(&mut self, id: MobjectId, f: impl FnOnce(&mut Mobject) -> R) -> SlateResult<R> {
        let mobject = self
            .objects
            .get_mut(&id)
            .ok_or(SlateError::DanglingReference { id })?;
        let out = f(mobject);
        mobject.version += 1;
        self.invalidate(id);
        Ok(out)
    }

    /// Type-checked attribute write.
    pub fn set_attribute(
        &mut self,
        id: MobjectId,
        attribute: Attribute,
        value: AttrValue,
    ) -> SlateResult<()> {
        let mobject = self
            .objects
            .get_mut(&id)
            .ok_or(SlateError::DanglingReference { id })?;
        mobject.set_attribute(attribute, value)?;
        self.invalidate(id);
        Ok(())
    }

    pub fn attribute(&self, id: MobjectId, attribute: Attribute) -> SlateResult<Option<AttrValue>> {
        Ok(self.get(id)?.attribute(attribute))
    }

    pub fn set_position(&mut self, id: MobjectId, position: Point2D) -> SlateResult<()> {
        self.modify(id, |m| m.transform.position = position)
    }

    pub fn set_transform(&mut self, id: MobjectId, transform: Transform2D) -> SlateResult<()> {
        self.modify(id, |m| m.transform = transform)
    }

    pub fn set_style(&mut self, id: MobjectId, style: Style) -> SlateResult<()> {
        self.modify(id, |m| m.style = style)
    }

    pub fn set_shape(&mut self, id: MobjectId, shape: Shape) -> SlateResult<()> {
        self.set_attribute(id, Attribute::Shape, AttrValue::Shape(shape))
    }

    pub fn set_visible(&mut self, id: MobjectId, visible: bool) -> SlateResult<()> {
        if self.get(id)?.visible == visible {
            return Ok(());
        }
        self.modify(id, |m| m.visible = visible)
    }

    /// Make `child` the last child of `parent`. The child must not already have a parent.
    pub fn adopt(&mut self, parent: MobjectId, child: MobjectId) -> SlateResult<()> {
        let child_mob = self.get(child)?;
        self.get(parent)?;
        if let Some(current) = child_mob.parent {
            return Err(SlateError::invalid_argument(format!(
                "{} already belongs to {}",
                child_mob.label(),
                current
            )));
        }
        if parent == child || self.is_ancestor(child, parent) {
            return Err(SlateError::invalid_argument(format!(
                "adding {} under {} would make it its own ancestor",
                child, parent
            )));
        }
        self.modify(child, |m| m.parent = Some(parent))?;
        self.modify(parent, |m| m.children.push(child))
    }

    /// Remove a mobject and its whole subtree. Returns the removed ids in pre-order.
    pub fn destroy(&mut self, id: MobjectId) -> SlateResult<Vec<MobjectId>> {
        let family = self.family(id)?;
        if let Some(parent) = self.get(id)?.parent {
            self.modify(parent, |m| m.children.retain(|c| *c != id))?;
        }
        let mut cache = self.bounds_cache.borrow_mut();
        for member in &family {
            self.objects.remove(member);
            cache.remove(member);
        }
        Ok(family)
    }

    pub fn parent(&self, id: MobjectId) -> SlateResult<Option<MobjectId>> {
        Ok(self.get(id)?.parent)
    }

    pub fn children(&self, id: MobjectId) -> SlateResult<&[MobjectId]> {
        Ok(&self.get(id)?.children)
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: MobjectId) -> SlateResult<Vec<MobjectId>> {
        let mut out = Vec::new();
        let mut current = self.get(id)?.parent;
        while let Some(p) = current {
            out.push(p);
            current = self.get(p)?.parent;
        }
        Ok(out)
    }

    /// Whether `ancestor` is a strict ancestor of `id`. Unknown ids are never related.
    pub fn is_ancestor(&self, ancestor: MobjectId, id: MobjectId) -> bool {
        let mut current = self.objects.get(&id).and_then(|m| m.parent);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.objects.get(&p).and_then(|m| m.parent);
        }
        false
    }

    /// Whether two mobjects are the same or one contains the other.
    pub fn related(&self, a: MobjectId, b: MobjectId) -> bool {
        a == b || self.is_ancestor(a, b) || self.is_ancestor(b, a)
    }

    /// `id` followed by all of its descendants in draw order.
    pub fn family(&self, id: MobjectId) -> SlateResult<Vec<MobjectId>> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let mobject = self.get(current)?;
            out.push(current);
            stack.extend(mobject.children.iter().rev().copied());
        }
        Ok(out)
    }

    /// Members of the subtree that draw a shape of their own (everything but groups),
    /// in draw order.
    pub fn parts(&self, id: MobjectId) -> SlateResult<Vec<MobjectId>> {
        let mut out = Vec::new();
        for member in self.family(id)? {
            if !self.get(member)?.shape.is_group() {
                out.push(member);
            }
        }
        Ok(out)
    }

    /// World transform built from a caller-supplied local transform per mobject.
    pub fn world_transform_with(
        &self,
        id: MobjectId,
        local: &impl Fn(&Mobject) -> Transform2D,
    ) -> SlateResult<Transform2D> {
        let mut chain = vec![self.get(id)?];
        for ancestor in self.ancestors(id)? {
            chain.push(self.get(ancestor)?);
        }
        Ok(chain
            .iter()
            .rev()
            .fold(Transform2D::identity(), |world, m| world.then(&local(*m))))
    }

    pub fn world_transform(&self, id: MobjectId) -> SlateResult<Transform2D> {
        self.world_transform_with(id, &|m: &Mobject| m.transform)
    }

    /// World transform of the frame `id` is positioned in.
    pub fn parent_world(&self, id: MobjectId) -> SlateResult<Transform2D> {
        match self.get(id)?.parent {
            Some(parent) => self.world_transform(parent),
            None => Ok(Transform2D::identity()),
        }
    }

    /// Bounds of the subtree in the mobject's own frame, before its transform.
    /// Empty groups report a zero-sized box at their origin.
    pub fn local_bounds(&self, id: MobjectId) -> SlateResult<BoundingBox> {
        Ok(self
            .cached_local_bounds(id)?
            .unwrap_or_else(|| BoundingBox::point(Point2D::zero())))
    }

    fn cached_local_bounds(&self, id: MobjectId) -> SlateResult<Option<BoundingBox>> {
        if let Some(hit) = self.bounds_cache.borrow().get(&id) {
            return Ok(*hit);
        }
        let mobject = self.get(id)?;
        let mut bounds = mobject.shape.extent();
        for child in &mobject.children {
            let child_mob = self.get(*child)?;
            if let Some(child_bounds) = self.cached_local_bounds(*child)? {
                let placed = child_mob.transform.apply_box(&child_bounds);
                bounds = Some(match bounds {
                    Some(b) => b.union(&placed),
                    None => placed,
                });
            }
        }
        self.bounds_cache.borrow_mut().insert(id, bounds);
        Ok(bounds)
    }

    /// Bounds of the subtree in its parent's frame.
    pub fn bounds_in_parent(&self, id: MobjectId) -> SlateResult<BoundingBox> {
        let local = self.local_bounds(id)?;
        Ok(self.get(id)?.transform.apply_box(&local))
    }

    /// Bounds of the subtree on the canvas.
    pub fn world_bounds(&self, id: MobjectId) -> SlateResult<BoundingBox> {
        let local = self.local_bounds(id)?;
        Ok(self.world_transform(id)?.apply_box(&local))
    }

    fn invalidate(&self, id: MobjectId) {
        let mut cache = self.bounds_cache.borrow_mut();
        let mut current = Some(id);
        while let Some(m) = current {
            cache.remove(&m);
            current = self.objects.get(&m).and_then(|mob| mob.parent);
        }
    }

    #[cfg(test)]
    pub(crate) fn is_cached(&self, id: MobjectId) -> bool {
        self.bounds_cache.borrow().contains_key(&id)
    }
}
