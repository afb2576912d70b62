use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use slate_core::{BoundingBox, MobjectId, Point2D, Shape, SlateError, SlateResult};

use crate::store::ObjectStore;

/// Gap left between neighbours by `next_to` and `arrange` unless overridden.
pub const DEFAULT_BUFF: f64 = 0.25;
/// Margin kept from the canvas border by `to_edge` unless overridden.
pub const DEFAULT_EDGE_BUFF: f64 = 0.5;
/// Padding of a surrounding rectangle unless overridden.
pub const DEFAULT_SURROUND_BUFF: f64 = 0.1;

/// A location on a number line or a pair of axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisCoord {
    Value(f64),
    Coords(f64, f64),
}

/// A directive that positions a mobject relative to another mobject, a point, or the canvas.
///
/// Edges and directions use the critical point convention of
/// [`BoundingBox::critical_point`]: `UP` is the top centre, `UL` the top-left corner
/// and `ORIGIN` the centre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "relation", rename_all = "snake_case")]
pub enum LayoutRelation {
    /// Place `target` beside `anchor` in `direction`, `buff` apart.
    /// `aligned_edge` lines up that edge of both instead of their centres.
    NextTo {
        target: MobjectId,
        anchor: MobjectId,
        direction: Point2D,
        buff: f64,
        aligned_edge: Point2D,
    },
    /// Line up `edge` of `target` with the same edge of `anchor`, moving only along
    /// the axes the edge points along.
    AlignTo {
        target: MobjectId,
        anchor: MobjectId,
        edge: Point2D,
    },
    /// Put the `target_edge` point of `target` at the `anchor_edge` point of `anchor`
    /// plus `offset`.
    Anchor {
        target: MobjectId,
        target_edge: Point2D,
        anchor: MobjectId,
        anchor_edge: Point2D,
        offset: Point2D,
    },
    /// Put the `aligned_edge` point of `target` at `point`.
    MoveTo {
        target: MobjectId,
        point: Point2D,
        aligned_edge: Point2D,
    },
    /// Push `target` against an edge or corner of the canvas, keeping `buff` from it.
    ToEdge {
        target: MobjectId,
        edge: Point2D,
        buff: f64,
    },
    /// Lay `items` out edge to edge along an axis-aligned `direction`. When `center`
    /// is set the whole row is centred on it, otherwise the first item stays put.
    Arrange {
        items: Vec<MobjectId>,
        direction: Point2D,
        buff: f64,
        aligned_edge: Point2D,
        center: Option<Point2D>,
    },
    /// Centre item `k` at `start + step * k`.
    Distribute {
        items: Vec<MobjectId>,
        start: Point2D,
        step: Point2D,
    },
    /// Centre `target` on a value of a number line or a coordinate pair of axes.
    OnAxis {
        target: MobjectId,
        axis: MobjectId,
        coord: AxisCoord,
    },
    /// Resize the rectangle `target` to enclose `anchor` with `buff` to spare, and
    /// centre it there.
    Surround {
        target: MobjectId,
        anchor: MobjectId,
        buff: f64,
    },
}

impl LayoutRelation {
    pub fn next_to(target: MobjectId, anchor: MobjectId, direction: Point2D) -> Self {
        LayoutRelation::NextTo {
            target,
            anchor,
            direction,
            buff: DEFAULT_BUFF,
            aligned_edge: Point2D::ORIGIN,
        }
    }

    pub fn align_to(target: MobjectId, anchor: MobjectId, edge: Point2D) -> Self {
        LayoutRelation::AlignTo {
            target,
            anchor,
            edge,
        }
    }

    pub fn anchor(
        target: MobjectId,
        target_edge: Point2D,
        anchor: MobjectId,
        anchor_edge: Point2D,
        offset: Point2D,
    ) -> Self {
        LayoutRelation::Anchor {
            target,
            target_edge,
            anchor,
            anchor_edge,
            offset,
        }
    }

    pub fn move_to(target: MobjectId, point: Point2D) -> Self {
        LayoutRelation::MoveTo {
            target,
            point,
            aligned_edge: Point2D::ORIGIN,
        }
    }

    pub fn to_edge(target: MobjectId, edge: Point2D) -> Self {
        LayoutRelation::ToEdge {
            target,
            edge,
            buff: DEFAULT_EDGE_BUFF,
        }
    }

    pub fn arrange(items: Vec<MobjectId>, direction: Point2D) -> Self {
        LayoutRelation::Arrange {
            items,
            direction,
            buff: DEFAULT_BUFF,
            aligned_edge: Point2D::ORIGIN,
            center: Some(Point2D::ORIGIN),
        }
    }

    pub fn distribute(items: Vec<MobjectId>, start: Point2D, step: Point2D) -> Self {
        LayoutRelation::Distribute { items, start, step }
    }

    pub fn on_axis(target: MobjectId, axis: MobjectId, value: f64) -> Self {
        LayoutRelation::OnAxis {
            target,
            axis,
            coord: AxisCoord::Value(value),
        }
    }

    pub fn at_coords(target: MobjectId, axes: MobjectId, x: f64, y: f64) -> Self {
        LayoutRelation::OnAxis {
            target,
            axis: axes,
            coord: AxisCoord::Coords(x, y),
        }
    }

    pub fn surround(target: MobjectId, anchor: MobjectId) -> Self {
        LayoutRelation::Surround {
            target,
            anchor,
            buff: DEFAULT_SURROUND_BUFF,
        }
    }

    /// Override the gap of relations that have one.
    pub fn with_buff(mut self, value: f64) -> Self {
        match &mut self {
            LayoutRelation::NextTo { buff, .. }
            | LayoutRelation::ToEdge { buff, .. }
            | LayoutRelation::Arrange { buff, .. }
            | LayoutRelation::Surround { buff, .. } => *buff = value,
            _ => {}
        }
        self
    }

    /// Override the aligned edge of relations that have one.
    pub fn with_aligned_edge(mut self, edge: Point2D) -> Self {
        match &mut self {
            LayoutRelation::NextTo { aligned_edge, .. }
            | LayoutRelation::MoveTo { aligned_edge, .. }
            | LayoutRelation::Arrange { aligned_edge, .. } => *aligned_edge = edge,
            _ => {}
        }
        self
    }

    /// Mobjects whose position this relation writes.
    pub fn targets(&self) -> Vec<MobjectId> {
        match self {
            LayoutRelation::NextTo { target, .. }
            | LayoutRelation::AlignTo { target, .. }
            | LayoutRelation::Anchor { target, .. }
            | LayoutRelation::MoveTo { target, .. }
            | LayoutRelation::ToEdge { target, .. }
            | LayoutRelation::OnAxis { target, .. }
            | LayoutRelation::Surround { target, .. } => vec![*target],
            LayoutRelation::Arrange { items, .. } | LayoutRelation::Distribute { items, .. } => {
                items.clone()
            }
        }
    }

    /// Every mobject the relation mentions.
    pub fn references(&self) -> Vec<MobjectId> {
        let mut ids = self.targets();
        match self {
            LayoutRelation::NextTo { anchor, .. }
            | LayoutRelation::AlignTo { anchor, .. }
            | LayoutRelation::Anchor { anchor, .. }
            | LayoutRelation::Surround { anchor, .. } => ids.push(*anchor),
            LayoutRelation::OnAxis { axis, .. } => ids.push(*axis),
            _ => {}
        }
        ids
    }

    /// Check references and parameters without resolving anything.
    pub fn validate(&self, store: &ObjectStore) -> SlateResult<()> {
        store.require(self.references())?;
        let finite = |p: &Point2D| p.is_finite();
        let ok = match self {
            LayoutRelation::NextTo {
                direction,
                buff,
                aligned_edge,
                ..
            } => finite(direction) && buff.is_finite() && finite(aligned_edge),
            LayoutRelation::AlignTo { edge, .. } => finite(edge),
            LayoutRelation::Anchor {
                target_edge,
                anchor_edge,
                offset,
                ..
            } => finite(target_edge) && finite(anchor_edge) && finite(offset),
            LayoutRelation::MoveTo {
                point,
                aligned_edge,
                ..
            } => finite(point) && finite(aligned_edge),
            LayoutRelation::ToEdge { edge, buff, .. } => finite(edge) && buff.is_finite(),
            LayoutRelation::Arrange {
                items,
                direction,
                buff,
                center,
                ..
            } => {
                if items.is_empty() {
                    return Err(SlateError::invalid_argument("arrange needs at least one item"));
                }
                if (direction.x == 0.0) == (direction.y == 0.0) {
                    return Err(SlateError::invalid_argument(format!(
                        "arrange direction must lie along one axis, got ({}, {})",
                        direction.x, direction.y
                    )));
                }
                buff.is_finite() && center.map_or(true, |c| c.is_finite())
            }
            LayoutRelation::Distribute { items, start, step } => {
                if items.is_empty() {
                    return Err(SlateError::invalid_argument(
                        "distribute needs at least one item",
                    ));
                }
                finite(start) && finite(step)
            }
            LayoutRelation::OnAxis { axis, coord, .. } => {
                match (&store.get(*axis)?.shape, coord) {
                    (Shape::NumberLine { .. }, AxisCoord::Value(v)) => v.is_finite(),
                    (Shape::Axes { .. }, AxisCoord::Coords(x, y)) => x.is_finite() && y.is_finite(),
                    (shape, _) => {
                        return Err(SlateError::invalid_argument(format!(
                            "{} cannot locate {:?}",
                            shape.kind_name(),
                            coord
                        )))
                    }
                }
            }
            LayoutRelation::Surround { target, buff, .. } => {
                if !matches!(store.get(*target)?.shape, Shape::Rectangle { .. }) {
                    return Err(SlateError::invalid_argument(format!(
                        "only rectangles can surround, {} is a {}",
                        target,
                        store.get(*target)?.shape.kind_name()
                    )));
                }
                buff.is_finite()
            }
        };
        if ok {
            Ok(())
        } else {
            Err(SlateError::invalid_argument(format!(
                "non-finite layout parameter in {:?}",
                self
            )))
        }
    }
}

/// Which axes a placement may move the target along.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Mask {
    x: bool,
    y: bool,
}

impl Mask {
    const BOTH: Mask = Mask { x: true, y: true };

    /// Axes the direction has a component along; both for a zero direction.
    fn along(direction: &Point2D) -> Mask {
        match (direction.x != 0.0, direction.y != 0.0) {
            (false, false) => Mask::BOTH,
            (x, y) => Mask { x, y },
        }
    }
}

/// Where a placement wants the target's edge point to end up.
#[derive(Debug, Clone)]
enum Goal {
    Point(Point2D),
    Object {
        anchor: MobjectId,
        edge: Point2D,
        offset: Point2D,
    },
    Frame {
        edge: Point2D,
        buff: f64,
    },
    Axis {
        axis: MobjectId,
        coord: AxisCoord,
    },
    /// First item of a centred arrangement, placed from the extent of the whole row.
    ArrangeHead {
        items: Vec<MobjectId>,
        main_x: bool,
        sign: f64,
        across: f64,
        buff: f64,
        center: Point2D,
    },
}

#[derive(Debug, Clone)]
enum Rule {
    Place {
        edge: Point2D,
        goal: Goal,
        mask: Mask,
    },
    Surround {
        anchor: MobjectId,
        buff: f64,
    },
}

/// One position write, with the reads it depends on.
#[derive(Debug, Clone)]
struct Step {
    target: MobjectId,
    /// Mobjects whose placement on the canvas this step reads.
    position_reads: Vec<MobjectId>,
    /// Mobjects whose size (not position) this step reads.
    size_reads: Vec<MobjectId>,
    writes_size: bool,
    rule: Rule,
}

fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn expand(relation: &LayoutRelation, steps: &mut Vec<Step>) {
    let place = |target: MobjectId, position_reads: Vec<MobjectId>, edge, goal, mask| Step {
        target,
        position_reads,
        size_reads: Vec::new(),
        writes_size: false,
        rule: Rule::Place { edge, goal, mask },
    };
    match relation {
        LayoutRelation::NextTo {
            target,
            anchor,
            direction,
            buff,
            aligned_edge,
        } => steps.push(place(
            *target,
            vec![*anchor],
            *aligned_edge - *direction,
            Goal::Object {
                anchor: *anchor,
                edge: *aligned_edge + *direction,
                offset: *direction * *buff,
            },
            Mask::BOTH,
        )),
        LayoutRelation::AlignTo {
            target,
            anchor,
            edge,
        } => steps.push(place(
            *target,
            vec![*anchor],
            *edge,
            Goal::Object {
                anchor: *anchor,
                edge: *edge,
                offset: Point2D::zero(),
            },
            Mask::along(edge),
        )),
        LayoutRelation::Anchor {
            target,
            target_edge,
            anchor,
            anchor_edge,
            offset,
        } => steps.push(place(
            *target,
            vec![*anchor],
            *target_edge,
            Goal::Object {
                anchor: *anchor,
                edge: *anchor_edge,
                offset: *offset,
            },
            Mask::BOTH,
        )),
        LayoutRelation::MoveTo {
            target,
            point,
            aligned_edge,
        } => steps.push(place(
            *target,
            Vec::new(),
            *aligned_edge,
            Goal::Point(*point),
            Mask::BOTH,
        )),
        LayoutRelation::ToEdge { target, edge, buff } => steps.push(place(
            *target,
            Vec::new(),
            *edge,
            Goal::Frame {
                edge: *edge,
                buff: *buff,
            },
            Mask::along(edge),
        )),
        LayoutRelation::Arrange {
            items,
            direction,
            buff,
            aligned_edge,
            center,
        } => {
            let main_x = direction.x != 0.0;
            let (unit, across_edge) = if main_x {
                let s = sign(direction.x);
                (Point2D::new(s, 0.0), Point2D::new(0.0, sign(aligned_edge.y)))
            } else {
                let s = sign(direction.y);
                (Point2D::new(0.0, s), Point2D::new(sign(aligned_edge.x), 0.0))
            };
            if let (Some(center), Some(first)) = (center, items.first()) {
                steps.push(Step {
                    target: *first,
                    position_reads: Vec::new(),
                    size_reads: items.clone(),
                    writes_size: false,
                    rule: Rule::Place {
                        edge: across_edge - unit,
                        goal: Goal::ArrangeHead {
                            items: items.clone(),
                            main_x,
                            sign: if main_x { unit.x } else { unit.y },
                            across: if main_x { across_edge.y } else { across_edge.x },
                            buff: *buff,
                            center: *center,
                        },
                        mask: Mask::BOTH,
                    },
                });
            }
            for pair in items.windows(2) {
                steps.push(place(
                    pair[1],
                    vec![pair[0]],
                    across_edge - unit,
                    Goal::Object {
                        anchor: pair[0],
                        edge: across_edge + unit,
                        offset: unit * *buff,
                    },
                    Mask::BOTH,
                ));
            }
        }
        LayoutRelation::Distribute { items, start, step } => {
            for (k, item) in items.iter().enumerate() {
                steps.push(place(
                    *item,
                    Vec::new(),
                    Point2D::ORIGIN,
                    Goal::Point(*start + *step * k as f64),
                    Mask::BOTH,
                ));
            }
        }
        LayoutRelation::OnAxis {
            target,
            axis,
            coord,
        } => steps.push(place(
            *target,
            vec![*axis],
            Point2D::ORIGIN,
            Goal::Axis {
                axis: *axis,
                coord: *coord,
            },
            Mask::BOTH,
        )),
        LayoutRelation::Surround {
            target,
            anchor,
            buff,
        } => steps.push(Step {
            target: *target,
            position_reads: vec![*anchor],
            size_reads: Vec::new(),
            writes_size: true,
            rule: Rule::Surround {
                anchor: *anchor,
                buff: *buff,
            },
        }),
    }
}

/// Whether `step` must run after `writer`.
fn depends_on(store: &ObjectStore, step: &Step, step_index: usize, writer: &Step, writer_index: usize) -> bool {
    if writer.target == step.target {
        return writer_index < step_index;
    }
    // Moving a common ancestor shifts the read and the step's frame alike.
    let shared = |read: &MobjectId| {
        store.is_ancestor(writer.target, step.target) && store.is_ancestor(writer.target, *read)
    };
    let moves = |read: &MobjectId| store.related(writer.target, *read) && !shared(read);
    let resizes = |read: &MobjectId| {
        store.is_ancestor(*read, writer.target) || (writer.writes_size && writer.target == *read)
    };
    step.position_reads.iter().any(moves)
        || step.size_reads.iter().any(resizes)
        || resizes(&step.target)
}

/// Steps that read their own target, or something containing it or contained in it.
fn self_dependency(store: &ObjectStore, step: &Step) -> Option<Vec<MobjectId>> {
    step.position_reads
        .iter()
        .find(|read| store.related(step.target, **read))
        .map(|read| {
            let mut ids = vec![step.target, *read];
            ids.sort();
            ids.dedup();
            ids
        })
}

/// Resolves a batch of layout relations into mobject positions.
///
/// Relations form a dependency graph (a step reading a mobject runs after every step
/// that moves or resizes it) which is ordered topologically before anything is
/// written. Each placement is recomputed from the target's geometry with its own
/// translation zeroed, so resolving the same batch again yields identical positions.
pub struct LayoutSolver;

impl LayoutSolver {
    /// Compute where the relations would put their targets without touching `store`.
    /// Returns the resulting local position of every target.
    pub fn resolve(
        store: &ObjectStore,
        frame: &BoundingBox,
        relations: &[LayoutRelation],
    ) -> SlateResult<BTreeMap<MobjectId, Point2D>> {
        let mut scratch = store.clone();
        Self::apply(&mut scratch, frame, relations)?;
        let mut positions = BTreeMap::new();
        for relation in relations {
            for target in relation.targets() {
                positions.insert(target, scratch.get(target)?.transform.position);
            }
        }
        Ok(positions)
    }

    /// Resolve the relations and write the positions into `store`.
    pub fn apply(
        store: &mut ObjectStore,
        frame: &BoundingBox,
        relations: &[LayoutRelation],
    ) -> SlateResult<()> {
        if relations.is_empty() {
            return Ok(());
        }
        let mut steps = Vec::new();
        for relation in relations {
            relation.validate(store)?;
            expand(relation, &mut steps);
        }
        for index in Self::order(store, &steps)? {
            Self::run(store, frame, &steps[index])?;
        }
        Ok(())
    }

    /// Kahn's algorithm; ties go to the earliest declared step.
    fn order(store: &ObjectStore, steps: &[Step]) -> SlateResult<Vec<usize>> {
        for step in steps {
            if let Some(ids) = self_dependency(store, step) {
                return Err(SlateError::LayoutCycle { ids });
            }
        }

        let n = steps.len();
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut indegree = vec![0usize; n];
        for (i, step) in steps.iter().enumerate() {
            for (j, writer) in steps.iter().enumerate() {
                if i != j && depends_on(store, step, i, writer, j) {
                    successors[j].push(i);
                    indegree[i] += 1;
                }
            }
        }

        let mut ready: BTreeSet<usize> = (0..n).filter(|i| indegree[*i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(i) = ready.pop_first() {
            order.push(i);
            for &s in &successors[i] {
                indegree[s] -= 1;
                if indegree[s] == 0 {
                    ready.insert(s);
                }
            }
        }

        if order.len() != n {
            let ids: BTreeSet<MobjectId> = (0..n)
                .filter(|i| indegree[*i] > 0)
                .map(|i| steps[i].target)
                .collect();
            return Err(SlateError::LayoutCycle {
                ids: ids.into_iter().collect(),
            });
        }
        Ok(order)
    }

    fn run(store: &mut ObjectStore, frame: &BoundingBox, step: &Step) -> SlateResult<()> {
        match &step.rule {
            Rule::Place { edge, goal, mask } => {
                let (edge, desired) = Self::goal_point(store, frame, *edge, goal)?;
                place(store, step.target, &edge, desired, *mask)
            }
            Rule::Surround { anchor, buff } => {
                let around = store.world_bounds(*anchor)?;
                let parent = store.parent_world(step.target)?;
                let world = parent.then(&store.get(step.target)?.transform);
                let width = (around.width() + 2.0 * buff) / world.scale.x.abs().max(f64::EPSILON);
                let height = (around.height() + 2.0 * buff) / world.scale.y.abs().max(f64::EPSILON);
                store.set_shape(step.target, Shape::Rectangle { width, height })?;
                place(store, step.target, &Point2D::ORIGIN, around.center(), Mask::BOTH)
            }
        }
    }

    fn goal_point(
        store: &ObjectStore,
        frame: &BoundingBox,
        edge: Point2D,
        goal: &Goal,
    ) -> SlateResult<(Point2D, Point2D)> {
        let desired = match goal {
            Goal::Point(p) => *p,
            Goal::Object {
                anchor,
                edge: anchor_edge,
                offset,
            } => store.world_bounds(*anchor)?.critical_point(anchor_edge) + *offset,
            Goal::Frame { edge, buff } => frame.critical_point(edge) - *edge * *buff,
            Goal::Axis { axis, coord } => {
                let local = match (&store.get(*axis)?.shape, coord) {
                    (Shape::NumberLine { axis }, AxisCoord::Value(v)) => axis.to_point(*v),
                    (Shape::Axes { axes }, AxisCoord::Coords(x, y)) => axes.coords_to_point(*x, *y),
                    (shape, _) => {
                        return Err(SlateError::invalid_argument(format!(
                            "{} cannot locate {:?}",
                            shape.kind_name(),
                            coord
                        )))
                    }
                };
                store.world_transform(*axis)?.apply(&local)
            }
            Goal::ArrangeHead {
                items,
                main_x,
                sign,
                across,
                buff,
                center,
            } => {
                let mut total = 0.0;
                let mut widest: f64 = 0.0;
                for item in items {
                    let b = store.world_bounds(*item)?;
                    let (along, other) = if *main_x {
                        (b.width(), b.height())
                    } else {
                        (b.height(), b.width())
                    };
                    total += along;
                    widest = widest.max(other);
                }
                total += buff * items.len().saturating_sub(1) as f64;
                let main = -sign * total / 2.0;
                let cross = across * widest / 2.0;
                if *main_x {
                    *center + Point2D::new(main, cross)
                } else {
                    *center + Point2D::new(cross, main)
                }
            }
        };
        Ok((edge, desired))
    }
}

/// Move `target` so that its `edge` point lands on `desired`, along the masked axes.
fn place(
    store: &mut ObjectStore,
    target: MobjectId,
    edge: &Point2D,
    desired: Point2D,
    mask: Mask,
) -> SlateResult<()> {
    let mobject = store.get(target)?;
    let current = mobject.transform.position;
    let mut zeroed = mobject.transform;
    zeroed.position = Point2D::zero();
    let parent = store.parent_world(target)?;
    let local = store.local_bounds(target)?;
    let origin_point = parent.then(&zeroed).apply_box(&local).critical_point(edge);

    let position = if parent.rotation == 0.0 {
        let full = parent.inverse_vector(&(desired - origin_point));
        Point2D::new(
            if mask.x { full.x } else { current.x },
            if mask.y { full.y } else { current.y },
        )
    } else {
        let now = store.world_bounds(target)?.critical_point(edge);
        let goal = Point2D::new(
            if mask.x { desired.x } else { now.x },
            if mask.y { desired.y } else { now.y },
        );
        parent.inverse_vector(&(goal - origin_point))
    };
    store.set_position(target, position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mobject::{AttrValue, Attribute, MobjectSpec};
    use slate_core::CoordinateAxis;

    fn frame() -> BoundingBox {
        BoundingBox::from_center_size(Point2D::zero(), 8.0 * 16.0 / 9.0, 8.0)
    }

    fn add(store: &mut ObjectStore, spec: MobjectSpec) -> MobjectId {
        store.instantiate(spec)[0].id
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_next_to_below_centres_horizontally() {
        let mut store = ObjectStore::new();
        let title = add(&mut store, MobjectSpec::text("Number System"));
        let subtitle = add(
            &mut store,
            MobjectSpec::text("Let's understand numbers together!")
                .with_font_size(28.0)
                .at(Point2D::new(3.0, 3.0)),
        );
        LayoutSolver::apply(
            &mut store,
            &frame(),
            &[LayoutRelation::next_to(subtitle, title, Point2D::DOWN)],
        )
        .unwrap();
        let t = store.world_bounds(title).unwrap();
        let s = store.world_bounds(subtitle).unwrap();
        assert!(close(s.top().y, t.bottom().y - DEFAULT_BUFF));
        assert!(close(s.center().x, t.center().x));
    }

    #[test]
    fn test_distribute_uniform_spacing() {
        let mut store = ObjectStore::new();
        let circles: Vec<MobjectId> = (0..5)
            .map(|_| add(&mut store, MobjectSpec::circle(0.3)))
            .collect();
        LayoutSolver::apply(
            &mut store,
            &frame(),
            &[LayoutRelation::distribute(
                circles.clone(),
                Point2D::new(-4.0, 0.0),
                Point2D::new(1.5, 0.0),
            )],
        )
        .unwrap();
        let xs: Vec<f64> = circles
            .iter()
            .map(|c| store.get(*c).unwrap().transform.position.x)
            .collect();
        assert_eq!(xs, vec![-4.0, -2.5, -1.0, 0.5, 2.0]);
    }

    #[test]
    fn test_arrange_centres_row() {
        let mut store = ObjectStore::new();
        let squares: Vec<MobjectId> = (0..3)
            .map(|i| add(&mut store, MobjectSpec::square(1.0).at(Point2D::new(i as f64, 2.0))))
            .collect();
        LayoutSolver::apply(
            &mut store,
            &frame(),
            &[LayoutRelation::arrange(squares.clone(), Point2D::RIGHT)],
        )
        .unwrap();
        let centres: Vec<Point2D> = squares
            .iter()
            .map(|s| store.world_bounds(*s).unwrap().center())
            .collect();
        assert!(close(centres[0].x, -1.25));
        assert!(close(centres[1].x, 0.0));
        assert!(close(centres[2].x, 1.25));
        assert!(centres.iter().all(|c| close(c.y, 0.0)));
    }

    #[test]
    fn test_arrange_down_aligned_left() {
        let mut store = ObjectStore::new();
        let rows: Vec<MobjectId> = ["Integers", "Whole", "Natural numbers"]
            .iter()
            .map(|t| add(&mut store, MobjectSpec::text(*t).with_font_size(28.0)))
            .collect();
        let relation = LayoutRelation::arrange(rows.clone(), Point2D::DOWN)
            .with_buff(0.4)
            .with_aligned_edge(Point2D::LEFT);
        LayoutSolver::apply(&mut store, &frame(), &[relation]).unwrap();
        let boxes: Vec<BoundingBox> = rows
            .iter()
            .map(|r| store.world_bounds(*r).unwrap())
            .collect();
        assert!(close(boxes[0].min.x, boxes[1].min.x));
        assert!(close(boxes[0].min.x, boxes[2].min.x));
        assert!(close(boxes[1].max.y, boxes[0].min.y - 0.4));
        let whole = boxes[0].union(&boxes[1]).union(&boxes[2]);
        assert!(close(whole.center().x, 0.0));
        assert!(close(whole.center().y, 0.0));
    }

    #[test]
    fn test_to_edge_moves_only_along_edge_axis() {
        let mut store = ObjectStore::new();
        let title = add(&mut store, MobjectSpec::text("Title").at(Point2D::new(1.0, 0.0)));
        LayoutSolver::apply(&mut store, &frame(), &[LayoutRelation::to_edge(title, Point2D::UP)])
            .unwrap();
        let b = store.world_bounds(title).unwrap();
        assert!(close(b.top().y, 4.0 - DEFAULT_EDGE_BUFF));
        assert!(close(b.center().x, 1.0));
    }

    #[test]
    fn test_to_corner() {
        let mut store = ObjectStore::new();
        let label = add(&mut store, MobjectSpec::square(1.0));
        LayoutSolver::apply(
            &mut store,
            &frame(),
            &[LayoutRelation::to_edge(label, Point2D::UL).with_buff(0.2)],
        )
        .unwrap();
        let b = store.world_bounds(label).unwrap();
        assert!(close(b.min.x, frame().min.x + 0.2));
        assert!(close(b.max.y, 3.8));
    }

    #[test]
    fn test_align_to_left_keeps_y() {
        let mut store = ObjectStore::new();
        let a = add(&mut store, MobjectSpec::square(2.0).at(Point2D::new(-3.0, 1.0)));
        let b = add(&mut store, MobjectSpec::square(1.0).at(Point2D::new(2.0, -2.0)));
        LayoutSolver::apply(
            &mut store,
            &frame(),
            &[LayoutRelation::align_to(b, a, Point2D::LEFT)],
        )
        .unwrap();
        let bb = store.world_bounds(b).unwrap();
        assert!(close(bb.min.x, -4.0));
        assert!(close(bb.center().y, -2.0));
    }

    #[test]
    fn test_mutual_anchors_are_a_cycle() {
        let mut store = ObjectStore::new();
        let a = add(&mut store, MobjectSpec::circle(1.0));
        let b = add(&mut store, MobjectSpec::circle(1.0));
        let before = store.get(a).unwrap().transform;
        let err = LayoutSolver::apply(
            &mut store,
            &frame(),
            &[
                LayoutRelation::next_to(a, b, Point2D::RIGHT),
                LayoutRelation::next_to(b, a, Point2D::RIGHT),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, SlateError::LayoutCycle { ref ids } if ids == &vec![a, b]));
        assert_eq!(store.get(a).unwrap().transform, before);
    }

    #[test]
    fn test_anchoring_to_own_parent_is_a_cycle() {
        let mut store = ObjectStore::new();
        let created = store.instantiate(MobjectSpec::group(vec![MobjectSpec::dot()]));
        let (group, dot) = (created[0].id, created[1].id);
        let err = LayoutSolver::apply(
            &mut store,
            &frame(),
            &[LayoutRelation::next_to(dot, group, Point2D::UP)],
        )
        .unwrap_err();
        assert!(matches!(err, SlateError::LayoutCycle { .. }));
        assert!(LayoutSolver::apply(
            &mut store,
            &frame(),
            &[LayoutRelation::next_to(dot, dot, Point2D::UP)],
        )
        .is_err());
    }

    #[test]
    fn test_declaration_order_does_not_matter() {
        let build = |reverse: bool| {
            let mut store = ObjectStore::new();
            let a = add(&mut store, MobjectSpec::circle(0.5));
            let b = add(&mut store, MobjectSpec::square(0.7));
            let c = add(&mut store, MobjectSpec::text("c"));
            let mut relations = vec![
                LayoutRelation::to_edge(a, Point2D::LEFT),
                LayoutRelation::next_to(b, a, Point2D::RIGHT),
                LayoutRelation::next_to(c, b, Point2D::DOWN).with_buff(0.3),
            ];
            if reverse {
                relations.reverse();
            }
            LayoutSolver::resolve(&store, &frame(), &relations).unwrap()
        };
        assert_eq!(build(false), build(true));
    }

    #[test]
    fn test_resolve_is_pure_and_repeatable() {
        let mut store = ObjectStore::new();
        let a = add(&mut store, MobjectSpec::circle(0.5).at(Point2D::new(0.3, 0.1)));
        let b = add(&mut store, MobjectSpec::text("label"));
        let relations = vec![LayoutRelation::next_to(b, a, Point2D::UR)];
        let first = LayoutSolver::resolve(&store, &frame(), &relations).unwrap();
        assert_eq!(store.get(b).unwrap().transform.position, Point2D::zero());

        LayoutSolver::apply(&mut store, &frame(), &relations).unwrap();
        LayoutSolver::apply(&mut store, &frame(), &relations).unwrap();
        assert_eq!(store.get(b).unwrap().transform.position, first[&b]);
    }

    #[test]
    fn test_group_waits_for_member_layout() {
        let mut store = ObjectStore::new();
        let created = store.instantiate(MobjectSpec::group(vec![
            MobjectSpec::circle(0.5),
            MobjectSpec::text("label").with_font_size(24.0),
        ]));
        let (group, circle, label) = (created[0].id, created[1].id, created[2].id);
        LayoutSolver::apply(
            &mut store,
            &frame(),
            &[
                LayoutRelation::to_edge(group, Point2D::DOWN),
                LayoutRelation::next_to(label, circle, Point2D::DOWN),
            ],
        )
        .unwrap();
        let g = store.world_bounds(group).unwrap();
        let l = store.world_bounds(label).unwrap();
        assert!(close(g.bottom().y, -4.0 + DEFAULT_EDGE_BUFF));
        assert!(close(l.bottom().y, g.bottom().y));
    }

    #[test]
    fn test_on_axis_places_at_value() {
        let mut store = ObjectStore::new();
        let axis = CoordinateAxis::new(-5.0, 5.0, 1.0, 10.0).unwrap();
        let line = add(&mut store, MobjectSpec::number_line(axis).at(Point2D::new(0.0, -1.0)));
        let dot = add(&mut store, MobjectSpec::dot());
        LayoutSolver::apply(
            &mut store,
            &frame(),
            &[LayoutRelation::on_axis(dot, line, 3.0)],
        )
        .unwrap();
        assert_eq!(store.get(dot).unwrap().transform.position, Point2D::new(3.0, -1.0));

        let err = LayoutSolver::apply(
            &mut store,
            &frame(),
            &[LayoutRelation::on_axis(dot, dot, 1.0)],
        )
        .unwrap_err();
        assert!(matches!(err, SlateError::InvalidArgument(_)));
    }

    #[test]
    fn test_surround_encloses_anchor() {
        let mut store = ObjectStore::new();
        let text = add(&mut store, MobjectSpec::text("x = 3").at(Point2D::new(1.0, 1.0)));
        let rect = add(&mut store, MobjectSpec::rectangle(1.0, 1.0));
        LayoutSolver::apply(
            &mut store,
            &frame(),
            &[LayoutRelation::surround(rect, text).with_buff(0.2)],
        )
        .unwrap();
        let t = store.world_bounds(text).unwrap();
        let r = store.world_bounds(rect).unwrap();
        assert!(close(r.width(), t.width() + 0.4));
        assert!(close(r.height(), t.height() + 0.4));
        assert!(close(r.center().x, t.center().x));
    }

    #[test]
    fn test_move_to_inside_scaled_parent() {
        let mut store = ObjectStore::new();
        let created = store.instantiate(
            MobjectSpec::group(vec![MobjectSpec::dot()]).at(Point2D::new(1.0, 1.0)),
        );
        let (group, dot) = (created[0].id, created[1].id);
        store
            .set_attribute(group, Attribute::Scale, AttrValue::Number(2.0))
            .unwrap();
        LayoutSolver::apply(
            &mut store,
            &frame(),
            &[LayoutRelation::move_to(dot, Point2D::new(-3.0, 2.0))],
        )
        .unwrap();
        let c = store.world_bounds(dot).unwrap().center();
        assert!(close(c.x, -3.0) && close(c.y, 2.0));
        assert_eq!(store.get(dot).unwrap().transform.position, Point2D::new(-2.0, 0.5));
    }

    #[test]
    fn test_dangling_reference() {
        let mut store = ObjectStore::new();
        let a = add(&mut store, MobjectSpec::dot());
        let err = LayoutSolver::apply(
            &mut store,
            &frame(),
            &[LayoutRelation::next_to(a, MobjectId(99), Point2D::UP)],
        )
        .unwrap_err();
        assert!(matches!(err, SlateError::DanglingReference { id } if id == MobjectId(99)));
    }

    #[test]
    fn test_arrange_rejects_diagonal() {
        let mut store = ObjectStore::new();
        let a = add(&mut store, MobjectSpec::dot());
        assert!(LayoutSolver::apply(
            &mut store,
            &frame(),
            &[LayoutRelation::arrange(vec![a], Point2D::UR)],
        )
        .is_err());
    }

    #[test]
    fn test_empty_item_lists_rejected() {
        let store = ObjectStore::new();
        for relation in [
            LayoutRelation::arrange(Vec::new(), Point2D::RIGHT),
            LayoutRelation::distribute(Vec::new(), Point2D::zero(), Point2D::RIGHT),
        ] {
            assert!(matches!(
                relation.validate(&store),
                Err(SlateError::InvalidArgument(_))
            ));
        }
    }
}
