use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use slate_core::{
    BoundingBox, Color, Duration, Easing, Morph, MobjectId, Point2D, Shape, SlateError,
    SlateResult, Transform2D,
};

use crate::layout::{LayoutRelation, LayoutSolver};
use crate::mobject::{Mobject, Style};
use crate::store::ObjectStore;

/// Longest default lag between the parts of a written mobject.
const WRITE_MAX_LAG: f64 = 0.2;

/// How a progressive reveal traces its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    /// Trace outlines only.
    Create,
    /// Trace outlines while the fill fades in, parts staggered by default.
    Write,
}

/// Which part of the source becomes which part of the target in a transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Correspondence {
    /// Part `i` of the source becomes part `i` of the target; part counts must match.
    ByIndex,
    /// Explicit `(source part, target part)` pairs. Every target part must be covered
    /// and no source part may be used twice. Unpaired source parts fade out.
    Pairs(Vec<(usize, usize)>),
}

/// Where a move animation takes its subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveTarget {
    /// Centre the subject on a canvas point.
    Point(Point2D),
    /// Displace the subject by a canvas vector.
    Shift(Point2D),
    /// Wherever a layout relation would put it.
    Relation(LayoutRelation),
}

/// What an animation does to its target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnimationKind {
    /// Opacity 0 to full, optionally sliding in by `shift` and growing from `scale`.
    FadeIn { shift: Point2D, scale: f64 },
    /// Progressive trace of every part, a prefix of the geometry at partial time.
    Draw {
        mode: DrawMode,
        lag_ratio: Option<f64>,
    },
    /// Scale up from nothing about the centre.
    GrowFromCenter,
    /// Scale a line or arrow up from its start point.
    GrowArrow,
    /// Opacity to 0, optionally sliding away by `shift` and shrinking to `scale`.
    FadeOut { shift: Point2D, scale: f64 },
    /// Scale down to nothing about the centre.
    ShrinkToCenter,
    /// Progressive untrace, the inverse of `Draw { mode: Create }`.
    Uncreate,
    /// Morph the target's parts into the parts of `into`. With `replace` the target
    /// leaves the stage at the end and `into` takes its place.
    Transform {
        into: MobjectId,
        correspondence: Correspondence,
        replace: bool,
    },
    Move { to: MoveTarget },
    /// Scale about the centre by `factor`.
    Scale { factor: f64 },
    /// Rotate about the centre by `angle` radians.
    Rotate { angle: f64 },
    /// Change the color of the target and everything it contains.
    Recolor { color: Color },
}

/// A stateless animation descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub kind: AnimationKind,
    pub target: MobjectId,
    /// Run time in seconds. Falls back to the configured default run time.
    pub run_time: Option<f64>,
    /// Falls back to the configured default easing.
    pub easing: Option<Easing>,
}

/// Staging change applied when a play group ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndEffect {
    Remove(MobjectId),
    Replace {
        source: MobjectId,
        target: MobjectId,
    },
}

impl Animation {
    pub fn new(kind: AnimationKind, target: MobjectId) -> Self {
        Self {
            kind,
            target,
            run_time: None,
            easing: None,
        }
    }

    pub fn fade_in(target: MobjectId) -> Self {
        Self::new(
            AnimationKind::FadeIn {
                shift: Point2D::zero(),
                scale: 1.0,
            },
            target,
        )
    }

    pub fn create(target: MobjectId) -> Self {
        Self::new(
            AnimationKind::Draw {
                mode: DrawMode::Create,
                lag_ratio: None,
            },
            target,
        )
    }

    pub fn write(target: MobjectId) -> Self {
        Self::new(
            AnimationKind::Draw {
                mode: DrawMode::Write,
                lag_ratio: None,
            },
            target,
        )
    }

    pub fn grow_from_center(target: MobjectId) -> Self {
        Self::new(AnimationKind::GrowFromCenter, target)
    }

    pub fn grow_arrow(target: MobjectId) -> Self {
        Self::new(AnimationKind::GrowArrow, target)
    }

    pub fn fade_out(target: MobjectId) -> Self {
        Self::new(
            AnimationKind::FadeOut {
                shift: Point2D::zero(),
                scale: 1.0,
            },
            target,
        )
    }

    pub fn shrink_to_center(target: MobjectId) -> Self {
        Self::new(AnimationKind::ShrinkToCenter, target)
    }

    pub fn uncreate(target: MobjectId) -> Self {
        Self::new(AnimationKind::Uncreate, target)
    }

    pub fn transform(source: MobjectId, into: MobjectId) -> Self {
        Self::new(
            AnimationKind::Transform {
                into,
                correspondence: Correspondence::ByIndex,
                replace: false,
            },
            source,
        )
    }

    pub fn replacement_transform(source: MobjectId, into: MobjectId) -> Self {
        Self::new(
            AnimationKind::Transform {
                into,
                correspondence: Correspondence::ByIndex,
                replace: true,
            },
            source,
        )
    }

    pub fn move_to(target: MobjectId, point: Point2D) -> Self {
        Self::new(
            AnimationKind::Move {
                to: MoveTarget::Point(point),
            },
            target,
        )
    }

    pub fn shift(target: MobjectId, delta: Point2D) -> Self {
        Self::new(
            AnimationKind::Move {
                to: MoveTarget::Shift(delta),
            },
            target,
        )
    }

    /// Animate every mobject a relation positions to where it would put them.
    ///
    /// Fails when the relation positions nothing, such as an arrangement of no items.
    pub fn relayout(relation: LayoutRelation) -> SlateResult<Self> {
        let target = relation.targets().first().copied().ok_or_else(|| {
            SlateError::invalid_argument(format!("{:?} positions no mobjects", relation))
        })?;
        Ok(Self::new(
            AnimationKind::Move {
                to: MoveTarget::Relation(relation),
            },
            target,
        ))
    }

    pub fn scale(target: MobjectId, factor: f64) -> Self {
        Self::new(AnimationKind::Scale { factor }, target)
    }

    pub fn rotate(target: MobjectId, angle: f64) -> Self {
        Self::new(AnimationKind::Rotate { angle }, target)
    }

    pub fn recolor(target: MobjectId, color: Color) -> Self {
        Self::new(AnimationKind::Recolor { color }, target)
    }

    pub fn with_run_time(mut self, seconds: f64) -> Self {
        self.run_time = Some(seconds);
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }

    /// Set the slide of a fade.
    pub fn with_shift(mut self, by: Point2D) -> Self {
        if let AnimationKind::FadeIn { shift, .. } | AnimationKind::FadeOut { shift, .. } =
            &mut self.kind
        {
            *shift = by;
        }
        self
    }

    /// Set the start scale of a fade in, or the end scale of a fade out.
    pub fn with_scale(mut self, factor: f64) -> Self {
        if let AnimationKind::FadeIn { scale, .. } | AnimationKind::FadeOut { scale, .. } =
            &mut self.kind
        {
            *scale = factor;
        }
        self
    }

    pub fn with_lag_ratio(mut self, ratio: f64) -> Self {
        if let AnimationKind::Draw { lag_ratio, .. } = &mut self.kind {
            *lag_ratio = Some(ratio);
        }
        self
    }

    /// Use explicit part pairs for a transform.
    pub fn with_pairs(mut self, pairs: Vec<(usize, usize)>) -> Self {
        if let AnimationKind::Transform { correspondence, .. } = &mut self.kind {
            *correspondence = Correspondence::Pairs(pairs);
        }
        self
    }

    /// Run time once defaults are applied.
    pub fn resolved_run_time(&self, default: Duration) -> Duration {
        self.run_time.map(Duration::from_seconds).unwrap_or(default)
    }

    pub fn is_appear(&self) -> bool {
        matches!(
            self.kind,
            AnimationKind::FadeIn { .. }
                | AnimationKind::Draw { .. }
                | AnimationKind::GrowFromCenter
                | AnimationKind::GrowArrow
        )
    }

    pub fn is_disappear(&self) -> bool {
        matches!(
            self.kind,
            AnimationKind::FadeOut { .. } | AnimationKind::ShrinkToCenter | AnimationKind::Uncreate
        )
    }

    /// Mobjects staged when the animation's group starts.
    pub fn subjects(&self) -> Vec<MobjectId> {
        match &self.kind {
            AnimationKind::Move {
                to: MoveTarget::Relation(relation),
            } => relation.targets(),
            _ => vec![self.target],
        }
    }

    /// Every mobject the animation reads or writes.
    pub fn references(&self) -> Vec<MobjectId> {
        let mut ids = vec![self.target];
        match &self.kind {
            AnimationKind::Transform { into, .. } => ids.push(*into),
            AnimationKind::Move {
                to: MoveTarget::Relation(relation),
            } => ids.extend(relation.references()),
            _ => {}
        }
        ids
    }

    /// Staging changes applied when the animation's group ends.
    pub fn end_effects(&self) -> Vec<EndEffect> {
        match &self.kind {
            AnimationKind::Transform {
                into,
                replace: true,
                ..
            } => vec![EndEffect::Replace {
                source: self.target,
                target: *into,
            }],
            _ if self.is_disappear() => vec![EndEffect::Remove(self.target)],
            _ => Vec::new(),
        }
    }

    /// Check references, parameters and transform correspondence against the
    /// current object model.
    pub fn validate(&self, store: &ObjectStore) -> SlateResult<()> {
        store.require(self.references())?;
        if let Some(seconds) = self.run_time {
            Duration::checked_from_seconds(seconds)?;
        }
        let invalid = |what: String| Err(SlateError::invalid_argument(what));
        match &self.kind {
            AnimationKind::FadeIn { shift, scale } | AnimationKind::FadeOut { shift, scale } => {
                if !shift.is_finite() || !scale.is_finite() || *scale < 0.0 {
                    return invalid(format!("bad fade shift {:?} or scale {}", shift, scale));
                }
            }
            AnimationKind::Draw {
                lag_ratio: Some(lag),
                ..
            } if !lag.is_finite() || *lag < 0.0 => {
                return invalid(format!("lag ratio must be non-negative, got {}", lag));
            }
            AnimationKind::GrowArrow => {
                arrow_start(store.get(self.target)?)?;
            }
            AnimationKind::Transform {
                into,
                correspondence,
                ..
            } => {
                pairing(store, self.target, *into, correspondence)?;
            }
            AnimationKind::Move { to } => match to {
                MoveTarget::Point(p) | MoveTarget::Shift(p) if !p.is_finite() => {
                    return invalid(format!("non-finite move target {:?}", p));
                }
                MoveTarget::Relation(LayoutRelation::Surround { .. }) => {
                    return invalid("a surrounding rectangle cannot be animated into place".into());
                }
                MoveTarget::Relation(relation) if !relation.targets().contains(&self.target) => {
                    return invalid(format!("{:?} does not position {}", relation, self.target));
                }
                MoveTarget::Relation(relation) => relation.validate(store)?,
                _ => {}
            },
            AnimationKind::Scale { factor } if !factor.is_finite() => {
                return invalid(format!("non-finite scale factor {}", factor));
            }
            AnimationKind::Rotate { angle } if !angle.is_finite() => {
                return invalid(format!("non-finite rotation {}", angle));
            }
            _ => {}
        }
        Ok(())
    }

    /// Capture start and end states from the current object model.
    pub fn begin(
        &self,
        store: &ObjectStore,
        frame: &BoundingBox,
        duration: Duration,
        default_easing: Easing,
    ) -> SlateResult<ActiveAnimation> {
        self.validate(store)?;
        let target = store.get(self.target)?;
        let start = VisualState::of(target);
        let centre = store.bounds_in_parent(self.target)?.center();
        let single = |to: VisualState, commit: Commit| vec![Track::new(self.target, start, to, commit)];

        let tracks = match &self.kind {
            AnimationKind::FadeIn { shift, scale } => {
                let mut from = start.scaled_about(centre, *scale);
                from.transform.position = from.transform.position
                    - store.parent_world(self.target)?.inverse_vector(shift);
                from.style.opacity = 0.0;
                vec![Track::new(self.target, from, start, Commit::Write)]
            }
            AnimationKind::FadeOut { shift, scale } => {
                let mut to = start.scaled_about(centre, *scale);
                to.transform.position =
                    to.transform.position + store.parent_world(self.target)?.inverse_vector(shift);
                to.style.opacity = 0.0;
                single(to, Commit::Discard)
            }
            AnimationKind::Draw { mode, lag_ratio } => {
                let parts = store.parts(self.target)?;
                let n = parts.len();
                let lag = lag_ratio.unwrap_or(match mode {
                    DrawMode::Create => 0.0,
                    DrawMode::Write => (4.0 / n.max(1) as f64).min(WRITE_MAX_LAG),
                });
                let mut tracks = Vec::with_capacity(n);
                for (part, window) in parts.iter().zip(lag_windows(n, lag)) {
                    let end = VisualState::of(store.get(*part)?);
                    let mut from = end;
                    from.draw_progress = 0.0;
                    if *mode == DrawMode::Write {
                        from.style.fill_opacity = 0.0;
                    }
                    tracks.push(Track::new(*part, from, end, Commit::Write).within(window));
                }
                tracks
            }
            AnimationKind::Uncreate => {
                let parts = store.parts(self.target)?;
                let mut tracks = Vec::with_capacity(parts.len());
                for part in parts {
                    let from = VisualState::of(store.get(part)?);
                    let mut to = from;
                    to.draw_progress = 0.0;
                    tracks.push(Track::new(part, from, to, Commit::Discard));
                }
                tracks
            }
            AnimationKind::GrowFromCenter => {
                vec![Track::new(self.target, start.scaled_about(centre, 0.0), start, Commit::Write)]
            }
            AnimationKind::ShrinkToCenter => single(start.scaled_about(centre, 0.0), Commit::Discard),
            AnimationKind::GrowArrow => {
                let anchor = target.transform.apply(&arrow_start(target)?);
                vec![Track::new(self.target, start.scaled_about(anchor, 0.0), start, Commit::Write)]
            }
            AnimationKind::Scale { factor } => single(start.scaled_about(centre, *factor), Commit::Write),
            AnimationKind::Rotate { angle } => {
                let mut to = start;
                to.transform.rotation += angle;
                let pivot = Pivot {
                    center: centre,
                    angle: *angle,
                };
                to.transform.position = pivot.place(start.transform.position, 1.0);
                let mut track = Track::new(self.target, start, to, Commit::Write);
                track.pivot = Some(pivot);
                vec![track]
            }
            AnimationKind::Recolor { color } => {
                let mut tracks = Vec::new();
                for member in store.family(self.target)? {
                    let from = VisualState::of(store.get(member)?);
                    let mut to = from;
                    to.style.color = *color;
                    tracks.push(Track::new(member, from, to, Commit::Write));
                }
                tracks
            }
            AnimationKind::Move { to } => {
                let relation = match to {
                    MoveTarget::Point(point) => LayoutRelation::move_to(self.target, *point),
                    MoveTarget::Shift(delta) => {
                        let mut end = start;
                        end.transform.position = end.transform.position
                            + store.parent_world(self.target)?.inverse_vector(delta);
                        return Ok(self.activate(single(end, Commit::Write), duration, default_easing));
                    }
                    MoveTarget::Relation(relation) => relation.clone(),
                };
                let mut tracks = Vec::new();
                for (id, position) in LayoutSolver::resolve(store, frame, &[relation])? {
                    let from = VisualState::of(store.get(id)?);
                    let mut end = from;
                    end.transform.position = position;
                    tracks.push(Track::new(id, from, end, Commit::Write));
                }
                tracks
            }
            AnimationKind::Transform {
                into,
                correspondence,
                replace,
            } => transform_tracks(store, self.target, *into, correspondence, *replace)?,
        };
        Ok(self.activate(tracks, duration, default_easing))
    }

    fn activate(&self, tracks: Vec<Track>, duration: Duration, default_easing: Easing) -> ActiveAnimation {
        ActiveAnimation {
            offset: 0.0,
            duration,
            easing: self.easing.unwrap_or(default_easing),
            tracks,
        }
    }
}

/// Start point of a line or arrow in its own frame.
fn arrow_start(mobject: &Mobject) -> SlateResult<Point2D> {
    match &mobject.shape {
        Shape::Line { start, .. } | Shape::Arrow { start, .. } => Ok(*start),
        other => Err(SlateError::invalid_argument(format!(
            "only lines and arrows can grow from their start, {} is a {}",
            mobject.label(),
            other.kind_name()
        ))),
    }
}

/// Evenly staggered windows for `n` parts: each spans `1 / full` of the animation and
/// starts `lag / full` after the previous one, where `full = (n - 1) * lag + 1`.
pub(crate) fn lag_windows(n: usize, lag: f64) -> Vec<(f64, f64)> {
    let full = n.saturating_sub(1) as f64 * lag + 1.0;
    (0..n)
        .map(|i| {
            let start = i as f64 * lag;
            (start / full, (start + 1.0) / full)
        })
        .collect()
}

/// Parts matched by a transform.
struct Pairing {
    pairs: Vec<(MobjectId, MobjectId)>,
    unpaired: Vec<MobjectId>,
}

fn pairing(
    store: &ObjectStore,
    source: MobjectId,
    target: MobjectId,
    correspondence: &Correspondence,
) -> SlateResult<Pairing> {
    if store.related(source, target) {
        return Err(SlateError::incompatible(
            source,
            target,
            "a mobject cannot transform into itself or one of its own parts",
        ));
    }
    let from = store.parts(source)?;
    let to = store.parts(target)?;
    match correspondence {
        Correspondence::ByIndex => {
            if from.len() != to.len() {
                return Err(SlateError::incompatible(
                    source,
                    target,
                    format!(
                        "source has {} parts and target has {}, and no correspondence was declared",
                        from.len(),
                        to.len()
                    ),
                ));
            }
            Ok(Pairing {
                pairs: from.into_iter().zip(to).collect(),
                unpaired: Vec::new(),
            })
        }
        Correspondence::Pairs(pairs) => {
            let mut used = vec![false; from.len()];
            let mut covered = vec![false; to.len()];
            let mut matched = Vec::with_capacity(pairs.len());
            for &(i, j) in pairs {
                if i >= from.len() || j >= to.len() {
                    return Err(SlateError::incompatible(
                        source,
                        target,
                        format!(
                            "pair ({}, {}) is out of range for {} source and {} target parts",
                            i,
                            j,
                            from.len(),
                            to.len()
                        ),
                    ));
                }
                if used[i] {
                    return Err(SlateError::incompatible(
                        source,
                        target,
                        format!("source part {} is paired more than once", i),
                    ));
                }
                used[i] = true;
                covered[j] = true;
                matched.push((from[i], to[j]));
            }
            if let Some(j) = covered.iter().position(|c| !c) {
                return Err(SlateError::incompatible(
                    source,
                    target,
                    format!("target part {} has no source", j),
                ));
            }
            let unpaired = from
                .iter()
                .zip(&used)
                .filter(|(_, u)| !**u)
                .map(|(id, _)| *id)
                .collect();
            Ok(Pairing {
                pairs: matched,
                unpaired,
            })
        }
    }
}

/// World transform `id` will have once every paired part has reached its target.
fn end_world(
    store: &ObjectStore,
    id: MobjectId,
    targets: &BTreeMap<MobjectId, Transform2D>,
) -> SlateResult<Transform2D> {
    if let Some(world) = targets.get(&id) {
        return Ok(*world);
    }
    let mobject = store.get(id)?;
    let parent = match mobject.parent {
        Some(parent) => end_world(store, parent, targets)?,
        None => Transform2D::identity(),
    };
    Ok(parent.then(&mobject.transform))
}

fn transform_tracks(
    store: &ObjectStore,
    source: MobjectId,
    into: MobjectId,
    correspondence: &Correspondence,
    replace: bool,
) -> SlateResult<Vec<Track>> {
    let Pairing { pairs, unpaired } = pairing(store, source, into, correspondence)?;
    let mut targets = BTreeMap::new();
    for (from, to) in &pairs {
        targets.insert(*from, store.world_transform(*to)?);
    }

    let (commit, hide) = if replace {
        (Commit::Discard, Commit::Discard)
    } else {
        (Commit::Write, Commit::Hide)
    };
    let mut tracks = Vec::with_capacity(pairs.len() + unpaired.len());
    for (from_id, to_id) in &pairs {
        let part = store.get(*from_id)?;
        let goal = store.get(*to_id)?;
        let parent_end = match part.parent {
            Some(parent) => end_world(store, parent, &targets)?,
            None => Transform2D::identity(),
        };
        let end = VisualState {
            transform: targets[from_id].relative_to(&parent_end),
            style: goal.style,
            draw_progress: 1.0,
        };
        let mut track = Track::new(*from_id, VisualState::of(part), end, commit);
        if goal.shape != part.shape {
            track.morph_into = Some(goal.shape.clone());
        }
        tracks.push(track);
    }
    for id in unpaired {
        let from = VisualState::of(store.get(id)?);
        let mut to = from;
        to.style.opacity = 0.0;
        tracks.push(Track::new(id, from, to, hide));
    }
    Ok(tracks)
}

/// The animatable state of one mobject.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualState {
    pub transform: Transform2D,
    pub style: Style,
    pub draw_progress: f64,
}

impl VisualState {
    pub fn of(mobject: &Mobject) -> Self {
        Self {
            transform: mobject.transform,
            style: mobject.style,
            draw_progress: 1.0,
        }
    }

    pub fn lerp(&self, other: &VisualState, t: f64) -> VisualState {
        VisualState {
            transform: self.transform.lerp(&other.transform, t),
            style: self.style.lerp(&other.style, t),
            draw_progress: slate_core::math::lerp(self.draw_progress, other.draw_progress, t),
        }
    }

    /// Scale about `anchor`, a point in the parent's frame.
    fn scaled_about(&self, anchor: Point2D, factor: f64) -> VisualState {
        let mut out = *self;
        out.transform.position = anchor + (self.transform.position - anchor) * factor;
        out.transform.scale = self.transform.scale * factor;
        out
    }
}

/// What happens to a track's mobject when its group ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// Keep the final sampled state.
    Write,
    /// Restore the state from before the group.
    Discard,
    /// Restore, and hide the mobject.
    Hide,
}

/// Circular motion of a rotating mobject's position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pivot {
    pub center: Point2D,
    pub angle: f64,
}

impl Pivot {
    fn place(&self, from: Point2D, alpha: f64) -> Point2D {
        self.center + (from - self.center).rotate(self.angle * alpha)
    }
}

/// The interpolation of one mobject inside an animation.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: MobjectId,
    pub from: VisualState,
    pub to: VisualState,
    /// Part of the animation's normalized time this track moves in.
    pub window: (f64, f64),
    pub morph_into: Option<Shape>,
    pub pivot: Option<Pivot>,
    pub commit: Commit,
}

impl Track {
    fn new(id: MobjectId, from: VisualState, to: VisualState, commit: Commit) -> Self {
        Self {
            id,
            from,
            to,
            window: (0.0, 1.0),
            morph_into: None,
            pivot: None,
            commit,
        }
    }

    fn within(mut self, window: (f64, f64)) -> Self {
        self.window = window;
        self
    }

    /// Map animation progress in [0, 1] onto this track's window.
    pub fn local_progress(&self, progress: f64) -> f64 {
        let (start, end) = self.window;
        if end > start {
            ((progress - start) / (end - start)).clamp(0.0, 1.0)
        } else if progress >= end {
            1.0
        } else {
            0.0
        }
    }

    /// State at eased progress `alpha`.
    pub fn sample(&self, alpha: f64) -> TrackSample {
        let mut state = self.from.lerp(&self.to, alpha);
        if let Some(pivot) = &self.pivot {
            state.transform.position = pivot.place(self.from.transform.position, alpha);
        }
        TrackSample {
            id: self.id,
            state,
            morph: self.morph_into.clone().map(|into| Morph { into, alpha }),
        }
    }
}

/// One mobject's state at a sampled instant.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSample {
    pub id: MobjectId,
    pub state: VisualState,
    pub morph: Option<Morph>,
}

/// An animation bound to concrete start and end states for one play group.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveAnimation {
    /// Seconds into the group before this animation starts.
    pub offset: f64,
    pub duration: Duration,
    pub easing: Easing,
    pub tracks: Vec<Track>,
}

impl ActiveAnimation {
    pub fn starting_at(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    /// Eased progress of `track` at `t` seconds into the group. Tracks hold their start
    /// state until the animation's offset.
    pub fn alpha(&self, track: &Track, t: f64) -> f64 {
        let elapsed = t - self.offset;
        let progress = if self.duration.is_zero() {
            if elapsed >= 0.0 {
                1.0
            } else {
                0.0
            }
        } else {
            (elapsed / self.duration.as_seconds()).clamp(0.0, 1.0)
        };
        self.easing.apply(track.local_progress(progress))
    }

    pub fn sample(&self, t: f64) -> impl Iterator<Item = TrackSample> + '_ {
        self.tracks.iter().map(move |track| track.sample(self.alpha(track, t)))
    }

    /// Samples at the end of the animation, paired with their commit rule.
    pub fn finish(&self) -> impl Iterator<Item = (TrackSample, Commit)> + '_ {
        let end = self.offset + self.duration.as_seconds();
        self.tracks
            .iter()
            .map(move |track| (track.sample(self.alpha(track, end)), track.commit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mobject::MobjectSpec;

    fn frame() -> BoundingBox {
        BoundingBox::from_center_size(Point2D::zero(), 8.0 * 16.0 / 9.0, 8.0)
    }

    fn begin(store: &ObjectStore, animation: &Animation) -> ActiveAnimation {
        animation
            .begin(store, &frame(), Duration::from_seconds(1.0), Easing::Linear)
            .unwrap()
    }

    fn add(store: &mut ObjectStore, spec: MobjectSpec) -> MobjectId {
        store.instantiate(spec)[0].id
    }

    #[test]
    fn test_fade_in_opacity_ramp() {
        let mut store = ObjectStore::new();
        let c = add(&mut store, MobjectSpec::circle(1.0).with_opacity(0.8));
        let active = begin(&store, &Animation::fade_in(c));
        let half: Vec<TrackSample> = active.sample(0.5).collect();
        assert_eq!(half.len(), 1);
        assert!((half[0].state.style.opacity - 0.4).abs() < 1e-12);
        let end: Vec<TrackSample> = active.sample(1.0).collect();
        assert_eq!(end[0].state.style.opacity, 0.8);
    }

    #[test]
    fn test_offset_holds_start_state() {
        let mut store = ObjectStore::new();
        let c = add(&mut store, MobjectSpec::circle(1.0));
        let active = begin(&store, &Animation::fade_in(c)).starting_at(0.5);
        let before: Vec<TrackSample> = active.sample(0.25).collect();
        assert_eq!(before[0].state.style.opacity, 0.0);
        let mid: Vec<TrackSample> = active.sample(1.0).collect();
        assert!((mid[0].state.style.opacity - 0.5).abs() < 1e-12);
        let (end, _) = active.finish().next().unwrap();
        assert_eq!(end.state.style.opacity, 1.0);
    }

    #[test]
    fn test_fade_in_with_shift_slides_into_place() {
        let mut store = ObjectStore::new();
        let c = add(&mut store, MobjectSpec::dot().at(Point2D::new(1.0, 1.0)));
        let active = begin(&store, &Animation::fade_in(c).with_shift(Point2D::UP));
        let start: Vec<TrackSample> = active.sample(0.0).collect();
        assert_eq!(start[0].state.transform.position, Point2D::new(1.0, 0.0));
        let end: Vec<TrackSample> = active.sample(1.0).collect();
        assert_eq!(end[0].state.transform.position, Point2D::new(1.0, 1.0));
    }

    #[test]
    fn test_draw_traces_instead_of_fading() {
        let mut store = ObjectStore::new();
        let t = add(&mut store, MobjectSpec::text("Numbers"));
        let fade = begin(&store, &Animation::fade_in(t));
        let draw = begin(&store, &Animation::write(t));
        let f: Vec<TrackSample> = fade.sample(0.5).collect();
        let d: Vec<TrackSample> = draw.sample(0.5).collect();
        assert_eq!(f[0].state.draw_progress, 1.0);
        assert!(f[0].state.style.opacity < 1.0);
        assert!((d[0].state.draw_progress - 0.5).abs() < 1e-12);
        assert_eq!(d[0].state.style.opacity, 1.0);
        assert!((d[0].state.style.fill_opacity - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_draw_staggers_parts() {
        let mut store = ObjectStore::new();
        let g = add(
            &mut store,
            MobjectSpec::group((0..3).map(|_| MobjectSpec::square(1.0)).collect()),
        );
        let active = begin(&store, &Animation::create(g).with_lag_ratio(0.5));
        let windows: Vec<(f64, f64)> = active.tracks.iter().map(|t| t.window).collect();
        assert_eq!(windows, vec![(0.0, 0.5), (0.25, 0.75), (0.5, 1.0)]);
        let at: Vec<f64> = active.sample(0.25).map(|s| s.state.draw_progress).collect();
        assert_eq!(at, vec![0.5, 0.0, 0.0]);
        assert!(active.sample(1.0).all(|s| s.state.draw_progress == 1.0));
    }

    #[test]
    fn test_grow_arrow_scales_from_start() {
        let mut store = ObjectStore::new();
        let a = add(
            &mut store,
            MobjectSpec::arrow(Point2D::new(-1.0, 0.0), Point2D::new(1.0, 0.0)).at(Point2D::new(0.0, 2.0)),
        );
        let active = begin(&store, &Animation::grow_arrow(a));
        let start: Vec<TrackSample> = active.sample(0.0).collect();
        assert_eq!(start[0].state.transform.scale, Point2D::zero());
        assert_eq!(start[0].state.transform.position, Point2D::new(-1.0, 2.0));

        let c = add(&mut store, MobjectSpec::circle(1.0));
        assert!(matches!(
            Animation::grow_arrow(c).validate(&store),
            Err(SlateError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_fade_out_discards_and_removes() {
        let mut store = ObjectStore::new();
        let c = add(&mut store, MobjectSpec::circle(1.0));
        let animation = Animation::fade_out(c);
        assert_eq!(animation.end_effects(), vec![EndEffect::Remove(c)]);
        let active = begin(&store, &animation);
        assert!(active.finish().all(|(s, commit)| commit == Commit::Discard && s.state.style.opacity == 0.0));
    }

    #[test]
    fn test_transform_mismatched_parts_rejected() {
        let mut store = ObjectStore::new();
        let three = add(
            &mut store,
            MobjectSpec::group((0..3).map(|_| MobjectSpec::dot()).collect()),
        );
        let two = add(
            &mut store,
            MobjectSpec::group((0..2).map(|_| MobjectSpec::dot()).collect()),
        );
        let err = Animation::transform(three, two).validate(&store).unwrap_err();
        assert!(matches!(
            err,
            SlateError::IncompatibleTransform { source_id, target_id, .. }
                if source_id == three && target_id == two
        ));
        Animation::transform(three, two)
            .with_pairs(vec![(0, 0), (2, 1)])
            .validate(&store)
            .unwrap();
        assert!(Animation::transform(three, two)
            .with_pairs(vec![(0, 0), (0, 1)])
            .validate(&store)
            .is_err());
        assert!(Animation::transform(three, two)
            .with_pairs(vec![(0, 0)])
            .validate(&store)
            .is_err());
    }

    #[test]
    fn test_transform_pairs_fade_unpaired_parts() {
        let mut store = ObjectStore::new();
        let created = store.instantiate(MobjectSpec::group(vec![
            MobjectSpec::dot(),
            MobjectSpec::square(1.0),
        ]));
        let (source, dot) = (created[0].id, created[1].id);
        let target = add(&mut store, MobjectSpec::circle(0.5).at(Point2D::new(3.0, 0.0)));
        let active = begin(&store, &Animation::transform(source, target).with_pairs(vec![(1, 0)]));
        let finished: Vec<(TrackSample, Commit)> = active.finish().collect();
        assert_eq!(finished.len(), 2);
        assert_eq!(finished[0].1, Commit::Write);
        assert_eq!(finished[0].0.state.transform.position, Point2D::new(3.0, 0.0));
        assert_eq!(
            finished[0].0.morph,
            Some(Morph {
                into: Shape::Circle { radius: 0.5 },
                alpha: 1.0
            })
        );
        assert_eq!(finished[1].0.id, dot);
        assert_eq!(finished[1].1, Commit::Hide);
    }

    #[test]
    fn test_replacement_transform_swaps_at_end() {
        let mut store = ObjectStore::new();
        let a = add(&mut store, MobjectSpec::text("1"));
        let b = add(&mut store, MobjectSpec::text("2"));
        let animation = Animation::replacement_transform(a, b);
        assert_eq!(
            animation.end_effects(),
            vec![EndEffect::Replace { source: a, target: b }]
        );
        let active = begin(&store, &animation);
        assert!(active.finish().all(|(_, commit)| commit == Commit::Discard));
    }

    #[test]
    fn test_transform_into_own_part_rejected() {
        let mut store = ObjectStore::new();
        let created = store.instantiate(MobjectSpec::group(vec![MobjectSpec::dot()]));
        let err = Animation::transform(created[0].id, created[1].id)
            .validate(&store)
            .unwrap_err();
        assert!(matches!(err, SlateError::IncompatibleTransform { .. }));
    }

    #[test]
    fn test_move_by_relation_resolves_without_writing() {
        let mut store = ObjectStore::new();
        let title = add(&mut store, MobjectSpec::text("Title"));
        let animation = Animation::relayout(LayoutRelation::to_edge(title, Point2D::UP)).unwrap();
        let active = begin(&store, &animation);
        assert_eq!(store.get(title).unwrap().transform.position, Point2D::zero());
        let end: Vec<TrackSample> = active.sample(1.0).collect();
        let height = store.local_bounds(title).unwrap().height();
        assert!((end[0].state.transform.position.y - (3.5 - height / 2.0)).abs() < 1e-9);
    }

    #[test]
    fn test_relayout_needs_a_positioned_mobject() {
        let mut store = ObjectStore::new();
        let a = add(&mut store, MobjectSpec::dot());
        let b = add(&mut store, MobjectSpec::dot());
        let empty = LayoutRelation::distribute(Vec::new(), Point2D::zero(), Point2D::RIGHT);
        assert!(matches!(
            Animation::relayout(empty),
            Err(SlateError::InvalidArgument(_))
        ));
        let stray = Animation::new(
            AnimationKind::Move {
                to: MoveTarget::Relation(LayoutRelation::to_edge(a, Point2D::UP)),
            },
            b,
        );
        assert!(matches!(stray.validate(&store), Err(SlateError::InvalidArgument(_))));
    }

    #[test]
    fn test_rotate_follows_arc() {
        let mut store = ObjectStore::new();
        let created = store.instantiate(MobjectSpec::group(vec![
            MobjectSpec::dot().at(Point2D::new(1.0, 0.0)),
            MobjectSpec::dot().at(Point2D::new(-1.0, 0.0)),
        ]));
        let g = created[0].id;
        store.set_position(g, Point2D::new(2.0, 0.0)).unwrap();
        let active = begin(&store, &Animation::rotate(g, std::f64::consts::PI));
        let mid: Vec<TrackSample> = active.sample(0.5).collect();
        let p = mid[0].state.transform.position;
        assert!((p.x - 2.0).abs() < 1e-12 && p.y.abs() < 1e-12);
        assert!((mid[0].state.transform.rotation - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_recolor_covers_family() {
        let mut store = ObjectStore::new();
        let g = add(
            &mut store,
            MobjectSpec::group(vec![MobjectSpec::dot(), MobjectSpec::dot()]),
        );
        let active = begin(&store, &Animation::recolor(g, Color::RED));
        assert_eq!(active.tracks.len(), 3);
        assert!(active.sample(1.0).all(|s| s.state.style.color == Color::RED));
    }

    #[test]
    fn test_zero_duration_jumps_to_end() {
        let mut store = ObjectStore::new();
        let c = add(&mut store, MobjectSpec::circle(1.0));
        let active = Animation::fade_in(c)
            .begin(&store, &frame(), Duration::zero(), Easing::Smooth)
            .unwrap();
        assert!(active.sample(0.0).all(|s| s.state.style.opacity == 1.0));
    }

    #[test]
    fn test_classification() {
        let id = MobjectId(1);
        assert!(Animation::write(id).is_appear());
        assert!(Animation::grow_arrow(id).is_appear());
        assert!(Animation::shrink_to_center(id).is_disappear());
        assert!(Animation::uncreate(id).is_disappear());
        assert!(!Animation::shift(id, Point2D::UP).is_disappear());
        assert!(Animation::shift(id, Point2D::UP).end_effects().is_empty());
    }
}
