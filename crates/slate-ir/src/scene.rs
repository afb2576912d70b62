use serde::{Deserialize, Serialize};
use slate_core::{
    BoundingBox, Color, CoordinateAxis, Duration, EngineConfig, MobjectId, Point2D, SlateError,
    SlateResult,
};
use uuid::Uuid;

use crate::animation::Animation;
use crate::layout::LayoutRelation;
use crate::mobject::{AttrValue, Attribute, MobjectSpec};
use crate::stage::{Stage, StagedSet};
use crate::store::ObjectStore;
use crate::timeline::{schedule, EntrySpan, StageOp, TimelineEntry, TIME_EPSILON};
use crate::validate::validate_timeline;

/// Lifecycle of a scene build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneState {
    /// Nothing recorded yet.
    Idle,
    /// Entries are accumulating.
    Building,
    /// Validated and closed; further calls fail with [`SlateError::SceneClosed`].
    Finalized,
}

/// Records a lesson as an ordered timeline of play groups and pauses.
///
/// Build calls take effect on the object model right away, so ids and structure can be
/// queried while building. Layout relations are only checked for references here; they
/// are resolved as one batch at the start of the next entry. The staged set follows
/// each play group's boundary effects, so [`Scene::current_staged_set`] is what will
/// be on stage once the last recorded entry has finished.
#[derive(Debug, Clone)]
pub struct Scene {
    name: String,
    config: EngineConfig,
    state: SceneState,
    stage: Stage,
    entries: Vec<TimelineEntry>,
    pending: Vec<StageOp>,
}

impl Scene {
    /// A scene with the default configuration.
    pub fn new(name: impl Into<String>) -> Self {
        let config = EngineConfig::default();
        Self {
            name: name.into(),
            stage: Stage::new(config.canvas.frame_bounds()),
            config,
            state: SceneState::Idle,
            entries: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn with_config(name: impl Into<String>, config: EngineConfig) -> SlateResult<Self> {
        config.validate()?;
        let mut scene = Self::new(name);
        scene.stage = Stage::new(config.canvas.frame_bounds());
        scene.config = config;
        Ok(scene)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> SceneState {
        self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &ObjectStore {
        self.stage.store()
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// The top-level mobjects on stage after the last recorded entry.
    pub fn current_staged_set(&self) -> &StagedSet {
        self.stage.staged()
    }

    pub fn find(&self, name: &str) -> Option<MobjectId> {
        self.stage.store().find_by_name(name).map(|m| m.id)
    }

    fn open(&mut self) -> SlateResult<()> {
        match self.state {
            SceneState::Finalized => Err(SlateError::SceneClosed),
            SceneState::Idle => {
                self.state = SceneState::Building;
                Ok(())
            }
            SceneState::Building => Ok(()),
        }
    }

    fn tag(&self, err: SlateError) -> SlateError {
        err.at_entry(self.entries.len())
    }

    /// Apply a build operation and record it for the next entry.
    fn record(&mut self, op: StageOp) -> SlateResult<()> {
        self.open()?;
        let applied = match &op {
            StageOp::Layout { relation } => relation.validate(self.stage.store()),
            _ => self.stage.apply_op(&op),
        };
        applied.map_err(|e| self.tag(e))?;
        self.pending.push(op);
        Ok(())
    }

    /// Create a mobject (and its children). It is not on stage until staged or animated.
    pub fn create(&mut self, spec: MobjectSpec) -> SlateResult<MobjectId> {
        self.open()?;
        let mobjects = self.stage.instantiate(spec);
        let id = mobjects[0].id;
        self.pending.push(StageOp::Insert { mobjects });
        Ok(id)
    }

    /// Create a group owning `children`, which must not belong to another mobject.
    ///
    /// Every child is checked before anything is created, so a rejected group leaves
    /// the scene untouched.
    pub fn group(&mut self, children: &[MobjectId]) -> SlateResult<MobjectId> {
        self.open()?;
        let mut seen = std::collections::BTreeSet::new();
        if let Some(repeated) = children.iter().find(|c| !seen.insert(**c)) {
            return Err(self.tag(SlateError::invalid_argument(format!(
                "{} is listed twice in one group",
                repeated
            ))));
        }
        for child in children {
            let owned = match self.stage.store().get(*child) {
                Ok(mobject) => mobject.parent.map(|p| (mobject.label(), p)),
                Err(e) => return Err(self.tag(e)),
            };
            if let Some((label, parent)) = owned {
                return Err(self.tag(SlateError::invalid_argument(format!(
                    "{} already belongs to {}",
                    label, parent
                ))));
            }
        }
        let id = self.create(MobjectSpec::group(Vec::new()))?;
        for child in children {
            self.add_child(id, *child)?;
        }
        Ok(id)
    }

    pub fn add_child(&mut self, parent: MobjectId, child: MobjectId) -> SlateResult<()> {
        self.record(StageOp::Adopt { parent, child })
    }

    pub fn set_attribute(
        &mut self,
        id: MobjectId,
        attribute: Attribute,
        value: AttrValue,
    ) -> SlateResult<()> {
        self.record(StageOp::SetAttribute {
            id,
            attribute,
            value,
        })
    }

    pub fn set_color(&mut self, id: MobjectId, color: Color) -> SlateResult<()> {
        self.set_attribute(id, Attribute::Color, AttrValue::Color(color))
    }

    pub fn set_opacity(&mut self, id: MobjectId, opacity: f64) -> SlateResult<()> {
        self.set_attribute(id, Attribute::Opacity, AttrValue::Number(opacity))
    }

    /// Displace a mobject by a canvas vector without animating.
    pub fn shift(&mut self, id: MobjectId, delta: Point2D) -> SlateResult<()> {
        self.record(StageOp::Shift { id, delta })
    }

    pub fn relate(&mut self, relation: LayoutRelation) -> SlateResult<()> {
        self.record(StageOp::Layout { relation })
    }

    pub fn move_to(&mut self, id: MobjectId, point: Point2D) -> SlateResult<()> {
        self.relate(LayoutRelation::move_to(id, point))
    }

    pub fn next_to(&mut self, id: MobjectId, anchor: MobjectId, direction: Point2D) -> SlateResult<()> {
        let buff = self.config.canvas.mobject_buff;
        self.relate(LayoutRelation::next_to(id, anchor, direction).with_buff(buff))
    }

    pub fn align_to(&mut self, id: MobjectId, anchor: MobjectId, edge: Point2D) -> SlateResult<()> {
        self.relate(LayoutRelation::align_to(id, anchor, edge))
    }

    /// Push against a canvas edge (`UP`, `LEFT`, ...) or corner (`UL`, `DR`, ...).
    pub fn to_edge(&mut self, id: MobjectId, edge: Point2D) -> SlateResult<()> {
        let buff = self.config.canvas.edge_buff;
        self.relate(LayoutRelation::to_edge(id, edge).with_buff(buff))
    }

    pub fn to_corner(&mut self, id: MobjectId, corner: Point2D) -> SlateResult<()> {
        self.to_edge(id, corner)
    }

    /// Lay items out edge to edge along `direction`, centred on the origin.
    pub fn arrange(&mut self, items: &[MobjectId], direction: Point2D) -> SlateResult<()> {
        let buff = self.config.canvas.mobject_buff;
        self.relate(LayoutRelation::arrange(items.to_vec(), direction).with_buff(buff))
    }

    /// Centre item `k` at `start + step * k`.
    pub fn distribute(&mut self, items: &[MobjectId], start: Point2D, step: Point2D) -> SlateResult<()> {
        self.relate(LayoutRelation::distribute(items.to_vec(), start, step))
    }

    pub fn place_on_axis(&mut self, id: MobjectId, axis: MobjectId, value: f64) -> SlateResult<()> {
        self.relate(LayoutRelation::on_axis(id, axis, value))
    }

    pub fn place_at_coords(&mut self, id: MobjectId, axes: MobjectId, x: f64, y: f64) -> SlateResult<()> {
        self.relate(LayoutRelation::at_coords(id, axes, x, y))
    }

    /// Create a rectangle framing `anchor`. It follows `anchor`'s layout.
    pub fn surround(&mut self, anchor: MobjectId) -> SlateResult<MobjectId> {
        self.stage.store().get(anchor).map_err(|e| self.tag(e))?;
        let id = self.create(MobjectSpec::rectangle(1.0, 1.0).with_color(Color::YELLOW))?;
        self.relate(LayoutRelation::surround(id, anchor))?;
        Ok(id)
    }

    /// An axis over `[min, max]` with the configured default step and length.
    pub fn default_axis(&self, min: f64, max: f64) -> SlateResult<CoordinateAxis> {
        CoordinateAxis::new(
            min,
            max,
            self.config.axis.default_step,
            self.config.axis.default_length,
        )
    }

    /// Put a mobject on stage without animating.
    pub fn stage(&mut self, id: MobjectId) -> SlateResult<()> {
        self.record(StageOp::Stage { id })
    }

    /// Take a top-level mobject off stage without animating.
    pub fn unstage(&mut self, id: MobjectId) -> SlateResult<()> {
        self.record(StageOp::Unstage { id })
    }

    /// Remove a mobject and its subtree from the scene.
    pub fn destroy(&mut self, id: MobjectId) -> SlateResult<()> {
        self.record(StageOp::Destroy { id })
    }

    /// Append a play group of concurrent animations.
    pub fn play(&mut self, animations: Vec<Animation>) -> SlateResult<()> {
        self.push_play(animations, None, None)
    }

    /// Append a play group whose members all run for `seconds`.
    pub fn play_timed(&mut self, animations: Vec<Animation>, seconds: f64) -> SlateResult<()> {
        self.open()?;
        let run_time = Duration::checked_from_seconds(seconds).map_err(|e| self.tag(e))?;
        self.push_play(animations, Some(run_time), None)
    }

    /// Append a play group whose members start one after another, each once the
    /// previous one is `lag_ratio` of the way through.
    pub fn play_lagged(&mut self, animations: Vec<Animation>, lag_ratio: f64) -> SlateResult<()> {
        self.push_play(animations, None, Some(lag_ratio))
    }

    /// Like [`Scene::play_lagged`], with the whole staggered group lasting `seconds`.
    pub fn play_lagged_timed(
        &mut self,
        animations: Vec<Animation>,
        lag_ratio: f64,
        seconds: f64,
    ) -> SlateResult<()> {
        self.open()?;
        let run_time = Duration::checked_from_seconds(seconds).map_err(|e| self.tag(e))?;
        self.push_play(animations, Some(run_time), Some(lag_ratio))
    }

    fn push_play(
        &mut self,
        animations: Vec<Animation>,
        run_time: Option<Duration>,
        lag_ratio: Option<f64>,
    ) -> SlateResult<()> {
        self.open()?;
        if animations.is_empty() {
            return Err(self.tag(SlateError::invalid_argument(
                "a play group needs at least one animation",
            )));
        }
        let mut entry = TimelineEntry::play(Vec::new(), animations, run_time);
        if let Some(lag) = lag_ratio {
            entry = entry.with_lag_ratio(lag);
        }
        entry
            .check_timing(&self.config.animation)
            .and_then(|_| self.check_group(entry.animations()))
            .map_err(|e| self.tag(e))?;
        entry.prelude = std::mem::take(&mut self.pending);
        self.entries.push(entry);
        Ok(())
    }

    /// Validate a group against the object model and apply its staging effects.
    fn check_group(&mut self, animations: &[Animation]) -> SlateResult<()> {
        for animation in animations {
            animation.validate(self.stage.store())?;
        }
        self.stage.enter_group(animations)?;
        self.stage.leave_group(animations)
    }

    /// Append a pause.
    pub fn pause(&mut self, seconds: f64) -> SlateResult<()> {
        self.open()?;
        let duration = Duration::checked_from_seconds(seconds).map_err(|e| self.tag(e))?;
        let prelude = std::mem::take(&mut self.pending);
        self.entries.push(TimelineEntry::wait(prelude, duration));
        Ok(())
    }

    pub fn wait(&mut self, seconds: f64) -> SlateResult<()> {
        self.pause(seconds)
    }

    /// Duplicate a mobject and its subtree as a new top-level mobject over the original.
    /// The copy is not staged. It is taken when the next entry starts, so it reflects
    /// every layout recorded before it.
    pub fn copy(&mut self, id: MobjectId) -> SlateResult<MobjectId> {
        self.open()?;
        let size = self.stage.store().family(id).map_err(|e| self.tag(e))?.len();
        let ids = self.stage.reserve_ids(size);
        let copy = ids[0];
        self.record(StageOp::Copy { source: id, ids })?;
        Ok(copy)
    }

    /// Morph a fresh copy of `source` into `target`. The source stays on stage; the copy
    /// leaves at the end and `target` takes its place.
    pub fn transform_from_copy(&mut self, source: MobjectId, target: MobjectId) -> SlateResult<Animation> {
        let copy = self.copy(source)?;
        Ok(Animation::replacement_transform(copy, target))
    }

    /// Fade out everything currently on stage in one play group.
    pub fn fade_out_all(&mut self) -> SlateResult<()> {
        let staged = self.stage.staged().to_vec();
        if staged.is_empty() {
            return self.open();
        }
        self.play(staged.into_iter().map(Animation::fade_out).collect())
    }

    /// Validate the whole timeline by dry-running it and close the scene.
    ///
    /// Operations recorded after the last entry go into a zero-length closing entry.
    /// On failure nothing is closed and the error carries the offending entry index.
    pub fn finalize(&mut self) -> SlateResult<FinalizedScene> {
        if self.state == SceneState::Finalized {
            return Err(SlateError::SceneClosed);
        }
        let mut entries = self.entries.clone();
        if !self.pending.is_empty() {
            tracing::warn!(
                scene = %self.name,
                ops = self.pending.len(),
                "build operations after the last entry folded into a closing entry"
            );
            entries.push(TimelineEntry::wait(self.pending.clone(), Duration::zero()));
        }
        validate_timeline(&entries, &self.config)?;

        let (spans, total) = schedule(&entries, &self.config.animation);
        tracing::debug!(
            scene = %self.name,
            entries = entries.len(),
            duration = total.as_seconds(),
            "scene finalized"
        );
        self.state = SceneState::Finalized;
        self.pending.clear();
        Ok(FinalizedScene {
            id: Uuid::new_v4(),
            name: self.name.clone(),
            config: self.config.clone(),
            entries,
            spans,
            total,
        })
    }
}

/// A validated, immutable timeline ready for playback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizedScene {
    /// Identifies this build.
    pub id: Uuid,
    pub name: String,
    pub config: EngineConfig,
    entries: Vec<TimelineEntry>,
    spans: Vec<EntrySpan>,
    total: Duration,
}

impl FinalizedScene {
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn spans(&self) -> &[EntrySpan] {
        &self.spans
    }

    pub fn total_duration(&self) -> Duration {
        self.total
    }

    pub fn frame_bounds(&self) -> BoundingBox {
        self.config.canvas.frame_bounds()
    }

    /// Entry running at scene time `t`; `None` once the timeline has ended.
    /// Zero-length entries are never reported.
    pub fn entry_at(&self, t: f64) -> Option<usize> {
        self.spans
            .iter()
            .position(|span| span.start <= t + TIME_EPSILON && !span.finished_by(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine() {
        let mut scene = Scene::new("states");
        assert_eq!(scene.state(), SceneState::Idle);
        let c = scene.create(MobjectSpec::circle(1.0)).unwrap();
        assert_eq!(scene.state(), SceneState::Building);
        scene.play(vec![Animation::create(c)]).unwrap();
        scene.finalize().unwrap();
        assert_eq!(scene.state(), SceneState::Finalized);
        assert!(matches!(scene.play(vec![Animation::fade_out(c)]), Err(SlateError::SceneClosed)));
        assert!(matches!(scene.pause(1.0), Err(SlateError::SceneClosed)));
        assert!(matches!(scene.finalize(), Err(SlateError::SceneClosed)));
    }

    #[test]
    fn test_disappear_leaves_staged_set_immediately() {
        let mut scene = Scene::new("disappear");
        let x = scene.create(MobjectSpec::circle(1.0)).unwrap();
        let y = scene.create(MobjectSpec::square(1.0)).unwrap();
        scene
            .play(vec![Animation::fade_in(x), Animation::grow_from_center(y)])
            .unwrap();
        assert_eq!(scene.current_staged_set().to_vec(), vec![x, y]);
        scene
            .play(vec![Animation::fade_out(x), Animation::shrink_to_center(y)])
            .unwrap();
        assert!(scene.current_staged_set().is_empty());
    }

    #[test]
    fn test_play_rejects_unknown_target_with_index() {
        let mut scene = Scene::new("dangling");
        let c = scene.create(MobjectSpec::circle(1.0)).unwrap();
        scene.play(vec![Animation::fade_in(c)]).unwrap();
        let err = scene.play(vec![Animation::fade_in(MobjectId(42))]).unwrap_err();
        assert_eq!(err.entry_index(), Some(1));
        assert!(matches!(err.root(), SlateError::DanglingReference { .. }));
    }

    #[test]
    fn test_incompatible_transform_rejected_at_play() {
        let mut scene = Scene::new("morph");
        let a = scene
            .create(MobjectSpec::group(vec![MobjectSpec::dot(), MobjectSpec::dot()]))
            .unwrap();
        let b = scene.create(MobjectSpec::circle(1.0)).unwrap();
        let err = scene.play(vec![Animation::transform(a, b)]).unwrap_err();
        assert!(matches!(err.root(), SlateError::IncompatibleTransform { .. }));
    }

    #[test]
    fn test_layout_cycle_fails_finalize() {
        let mut scene = Scene::new("cycle");
        let a = scene.create(MobjectSpec::circle(1.0)).unwrap();
        let b = scene.create(MobjectSpec::circle(1.0)).unwrap();
        scene.next_to(a, b, Point2D::RIGHT).unwrap();
        scene.next_to(b, a, Point2D::RIGHT).unwrap();
        scene.play(vec![Animation::fade_in(a)]).unwrap();
        let err = scene.finalize().unwrap_err();
        assert_eq!(err.entry_index(), Some(0));
        assert!(matches!(err.root(), SlateError::LayoutCycle { .. }));
        assert_eq!(scene.state(), SceneState::Building);
    }

    #[test]
    fn test_trailing_ops_become_closing_entry() {
        let mut scene = Scene::new("trailing");
        let a = scene.create(MobjectSpec::circle(1.0)).unwrap();
        scene.play(vec![Animation::fade_in(a)]).unwrap();
        scene.unstage(a).unwrap();
        let finalized = scene.finalize().unwrap();
        assert_eq!(finalized.entries().len(), 2);
        assert_eq!(finalized.total_duration().as_seconds(), 1.0);
        assert_eq!(finalized.entry_at(0.5), Some(0));
        assert_eq!(finalized.entry_at(1.0), None);
    }

    #[test]
    fn test_fade_out_all_clears_stage() {
        let mut scene = Scene::new("clear");
        let a = scene.create(MobjectSpec::circle(1.0)).unwrap();
        let b = scene.create(MobjectSpec::text("b")).unwrap();
        scene.stage(a).unwrap();
        scene.play(vec![Animation::write(b)]).unwrap();
        scene.fade_out_all().unwrap();
        assert!(scene.current_staged_set().is_empty());
        assert_eq!(scene.entries().len(), 2);
        assert_eq!(scene.entries()[1].animations().len(), 2);
    }

    #[test]
    fn test_schedule_and_entry_lookup() {
        let mut scene = Scene::new("clock");
        let a = scene.create(MobjectSpec::circle(1.0)).unwrap();
        scene.play_timed(vec![Animation::fade_in(a)], 2.0).unwrap();
        scene.wait(0.5).unwrap();
        scene.play(vec![Animation::fade_out(a)]).unwrap();
        let finalized = scene.finalize().unwrap();
        assert_eq!(finalized.total_duration().as_seconds(), 3.5);
        assert_eq!(finalized.entry_at(0.0), Some(0));
        assert_eq!(finalized.entry_at(2.0), Some(1));
        assert_eq!(finalized.entry_at(2.7), Some(2));
        assert_eq!(finalized.entry_at(3.5), None);
    }

    #[test]
    fn test_group_requires_parentless_children() {
        let mut scene = Scene::new("groups");
        let a = scene.create(MobjectSpec::dot()).unwrap();
        let b = scene.create(MobjectSpec::dot()).unwrap();
        let g = scene.group(&[a, b]).unwrap();
        assert_eq!(scene.store().children(g).unwrap(), &[a, b]);
        assert!(scene.group(&[a]).is_err());
    }

    #[test]
    fn test_group_with_repeated_child_creates_nothing() {
        let mut scene = Scene::new("repeats");
        let a = scene.create(MobjectSpec::dot()).unwrap();
        let before = scene.store().len();
        let err = scene.group(&[a, a]).unwrap_err();
        assert!(matches!(err.root(), SlateError::InvalidArgument(_)));
        assert_eq!(scene.store().len(), before);
        assert_eq!(scene.store().parent(a).unwrap(), None);
        let g = scene.group(&[a]).unwrap();
        assert_eq!(scene.store().children(g).unwrap(), &[a]);
    }

    #[test]
    fn test_unusable_durations_rejected_at_build() {
        let mut scene = Scene::new("timing");
        let c = scene.create(MobjectSpec::circle(1.0)).unwrap();
        for seconds in [f64::INFINITY, f64::NAN, -1.0, 1e300] {
            let err = scene.pause(seconds).unwrap_err();
            assert!(matches!(err.root(), SlateError::InvalidArgument(_)));
            let err = scene.play_timed(vec![Animation::fade_in(c)], seconds).unwrap_err();
            assert!(matches!(err.root(), SlateError::InvalidArgument(_)));
            let err = scene
                .play(vec![Animation::fade_in(c).with_run_time(seconds)])
                .unwrap_err();
            assert_eq!(err.entry_index(), Some(0));
            assert!(matches!(err.root(), SlateError::InvalidArgument(_)));
        }
        assert!(scene.entries().is_empty());
        scene.play(vec![Animation::fade_in(c).with_run_time(2.0)]).unwrap();
        assert_eq!(scene.finalize().unwrap().total_duration().as_seconds(), 2.0);
    }

    #[test]
    fn test_lagged_group_spans_the_stagger() {
        let mut scene = Scene::new("lagged");
        let items: Vec<MobjectId> = (0..3)
            .map(|_| scene.create(MobjectSpec::dot()).unwrap())
            .collect();
        for lag in [-0.5, f64::NAN, f64::INFINITY] {
            let err = scene
                .play_lagged(items.iter().copied().map(Animation::fade_in).collect(), lag)
                .unwrap_err();
            assert!(matches!(err.root(), SlateError::InvalidArgument(_)));
        }
        let err = scene
            .play_lagged(items.iter().copied().map(Animation::fade_in).collect(), 1e6)
            .unwrap_err();
        assert_eq!(err.entry_index(), Some(0));
        assert!(scene.current_staged_set().is_empty());

        scene
            .play_lagged(items.iter().copied().map(Animation::fade_in).collect(), 0.5)
            .unwrap();
        scene
            .play_lagged_timed(items.iter().copied().map(Animation::fade_out).collect(), 0.5, 1.0)
            .unwrap();
        let finalized = scene.finalize().unwrap();
        assert_eq!(finalized.total_duration().as_seconds(), 3.0);
        assert_eq!(finalized.spans()[1].start, 2.0);
    }

    #[test]
    fn test_transform_from_copy_keeps_source_staged() {
        let mut scene = Scene::new("copies");
        let source = scene.create(MobjectSpec::math_tex("x = 1").named("eq1")).unwrap();
        let target = scene.create(MobjectSpec::math_tex("x = 2")).unwrap();
        scene.next_to(target, source, Point2D::DOWN).unwrap();
        scene.play(vec![Animation::write(source)]).unwrap();

        let morph = scene.transform_from_copy(source, target).unwrap();
        let copy = morph.target;
        assert_ne!(copy, source);
        assert_eq!(scene.store().get(copy).unwrap().name, None);
        assert_eq!(scene.find("eq1"), Some(source));
        scene.play_timed(vec![morph], 2.0).unwrap();
        assert_eq!(scene.current_staged_set().to_vec(), vec![source, target]);

        assert!(scene.copy(MobjectId(99)).is_err());
        let finalized = scene.finalize().unwrap();
        assert!(matches!(
            finalized.entries()[1].prelude[0],
            StageOp::Copy { source: s, .. } if s == source
        ));
    }
}
