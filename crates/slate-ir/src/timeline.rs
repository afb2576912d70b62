use serde::{Deserialize, Serialize};
use slate_core::{AnimationConfig, Duration, MobjectId, Point2D, SlateError, SlateResult};

use crate::animation::{lag_windows, Animation};
use crate::layout::LayoutRelation;
use crate::mobject::{AttrValue, Attribute, Mobject};

/// Tolerance when comparing scene times against entry boundaries.
pub const TIME_EPSILON: f64 = 1e-9;

/// A scene build operation, replayed at the start of the entry it precedes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StageOp {
    /// Newly created mobjects, parents before children.
    Insert { mobjects: Vec<Mobject> },
    /// A detached duplicate of `source`'s subtree, taken when replayed. `ids` name the
    /// duplicates in the order of [`ObjectStore::family`](crate::store::ObjectStore::family).
    Copy { source: MobjectId, ids: Vec<MobjectId> },
    Adopt { parent: MobjectId, child: MobjectId },
    SetAttribute {
        id: MobjectId,
        attribute: Attribute,
        value: AttrValue,
    },
    /// Displace by a canvas vector.
    Shift { id: MobjectId, delta: Point2D },
    Layout { relation: LayoutRelation },
    Stage { id: MobjectId },
    Unstage { id: MobjectId },
    Destroy { id: MobjectId },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryKind {
    /// Animations running concurrently. `run_time` overrides every member's run time.
    ///
    /// With a `lag_ratio` each member starts once the previous one is that fraction of
    /// the way through; a `run_time` then spans the whole staggered group.
    Play {
        animations: Vec<Animation>,
        run_time: Option<Duration>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lag_ratio: Option<f64>,
    },
    /// A pause with no mutation.
    Wait { duration: Duration },
}

/// One step of the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Build operations issued since the previous entry.
    pub prelude: Vec<StageOp>,
    pub kind: EntryKind,
}

impl TimelineEntry {
    pub fn play(prelude: Vec<StageOp>, animations: Vec<Animation>, run_time: Option<Duration>) -> Self {
        Self {
            prelude,
            kind: EntryKind::Play {
                animations,
                run_time,
                lag_ratio: None,
            },
        }
    }

    /// Stagger the members of a play entry. Waits are unaffected.
    pub fn with_lag_ratio(mut self, lag: f64) -> Self {
        if let EntryKind::Play { lag_ratio, .. } = &mut self.kind {
            *lag_ratio = Some(lag);
        }
        self
    }

    pub fn wait(prelude: Vec<StageOp>, duration: Duration) -> Self {
        Self {
            prelude,
            kind: EntryKind::Wait { duration },
        }
    }

    pub fn animations(&self) -> &[Animation] {
        match &self.kind {
            EntryKind::Play { animations, .. } => animations,
            EntryKind::Wait { .. } => &[],
        }
    }

    /// Reject pauses, group run times and lag ratios that are not finite, along with
    /// entries that would run past the longest supported span.
    pub fn check_timing(&self, config: &AnimationConfig) -> SlateResult<()> {
        match &self.kind {
            EntryKind::Play {
                run_time,
                lag_ratio,
                ..
            } => {
                if let Some(run_time) = run_time {
                    run_time.checked()?;
                }
                if let Some(lag) = lag_ratio.filter(|lag| !lag.is_finite() || *lag < 0.0) {
                    return Err(SlateError::invalid_argument(format!(
                        "lag ratio must be a non-negative number, got {}",
                        lag
                    )));
                }
            }
            EntryKind::Wait { duration } => {
                duration.checked()?;
            }
        }
        self.duration(config).checked().map(|_| ())
    }

    /// Start offset and run time of every member, in member order. Empty for waits.
    pub fn timings(&self, config: &AnimationConfig) -> Vec<MemberTiming> {
        let (animations, run_time, lag) = match &self.kind {
            EntryKind::Play {
                animations,
                run_time,
                lag_ratio,
            } => (animations, run_time, lag_ratio.unwrap_or(0.0)),
            EntryKind::Wait { .. } => return Vec::new(),
        };
        match run_time {
            Some(total) => lag_windows(animations.len(), lag)
                .into_iter()
                .map(|(start, end)| MemberTiming {
                    offset: start * total.as_seconds(),
                    duration: Duration::from_seconds((end - start) * total.as_seconds()),
                })
                .collect(),
            None => {
                let mut offset = 0.0;
                animations
                    .iter()
                    .map(|animation| {
                        let duration = animation.resolved_run_time(config.run_time());
                        let timing = MemberTiming { offset, duration };
                        offset += lag * duration.as_seconds();
                        timing
                    })
                    .collect()
            }
        }
    }

    /// The group duration: the last member to finish, or the wait length.
    pub fn duration(&self, config: &AnimationConfig) -> Duration {
        match &self.kind {
            EntryKind::Play {
                run_time: Some(run_time),
                ..
            } => *run_time,
            EntryKind::Play { .. } => Duration::from_seconds(
                self.timings(config)
                    .iter()
                    .map(MemberTiming::end)
                    .fold(0.0, f64::max),
            ),
            EntryKind::Wait { duration } => *duration,
        }
    }
}

/// When one member of a play group runs, in seconds from the start of the group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberTiming {
    pub offset: f64,
    pub duration: Duration,
}

impl MemberTiming {
    pub fn end(&self) -> f64 {
        self.offset + self.duration.as_seconds()
    }
}

/// Where an entry sits on the scene clock, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntrySpan {
    pub start: f64,
    pub end: f64,
}

impl EntrySpan {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether the entry has run to completion by scene time `t`.
    pub fn finished_by(&self, t: f64) -> bool {
        t >= self.end - TIME_EPSILON
    }
}

/// Lay entries end to end. Returns each entry's span and the total duration.
pub fn schedule(entries: &[TimelineEntry], config: &AnimationConfig) -> (Vec<EntrySpan>, Duration) {
    let mut spans = Vec::with_capacity(entries.len());
    let mut clock = 0.0;
    for entry in entries {
        let end = clock + entry.duration(config).as_seconds();
        spans.push(EntrySpan { start: clock, end });
        clock = end;
    }
    (spans, Duration::from_seconds(clock))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_duration_is_longest_member() {
        let config = AnimationConfig::default();
        let entry = TimelineEntry::play(
            Vec::new(),
            vec![
                Animation::fade_in(MobjectId(0)).with_run_time(2.0),
                Animation::shift(MobjectId(1), Point2D::UP),
            ],
            None,
        );
        assert_eq!(entry.duration(&config).as_seconds(), 2.0);
        let timings = entry.timings(&config);
        assert_eq!(timings[1].duration.as_seconds(), 1.0);
        assert!(timings.iter().all(|t| t.offset == 0.0));
    }

    #[test]
    fn test_group_run_time_overrides_members() {
        let config = AnimationConfig::default();
        let entry = TimelineEntry::play(
            Vec::new(),
            vec![Animation::write(MobjectId(0)).with_run_time(3.0)],
            Some(Duration::from_seconds(0.5)),
        );
        assert_eq!(entry.duration(&config).as_seconds(), 0.5);
        assert_eq!(entry.timings(&config)[0].duration.as_seconds(), 0.5);
    }

    #[test]
    fn test_lagged_members_start_in_turn() {
        let config = AnimationConfig::default();
        let entry = TimelineEntry::play(
            Vec::new(),
            vec![
                Animation::fade_in(MobjectId(0)),
                Animation::fade_in(MobjectId(1)).with_run_time(2.0),
                Animation::fade_in(MobjectId(2)),
            ],
            None,
        )
        .with_lag_ratio(0.5);
        let offsets: Vec<f64> = entry.timings(&config).iter().map(|t| t.offset).collect();
        assert_eq!(offsets, vec![0.0, 0.5, 1.5]);
        assert_eq!(entry.duration(&config).as_seconds(), 2.5);
    }

    #[test]
    fn test_lagged_run_time_spans_the_whole_group() {
        let config = AnimationConfig::default();
        let entry = TimelineEntry::play(
            Vec::new(),
            vec![
                Animation::fade_in(MobjectId(0)),
                Animation::fade_in(MobjectId(1)),
                Animation::fade_in(MobjectId(2)),
            ],
            Some(Duration::from_seconds(4.0)),
        )
        .with_lag_ratio(0.5);
        let timings = entry.timings(&config);
        assert_eq!(timings[0].duration.as_seconds(), 2.0);
        assert_eq!(timings[2].offset, 2.0);
        assert_eq!(timings[2].end(), 4.0);
        assert_eq!(entry.duration(&config).as_seconds(), 4.0);
    }

    #[test]
    fn test_lag_ratio_ignored_by_waits_and_omitted_from_json() {
        let wait = TimelineEntry::wait(Vec::new(), Duration::from_seconds(1.0)).with_lag_ratio(0.5);
        assert_eq!(wait.kind, EntryKind::Wait { duration: Duration::from_seconds(1.0) });
        let play = TimelineEntry::play(Vec::new(), vec![Animation::fade_in(MobjectId(0))], None);
        let json = serde_json::to_value(&play).unwrap();
        assert!(json["kind"].get("lag_ratio").is_none());
        let back: TimelineEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, play);
    }

    #[test]
    fn test_schedule_sums_entries() {
        let config = AnimationConfig::default();
        let entries = vec![
            TimelineEntry::play(Vec::new(), vec![Animation::fade_in(MobjectId(0))], None),
            TimelineEntry::wait(Vec::new(), Duration::from_seconds(0.5)),
            TimelineEntry::wait(Vec::new(), Duration::zero()),
        ];
        let (spans, total) = schedule(&entries, &config);
        assert_eq!(total.as_seconds(), 1.5);
        assert_eq!(spans[1], EntrySpan { start: 1.0, end: 1.5 });
        assert!(spans[2].finished_by(1.5));
        assert!(!spans[1].finished_by(1.2));
    }

    #[test]
    fn test_entry_json_is_tagged() {
        let entry = TimelineEntry::wait(
            vec![StageOp::Stage { id: MobjectId(3) }],
            Duration::from_seconds(1.0),
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["kind"]["type"], "wait");
        assert_eq!(json["prelude"][0]["op"], "stage");
        let back: TimelineEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }
}
