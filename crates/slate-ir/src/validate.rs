use slate_core::{EngineConfig, SlateResult};

use crate::stage::{Stage, StagedSet};
use crate::timeline::TimelineEntry;

/// Dry-run a timeline on a fresh stage, entry by entry, exactly as playback will.
///
/// Catches dangling references, layout cycles and incompatible transforms before any
/// frame is produced, along with timing that is not finite or runs too long.
/// The first failure is returned tagged with its entry index.
/// On success returns the staged set left after the last entry.
pub fn validate_timeline(entries: &[TimelineEntry], config: &EngineConfig) -> SlateResult<StagedSet> {
    let mut stage = Stage::new(config.canvas.frame_bounds());
    for (index, entry) in entries.iter().enumerate() {
        entry
            .check_timing(&config.animation)
            .and_then(|_| stage.open_entry(entry, &config.animation))
            .and_then(|_| stage.close_entry())
            .map_err(|e| e.at_entry(index))?;
    }
    Ok(stage.staged().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Animation;
    use crate::layout::LayoutRelation;
    use crate::mobject::MobjectSpec;
    use crate::store::ObjectStore;
    use crate::timeline::StageOp;
    use slate_core::{Duration, MobjectId, Point2D, SlateError};

    fn insert(store: &mut ObjectStore, spec: MobjectSpec) -> (MobjectId, StageOp) {
        let mobjects = store.instantiate(spec);
        (mobjects[0].id, StageOp::Insert { mobjects })
    }

    #[test]
    fn test_valid_timeline_reports_final_staged_set() {
        let mut store = ObjectStore::new();
        let (a, op) = insert(&mut store, MobjectSpec::circle(1.0));
        let entries = vec![
            TimelineEntry::play(vec![op], vec![Animation::fade_in(a)], None),
            TimelineEntry::wait(Vec::new(), Duration::from_seconds(1.0)),
        ];
        let staged = validate_timeline(&entries, &EngineConfig::default()).unwrap();
        assert_eq!(staged.to_vec(), vec![a]);
    }

    #[test]
    fn test_target_created_later_is_dangling() {
        let mut store = ObjectStore::new();
        let (a, op) = insert(&mut store, MobjectSpec::circle(1.0));
        let entries = vec![
            TimelineEntry::play(Vec::new(), vec![Animation::fade_in(a)], None),
            TimelineEntry::wait(vec![op], Duration::zero()),
        ];
        let err = validate_timeline(&entries, &EngineConfig::default()).unwrap_err();
        assert_eq!(err.entry_index(), Some(0));
        assert!(matches!(err.root(), SlateError::DanglingReference { id } if *id == a));
    }

    #[test]
    fn test_layout_cycle_reported_at_entry() {
        let mut store = ObjectStore::new();
        let (a, op_a) = insert(&mut store, MobjectSpec::circle(1.0));
        let (b, op_b) = insert(&mut store, MobjectSpec::circle(1.0));
        let entries = vec![
            TimelineEntry::wait(Vec::new(), Duration::from_seconds(1.0)),
            TimelineEntry::play(
                vec![
                    op_a,
                    op_b,
                    StageOp::Layout {
                        relation: LayoutRelation::next_to(a, b, Point2D::RIGHT),
                    },
                    StageOp::Layout {
                        relation: LayoutRelation::next_to(b, a, Point2D::LEFT),
                    },
                ],
                vec![Animation::fade_in(a)],
                None,
            ),
        ];
        let err = validate_timeline(&entries, &EngineConfig::default()).unwrap_err();
        assert_eq!(err.entry_index(), Some(1));
        assert!(matches!(err.root(), SlateError::LayoutCycle { .. }));
    }

    #[test]
    fn test_destroyed_target_is_dangling() {
        let mut store = ObjectStore::new();
        let (a, op) = insert(&mut store, MobjectSpec::circle(1.0));
        let entries = vec![
            TimelineEntry::play(vec![op], vec![Animation::fade_in(a)], None),
            TimelineEntry::play(
                vec![StageOp::Destroy { id: a }],
                vec![Animation::fade_out(a)],
                None,
            ),
        ];
        let err = validate_timeline(&entries, &EngineConfig::default()).unwrap_err();
        assert_eq!(err.entry_index(), Some(1));
    }

    #[test]
    fn test_unusable_wait_read_back_is_rejected() {
        let huge: Duration = serde_json::from_str(r#"{"seconds": 1e300}"#).unwrap();
        let entries = vec![
            TimelineEntry::wait(Vec::new(), Duration::from_seconds(1.0)),
            TimelineEntry::wait(Vec::new(), huge),
        ];
        let err = validate_timeline(&entries, &EngineConfig::default()).unwrap_err();
        assert_eq!(err.entry_index(), Some(1));
        assert!(matches!(err.root(), SlateError::InvalidArgument(_)));
    }
}
