//! # slate-ir
//!
//! The scene model: mobjects and their store, layout relations, animation
//! primitives, and the timeline a [`Scene`] records. A finalized scene is a
//! validated timeline that the renderer replays frame by frame.

pub mod animation;
pub mod layout;
pub mod mobject;
pub mod scene;
pub mod stage;
pub mod store;
pub mod timeline;
pub mod validate;

pub use animation::{
    ActiveAnimation, Animation, AnimationKind, Commit, Correspondence, DrawMode, EndEffect,
    MoveTarget, Track, TrackSample, VisualState,
};
pub use layout::{AxisCoord, LayoutRelation, LayoutSolver};
pub use mobject::{AttrValue, Attribute, Mobject, MobjectSpec, Payload, Style};
pub use scene::{FinalizedScene, Scene, SceneState};
pub use stage::{Stage, StagedSet};
pub use store::ObjectStore;
pub use timeline::{EntryKind, EntrySpan, MemberTiming, StageOp, TimelineEntry, TIME_EPSILON};
pub use validate::validate_timeline;
