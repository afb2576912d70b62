//! # slate-core
//!
//! Core types and primitives for the Slate animation engine.
//! This crate contains foundational types shared across all Slate crates:
//! geometry, colors, durations, easing functions, shapes, coordinate axes,
//! frame snapshots, configuration and error types.

pub mod axis;
pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod hash;
pub mod math;
pub mod time;
pub mod types;

pub use config::*;

pub use axis::{Axes, CoordinateAxis};
pub use color::Color;
pub use error::{SlateError, SlateResult};
pub use frame::{FrameSnapshot, Morph, ObjectState};
pub use hash::ContentHash;
pub use math::{BoundingBox, Point2D, Transform2D};
pub use time::{Duration, MAX_SPAN_SECONDS};
pub use types::{Easing, MobjectId, Shape};
