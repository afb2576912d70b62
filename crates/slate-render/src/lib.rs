//! # slate-render
//!
//! The Slate playback engine. Takes a finalized scene and produces one object-state
//! snapshot per output frame for an external rasterizer. Playback is single-threaded
//! and strictly sequential: entries run in declaration order, each to completion.

pub mod pipeline;

pub use pipeline::{Playback, PlaybackResult, Player};
