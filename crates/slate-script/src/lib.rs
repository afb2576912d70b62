//! # slate-script
//!
//! Lesson orchestration. A [`Lesson`] records its timeline into a [`slate_ir::Scene`];
//! the [`Orchestrator`] builds, validates and plays it. Lessons can be written in Rust
//! or as a JSON [`LessonScript`], an ordered list of create/layout/play/wait commands.

pub mod ast;
pub mod compiler;
pub mod lesson;
pub mod orchestrator;

pub use ast::{AnimKind, AnimNode, Command, LessonScript, ShapeNode, StyleNode, VectorNode};
pub use compiler::Compiler;
pub use lesson::Lesson;
pub use orchestrator::Orchestrator;
