use slate_core::{EngineConfig, SlateResult};
use slate_ir::Scene;

use crate::ast::LessonScript;
use crate::compiler::Compiler;

/// A lesson: something that records a timeline into a scene.
pub trait Lesson {
    fn name(&self) -> &str;

    /// Settings this lesson insists on. `None` defers to the orchestrator.
    fn config(&self) -> Option<&EngineConfig> {
        None
    }

    fn construct(&self, scene: &mut Scene) -> SlateResult<()>;
}

impl Lesson for LessonScript {
    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> Option<&EngineConfig> {
        self.config.as_ref()
    }

    fn construct(&self, scene: &mut Scene) -> SlateResult<()> {
        Compiler::compile(self, scene)
    }
}
