use slate_core::{EngineConfig, SlateResult};
use slate_ir::{FinalizedScene, Scene};
use slate_render::{PlaybackResult, Player};

use crate::lesson::Lesson;

/// Builds lessons into validated scenes and plays them back.
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    config: EngineConfig,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> SlateResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Load settings from a `slate.toml` file.
    pub fn from_config_file(path: &std::path::Path) -> SlateResult<Self> {
        Ok(Self {
            config: EngineConfig::load_from_file(path)?,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Record the lesson and finalize it. Nothing is returned for a lesson that
    /// fails anywhere: the error names the failing entry where there is one.
    pub fn build(&self, lesson: &dyn Lesson) -> SlateResult<FinalizedScene> {
        let config = lesson.config().unwrap_or(&self.config).clone();
        tracing::info!("Building lesson '{}'", lesson.name());

        let mut scene = Scene::with_config(lesson.name(), config)?;
        let finalized = lesson
            .construct(&mut scene)
            .and_then(|_| scene.finalize())
            .inspect_err(|e| {
                tracing::error!(
                    lesson = lesson.name(),
                    entry = ?e.entry_index(),
                    "lesson build failed: {}",
                    e
                );
            })?;

        tracing::info!(
            "Built lesson '{}': {} entries, {:.2}s",
            finalized.name,
            finalized.entries().len(),
            finalized.total_duration().as_seconds()
        );
        Ok(finalized)
    }

    /// Build the lesson and play it back at its configured rate.
    pub fn render(&self, lesson: &dyn Lesson) -> SlateResult<PlaybackResult> {
        let scene = self.build(lesson)?;
        let result = Player::new(&scene).render()?;
        tracing::info!(
            "Rendered lesson '{}': {} frames at {} fps",
            scene.name,
            result.frame_count(),
            result.fps
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slate_core::{Quality, SlateError};
    use slate_ir::{Animation, MobjectSpec};

    struct Flash;

    impl Lesson for Flash {
        fn name(&self) -> &str {
            "flash"
        }

        fn construct(&self, scene: &mut Scene) -> SlateResult<()> {
            let dot = scene.create(MobjectSpec::dot())?;
            scene.play(vec![Animation::fade_in(dot)])?;
            scene.play(vec![Animation::fade_out(dot)])
        }
    }

    struct Broken;

    impl Lesson for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn construct(&self, scene: &mut Scene) -> SlateResult<()> {
            let dot = scene.create(MobjectSpec::dot())?;
            scene.pause(1.0)?;
            scene.destroy(dot)?;
            scene.play(vec![Animation::fade_in(dot)])
        }
    }

    #[test]
    fn test_build_and_render() {
        let orchestrator = Orchestrator::new();
        let scene = orchestrator.build(&Flash).unwrap();
        assert_eq!(scene.name, "flash");
        assert_eq!(scene.total_duration().as_seconds(), 2.0);

        let result = orchestrator.render(&Flash).unwrap();
        assert_eq!(result.frame_count(), 2 * 30 + 1);
        assert!(result.last_frame().unwrap().objects.is_empty());
    }

    #[test]
    fn test_orchestrator_config_applies() {
        let mut config = EngineConfig::default();
        config.render.quality = Some(Quality::Medium);
        config.animation.default_run_time = 0.5;
        let orchestrator = Orchestrator::with_config(config).unwrap();
        let scene = orchestrator.build(&Flash).unwrap();
        assert_eq!(scene.total_duration().as_seconds(), 1.0);
        assert_eq!(Player::new(&scene).fps(), Quality::Medium.fps());
    }

    #[test]
    fn test_build_error_surfaces() {
        let err = Orchestrator::new().build(&Broken).unwrap_err();
        assert!(matches!(err.root(), SlateError::DanglingReference { .. }));
        assert_eq!(err.entry_index(), Some(1));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.render.fps = 0.0;
        assert!(Orchestrator::with_config(config).is_err());
    }
}
