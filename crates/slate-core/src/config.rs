use serde::{Deserialize, Serialize};

use crate::error::{SlateError, SlateResult};
use crate::math::{BoundingBox, Point2D};
use crate::time::Duration;
use crate::types::Easing;

/// Frame rate presets, mirroring the usual low/medium/high preview qualities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    #[default]
    Low,
    Medium,
    High,
}

impl Quality {
    pub fn fps(&self) -> f64 {
        match self {
            Quality::Low => 15.0,
            Quality::Medium => 30.0,
            Quality::High => 60.0,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "low" | "l" => Some(Quality::Low),
            "medium" | "m" => Some(Quality::Medium),
            "high" | "h" => Some(Quality::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Frames sampled per second of wall-clock playback.
    pub fps: f64,
    /// Scene seconds advanced per wall-clock second. Does not change scene durations.
    pub playback_speed: f64,
    /// When set, overrides `fps` with the preset's rate.
    pub quality: Option<Quality>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fps: 30.0,
            playback_speed: 1.0,
            quality: None,
        }
    }
}

impl RenderConfig {
    /// The frame rate in effect after applying the quality preset.
    pub fn effective_fps(&self) -> f64 {
        self.quality.map(|q| q.fps()).unwrap_or(self.fps)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Run time in seconds for animations that do not specify one.
    pub default_run_time: f64,
    pub default_easing: Easing,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            default_run_time: 1.0,
            default_easing: Easing::Smooth,
        }
    }
}

impl AnimationConfig {
    pub fn run_time(&self) -> Duration {
        Duration::from_seconds(self.default_run_time)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AxisConfig {
    pub default_step: f64,
    pub default_length: f64,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            default_step: 1.0,
            default_length: 10.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub frame_width: f64,
    pub frame_height: f64,
    /// Margin kept between a mobject and the frame edge by `to_edge`.
    pub edge_buff: f64,
    /// Default gap between neighbours for `next_to` and `arrange`.
    pub mobject_buff: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            frame_width: 8.0 * 16.0 / 9.0,
            frame_height: 8.0,
            edge_buff: 0.5,
            mobject_buff: 0.25,
        }
    }
}

impl CanvasConfig {
    /// The visible canvas region, centred on the origin.
    pub fn frame_bounds(&self) -> BoundingBox {
        BoundingBox::from_center_size(Point2D::zero(), self.frame_width, self.frame_height)
    }
}

/// Engine-wide settings, loadable from a `slate.toml` file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub axis: AxisConfig,
    #[serde(default)]
    pub canvas: CanvasConfig,
}

impl EngineConfig {
    pub fn from_toml_str(contents: &str) -> SlateResult<Self> {
        let config: EngineConfig =
            toml::from_str(contents).map_err(|e| SlateError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &std::path::Path) -> SlateResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn save_to_file(&self, path: &std::path::Path) -> SlateResult<()> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| SlateError::Config(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> SlateResult<()> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(SlateError::Config(format!(
                    "{} must be positive, got {}",
                    name, v
                )))
            }
        };
        positive("render.fps", self.render.fps)?;
        positive("render.playback_speed", self.render.playback_speed)?;
        positive("axis.default_step", self.axis.default_step)?;
        positive("axis.default_length", self.axis.default_length)?;
        positive("canvas.frame_width", self.canvas.frame_width)?;
        positive("canvas.frame_height", self.canvas.frame_height)?;
        Duration::checked_from_seconds(self.animation.default_run_time).map_err(|e| {
            SlateError::Config(format!("animation.default_run_time: {}", e))
        })?;
        for (name, v) in [
            ("canvas.edge_buff", self.canvas.edge_buff),
            ("canvas.mobject_buff", self.canvas.mobject_buff),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(SlateError::Config(format!(
                    "{} must be non-negative, got {}",
                    name, v
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.render.effective_fps(), 30.0);
        assert_eq!(config.animation.default_easing, Easing::Smooth);
        assert_eq!(config.animation.run_time(), Duration::from_seconds(1.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [render]
            fps = 60.0
            playback_speed = 2.0

            [animation]
            default_run_time = 0.5
            default_easing = "linear"
            "#,
        )
        .unwrap();
        assert_eq!(config.render.fps, 60.0);
        assert_eq!(config.render.playback_speed, 2.0);
        assert_eq!(config.animation.default_easing, Easing::Linear);
        assert_eq!(config.canvas.edge_buff, 0.5);
    }

    #[test]
    fn test_quality_overrides_fps() {
        let config = EngineConfig::from_toml_str(
            r#"
            [render]
            fps = 30.0
            playback_speed = 1.0
            quality = "high"
            "#,
        )
        .unwrap();
        assert_eq!(config.render.effective_fps(), 60.0);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = EngineConfig::from_toml_str(
            r#"
            [render]
            fps = 0.0
            playback_speed = 1.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, SlateError::Config(_)));
        assert!(EngineConfig::from_toml_str("[render]\nfps = \"fast\"").is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join(format!("slate-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("slate.toml");
        let mut config = EngineConfig::default();
        config.render.fps = 24.0;
        config.save_to_file(&path).unwrap();
        let loaded = EngineConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.render.fps, 24.0);
        std::fs::remove_dir_all(&dir).ok();
    }
}
