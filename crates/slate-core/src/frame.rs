use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::math::{BoundingBox, Point2D};
use crate::types::{MobjectId, Shape};

/// In-flight shape interpolation for a transform animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Morph {
    /// The shape being morphed into.
    pub into: Shape,
    /// Blend factor in [0, 1]; 0 shows the object's own shape, 1 shows `into`.
    pub alpha: f64,
}

/// Resolved visual state of one drawn mobject in a frame, in canvas coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectState {
    pub id: MobjectId,
    pub parent: Option<MobjectId>,
    pub shape: Shape,
    pub position: Point2D,
    pub scale: Point2D,
    pub rotation: f64,
    pub color: Color,
    /// Opacity multiplied through all ancestors.
    pub opacity: f64,
    pub fill_opacity: f64,
    pub stroke_width: f64,
    /// Fraction of the outline drawn, for progressive reveal.
    pub draw_progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morph: Option<Morph>,
}

impl ObjectState {
    /// Canvas-space bounds of the object's own shape, if it has any.
    pub fn bounds(&self) -> Option<BoundingBox> {
        let local = self.shape.extent()?;
        let corners = local.corners().map(|c| {
            self.position + c.scale_by(&self.scale).rotate(self.rotation)
        });
        Some(BoundingBox::from_points(corners))
    }

    /// Whether anything of this object would reach the canvas.
    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0 && self.draw_progress > 0.0
    }
}

/// Everything drawn at one sampled instant of playback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    /// Zero-based frame number.
    pub index: u64,
    /// Scene time in seconds.
    pub time: f64,
    /// Timeline entry active at this time; `None` once the timeline has ended.
    pub entry: Option<usize>,
    /// Drawn objects in paint order (parents before children).
    pub objects: Vec<ObjectState>,
}

impl FrameSnapshot {
    pub fn object(&self, id: MobjectId) -> Option<&ObjectState> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn contains(&self, id: MobjectId) -> bool {
        self.object(id).is_some()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot_at(x: f64, y: f64) -> ObjectState {
        ObjectState {
            id: MobjectId(1),
            parent: None,
            shape: Shape::Dot { radius: 0.1 },
            position: Point2D::new(x, y),
            scale: Point2D::new(1.0, 1.0),
            rotation: 0.0,
            color: Color::YELLOW,
            opacity: 1.0,
            fill_opacity: 1.0,
            stroke_width: 0.0,
            draw_progress: 1.0,
            morph: None,
        }
    }

    #[test]
    fn test_object_bounds_follow_position_and_scale() {
        let mut state = dot_at(2.0, -1.0);
        state.scale = Point2D::new(2.0, 2.0);
        let b = state.bounds().unwrap();
        assert!((b.center().x - 2.0).abs() < 1e-12);
        assert!((b.width() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_snapshot_lookup() {
        let snapshot = FrameSnapshot {
            index: 0,
            time: 0.0,
            entry: Some(0),
            objects: vec![dot_at(0.0, 0.0)],
        };
        assert!(snapshot.contains(MobjectId(1)));
        assert!(!snapshot.contains(MobjectId(2)));
        assert_eq!(snapshot.object_count(), 1);
    }

    #[test]
    fn test_invisible_when_faded_out() {
        let mut state = dot_at(0.0, 0.0);
        assert!(state.is_visible());
        state.opacity = 0.0;
        assert!(!state.is_visible());
    }
}
