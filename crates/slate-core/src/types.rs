use serde::{Deserialize, Serialize};

use crate::axis::{Axes, CoordinateAxis};
use crate::math::{BoundingBox, Point2D};

/// Unique identifier of a mobject within one scene build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MobjectId(pub u64);

impl std::fmt::Display for MobjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Easing function for animation interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    /// Sigmoid-shaped rate function, flat at both ends.
    Smooth,
    /// Goes to 1 at the midpoint and back to 0.
    ThereAndBack,
}

impl Default for Easing {
    fn default() -> Self {
        Easing::Smooth
    }
}

const SMOOTH_INFLECTION: f64 = 10.0;

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl Easing {
    /// Apply the easing function to a normalized time value t in [0, 1].
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => t * (2.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::CubicIn => t * t * t,
            Easing::CubicOut => {
                let t1 = t - 1.0;
                t1 * t1 * t1 + 1.0
            }
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let t1 = 2.0 * t - 2.0;
                    0.5 * t1 * t1 * t1 + 1.0
                }
            }
            Easing::Smooth => {
                if t == 0.0 || t == 1.0 {
                    return t;
                }
                let error = sigmoid(-SMOOTH_INFLECTION / 2.0);
                ((sigmoid(SMOOTH_INFLECTION * (t - 0.5)) - error) / (1.0 - 2.0 * error))
                    .clamp(0.0, 1.0)
            }
            Easing::ThereAndBack => {
                let folded = if t < 0.5 { 2.0 * t } else { 2.0 * (1.0 - t) };
                Easing::Smooth.apply(folded)
            }
        }
    }

    /// Parse a snake_case easing name ("linear", "smooth", "ease_in_out").
    pub fn from_name(name: &str) -> Option<Self> {
        let easing = match name {
            "linear" => Easing::Linear,
            "ease_in" => Easing::EaseIn,
            "ease_out" => Easing::EaseOut,
            "ease_in_out" => Easing::EaseInOut,
            "cubic_in" => Easing::CubicIn,
            "cubic_out" => Easing::CubicOut,
            "cubic_in_out" => Easing::CubicInOut,
            "smooth" => Easing::Smooth,
            "there_and_back" => Easing::ThereAndBack,
            _ => return None,
        };
        Some(easing)
    }
}

/// Height of one text line per point of font size, in canvas units.
pub const TEXT_LINE_HEIGHT_PER_POINT: f64 = 0.5 / 48.0;
/// Average glyph advance relative to the line height.
pub const TEXT_GLYPH_ASPECT: f64 = 0.55;
/// Thickness of a number line's tick band.
pub const TICK_SIZE: f64 = 0.2;

/// Geometry of a mobject, in its local coordinate space centred on its position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Circle { radius: f64 },
    Dot { radius: f64 },
    Square { side: f64 },
    Rectangle { width: f64, height: f64 },
    Line { start: Point2D, end: Point2D },
    Arrow { start: Point2D, end: Point2D },
    Text { text: String, font_size: f64 },
    MathTex { tex: String, font_size: f64 },
    NumberLine { axis: CoordinateAxis },
    Axes { axes: Axes },
    /// Pure container; its extent is the union of its children.
    Group,
}

impl Shape {
    /// Local bounds of the shape itself, excluding children. `None` for groups.
    pub fn extent(&self) -> Option<BoundingBox> {
        let origin = Point2D::zero();
        let bounds = match self {
            Shape::Circle { radius } | Shape::Dot { radius } => {
                BoundingBox::from_center_size(origin, radius * 2.0, radius * 2.0)
            }
            Shape::Square { side } => BoundingBox::from_center_size(origin, *side, *side),
            Shape::Rectangle { width, height } => {
                BoundingBox::from_center_size(origin, *width, *height)
            }
            Shape::Line { start, end } | Shape::Arrow { start, end } => {
                BoundingBox::from_points([*start, *end])
            }
            Shape::Text { text, font_size } => text_extent(text, *font_size),
            Shape::MathTex { tex, font_size } => text_extent(tex, *font_size),
            Shape::NumberLine { axis } => {
                let half_tick = Point2D::new(0.0, TICK_SIZE / 2.0);
                let a = axis.to_point(axis.min());
                let b = axis.to_point(axis.max());
                BoundingBox::from_points([a - half_tick, a + half_tick, b - half_tick, b + half_tick])
            }
            Shape::Axes { axes } => {
                let x = &axes.x;
                let y = &axes.y;
                BoundingBox::from_points([
                    axes.coords_to_point(x.min(), y.min()),
                    axes.coords_to_point(x.max(), y.max()),
                    axes.coords_to_point(x.min(), y.max()),
                    axes.coords_to_point(x.max(), y.min()),
                ])
            }
            Shape::Group => return None,
        };
        Some(bounds)
    }

    /// Short lowercase name of the shape kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::Circle { .. } => "circle",
            Shape::Dot { .. } => "dot",
            Shape::Square { .. } => "square",
            Shape::Rectangle { .. } => "rectangle",
            Shape::Line { .. } => "line",
            Shape::Arrow { .. } => "arrow",
            Shape::Text { .. } => "text",
            Shape::MathTex { .. } => "math_tex",
            Shape::NumberLine { .. } => "number_line",
            Shape::Axes { .. } => "axes",
            Shape::Group => "group",
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Shape::Group)
    }
}

fn text_extent(text: &str, font_size: f64) -> BoundingBox {
    let line_height = font_size * TEXT_LINE_HEIGHT_PER_POINT;
    let lines = text.lines().count().max(1);
    let widest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
    let width = widest as f64 * line_height * TEXT_GLYPH_ASPECT;
    BoundingBox::from_center_size(Point2D::zero(), width, line_height * lines as f64)
}
