use serde::{Deserialize, Serialize};

use slate_core::axis::{format_tick, Axes, CoordinateAxis};
use slate_core::math::lerp;
use slate_core::types::{TEXT_LINE_HEIGHT_PER_POINT, TICK_SIZE};
use slate_core::{Color, MobjectId, Point2D, Shape, SlateError, SlateResult, Transform2D};

/// Stroke width used for outlined shapes unless overridden.
pub const DEFAULT_STROKE_WIDTH: f64 = 4.0;
/// Default radius of a [`Shape::Dot`].
pub const DEFAULT_DOT_RADIUS: f64 = 0.08;
/// Default font size for text and formulas.
pub const DEFAULT_FONT_SIZE: f64 = 48.0;
/// Font size of number line tick labels.
pub const TICK_LABEL_FONT_SIZE: f64 = 24.0;
/// Gap between a number line and its tick labels.
const TICK_LABEL_BUFF: f64 = 0.25;

/// Visual style of a mobject.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub color: Color,
    /// Opacity of the whole mobject; multiplied into its descendants when drawn.
    pub opacity: f64,
    pub fill_opacity: f64,
    pub stroke_width: f64,
}

impl Style {
    /// The default style for a shape kind: filled text and dots, outlined geometry.
    pub fn for_shape(shape: &Shape) -> Self {
        let (fill_opacity, stroke_width) = match shape {
            Shape::Text { .. } | Shape::MathTex { .. } => (1.0, 0.0),
            Shape::Dot { .. } => (1.0, 0.0),
            Shape::Group => (0.0, 0.0),
            _ => (0.0, DEFAULT_STROKE_WIDTH),
        };
        Self {
            color: Color::WHITE,
            opacity: 1.0,
            fill_opacity,
            stroke_width,
        }
    }

    pub fn lerp(&self, other: &Style, t: f64) -> Style {
        Style {
            color: self.color.lerp(&other.color, t as f32),
            opacity: lerp(self.opacity, other.opacity, t),
            fill_opacity: lerp(self.fill_opacity, other.fill_opacity, t),
            stroke_width: lerp(self.stroke_width, other.stroke_width, t),
        }
    }
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            opacity: 1.0,
            fill_opacity: 0.0,
            stroke_width: DEFAULT_STROKE_WIDTH,
        }
    }
}

/// Optional numeric or textual value carried by a mobject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Number(f64),
    Text(String),
}

/// A named, individually writable field of a mobject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Position,
    Scale,
    Rotation,
    Color,
    Opacity,
    FillOpacity,
    StrokeWidth,
    Visible,
    Shape,
    Payload,
    Name,
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Attribute::Position => "position",
            Attribute::Scale => "scale",
            Attribute::Rotation => "rotation",
            Attribute::Color => "color",
            Attribute::Opacity => "opacity",
            Attribute::FillOpacity => "fill_opacity",
            Attribute::StrokeWidth => "stroke_width",
            Attribute::Visible => "visible",
            Attribute::Shape => "shape",
            Attribute::Payload => "payload",
            Attribute::Name => "name",
        };
        write!(f, "{}", name)
    }
}

/// A value written to or read from an [`Attribute`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttrValue {
    Number(f64),
    Point(Point2D),
    Color(Color),
    Bool(bool),
    Text(String),
    Shape(Shape),
}

impl AttrValue {
    fn kind(&self) -> &'static str {
        match self {
            AttrValue::Number(_) => "number",
            AttrValue::Point(_) => "point",
            AttrValue::Color(_) => "color",
            AttrValue::Bool(_) => "bool",
            AttrValue::Text(_) => "text",
            AttrValue::Shape(_) => "shape",
        }
    }
}

/// A positioned, styled visual entity. Children are owned and drawn in insertion order.
///
/// The transform is relative to the parent, so moving a group moves its members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mobject {
    pub id: MobjectId,
    pub name: Option<String>,
    pub shape: Shape,
    pub transform: Transform2D,
    pub style: Style,
    /// Hidden mobjects and their subtrees are not drawn even when staged.
    pub visible: bool,
    pub payload: Option<Payload>,
    pub parent: Option<MobjectId>,
    pub children: Vec<MobjectId>,
    /// Bumped on every attribute write.
    pub version: u64,
}

impl Mobject {
    pub fn new(id: MobjectId, shape: Shape) -> Self {
        let style = Style::for_shape(&shape);
        Self {
            id,
            name: None,
            shape,
            transform: Transform2D::identity(),
            style,
            visible: true,
            payload: None,
            parent: None,
            children: Vec::new(),
            version: 0,
        }
    }

    /// A display label: the name when set, otherwise the id.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("{} ({})", name, self.id),
            None => format!("{} {}", self.shape.kind_name(), self.id),
        }
    }

    /// Read an attribute. `None` when an optional attribute is unset.
    pub fn attribute(&self, attribute: Attribute) -> Option<AttrValue> {
        let value = match attribute {
            Attribute::Position => AttrValue::Point(self.transform.position),
            Attribute::Scale => AttrValue::Point(self.transform.scale),
            Attribute::Rotation => AttrValue::Number(self.transform.rotation),
            Attribute::Color => AttrValue::Color(self.style.color),
            Attribute::Opacity => AttrValue::Number(self.style.opacity),
            Attribute::FillOpacity => AttrValue::Number(self.style.fill_opacity),
            Attribute::StrokeWidth => AttrValue::Number(self.style.stroke_width),
            Attribute::Visible => AttrValue::Bool(self.visible),
            Attribute::Shape => AttrValue::Shape(self.shape.clone()),
            Attribute::Payload => match self.payload.as_ref()? {
                Payload::Number(n) => AttrValue::Number(*n),
                Payload::Text(t) => AttrValue::Text(t.clone()),
            },
            Attribute::Name => AttrValue::Text(self.name.clone()?),
        };
        Some(value)
    }

    /// Write an attribute after checking that the value has the right type.
    pub fn set_attribute(&mut self, attribute: Attribute, value: AttrValue) -> SlateResult<()> {
        match (attribute, value) {
            (Attribute::Position, AttrValue::Point(p)) if p.is_finite() => {
                self.transform.position = p
            }
            (Attribute::Scale, AttrValue::Point(s)) if s.is_finite() => self.transform.scale = s,
            (Attribute::Scale, AttrValue::Number(s)) if s.is_finite() => {
                self.transform.scale = Point2D::new(s, s)
            }
            (Attribute::Rotation, AttrValue::Number(r)) if r.is_finite() => {
                self.transform.rotation = r
            }
            (Attribute::Color, AttrValue::Color(c)) => self.style.color = c,
            (Attribute::Opacity, AttrValue::Number(o)) => self.style.opacity = unit(o)?,
            (Attribute::FillOpacity, AttrValue::Number(o)) => self.style.fill_opacity = unit(o)?,
            (Attribute::StrokeWidth, AttrValue::Number(w)) if w.is_finite() && w >= 0.0 => {
                self.style.stroke_width = w
            }
            (Attribute::Visible, AttrValue::Bool(v)) => self.visible = v,
            (Attribute::Shape, AttrValue::Shape(shape)) => {
                if shape.is_group() != self.shape.is_group() {
                    return Err(SlateError::invalid_argument(format!(
                        "cannot change {} between a group and a shape",
                        self.label()
                    )));
                }
                self.shape = shape
            }
            (Attribute::Payload, AttrValue::Number(n)) => self.payload = Some(Payload::Number(n)),
            (Attribute::Payload, AttrValue::Text(t)) => self.payload = Some(Payload::Text(t)),
            (Attribute::Name, AttrValue::Text(t)) => self.name = Some(t),
            (attribute, value) => {
                return Err(SlateError::invalid_argument(format!(
                    "attribute {} of {} does not accept {} value {:?}",
                    attribute,
                    self.label(),
                    value.kind(),
                    value
                )))
            }
        }
        self.version += 1;
        Ok(())
    }
}

fn unit(v: f64) -> SlateResult<f64> {
    if (0.0..=1.0).contains(&v) {
        Ok(v)
    } else {
        Err(SlateError::invalid_argument(format!(
            "opacity must lie in [0, 1], got {}",
            v
        )))
    }
}

/// A description of a mobject (and its children) before it is given an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MobjectSpec {
    pub shape: Shape,
    pub name: Option<String>,
    pub transform: Transform2D,
    pub style: Style,
    pub payload: Option<Payload>,
    pub children: Vec<MobjectSpec>,
}

impl MobjectSpec {
    pub fn new(shape: Shape) -> Self {
        let style = Style::for_shape(&shape);
        Self {
            shape,
            name: None,
            transform: Transform2D::identity(),
            style,
            payload: None,
            children: Vec::new(),
        }
    }

    pub fn circle(radius: f64) -> Self {
        Self::new(Shape::Circle { radius })
    }

    pub fn dot() -> Self {
        Self::new(Shape::Dot {
            radius: DEFAULT_DOT_RADIUS,
        })
    }

    pub fn square(side: f64) -> Self {
        Self::new(Shape::Square { side })
    }

    pub fn rectangle(width: f64, height: f64) -> Self {
        Self::new(Shape::Rectangle { width, height })
    }

    pub fn line(start: Point2D, end: Point2D) -> Self {
        Self::new(Shape::Line { start, end })
    }

    pub fn arrow(start: Point2D, end: Point2D) -> Self {
        Self::new(Shape::Arrow { start, end })
    }

    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(Shape::Text {
            text: text.clone(),
            font_size: DEFAULT_FONT_SIZE,
        })
        .with_payload(Payload::Text(text))
    }

    pub fn math_tex(tex: impl Into<String>) -> Self {
        Self::new(Shape::MathTex {
            tex: tex.into(),
            font_size: DEFAULT_FONT_SIZE,
        })
    }

    pub fn number_line(axis: CoordinateAxis) -> Self {
        Self::new(Shape::NumberLine { axis })
    }

    /// A number line with one text label per tick, placed below the line.
    pub fn number_line_with_numbers(axis: CoordinateAxis, font_size: f64) -> Self {
        let label_height = font_size * TEXT_LINE_HEIGHT_PER_POINT;
        let drop = TICK_SIZE / 2.0 + TICK_LABEL_BUFF + label_height / 2.0;
        let labels = axis
            .ticks()
            .into_iter()
            .map(|value| {
                MobjectSpec::text(format_tick(value))
                    .with_font_size(font_size)
                    .with_payload(Payload::Number(value))
                    .at(axis.to_point(value) + Point2D::DOWN * drop)
            })
            .collect();
        Self::number_line(axis).with_children(labels)
    }

    pub fn axes(axes: Axes) -> Self {
        Self::new(Shape::Axes { axes })
    }

    pub fn group(children: Vec<MobjectSpec>) -> Self {
        Self::new(Shape::Group).with_children(children)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.style.color = color;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.style.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_fill_opacity(mut self, fill_opacity: f64) -> Self {
        self.style.fill_opacity = fill_opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_stroke_width(mut self, stroke_width: f64) -> Self {
        self.style.stroke_width = stroke_width.max(0.0);
        self
    }

    /// Set the font size of text and formula shapes. Other shapes are unchanged.
    pub fn with_font_size(mut self, size: f64) -> Self {
        match &mut self.shape {
            Shape::Text { font_size, .. } | Shape::MathTex { font_size, .. } => *font_size = size,
            _ => {}
        }
        self
    }

    pub fn with_radius(mut self, r: f64) -> Self {
        match &mut self.shape {
            Shape::Circle { radius } | Shape::Dot { radius } => *radius = r,
            _ => {}
        }
        self
    }

    pub fn at(mut self, position: Point2D) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_scale(mut self, factor: f64) -> Self {
        self.transform.scale = Point2D::new(factor, factor);
        self
    }

    pub fn with_rotation(mut self, radians: f64) -> Self {
        self.transform.rotation = radians;
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_children(mut self, children: Vec<MobjectSpec>) -> Self {
        self.children.extend(children);
        self
    }

    /// Number of mobjects this spec expands into, including itself.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }
}
