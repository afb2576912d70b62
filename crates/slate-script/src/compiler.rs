//! Lesson script compiler: commands → scene build calls.

use crate::ast::*;
use slate_core::{Axes, Color, CoordinateAxis, Easing, MobjectId, Point2D, SlateError, SlateResult};
use slate_ir::mobject::TICK_LABEL_FONT_SIZE;
use slate_ir::{AttrValue, Attribute, Animation, LayoutRelation, MobjectSpec, Scene};

/// Height of script axes when `y_length` is not given.
const DEFAULT_AXES_HEIGHT: f64 = 6.0;

/// Replays a [`LessonScript`] onto a [`Scene`], resolving names as it goes.
pub struct Compiler<'s> {
    scene: &'s mut Scene,
}

impl<'s> Compiler<'s> {
    pub fn new(scene: &'s mut Scene) -> Self {
        Self { scene }
    }

    /// Interpret every command in order. Name and value errors become
    /// [`SlateError::Compile`] tagged with the failing command.
    pub fn compile(script: &LessonScript, scene: &'s mut Scene) -> SlateResult<()> {
        let mut compiler = Self::new(scene);
        for (index, command) in script.commands.iter().enumerate() {
            tracing::debug!(command = index, kind = command.kind_name(), "interpreting");
            compiler.command(command).map_err(|e| match e {
                SlateError::Compile(message) => SlateError::Compile(format!(
                    "command {} ({}): {}",
                    index,
                    command.kind_name(),
                    message
                )),
                other => other,
            })?;
        }
        Ok(())
    }

    pub fn command(&mut self, command: &Command) -> SlateResult<()> {
        match command {
            Command::Create {
                name,
                shape,
                style,
                at,
            } => {
                if self.scene.find(name).is_some() {
                    return Err(SlateError::Compile(format!("name '{}' is already taken", name)));
                }
                let mut spec = self.shape(shape)?.named(name.as_str());
                spec = apply_style(spec, style)?;
                if let Some(at) = at {
                    spec = spec.at(vector(at)?);
                }
                self.scene.create(spec)?;
            }
            Command::Group { name, children } => {
                if self.scene.find(name).is_some() {
                    return Err(SlateError::Compile(format!("name '{}' is already taken", name)));
                }
                let children = self.ids(children)?;
                let id = self.scene.group(&children)?;
                self.scene
                    .set_attribute(id, Attribute::Name, AttrValue::Text(name.clone()))?;
            }
            Command::Stage { target } => {
                let id = self.id(target)?;
                self.scene.stage(id)?;
            }
            Command::Unstage { target } => {
                let id = self.id(target)?;
                self.scene.unstage(id)?;
            }
            Command::Destroy { target } => {
                let id = self.id(target)?;
                self.scene.destroy(id)?;
            }
            Command::Shift { target, by } => {
                let id = self.id(target)?;
                self.scene.shift(id, vector(by)?)?;
            }
            Command::MoveTo { target, to } => {
                let id = self.id(target)?;
                self.scene.move_to(id, vector(to)?)?;
            }
            Command::NextTo {
                target,
                anchor,
                direction,
                buff,
                aligned_edge,
            } => {
                let relation = self.next_to(target, anchor, direction, *buff)?;
                let relation = match aligned_edge {
                    Some(edge) => relation.with_aligned_edge(vector(edge)?),
                    None => relation,
                };
                self.scene.relate(relation)?;
            }
            Command::AlignTo {
                target,
                anchor,
                edge,
            } => {
                let (id, anchor) = (self.id(target)?, self.id(anchor)?);
                self.scene.align_to(id, anchor, vector(edge)?)?;
            }
            Command::ToEdge { target, edge, buff } | Command::ToCorner {
                target,
                corner: edge,
                buff,
            } => {
                let relation = self.to_edge(target, edge, *buff)?;
                self.scene.relate(relation)?;
            }
            Command::Arrange {
                items,
                direction,
                buff,
                aligned_edge,
            } => {
                let items = self.ids(items)?;
                let buff = buff.unwrap_or(self.scene.config().canvas.mobject_buff);
                let mut relation = LayoutRelation::arrange(items, vector(direction)?).with_buff(buff);
                if let Some(edge) = aligned_edge {
                    relation = relation.with_aligned_edge(vector(edge)?);
                }
                self.scene.relate(relation)?;
            }
            Command::Distribute { items, start, step } => {
                let items = self.ids(items)?;
                self.scene.distribute(&items, vector(start)?, vector(step)?)?;
            }
            Command::PlaceOnAxis {
                target,
                axis,
                value,
            } => {
                let (id, axis) = (self.id(target)?, self.id(axis)?);
                self.scene.place_on_axis(id, axis, *value)?;
            }
            Command::PlaceAtCoords { target, axes, x, y } => {
                let (id, axes) = (self.id(target)?, self.id(axes)?);
                self.scene.place_at_coords(id, axes, *x, *y)?;
            }
            Command::Surround {
                name,
                anchor,
                buff,
                color,
            } => {
                if self.scene.find(name).is_some() {
                    return Err(SlateError::Compile(format!("name '{}' is already taken", name)));
                }
                let anchor = self.id(anchor)?;
                let color = match color {
                    Some(color) => parse_color(color)?,
                    None => Color::YELLOW,
                };
                let frame = self.scene.create(
                    MobjectSpec::rectangle(1.0, 1.0)
                        .with_color(color)
                        .named(name.as_str()),
                )?;
                let mut relation = LayoutRelation::surround(frame, anchor);
                if let Some(buff) = buff {
                    relation = relation.with_buff(*buff);
                }
                self.scene.relate(relation)?;
            }
            Command::SetColor { target, color } => {
                let id = self.id(target)?;
                self.scene.set_color(id, parse_color(color)?)?;
            }
            Command::SetOpacity { target, opacity } => {
                let id = self.id(target)?;
                self.scene.set_opacity(id, *opacity)?;
            }
            Command::Play {
                animations,
                run_time,
                lag_ratio,
            } => {
                let animations = animations
                    .iter()
                    .map(|node| self.animation(node))
                    .collect::<SlateResult<Vec<_>>>()?;
                match (run_time, lag_ratio) {
                    (Some(seconds), Some(lag)) => {
                        self.scene.play_lagged_timed(animations, *lag, *seconds)?
                    }
                    (None, Some(lag)) => self.scene.play_lagged(animations, *lag)?,
                    (Some(seconds), None) => self.scene.play_timed(animations, *seconds)?,
                    (None, None) => self.scene.play(animations)?,
                }
            }
            Command::Wait { seconds } => self.scene.wait(*seconds)?,
            Command::FadeOutAll => self.scene.fade_out_all()?,
        }
        Ok(())
    }

    fn id(&self, name: &str) -> SlateResult<MobjectId> {
        self.scene
            .find(name)
            .ok_or_else(|| SlateError::Compile(format!("unknown mobject '{}'", name)))
    }

    fn ids(&self, names: &[String]) -> SlateResult<Vec<MobjectId>> {
        names.iter().map(|name| self.id(name)).collect()
    }

    fn next_to(
        &self,
        target: &str,
        anchor: &str,
        direction: &VectorNode,
        buff: Option<f64>,
    ) -> SlateResult<LayoutRelation> {
        let (id, anchor) = (self.id(target)?, self.id(anchor)?);
        let buff = buff.unwrap_or(self.scene.config().canvas.mobject_buff);
        Ok(LayoutRelation::next_to(id, anchor, vector(direction)?).with_buff(buff))
    }

    fn to_edge(&self, target: &str, edge: &VectorNode, buff: Option<f64>) -> SlateResult<LayoutRelation> {
        let id = self.id(target)?;
        let buff = buff.unwrap_or(self.scene.config().canvas.edge_buff);
        Ok(LayoutRelation::to_edge(id, vector(edge)?).with_buff(buff))
    }

    fn shape(&self, shape: &ShapeNode) -> SlateResult<MobjectSpec> {
        let spec = match shape {
            ShapeNode::Circle { radius } => MobjectSpec::circle(*radius),
            ShapeNode::Dot { radius } => match radius {
                Some(r) => MobjectSpec::dot().with_radius(*r),
                None => MobjectSpec::dot(),
            },
            ShapeNode::Square { side } => MobjectSpec::square(*side),
            ShapeNode::Rectangle { width, height } => MobjectSpec::rectangle(*width, *height),
            ShapeNode::Line { start, end } => MobjectSpec::line(vector(start)?, vector(end)?),
            ShapeNode::Arrow { start, end } => MobjectSpec::arrow(vector(start)?, vector(end)?),
            ShapeNode::Text { text, font_size } => with_font_size(MobjectSpec::text(text.as_str()), *font_size),
            ShapeNode::MathTex { tex, font_size } => {
                with_font_size(MobjectSpec::math_tex(tex.as_str()), *font_size)
            }
            ShapeNode::NumberLine {
                x_range: [min, max, step],
                length,
                include_numbers,
                font_size,
            } => {
                let length = length.unwrap_or(self.scene.config().axis.default_length);
                let axis = CoordinateAxis::new(*min, *max, *step, length)?;
                if *include_numbers {
                    MobjectSpec::number_line_with_numbers(
                        axis,
                        font_size.unwrap_or(TICK_LABEL_FONT_SIZE),
                    )
                } else {
                    MobjectSpec::number_line(axis)
                }
            }
            ShapeNode::Axes {
                x_range,
                y_range,
                x_length,
                y_length,
            } => {
                let axes = Axes::new(
                    *x_range,
                    *y_range,
                    x_length.unwrap_or(self.scene.config().axis.default_length),
                    y_length.unwrap_or(DEFAULT_AXES_HEIGHT),
                )?;
                MobjectSpec::axes(axes)
            }
        };
        Ok(spec)
    }

    fn animation(&mut self, node: &AnimNode) -> SlateResult<Animation> {
        let mut animation = match &node.kind {
            AnimKind::FadeIn {
                target,
                shift,
                scale,
            } => {
                let mut animation = Animation::fade_in(self.id(target)?);
                if let Some(shift) = shift {
                    animation = animation.with_shift(vector(shift)?);
                }
                if let Some(scale) = scale {
                    animation = animation.with_scale(*scale);
                }
                animation
            }
            AnimKind::FadeOut {
                target,
                shift,
                scale,
            } => {
                let mut animation = Animation::fade_out(self.id(target)?);
                if let Some(shift) = shift {
                    animation = animation.with_shift(vector(shift)?);
                }
                if let Some(scale) = scale {
                    animation = animation.with_scale(*scale);
                }
                animation
            }
            AnimKind::Create { target, lag_ratio } => {
                with_lag(Animation::create(self.id(target)?), *lag_ratio)
            }
            AnimKind::Write { target, lag_ratio } => {
                with_lag(Animation::write(self.id(target)?), *lag_ratio)
            }
            AnimKind::GrowFromCenter { target } => Animation::grow_from_center(self.id(target)?),
            AnimKind::GrowArrow { target } => Animation::grow_arrow(self.id(target)?),
            AnimKind::ShrinkToCenter { target } => Animation::shrink_to_center(self.id(target)?),
            AnimKind::Uncreate { target } => Animation::uncreate(self.id(target)?),
            AnimKind::Transform {
                target,
                into,
                pairs,
            } => with_pairs(
                Animation::transform(self.id(target)?, self.id(into)?),
                pairs,
            ),
            AnimKind::ReplacementTransform {
                target,
                into,
                pairs,
            } => with_pairs(
                Animation::replacement_transform(self.id(target)?, self.id(into)?),
                pairs,
            ),
            AnimKind::TransformFromCopy {
                target,
                into,
                pairs,
            } => {
                let (source, into) = (self.id(target)?, self.id(into)?);
                with_pairs(self.scene.transform_from_copy(source, into)?, pairs)
            }
            AnimKind::MoveTo { target, to } => Animation::move_to(self.id(target)?, vector(to)?),
            AnimKind::Shift { target, by } => Animation::shift(self.id(target)?, vector(by)?),
            AnimKind::ToEdge { target, edge, buff } => {
                Animation::relayout(self.to_edge(target, edge, *buff)?)?
            }
            AnimKind::NextTo {
                target,
                anchor,
                direction,
                buff,
            } => Animation::relayout(self.next_to(target, anchor, direction, *buff)?)?,
            AnimKind::Scale { target, factor } => Animation::scale(self.id(target)?, *factor),
            AnimKind::Rotate { target, degrees } => {
                Animation::rotate(self.id(target)?, degrees.to_radians())
            }
            AnimKind::Recolor { target, color } => {
                Animation::recolor(self.id(target)?, parse_color(color)?)
            }
        };
        if let Some(seconds) = node.run_time {
            animation = animation.with_run_time(seconds);
        }
        if let Some(name) = &node.easing {
            let easing = Easing::from_name(name)
                .ok_or_else(|| SlateError::Compile(format!("unknown easing '{}'", name)))?;
            animation = animation.with_easing(easing);
        }
        Ok(animation)
    }
}

fn with_font_size(spec: MobjectSpec, font_size: Option<f64>) -> MobjectSpec {
    match font_size {
        Some(size) => spec.with_font_size(size),
        None => spec,
    }
}

fn with_lag(animation: Animation, lag_ratio: Option<f64>) -> Animation {
    match lag_ratio {
        Some(ratio) => animation.with_lag_ratio(ratio),
        None => animation,
    }
}

fn with_pairs(animation: Animation, pairs: &Option<Vec<(usize, usize)>>) -> Animation {
    match pairs {
        Some(pairs) => animation.with_pairs(pairs.clone()),
        None => animation,
    }
}

fn apply_style(mut spec: MobjectSpec, style: &StyleNode) -> SlateResult<MobjectSpec> {
    if let Some(color) = &style.color {
        spec = spec.with_color(parse_color(color)?);
    }
    if let Some(opacity) = style.opacity {
        spec = spec.with_opacity(opacity);
    }
    if let Some(fill_opacity) = style.fill_opacity {
        spec = spec.with_fill_opacity(fill_opacity);
    }
    if let Some(stroke_width) = style.stroke_width {
        spec = spec.with_stroke_width(stroke_width);
    }
    Ok(spec)
}

/// Resolve a direction name or `[x, y]` pair.
pub fn vector(node: &VectorNode) -> SlateResult<Point2D> {
    match node {
        VectorNode::Xy([x, y]) => {
            let point = Point2D::new(*x, *y);
            if point.is_finite() {
                Ok(point)
            } else {
                Err(SlateError::Compile(format!("vector [{}, {}] is not finite", x, y)))
            }
        }
        VectorNode::Named(name) => match name.to_ascii_uppercase().as_str() {
            "ORIGIN" => Ok(Point2D::ORIGIN),
            "UP" => Ok(Point2D::UP),
            "DOWN" => Ok(Point2D::DOWN),
            "LEFT" => Ok(Point2D::LEFT),
            "RIGHT" => Ok(Point2D::RIGHT),
            "UL" => Ok(Point2D::UL),
            "UR" => Ok(Point2D::UR),
            "DL" => Ok(Point2D::DL),
            "DR" => Ok(Point2D::DR),
            _ => Err(SlateError::Compile(format!("unknown direction '{}'", name))),
        },
    }
}

/// Resolve a color name or `#rrggbb` hex string.
pub fn parse_color(value: &str) -> SlateResult<Color> {
    if value.starts_with('#') {
        return Color::from_hex(value)
            .map_err(|e| SlateError::Compile(format!("invalid color '{}': {}", value, e)));
    }
    Color::from_name(value).ok_or_else(|| SlateError::Compile(format!("unknown color '{}'", value)))
}
