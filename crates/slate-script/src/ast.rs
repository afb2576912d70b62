//! Lesson script document: the serde model of a JSON lesson.

use serde::{Deserialize, Serialize};
use slate_core::{EngineConfig, SlateError, SlateResult};

/// A lesson written as data: a name and the ordered build/play commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonScript {
    pub name: String,
    /// Engine settings for this lesson; the orchestrator's are used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<EngineConfig>,
    pub commands: Vec<Command>,
}

impl LessonScript {
    pub fn from_json(source: &str) -> SlateResult<Self> {
        serde_json::from_str(source)
            .map_err(|e| SlateError::Compile(format!("invalid lesson script: {}", e)))
    }

    pub fn load(path: &std::path::Path) -> SlateResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json(&source)
    }

    pub fn to_json(&self) -> SlateResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A canvas vector: a direction name (`UP`, `DL`, `ORIGIN`, ...) or `[x, y]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VectorNode {
    Xy([f64; 2]),
    Named(String),
}

/// Optional style overrides applied at creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleNode {
    /// A color name (`BLUE`) or hex string (`#ff8800`).
    pub color: Option<String>,
    pub opacity: Option<f64>,
    pub fill_opacity: Option<f64>,
    pub stroke_width: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeNode {
    Circle {
        #[serde(default = "default_radius")]
        radius: f64,
    },
    Dot {
        radius: Option<f64>,
    },
    Square {
        #[serde(default = "default_side")]
        side: f64,
    },
    Rectangle {
        width: f64,
        height: f64,
    },
    Line {
        start: VectorNode,
        end: VectorNode,
    },
    Arrow {
        start: VectorNode,
        end: VectorNode,
    },
    Text {
        text: String,
        font_size: Option<f64>,
    },
    MathTex {
        tex: String,
        font_size: Option<f64>,
    },
    /// `x_range` is `[min, max, step]`; length defaults to the configured axis length.
    NumberLine {
        x_range: [f64; 3],
        length: Option<f64>,
        #[serde(default)]
        include_numbers: bool,
        font_size: Option<f64>,
    },
    Axes {
        x_range: [f64; 3],
        y_range: [f64; 3],
        x_length: Option<f64>,
        y_length: Option<f64>,
    },
}

fn default_radius() -> f64 {
    1.0
}

fn default_side() -> f64 {
    2.0
}

fn default_wait() -> f64 {
    1.0
}

/// One step of a lesson script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    Create {
        name: String,
        shape: ShapeNode,
        #[serde(default)]
        style: StyleNode,
        at: Option<VectorNode>,
    },
    Group {
        name: String,
        children: Vec<String>,
    },
    Stage {
        target: String,
    },
    Unstage {
        target: String,
    },
    Destroy {
        target: String,
    },
    Shift {
        target: String,
        by: VectorNode,
    },
    MoveTo {
        target: String,
        to: VectorNode,
    },
    NextTo {
        target: String,
        anchor: String,
        direction: VectorNode,
        buff: Option<f64>,
        aligned_edge: Option<VectorNode>,
    },
    AlignTo {
        target: String,
        anchor: String,
        edge: VectorNode,
    },
    ToEdge {
        target: String,
        edge: VectorNode,
        buff: Option<f64>,
    },
    ToCorner {
        target: String,
        corner: VectorNode,
        buff: Option<f64>,
    },
    Arrange {
        items: Vec<String>,
        direction: VectorNode,
        buff: Option<f64>,
        aligned_edge: Option<VectorNode>,
    },
    Distribute {
        items: Vec<String>,
        start: VectorNode,
        step: VectorNode,
    },
    PlaceOnAxis {
        target: String,
        axis: String,
        value: f64,
    },
    PlaceAtCoords {
        target: String,
        axes: String,
        x: f64,
        y: f64,
    },
    /// Create a rectangle named `name` framing `anchor`.
    Surround {
        name: String,
        anchor: String,
        buff: Option<f64>,
        color: Option<String>,
    },
    SetColor {
        target: String,
        color: String,
    },
    SetOpacity {
        target: String,
        opacity: f64,
    },
    Play {
        animations: Vec<AnimNode>,
        /// Overrides every member's run time.
        run_time: Option<f64>,
        /// Start members one after another instead of together.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lag_ratio: Option<f64>,
    },
    Wait {
        #[serde(default = "default_wait")]
        seconds: f64,
    },
    FadeOutAll,
}

impl Command {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Command::Create { .. } => "create",
            Command::Group { .. } => "group",
            Command::Stage { .. } => "stage",
            Command::Unstage { .. } => "unstage",
            Command::Destroy { .. } => "destroy",
            Command::Shift { .. } => "shift",
            Command::MoveTo { .. } => "move_to",
            Command::NextTo { .. } => "next_to",
            Command::AlignTo { .. } => "align_to",
            Command::ToEdge { .. } => "to_edge",
            Command::ToCorner { .. } => "to_corner",
            Command::Arrange { .. } => "arrange",
            Command::Distribute { .. } => "distribute",
            Command::PlaceOnAxis { .. } => "place_on_axis",
            Command::PlaceAtCoords { .. } => "place_at_coords",
            Command::Surround { .. } => "surround",
            Command::SetColor { .. } => "set_color",
            Command::SetOpacity { .. } => "set_opacity",
            Command::Play { .. } => "play",
            Command::Wait { .. } => "wait",
            Command::FadeOutAll => "fade_out_all",
        }
    }
}

/// One member of a play group, with optional timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimNode {
    #[serde(flatten)]
    pub kind: AnimKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_time: Option<f64>,
    /// Easing name, e.g. `smooth`, `linear`, `ease_in_out`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "anim", rename_all = "snake_case")]
pub enum AnimKind {
    FadeIn {
        target: String,
        shift: Option<VectorNode>,
        scale: Option<f64>,
    },
    Create {
        target: String,
        lag_ratio: Option<f64>,
    },
    Write {
        target: String,
        lag_ratio: Option<f64>,
    },
    GrowFromCenter {
        target: String,
    },
    GrowArrow {
        target: String,
    },
    FadeOut {
        target: String,
        shift: Option<VectorNode>,
        scale: Option<f64>,
    },
    ShrinkToCenter {
        target: String,
    },
    Uncreate {
        target: String,
    },
    Transform {
        target: String,
        into: String,
        pairs: Option<Vec<(usize, usize)>>,
    },
    ReplacementTransform {
        target: String,
        into: String,
        pairs: Option<Vec<(usize, usize)>>,
    },
    /// Morph a copy of `target` into `into`, leaving `target` where it is.
    TransformFromCopy {
        target: String,
        into: String,
        pairs: Option<Vec<(usize, usize)>>,
    },
    MoveTo {
        target: String,
        to: VectorNode,
    },
    Shift {
        target: String,
        by: VectorNode,
    },
    /// Animated relayout against a canvas edge.
    ToEdge {
        target: String,
        edge: VectorNode,
        buff: Option<f64>,
    },
    /// Animated relayout beside another mobject.
    NextTo {
        target: String,
        anchor: String,
        direction: VectorNode,
        buff: Option<f64>,
    },
    Scale {
        target: String,
        factor: f64,
    },
    Rotate {
        target: String,
        degrees: f64,
    },
    Recolor {
        target: String,
        color: String,
    },
}
