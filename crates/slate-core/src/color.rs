use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// RGBA color representation with f32 components in [0.0, 1.0] range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Create a new RGBA color.
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque RGB color (alpha = 1.0).
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Create a color from a hex string (e.g., "#FF0000" or "#FF0000FF").
    pub fn from_hex(hex: &str) -> Result<Self, ColorError> {
        let hex = hex.trim_start_matches('#');
        if !hex.is_ascii() {
            return Err(ColorError::InvalidHex);
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|_| ColorError::InvalidHex)
        };
        match hex.len() {
            6 => Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            8 => Ok(Self::rgba(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)?,
            )),
            _ => Err(ColorError::InvalidHex),
        }
    }

    /// Look up a palette color by name, case-insensitively ("blue", "YELLOW").
    pub fn from_name(name: &str) -> Option<Self> {
        let color = match name.to_ascii_uppercase().as_str() {
            "WHITE" => Color::WHITE,
            "BLACK" => Color::BLACK,
            "GRAY" | "GREY" => Color::GRAY,
            "RED" => Color::RED,
            "GREEN" => Color::GREEN,
            "BLUE" => Color::BLUE,
            "YELLOW" => Color::YELLOW,
            "ORANGE" => Color::ORANGE,
            "PURPLE" => Color::PURPLE,
            "PINK" => Color::PINK,
            "TEAL" => Color::TEAL,
            "TRANSPARENT" => Color::TRANSPARENT,
            _ => return None,
        };
        Some(color)
    }

    /// Convert to RGBA u8 tuple.
    pub fn to_rgba8(&self) -> [u8; 4] {
        [
            (self.r * 255.0).clamp(0.0, 255.0) as u8,
            (self.g * 255.0).clamp(0.0, 255.0) as u8,
            (self.b * 255.0).clamp(0.0, 255.0) as u8,
            (self.a * 255.0).clamp(0.0, 255.0) as u8,
        ]
    }

    /// Linearly interpolate between two colors. `t == 1.0` yields `other` exactly.
    pub fn lerp(&self, other: &Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: f32, b: f32| a * (1.0 - t) + b * t;
        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    // --- Named constants ---

    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const GRAY: Color = Color::rgb(0.533, 0.533, 0.533);
    pub const RED: Color = Color::rgb(0.988, 0.384, 0.333);
    pub const GREEN: Color = Color::rgb(0.514, 0.757, 0.404);
    pub const BLUE: Color = Color::rgb(0.345, 0.769, 0.867);
    pub const YELLOW: Color = Color::rgb(1.0, 1.0, 0.0);
    pub const ORANGE: Color = Color::rgb(1.0, 0.525, 0.184);
    pub const PURPLE: Color = Color::rgb(0.604, 0.447, 0.675);
    pub const PINK: Color = Color::rgb(0.820, 0.278, 0.741);
    pub const TEAL: Color = Color::rgb(0.361, 0.816, 0.702);
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            write!(f, "#{:02X}{:02X}{:02X}", r, g, b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", r, g, b, a)
        }
    }
}

impl FromStr for Color {
    type Err = ColorError;

    /// Accepts a palette name or a hex string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(color) = Color::from_name(s) {
            return Ok(color);
        }
        if s.starts_with('#') || s.len() == 6 || s.len() == 8 {
            return Color::from_hex(s);
        }
        Err(ColorError::UnknownName(s.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ColorError {
    #[error("invalid hex color string")]
    InvalidHex,
    #[error("unknown color name '{0}'")]
    UnknownName(String),
}
