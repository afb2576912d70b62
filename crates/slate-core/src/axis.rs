//! Coordinate mapping between a numeric domain and canvas space.
//!
//! An axis is laid out in its own local frame: centred on the origin and running
//! along a unit direction. The owning mobject's transform places it on the canvas.

use serde::{Deserialize, Serialize};

use crate::error::{SlateError, SlateResult};
use crate::math::Point2D;

/// Tolerance used when deciding whether the last tick lands on `max`.
const TICK_EPSILON: f64 = 1e-9;

/// A ranged numeric axis with an affine, monotonic mapping onto a canvas segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateAxis {
    min: f64,
    max: f64,
    step: f64,
    length: f64,
    direction: Point2D,
}

impl CoordinateAxis {
    /// Create a horizontal axis over `[min, max]` with tick `step`, drawn `length` units long.
    pub fn new(min: f64, max: f64, step: f64, length: f64) -> SlateResult<Self> {
        Self::with_direction(min, max, step, length, Point2D::RIGHT)
    }

    /// Create an axis running along an arbitrary direction (normalised internally).
    pub fn with_direction(
        min: f64,
        max: f64,
        step: f64,
        length: f64,
        direction: Point2D,
    ) -> SlateResult<Self> {
        if ![min, max, step, length].iter().all(|v| v.is_finite()) {
            return Err(SlateError::InvalidAxis(
                "axis parameters must be finite".into(),
            ));
        }
        if max <= min {
            return Err(SlateError::InvalidAxis(format!(
                "range must be increasing, got [{}, {}]",
                min, max
            )));
        }
        if step <= 0.0 {
            return Err(SlateError::InvalidAxis(format!(
                "step must be positive, got {}",
                step
            )));
        }
        if length <= 0.0 {
            return Err(SlateError::InvalidAxis(format!(
                "length must be positive, got {}",
                length
            )));
        }
        let norm = direction.length();
        if !norm.is_finite() || norm == 0.0 {
            return Err(SlateError::InvalidAxis(
                "direction must be a non-zero vector".into(),
            ));
        }
        Ok(Self {
            min,
            max,
            step,
            length,
            direction: direction * (1.0 / norm),
        })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn direction(&self) -> Point2D {
        self.direction
    }

    /// Canvas units per unit of value.
    pub fn unit_size(&self) -> f64 {
        self.length / (self.max - self.min)
    }

    /// Map a value to a local point. Values outside the range extrapolate linearly.
    pub fn to_point(&self, value: f64) -> Point2D {
        let offset = (value - self.min) * self.unit_size() - self.length / 2.0;
        self.direction * offset
    }

    /// Map a local point back to a value by projecting it onto the axis.
    pub fn to_value(&self, point: &Point2D) -> f64 {
        let offset = point.dot(&self.direction) + self.length / 2.0;
        self.min + offset / self.unit_size()
    }

    /// Evenly spaced tick values from `min`, ending at `max` when the step divides the
    /// range and at the last value below `max` otherwise.
    pub fn ticks(&self) -> Vec<f64> {
        let count = ((self.max - self.min) / self.step + TICK_EPSILON).floor() as usize;
        (0..=count)
            .map(|i| {
                let v = self.min + i as f64 * self.step;
                if i == count && (v - self.max).abs() < TICK_EPSILON * self.step.max(1.0) {
                    self.max
                } else {
                    v
                }
            })
            .collect()
    }
}

/// Render a tick value as a label: integers without a decimal point, other values
/// with trailing zeros trimmed.
pub fn format_tick(value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() < 1e-9 {
        // Avoid "-0".
        return format!("{}", rounded as i64);
    }
    let text = format!("{:.6}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// A pair of perpendicular axes sharing an origin at the centre of their ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axes {
    pub x: CoordinateAxis,
    pub y: CoordinateAxis,
}

impl Axes {
    /// Build axes from an x range `[min, max, step]` and a y range, with lengths.
    pub fn new(x: [f64; 3], y: [f64; 3], x_length: f64, y_length: f64) -> SlateResult<Self> {
        Ok(Self {
            x: CoordinateAxis::with_direction(x[0], x[1], x[2], x_length, Point2D::RIGHT)?,
            y: CoordinateAxis::with_direction(y[0], y[1], y[2], y_length, Point2D::UP)?,
        })
    }

    /// Map a coordinate pair to a local point.
    pub fn coords_to_point(&self, x: f64, y: f64) -> Point2D {
        self.x.to_point(x) + self.y.to_point(y)
    }

    /// Map a local point back to a coordinate pair.
    pub fn point_to_coords(&self, point: &Point2D) -> (f64, f64) {
        (self.x.to_value(point), self.y.to_value(point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_malformed_ranges() {
        assert!(matches!(
            CoordinateAxis::new(5.0, -5.0, 1.0, 10.0),
            Err(SlateError::InvalidAxis(_))
        ));
        assert!(CoordinateAxis::new(0.0, 0.0, 1.0, 10.0).is_err());
        assert!(CoordinateAxis::new(0.0, 1.0, 0.0, 10.0).is_err());
        assert!(CoordinateAxis::new(0.0, 1.0, -0.5, 10.0).is_err());
        assert!(CoordinateAxis::new(0.0, 1.0, 0.5, 0.0).is_err());
        assert!(CoordinateAxis::new(0.0, f64::INFINITY, 0.5, 1.0).is_err());
        assert!(CoordinateAxis::with_direction(0.0, 1.0, 0.5, 1.0, Point2D::zero()).is_err());
    }

    #[test]
    fn test_integer_ticks_are_exact() {
        let axis = CoordinateAxis::new(-5.0, 5.0, 1.0, 10.0).unwrap();
        let expected: Vec<f64> = (-5..=5).map(|v| v as f64).collect();
        assert_eq!(axis.ticks(), expected);
    }

    #[test]
    fn test_ticks_stop_below_max_when_step_does_not_divide() {
        let axis = CoordinateAxis::new(0.0, 1.0, 0.3, 6.0).unwrap();
        let ticks = axis.ticks();
        assert_eq!(ticks.len(), 4);
        assert!((ticks[3] - 0.9).abs() < 1e-12);
        assert!(ticks.iter().all(|t| *t <= 1.0));
    }

    #[test]
    fn test_fractional_step_includes_endpoint() {
        let axis = CoordinateAxis::new(0.0, 3.0, 0.5, 8.0).unwrap();
        let ticks = axis.ticks();
        assert_eq!(ticks.len(), 7);
        assert_eq!(*ticks.last().unwrap(), 3.0);
    }

    #[test]
    fn test_extremes_map_to_segment_ends() {
        let axis = CoordinateAxis::new(-5.0, 5.0, 1.0, 10.0).unwrap();
        assert_eq!(axis.to_point(-5.0), Point2D::new(-5.0, 0.0));
        assert_eq!(axis.to_point(5.0), Point2D::new(5.0, 0.0));
        assert_eq!(axis.to_point(0.0), Point2D::zero());
    }

    #[test]
    fn test_round_trip_within_epsilon() {
        let axis = CoordinateAxis::new(0.0, 3.0, 0.5, 8.0).unwrap();
        let mut v = -1.0;
        while v <= 4.0 {
            let back = axis.to_value(&axis.to_point(v));
            assert!((back - v).abs() < 1e-9, "{} -> {}", v, back);
            v += 0.137;
        }
    }

    #[test]
    fn test_extrapolates_outside_range() {
        let axis = CoordinateAxis::new(0.0, 10.0, 1.0, 10.0).unwrap();
        assert!((axis.to_point(12.0).x - 7.0).abs() < 1e-12);
        assert!((axis.to_value(&Point2D::new(-6.0, 3.0)) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_axis_is_monotonic() {
        let axis = CoordinateAxis::new(-2.0, 2.0, 0.5, 4.0).unwrap();
        let xs: Vec<f64> = axis.ticks().iter().map(|v| axis.to_point(*v).x).collect();
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_axes_coordinates() {
        let axes = Axes::new([-3.0, 3.0, 1.0], [0.0, 4.0, 1.0], 6.0, 4.0).unwrap();
        let p = axes.coords_to_point(1.0, 3.0);
        assert!((p.x - 1.0).abs() < 1e-12);
        assert!((p.y - 1.0).abs() < 1e-12);
        let (x, y) = axes.point_to_coords(&p);
        assert!((x - 1.0).abs() < 1e-9);
        assert!((y - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_format_tick() {
        assert_eq!(format_tick(-5.0), "-5");
        assert_eq!(format_tick(1.5), "1.5");
        assert_eq!(format_tick(-0.0), "0");
        assert_eq!(format_tick(0.25), "0.25");
    }
}
