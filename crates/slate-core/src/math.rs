use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Interpolate between two scalars so that `t == 1.0` lands exactly on `b`.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// A 2D point, also used as a displacement vector in canvas units.
///
/// The canvas is y-up with the origin at its centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const ORIGIN: Point2D = Point2D { x: 0.0, y: 0.0 };
    pub const UP: Point2D = Point2D { x: 0.0, y: 1.0 };
    pub const DOWN: Point2D = Point2D { x: 0.0, y: -1.0 };
    pub const LEFT: Point2D = Point2D { x: -1.0, y: 0.0 };
    pub const RIGHT: Point2D = Point2D { x: 1.0, y: 0.0 };
    pub const UL: Point2D = Point2D { x: -1.0, y: 1.0 };
    pub const UR: Point2D = Point2D { x: 1.0, y: 1.0 };
    pub const DL: Point2D = Point2D { x: -1.0, y: -1.0 };
    pub const DR: Point2D = Point2D { x: 1.0, y: -1.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self::ORIGIN
    }

    /// Linear interpolation between two points.
    pub fn lerp(&self, other: &Point2D, t: f64) -> Point2D {
        Point2D {
            x: lerp(self.x, other.x, t),
            y: lerp(self.y, other.y, t),
        }
    }

    pub fn dot(&self, other: &Point2D) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Component-wise product.
    pub fn scale_by(&self, factors: &Point2D) -> Point2D {
        Point2D::new(self.x * factors.x, self.y * factors.y)
    }

    /// Rotate counter-clockwise by `angle` radians.
    pub fn rotate(&self, angle: f64) -> Point2D {
        if angle == 0.0 {
            return *self;
        }
        let (sin, cos) = angle.sin_cos();
        Point2D::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Default for Point2D {
    fn default() -> Self {
        Self::zero()
    }
}

impl Add for Point2D {
    type Output = Point2D;
    fn add(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point2D {
    fn add_assign(&mut self, rhs: Point2D) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point2D {
    type Output = Point2D;
    fn sub(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point2D {
    type Output = Point2D;
    fn mul(self, rhs: f64) -> Point2D {
        Point2D::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Point2D {
    type Output = Point2D;
    fn neg(self) -> Point2D {
        Point2D::new(-self.x, -self.y)
    }
}

/// A 2D affine transform relative to the parent: translation, scale and rotation.
///
/// Points are mapped as `position + rotate(scale * p)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    /// Position offset (translation).
    pub position: Point2D,
    /// Scale factors.
    pub scale: Point2D,
    /// Rotation in radians, counter-clockwise.
    pub rotation: f64,
}

impl Transform2D {
    /// Identity transform: no translation, scale 1, no rotation.
    pub fn identity() -> Self {
        Self {
            position: Point2D::zero(),
            scale: Point2D::new(1.0, 1.0),
            rotation: 0.0,
        }
    }

    pub fn at(position: Point2D) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    /// Map a point from local space into the space this transform lives in.
    pub fn apply(&self, p: &Point2D) -> Point2D {
        self.position + self.apply_vector(p)
    }

    /// Map a displacement (no translation).
    pub fn apply_vector(&self, v: &Point2D) -> Point2D {
        v.scale_by(&self.scale).rotate(self.rotation)
    }

    /// Inverse of [`Transform2D::apply_vector`]. Degenerate scale axes map to zero.
    pub fn inverse_vector(&self, v: &Point2D) -> Point2D {
        let r = v.rotate(-self.rotation);
        Point2D::new(safe_div(r.x, self.scale.x), safe_div(r.y, self.scale.y))
    }

    /// Inverse of [`Transform2D::apply`].
    pub fn inverse_apply(&self, p: &Point2D) -> Point2D {
        self.inverse_vector(&(*p - self.position))
    }

    /// Compose: the world transform of a child whose local transform is `local`.
    pub fn then(&self, local: &Transform2D) -> Transform2D {
        Transform2D {
            position: self.apply(&local.position),
            scale: self.scale.scale_by(&local.scale),
            rotation: self.rotation + local.rotation,
        }
    }

    /// Express a world transform relative to `parent` (inverse of [`Transform2D::then`]).
    pub fn relative_to(&self, parent: &Transform2D) -> Transform2D {
        Transform2D {
            position: parent.inverse_apply(&self.position),
            scale: Point2D::new(
                safe_div(self.scale.x, parent.scale.x),
                safe_div(self.scale.y, parent.scale.y),
            ),
            rotation: self.rotation - parent.rotation,
        }
    }

    /// Axis-aligned bounds of a local box after this transform.
    pub fn apply_box(&self, b: &BoundingBox) -> BoundingBox {
        BoundingBox::from_points(b.corners().iter().map(|c| self.apply(c)))
    }

    /// Linear interpolation between two transforms.
    pub fn lerp(&self, other: &Transform2D, t: f64) -> Transform2D {
        let t = t.clamp(0.0, 1.0);
        Transform2D {
            position: self.position.lerp(&other.position, t),
            scale: self.scale.lerp(&other.scale, t),
            rotation: lerp(self.rotation, other.rotation, t),
        }
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}

fn safe_div(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        0.0
    } else {
        a / b
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point2D,
    pub max: Point2D,
}

impl BoundingBox {
    pub fn new(min: Point2D, max: Point2D) -> Self {
        Self { min, max }
    }

    /// A zero-sized box at a point.
    pub fn point(p: Point2D) -> Self {
        Self { min: p, max: p }
    }

    pub fn from_center_size(center: Point2D, width: f64, height: f64) -> Self {
        let half = Point2D::new(width / 2.0, height / 2.0);
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Smallest box containing every point. Empty input yields a box at the origin.
    pub fn from_points(points: impl IntoIterator<Item = Point2D>) -> Self {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return Self::point(Point2D::zero());
        };
        iter.fold(Self::point(first), |acc, p| acc.union(&Self::point(p)))
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: Point2D::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point2D::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    pub fn corners(&self) -> [Point2D; 4] {
        [
            self.min,
            Point2D::new(self.max.x, self.min.y),
            self.max,
            Point2D::new(self.min.x, self.max.y),
        ]
    }

    pub fn center(&self) -> Point2D {
        Point2D::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// The point of the box selected by a direction: per axis, a negative component
    /// picks the minimum, a positive one the maximum and zero the centre.
    /// `UP` is the top-centre, `UL` the top-left corner, `ORIGIN` the centre.
    pub fn critical_point(&self, direction: &Point2D) -> Point2D {
        let pick = |d: f64, lo: f64, hi: f64| {
            if d < 0.0 {
                lo
            } else if d > 0.0 {
                hi
            } else {
                (lo + hi) / 2.0
            }
        };
        Point2D::new(
            pick(direction.x, self.min.x, self.max.x),
            pick(direction.y, self.min.y, self.max.y),
        )
    }

    pub fn top(&self) -> Point2D {
        self.critical_point(&Point2D::UP)
    }

    pub fn bottom(&self) -> Point2D {
        self.critical_point(&Point2D::DOWN)
    }

    pub fn left(&self) -> Point2D {
        self.critical_point(&Point2D::LEFT)
    }

    pub fn right(&self) -> Point2D {
        self.critical_point(&Point2D::RIGHT)
    }

    /// Extent of the box measured along a direction.
    pub fn extent_along(&self, direction: &Point2D) -> f64 {
        (self.critical_point(direction) - self.critical_point(&-*direction))
            .dot(direction)
            .abs()
    }
}
