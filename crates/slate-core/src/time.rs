use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Sub};

use crate::error::{SlateError, SlateResult};

/// Longest span a single pause or animation may take: one hour of scene time.
pub const MAX_SPAN_SECONDS: f64 = 3600.0;

/// Non-negative span of scene time, stored as fractional seconds.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Duration {
    seconds: f64,
}

impl Duration {
    /// Create a duration from seconds. Negative and NaN inputs clamp to zero.
    pub fn from_seconds(s: f64) -> Self {
        Self {
            seconds: if s.is_nan() { 0.0 } else { s.max(0.0) },
        }
    }

    /// Create a duration for a timeline entry, rejecting values that are not finite,
    /// negative, or longer than [`MAX_SPAN_SECONDS`].
    pub fn checked_from_seconds(s: f64) -> SlateResult<Self> {
        if s.is_finite() && (0.0..=MAX_SPAN_SECONDS).contains(&s) {
            Ok(Self { seconds: s })
        } else {
            Err(SlateError::invalid_argument(format!(
                "duration must be between 0 and {}s, got {}",
                MAX_SPAN_SECONDS, s
            )))
        }
    }

    /// Re-check a duration that did not come through [`Duration::checked_from_seconds`],
    /// such as one read back from JSON.
    pub fn checked(self) -> SlateResult<Self> {
        Self::checked_from_seconds(self.seconds)
    }

    pub fn from_millis(ms: f64) -> Self {
        Self::from_seconds(ms / 1000.0)
    }

    pub fn zero() -> Self {
        Self { seconds: 0.0 }
    }

    pub fn as_seconds(&self) -> f64 {
        self.seconds
    }

    pub fn is_zero(&self) -> bool {
        self.seconds == 0.0
    }

    /// The longer of two durations.
    pub fn max(self, other: Duration) -> Duration {
        if other.seconds > self.seconds {
            other
        } else {
            self
        }
    }

    /// Number of frame intervals needed to cover this duration at `fps`.
    pub fn frame_count(&self, fps: f64) -> u64 {
        (self.seconds * fps - 1e-9).ceil().max(0.0) as u64
    }
}

impl Default for Duration {
    fn default() -> Self {
        Duration::zero()
    }
}

impl Add for Duration {
    type Output = Duration;
    fn add(self, rhs: Duration) -> Duration {
        Duration::from_seconds(self.seconds + rhs.seconds)
    }
}

impl AddAssign for Duration {
    fn add_assign(&mut self, rhs: Duration) {
        *self = *self + rhs;
    }
}

impl Sub for Duration {
    type Output = Duration;
    fn sub(self, rhs: Duration) -> Duration {
        Duration::from_seconds(self.seconds - rhs.seconds)
    }
}

impl Mul<f64> for Duration {
    type Output = Duration;
    fn mul(self, rhs: f64) -> Duration {
        Duration::from_seconds(self.seconds * rhs)
    }
}

impl Div<f64> for Duration {
    type Output = Duration;
    fn div(self, rhs: f64) -> Duration {
        if rhs == 0.0 {
            return Duration::zero();
        }
        Duration::from_seconds(self.seconds / rhs)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.seconds < 1.0 {
            write!(f, "{:.0}ms", self.seconds * 1000.0)
        } else {
            write!(f, "{:.2}s", self.seconds)
        }
    }
}
