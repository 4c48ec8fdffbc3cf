use crate::{Interval, Vec3};

/// A ray with an origin, a direction and the parameter range it is valid over.
///
/// The direction does not have to be unit length at construction; camera and
/// scatter rays are normalized before they are traced. During closest-hit
/// search the upper bound of `interval` only ever shrinks.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub interval: Interval,
}

impl Ray {
    /// Near bound that keeps a ray from re-hitting the surface it left.
    pub const T_MIN: f32 = 0.001;

    /// Default far bound for freshly generated rays.
    pub const T_MAX: f32 = 1000.0;

    /// Default valid parameter range, `[0.001, 1000]`.
    pub const DEFAULT_INTERVAL: Interval = Interval::new(Self::T_MIN, Self::T_MAX);

    /// Create a new ray with the default valid range.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            interval: Self::DEFAULT_INTERVAL,
        }
    }

    /// Create a ray with an explicit parameter range.
    pub fn with_interval(origin: Vec3, direction: Vec3, interval: Interval) -> Self {
        Self {
            origin,
            direction,
            interval,
        }
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Lower the far bound to `t`. Larger values are ignored.
    #[inline]
    pub fn shrink_to(&mut self, t: f32) {
        if t < self.interval.max {
            self.interval.max = t;
        }
    }

    /// True if the direction is finite and not degenerate.
    pub fn is_valid(&self) -> bool {
        self.direction.is_finite()
            && self.origin.is_finite()
            && self.direction.length_squared() > 1e-12
    }
}
