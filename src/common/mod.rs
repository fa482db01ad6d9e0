//! Common utilities and types for pole localization

use std::f64::consts::{PI, TAU};

/// Common types used across the codebase
pub mod types {
    use std::time::Instant;

    use nalgebra::Point2;

    /// Monotonic time used for cycle bookkeeping
    pub type Timestamp = Instant;

    /// A Cartesian point, platform-relative or in the fixed map frame
    pub type XYPoint = Point2<f64>;

    /// A polar reading relative to the platform
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct ScanPoint {
        /// Range in meters
        pub distance: f64,
        /// Bearing in radians, platform-relative
        pub angle: f64,
    }

    impl ScanPoint {
        pub fn new(distance: f64, angle: f64) -> Self {
            ScanPoint { distance, angle }
        }

        /// Convert to platform-relative Cartesian coordinates
        pub fn to_xy(&self) -> XYPoint {
            XYPoint::new(
                self.distance * self.angle.cos(),
                self.distance * self.angle.sin(),
            )
        }

        /// Squared Cartesian distance between two polar readings
        pub fn distance_squared(&self, other: &ScanPoint) -> f64 {
            nalgebra::distance_squared(&self.to_xy(), &other.to_xy())
        }
    }

    /// Platform pose in the fixed map frame
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Pose {
        pub x: f64,
        pub y: f64,
        /// Heading in radians, normalized to (-pi, pi]
        pub theta: f64,
        pub timestamp: Timestamp,
    }

    impl Pose {
        pub fn position(&self) -> XYPoint {
            XYPoint::new(self.x, self.y)
        }
    }
}

/// Wrap an angle into (-pi, pi].
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = (PI - angle).rem_euclid(TAU);
    // rem_euclid may round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        PI
    } else {
        PI - wrapped
    }
}

/// Circular mean of a set of headings, `None` when empty or when the headings cancel out.
pub fn circular_mean(angles: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sin_sum, cos_sum, count) = angles
        .into_iter()
        .fold((0.0, 0.0, 0usize), |(s, c, n), angle| {
            (s + angle.sin(), c + angle.cos(), n + 1)
        });
    if count == 0 || (sin_sum.abs() < f64::EPSILON && cos_sum.abs() < f64::EPSILON) {
        return None;
    }
    Some(normalize_angle(sin_sum.atan2(cos_sum)))
}
