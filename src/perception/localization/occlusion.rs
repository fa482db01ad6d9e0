//! Expected readings for landmarks that were not seen this cycle.

use std::f64::consts::PI;

use tracing::trace;

use super::landmark::Landmark;
use crate::common::normalize_angle;
use crate::common::types::{Pose, ScanPoint};

/// Reading of a map position as seen from `pose`
pub fn expected_reading(pose: &Pose, landmark: &Landmark) -> ScanPoint {
    let position = landmark.map_position();
    let dx = pose.x - position.x;
    let dy = pose.y - position.y;
    ScanPoint::new(dx.hypot(dy), normalize_angle(dy.atan2(dx) + PI - pose.theta))
}

/// Replace the last reading of every hidden landmark with the one `pose` predicts.
///
/// Returns the number of landmarks updated.
pub fn extrapolate_hidden(landmarks: &mut [Landmark], pose: &Pose) -> usize {
    let mut updated = 0;
    for landmark in landmarks.iter_mut().filter(|l| !l.visible) {
        let expected = expected_reading(pose, landmark);
        trace!(
            "Changed pole {} to {:.3} m {:.3} rad",
            landmark.id(),
            expected.distance,
            expected.angle
        );
        landmark.extrapolate(expected);
        updated += 1;
    }
    updated
}
