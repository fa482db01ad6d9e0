//! Intensity gating for reflective tape.

use super::Filter;
use crate::common::types::ScanPoint;
use crate::perception::sensors::LaserScanFrame;

/// Keeps beams whose intensity exceeds the tape threshold.
///
/// Beams with non-finite or non-positive range are dropped as well, whatever
/// their intensity.
#[derive(Debug, Clone)]
pub struct ReflectivityFilter {
    threshold: f64,
}

impl ReflectivityFilter {
    pub fn new(threshold: f64) -> Self {
        ReflectivityFilter { threshold }
    }

    #[inline]
    fn is_reflective(&self, range: f64, intensity: f64) -> bool {
        intensity > self.threshold && range.is_finite() && range > 0.0
    }
}

impl Filter<&LaserScanFrame, Vec<ScanPoint>> for ReflectivityFilter {
    fn filter(&self, frame: &LaserScanFrame) -> Vec<ScanPoint> {
        frame
            .ranges
            .iter()
            .zip(frame.intensities.iter())
            .enumerate()
            .filter(|(_, (range, intensity))| self.is_reflective(**range, **intensity))
            .map(|(i, (range, _))| ScanPoint::new(*range, frame.angle_at(i)))
            .collect()
    }
}
