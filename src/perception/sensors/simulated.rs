//! Simulated range scanner for demos and tests.
//!
//! Poles are modelled as thin cylinders covered in reflective tape. Every beam whose
//! bearing falls inside a pole's angular half-width returns the pole's center distance
//! with a high intensity; all other beams return the background range with a low one.

use std::collections::HashSet;
use std::f64::consts::{PI, TAU};

use super::{LaserScanFrame, Sensor};
use crate::common::normalize_angle;
use crate::common::types::XYPoint;
use crate::error::Result;

/// Intensity returned by reflective tape
pub const TAPE_INTENSITY: f64 = 5000.0;
/// Intensity returned by everything else
pub const BACKGROUND_INTENSITY: f64 = 200.0;

/// Simulated scanner configuration
#[derive(Debug, Clone)]
pub struct SimulatedScannerConfig {
    /// Beams per full revolution (default: 3600)
    pub beam_count: usize,
    /// Pole radius in meters (default: 0.05)
    pub pole_radius: f64,
    /// Range reported when nothing reflective is hit (default: 30.0)
    pub background_range: f64,
}

impl Default for SimulatedScannerConfig {
    fn default() -> Self {
        Self {
            beam_count: 3600,
            pole_radius: 0.05,
            background_range: 30.0,
        }
    }
}

/// Scanner mounted on a platform moving through a field of poles
#[derive(Debug, Clone)]
pub struct SimulatedScanner {
    config: SimulatedScannerConfig,
    poles: Vec<XYPoint>,
    pose: (f64, f64, f64),
    occluded: HashSet<usize>,
}

impl SimulatedScanner {
    pub fn new(poles: Vec<XYPoint>, config: SimulatedScannerConfig) -> Self {
        SimulatedScanner {
            config,
            poles,
            pose: (0.0, 0.0, 0.0),
            occluded: HashSet::new(),
        }
    }

    /// Place the platform at `(x, y, theta)` in the world frame
    pub fn set_pose(&mut self, x: f64, y: f64, theta: f64) {
        self.pose = (x, y, theta);
    }

    pub fn pose(&self) -> (f64, f64, f64) {
        self.pose
    }

    pub fn poles(&self) -> &[XYPoint] {
        &self.poles
    }

    /// Hide or reveal pole `index`
    pub fn set_occluded(&mut self, index: usize, occluded: bool) {
        if occluded {
            self.occluded.insert(index);
        } else {
            self.occluded.remove(&index);
        }
    }

    /// Platform-relative (distance, bearing) of pole `index`
    pub fn expected_reading(&self, index: usize) -> Option<(f64, f64)> {
        let pole = self.poles.get(index)?;
        let (x, y, theta) = self.pose;
        let dx = pole.x - x;
        let dy = pole.y - y;
        Some((dx.hypot(dy), normalize_angle(dy.atan2(dx) - theta)))
    }

    /// Render one full sweep at the current pose
    pub fn scan(&self) -> LaserScanFrame {
        let n = self.config.beam_count;
        let angle_min = -PI;
        let angle_increment = TAU / n as f64;
        let mut ranges = vec![self.config.background_range; n];
        let mut intensities = vec![BACKGROUND_INTENSITY; n];

        for index in 0..self.poles.len() {
            if self.occluded.contains(&index) {
                continue;
            }
            let Some((distance, bearing)) = self.expected_reading(index) else {
                continue;
            };
            if distance <= self.config.pole_radius || distance >= self.config.background_range {
                continue;
            }
            let half_width = (self.config.pole_radius / distance).atan();
            for (i, (range, intensity)) in ranges.iter_mut().zip(intensities.iter_mut()).enumerate() {
                let beam = angle_min + angle_increment * i as f64;
                if normalize_angle(beam - bearing).abs() <= half_width && distance < *range {
                    *range = distance;
                    *intensity = TAPE_INTENSITY;
                }
            }
        }

        LaserScanFrame::new(ranges, intensities, angle_min, angle_increment)
    }
}

impl Sensor for SimulatedScanner {
    fn name(&self) -> &str {
        "simulated_scanner"
    }

    fn read(&mut self) -> Result<LaserScanFrame> {
        Ok(self.scan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn pole_shows_up_as_bright_beams() {
        let scanner = SimulatedScanner::new(
            vec![XYPoint::new(4.0, 0.0)],
            SimulatedScannerConfig::default(),
        );
        let frame = scanner.scan();
        assert!(frame.validate().is_ok());

        let hits: Vec<usize> = (0..frame.len())
            .filter(|&i| frame.intensities[i] == TAPE_INTENSITY)
            .collect();
        assert!(!hits.is_empty());
        for &i in &hits {
            assert_relative_eq!(frame.ranges[i], 4.0, epsilon = 1e-12);
            assert!(frame.angle_at(i).abs() < 0.02);
        }
    }

    #[test]
    fn occluded_pole_is_not_rendered() {
        let mut scanner = SimulatedScanner::new(
            vec![XYPoint::new(4.0, 0.0), XYPoint::new(0.0, 4.0)],
            SimulatedScannerConfig::default(),
        );
        scanner.set_occluded(0, true);
        let frame = scanner.scan();
        let hits: Vec<usize> = (0..frame.len())
            .filter(|&i| frame.intensities[i] == TAPE_INTENSITY)
            .collect();
        assert!(!hits.is_empty());
        assert!(hits.iter().all(|&i| (frame.ranges[i] - 4.0).abs() < 1e-12));
        // only the pole at +y remains
        assert!(hits
            .iter()
            .all(|&i| (frame.angle_at(i) - PI / 2.0).abs() < 0.02));
    }
}
