//! Seed-based clustering of reflective hits into pole observations.

use std::f64::consts::PI;

use super::Filter;
use crate::common::normalize_angle;
use crate::common::types::ScanPoint;

/// Merges hits that belong to the same pole.
///
/// Points are visited in order. The first unassigned point seeds a cluster and every
/// later unassigned point joins it when both its chord distance
/// (`|Δangle| * seed.distance`) and its radial distance (`|Δdistance|`) to the seed
/// are below the threshold. A cluster's value is the mean of its members' distances
/// and the mean of their angles.
///
/// Angle differences are wrapped, so a pole lying on the ±π seam of the scan stays
/// one cluster and its mean bearing is taken relative to the seed.
#[derive(Debug, Clone)]
pub struct PoleClusterer {
    max_separation: f64,
}

impl PoleClusterer {
    pub fn new(max_separation: f64) -> Self {
        PoleClusterer { max_separation }
    }

    #[inline]
    fn same_pole(&self, seed: &ScanPoint, point: &ScanPoint) -> bool {
        (angle_offset(seed.angle, point.angle) * seed.distance).abs() < self.max_separation
            && (seed.distance - point.distance).abs() < self.max_separation
    }
}

/// `from - to`, wrapped only when it crosses the ±π seam
#[inline]
fn angle_offset(from: f64, to: f64) -> f64 {
    let offset = from - to;
    if offset.abs() > PI {
        normalize_angle(offset)
    } else {
        offset
    }
}

impl Filter<Vec<ScanPoint>> for PoleClusterer {
    fn filter(&self, points: Vec<ScanPoint>) -> Vec<ScanPoint> {
        let mut assigned = vec![false; points.len()];
        let mut clusters = Vec::new();

        for (i, seed) in points.iter().enumerate() {
            if assigned[i] {
                continue;
            }
            assigned[i] = true;

            let mut distance_sum = seed.distance;
            let mut offset_sum = 0.0;
            let mut members = 1usize;
            for (j, point) in points.iter().enumerate().skip(i + 1) {
                if !assigned[j] && self.same_pole(seed, point) {
                    assigned[j] = true;
                    distance_sum += point.distance;
                    offset_sum += angle_offset(point.angle, seed.angle);
                    members += 1;
                }
            }

            let mut angle = seed.angle + offset_sum / members as f64;
            if !(-PI < angle && angle <= PI) {
                angle = normalize_angle(angle);
            }
            clusters.push(ScanPoint::new(distance_sum / members as f64, angle));
        }

        clusters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(PoleClusterer::new(0.2).filter(Vec::new()).is_empty());
    }

    #[test]
    fn averages_polar_components() {
        let points = vec![
            ScanPoint::new(5.0, 0.10),
            ScanPoint::new(5.1, 0.11),
            ScanPoint::new(4.9, 0.12),
        ];
        let clusters = PoleClusterer::new(0.2).filter(points);
        assert_eq!(clusters.len(), 1);
        assert_relative_eq!(clusters[0].distance, 5.0, epsilon = 1e-12);
        assert_relative_eq!(clusters[0].angle, 0.11, epsilon = 1e-12);
    }

    #[test]
    fn chord_at_threshold_starts_a_new_cluster() {
        // (0.14 - 0.10) * 5.0 lands exactly on 0.2
        let points = vec![ScanPoint::new(5.0, 0.10), ScanPoint::new(4.9, 0.14)];
        assert_eq!(PoleClusterer::new(0.2).filter(points).len(), 2);
    }

    #[test]
    fn pole_on_the_seam_stays_one_cluster() {
        // scan order starts at -π, so the seed sits just above it
        let points = vec![
            ScanPoint::new(4.0, -PI + 0.004),
            ScanPoint::new(4.0, -PI + 0.008),
            ScanPoint::new(4.2, 0.8),
            ScanPoint::new(4.0, PI - 0.006),
        ];
        let clusters = PoleClusterer::new(0.2).filter(points);
        assert_eq!(clusters.len(), 2);
        assert_relative_eq!(clusters[0].distance, 4.0, epsilon = 1e-12);
        assert_relative_eq!(
            normalize_angle(clusters[0].angle - (-PI + 0.002)),
            0.0,
            epsilon = 1e-9
        );
        assert!(clusters[0].angle > -PI && clusters[0].angle <= PI);
        assert_relative_eq!(clusters[1].angle, 0.8, epsilon = 1e-12);
    }

    #[test]
    fn clustering_is_idempotent_on_separated_poles() {
        let poles = vec![
            ScanPoint::new(3.0, -1.2),
            ScanPoint::new(7.5, 0.3),
            ScanPoint::new(7.5, 0.4),
            ScanPoint::new(2.0, 2.8),
        ];
        let clusterer = PoleClusterer::new(0.2);
        assert_eq!(clusterer.filter(poles.clone()), poles);

        let once = clusterer.filter(vec![
            ScanPoint::new(3.0, 1.0),
            ScanPoint::new(3.05, 1.01),
            ScanPoint::new(6.0, -0.5),
        ]);
        assert_eq!(clusterer.filter(once.clone()), once);
    }

    #[test]
    fn merges_non_adjacent_sightings_of_the_same_pole() {
        // pooled observations from several cycles interleave different poles
        let pooled = vec![
            ScanPoint::new(4.0, 0.50),
            ScanPoint::new(8.0, 1.50),
            ScanPoint::new(4.02, 0.51),
            ScanPoint::new(7.98, 1.49),
        ];
        let clusters = PoleClusterer::new(0.2).filter(pooled);
        assert_eq!(clusters.len(), 2);
        assert_relative_eq!(clusters[0].distance, 4.01, epsilon = 1e-12);
        assert_relative_eq!(clusters[0].angle, 0.505, epsilon = 1e-12);
        assert_relative_eq!(clusters[1].distance, 7.99, epsilon = 1e-12);
        assert_relative_eq!(clusters[1].angle, 1.495, epsilon = 1e-12);
    }
}
