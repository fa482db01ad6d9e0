//! Pole extraction from raw scans
//!
//! A scan goes through two stages: the reflectivity filter keeps beams that hit
//! reflective tape, then the clusterer merges neighbouring hits into one polar
//! observation per pole.

pub mod clustering;
pub mod reflectivity;

pub use self::clustering::PoleClusterer;
pub use self::reflectivity::ReflectivityFilter;

use crate::common::types::ScanPoint;
use crate::config::ScanConfig;
use crate::perception::sensors::LaserScanFrame;

/// A generic filter interface
pub trait Filter<I, O = I> {
    /// Filter the input data
    fn filter(&self, input: I) -> O;
}

/// Turns a raw frame into an ordered list of pole observations
#[derive(Debug, Clone)]
pub struct ScanClusterer {
    reflectivity: ReflectivityFilter,
    clusterer: PoleClusterer,
}

impl ScanClusterer {
    pub fn new(config: &ScanConfig) -> Self {
        ScanClusterer {
            reflectivity: ReflectivityFilter::new(config.intensity_threshold),
            clusterer: PoleClusterer::new(config.cluster_distance),
        }
    }

    /// Extract one observation per reflective cluster, in scan order
    pub fn extract(&self, frame: &LaserScanFrame) -> Vec<ScanPoint> {
        self.clusterer.filter(self.reflectivity.filter(frame))
    }

    /// Re-run only the clustering step, e.g. over observations pooled across cycles
    pub fn cluster(&self, points: Vec<ScanPoint>) -> Vec<ScanPoint> {
        self.clusterer.filter(points)
    }
}

impl Default for ScanClusterer {
    fn default() -> Self {
        Self::new(&ScanConfig::default())
    }
}
