//! Landmark map bootstrap.
//!
//! Observations are gathered over a fixed time window. When the window closes the
//! pooled sightings are re-clustered into one averaged reading per pole, and the map
//! frame is anchored on the first pole with its x axis pointing at the second.

use std::time::Duration;

use nalgebra::Rotation2;
use tracing::{info, warn};

use super::landmark::Landmark;
use crate::common::types::{ScanPoint, Timestamp, XYPoint};
use crate::config::InitiationConfig;
use crate::error::{LocalizationError, Result};
use crate::perception::filters::ScanClusterer;

/// Outcome of feeding one cycle to the builder
#[derive(Debug)]
pub enum InitiationProgress {
    /// The window is still open
    Gathering { cycles: usize },
    /// The window closed and produced a map
    Complete(Vec<Landmark>),
}

/// Collects observations during initiation and turns them into landmarks
#[derive(Debug)]
pub struct MapBuilder {
    window: Duration,
    min_cycles: usize,
    started_at: Option<Timestamp>,
    samples: Vec<Vec<ScanPoint>>,
}

impl MapBuilder {
    pub fn new(config: &InitiationConfig) -> Self {
        MapBuilder {
            window: config.window(),
            min_cycles: config.min_cycles,
            started_at: None,
            samples: Vec::new(),
        }
    }

    /// Number of cycles with observations in the current window
    pub fn cycles(&self) -> usize {
        self.samples.len()
    }

    /// Drop everything gathered so far
    pub fn reset(&mut self) {
        self.started_at = None;
        self.samples.clear();
    }

    /// Feed one cycle's observations.
    ///
    /// The cycle that finds the window elapsed closes it and is not itself gathered.
    /// Whatever the outcome, a closed window is discarded and the next call opens a
    /// fresh one.
    pub fn push(
        &mut self,
        observations: Vec<ScanPoint>,
        now: Timestamp,
        clusterer: &ScanClusterer,
    ) -> Result<InitiationProgress> {
        let started_at = *self.started_at.get_or_insert_with(|| {
            info!("Gathering data...");
            now
        });

        if now.duration_since(started_at) >= self.window {
            let result = self.build(clusterer, now);
            self.reset();
            return result.map(InitiationProgress::Complete);
        }

        if !observations.is_empty() {
            self.samples.push(observations);
        }
        Ok(InitiationProgress::Gathering {
            cycles: self.samples.len(),
        })
    }

    fn build(&self, clusterer: &ScanClusterer, now: Timestamp) -> Result<Vec<Landmark>> {
        info!(
            "Gathered {} scans with poles (need {})",
            self.samples.len(),
            self.min_cycles
        );

        if self.samples.len() < self.min_cycles {
            warn!("Gathering data failed during initiation!");
            return Err(LocalizationError::InsufficientInitiationData {
                cycles: self.samples.len(),
                required: self.min_cycles,
            });
        }

        let pooled: Vec<ScanPoint> = self.samples.iter().flatten().copied().collect();
        let averaged = clusterer.cluster(pooled);
        for pole in &averaged {
            info!("pole (polar) at {:.6} m {:.6} rad", pole.distance, pole.angle);
        }

        let positions = anchor_map_frame(&averaged)?;
        for position in &positions {
            info!("pole (kart.) at [{:.6} {:.6}]", position.x, position.y);
        }

        Ok(averaged
            .into_iter()
            .zip(positions)
            .enumerate()
            .map(|(id, (observation, position))| Landmark::new(id, position, observation, now))
            .collect())
    }
}

/// Express averaged pole readings in the map frame.
///
/// The frame's origin is the first pole and its x axis points from the first pole to
/// the second, so at least two poles are required.
pub fn anchor_map_frame(observations: &[ScanPoint]) -> Result<Vec<XYPoint>> {
    if observations.len() < 2 {
        return Err(LocalizationError::InsufficientLandmarksDetected {
            found: observations.len(),
        });
    }

    let points: Vec<XYPoint> = observations.iter().map(ScanPoint::to_xy).collect();
    let origin = points[0];
    let axis = points[1] - origin;
    let rotation = Rotation2::new(-axis.y.atan2(axis.x));

    Ok(points
        .iter()
        .map(|point| XYPoint::from(rotation * (point - origin)))
        .collect())
}
