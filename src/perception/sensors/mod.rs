//! Range scanner interfaces
//!
//! The transport delivering scans is external. This module defines the frame it hands
//! over and the "latest frame" slot shared between the transport callback (single
//! writer) and the control loop (single reader). The loop always reads the newest
//! frame, so frames may be skipped or read twice.

pub mod simulated;

use crate::error::{LocalizationError, Result};
use tokio::sync::watch;

/// A generic range sensor interface
pub trait Sensor {
    /// Get the sensor name
    fn name(&self) -> &str;

    /// Produce the next scan frame
    fn read(&mut self) -> Result<LaserScanFrame>;
}

/// One full sweep of range and intensity data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaserScanFrame {
    pub ranges: Vec<f64>,
    pub intensities: Vec<f64>,
    pub angle_min: f64,
    pub angle_increment: f64,
}

impl LaserScanFrame {
    pub fn new(ranges: Vec<f64>, intensities: Vec<f64>, angle_min: f64, angle_increment: f64) -> Self {
        LaserScanFrame {
            ranges,
            intensities,
            angle_min,
            angle_increment,
        }
    }

    /// Bearing of beam `index`
    #[inline]
    pub fn angle_at(&self, index: usize) -> f64 {
        self.angle_min + self.angle_increment * index as f64
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Check that ranges and intensities describe the same beams
    pub fn validate(&self) -> Result<()> {
        if self.ranges.len() != self.intensities.len() {
            return Err(LocalizationError::InvalidScan(format!(
                "{} ranges but {} intensities",
                self.ranges.len(),
                self.intensities.len()
            )));
        }
        if !self.angle_min.is_finite() || !self.angle_increment.is_finite() {
            return Err(LocalizationError::InvalidScan(
                "non-finite angle parameters".to_string(),
            ));
        }
        Ok(())
    }
}

/// Writing half of the latest-frame slot, owned by the transport
#[derive(Debug)]
pub struct ScanWriter {
    tx: watch::Sender<Option<LaserScanFrame>>,
}

/// Reading half of the latest-frame slot, owned by the control loop
#[derive(Debug)]
pub struct ScanReader {
    rx: watch::Receiver<Option<LaserScanFrame>>,
}

/// Create an empty latest-frame slot
pub fn scan_channel() -> (ScanWriter, ScanReader) {
    let (tx, rx) = watch::channel(None);
    (ScanWriter { tx }, ScanReader { rx })
}

impl ScanWriter {
    /// Replace the stored frame, whether or not the previous one was consumed
    pub fn publish(&self, frame: LaserScanFrame) {
        self.tx.send_replace(Some(frame));
    }
}

impl ScanReader {
    /// Newest frame available, if any has arrived yet
    pub fn latest(&mut self) -> Option<LaserScanFrame> {
        self.rx.borrow_and_update().clone()
    }
}
