//! Landmark (pole) state

use crate::common::types::{ScanPoint, Timestamp, XYPoint};

/// A reflective pole fixed in the map frame
#[derive(Debug, Clone, PartialEq)]
pub struct Landmark {
    id: usize,
    map_position: XYPoint,
    /// Most recent platform-relative reading, measured or extrapolated
    pub last_observation: ScanPoint,
    /// Time of the last real measurement
    pub last_seen_at: Timestamp,
    /// Matched in the current cycle
    pub visible: bool,
}

impl Landmark {
    pub fn new(id: usize, map_position: XYPoint, observation: ScanPoint, seen_at: Timestamp) -> Self {
        Landmark {
            id,
            map_position,
            last_observation: observation,
            last_seen_at: seen_at,
            visible: true,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Absolute position, fixed at creation
    pub fn map_position(&self) -> XYPoint {
        self.map_position
    }

    /// Record a real measurement
    pub fn observe(&mut self, observation: ScanPoint, at: Timestamp) {
        self.last_observation = observation;
        self.last_seen_at = at;
        self.visible = true;
    }

    /// Replace the reading with an expected one while the pole is hidden
    pub fn extrapolate(&mut self, expected: ScanPoint) {
        self.last_observation = expected;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }
}
