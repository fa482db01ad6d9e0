//! Landmark map, tracking and pose estimation

pub mod landmark;
pub mod map_builder;
pub mod occlusion;
pub mod tracker;
pub mod triangulation;

pub use self::landmark::Landmark;
pub use self::map_builder::{InitiationProgress, MapBuilder};
pub use self::tracker::Association;
pub use self::triangulation::{PairEstimate, PoseEstimator};

/// Top-level operating phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Gathering scans to build the landmark map
    #[default]
    Initiating,
    /// Tracking landmarks and triangulating the pose
    Localizing,
}

impl Phase {
    /// The phase after a successful initiation. There is no way back.
    pub fn after_initiation(self) -> Phase {
        Phase::Localizing
    }

    pub fn is_localizing(self) -> bool {
        self == Phase::Localizing
    }
}
