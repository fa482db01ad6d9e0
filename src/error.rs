//! Error types for pole localization

use crate::lifecycle::State;
use thiserror::Error;

/// Localization error type
#[derive(Error, Debug)]
pub enum LocalizationError {
    #[error("Initiation gathered {cycles}/{required} usable scan cycles")]
    InsufficientInitiationData { cycles: usize, required: usize },

    #[error("Initiation found {found} landmark(s), at least 2 are required")]
    InsufficientLandmarksDetected { found: usize },

    #[error("{observations} observation(s) could not be associated: no landmarks exist")]
    UnmatchedObservation { observations: usize },

    #[error("Ambiguous pose from poles {first},{second}: {consistent} candidate(s) passed the angle check")]
    AmbiguousPoseSolution {
        first: usize,
        second: usize,
        consistent: usize,
    },

    #[error("Circles around poles {first},{second} do not intersect (D={baseline:.3}, a={range_a:.3}, b={range_b:.3})")]
    DegenerateCircleGeometry {
        first: usize,
        second: usize,
        baseline: f64,
        range_a: f64,
        range_b: f64,
    },

    #[error("Heading refinement for poles {first},{second} did not converge after {iterations} iteration(s)")]
    NewtonDidNotConverge {
        first: usize,
        second: usize,
        iterations: usize,
    },

    #[error("Invalid scan: {0}")]
    InvalidScan(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("{node} cannot move from {from:?} to {to:?}")]
    InvalidTransition { node: String, from: State, to: State },
}

impl LocalizationError {
    /// Whether the error ends the run instead of just the current cycle.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LocalizationError::InsufficientLandmarksDetected { .. })
    }
}

impl From<toml::de::Error> for LocalizationError {
    fn from(e: toml::de::Error) -> Self {
        LocalizationError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LocalizationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_missing_landmarks_is_fatal() {
        assert!(LocalizationError::InsufficientLandmarksDetected { found: 1 }.is_fatal());
        assert!(!LocalizationError::InsufficientInitiationData {
            cycles: 3,
            required: 25
        }
        .is_fatal());
        assert!(!LocalizationError::UnmatchedObservation { observations: 2 }.is_fatal());
        assert!(!LocalizationError::AmbiguousPoseSolution {
            first: 0,
            second: 1,
            consistent: 2
        }
        .is_fatal());
    }
}
