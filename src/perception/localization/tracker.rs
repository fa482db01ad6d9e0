//! Nearest-neighbour association of observations with landmarks.

use tracing::debug;

use super::landmark::Landmark;
use crate::common::types::{ScanPoint, Timestamp};
use crate::error::{LocalizationError, Result};

/// An observation matched to a landmark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Association {
    /// Index into the cycle's observation list
    pub observation: usize,
    /// Id of the matched landmark
    pub landmark: usize,
}

/// Match this cycle's observations against the landmarks' last readings.
///
/// Each observation goes to the landmark whose `last_observation` is closest in
/// platform-relative Cartesian space. Matching is greedy and not exclusive: when two
/// observations pick the same landmark, the later one wins. Landmarks left without a
/// match are marked invisible.
pub fn associate(
    observations: &[ScanPoint],
    landmarks: &mut [Landmark],
    now: Timestamp,
) -> Result<Vec<Association>> {
    if landmarks.is_empty() {
        if observations.is_empty() {
            return Ok(Vec::new());
        }
        return Err(LocalizationError::UnmatchedObservation {
            observations: observations.len(),
        });
    }

    let mut matched = vec![false; landmarks.len()];
    let mut associations = Vec::with_capacity(observations.len());

    for (index, observation) in observations.iter().enumerate() {
        let nearest = landmarks
            .iter()
            .enumerate()
            .map(|(i, landmark)| (i, observation.distance_squared(&landmark.last_observation)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i);
        let Some(nearest) = nearest else {
            continue;
        };

        if matched[nearest] {
            debug!(
                "pole {} matched again by observation at {:.3} m {:.3} rad",
                landmarks[nearest].id(),
                observation.distance,
                observation.angle
            );
        }
        landmarks[nearest].observe(*observation, now);
        matched[nearest] = true;
        associations.push(Association {
            observation: index,
            landmark: landmarks[nearest].id(),
        });
    }

    for (landmark, seen) in landmarks.iter_mut().zip(matched) {
        if !seen {
            landmark.hide();
        }
    }

    Ok(associations)
}
