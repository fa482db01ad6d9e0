//! Perception module: from raw scans to a pose
pub mod filters;
pub mod localization;
pub mod sensors;

use self::filters::ScanClusterer;
use self::localization::{
    occlusion, tracker, InitiationProgress, Landmark, MapBuilder, Phase, PoseEstimator,
};
use self::sensors::LaserScanFrame;
use crate::common::types::{Pose, Timestamp};
use crate::config::LocalizationConfig;
use crate::error::Result;
use crate::lifecycle::{LifecycleNode, LifecycleNodeBase, State};
use tracing::{debug, info};

/// What one cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub phase: Phase,
    /// Pole observations extracted from the frame
    pub observations: usize,
    /// The landmark map was created during this cycle
    pub map_created: bool,
    /// A new pose was estimated during this cycle
    pub pose_updated: bool,
}

/// Perception stack for the robot.
///
/// Owns the landmark set and the current pose and runs every stage on them in
/// sequence, once per scan cycle.
pub struct PerceptionStack {
    base: LifecycleNodeBase,
    config: LocalizationConfig,
    clusterer: ScanClusterer,
    map_builder: MapBuilder,
    estimator: PoseEstimator,
    phase: Phase,
    landmarks: Vec<Landmark>,
    pose: Option<Pose>,
}

impl PerceptionStack {
    /// Create a new perception stack
    pub fn new(config: LocalizationConfig) -> Self {
        PerceptionStack {
            base: LifecycleNodeBase::new("perception_stack"),
            clusterer: ScanClusterer::new(&config.scan),
            map_builder: MapBuilder::new(&config.initiation),
            estimator: PoseEstimator::new(&config.estimation),
            config,
            phase: Phase::Initiating,
            landmarks: Vec::new(),
            pose: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    /// Get the current pose estimate, `None` before the first one
    pub fn get_pose(&self) -> Option<&Pose> {
        self.pose.as_ref()
    }

    pub fn state(&self) -> State {
        self.base.get_state()
    }

    /// Run one scan cycle.
    ///
    /// While initiating, the frame feeds the map builder. Once localizing, observations
    /// are associated with landmarks, a pose is triangulated from visible pairs, and
    /// hidden landmarks get readings predicted from that pose.
    pub fn process(&mut self, frame: &LaserScanFrame, now: Timestamp) -> Result<CycleReport> {
        let mut report = CycleReport {
            phase: self.phase,
            observations: 0,
            map_created: false,
            pose_updated: false,
        };
        if !self.base.is_active() {
            debug!("{} is not active, skipping scan", self.base.name);
            return Ok(report);
        }

        frame.validate()?;
        let observations = self.clusterer.extract(frame);
        report.observations = observations.len();

        match self.phase {
            Phase::Initiating => {
                match self.map_builder.push(observations, now, &self.clusterer)? {
                    InitiationProgress::Gathering { .. } => {}
                    InitiationProgress::Complete(landmarks) => {
                        self.complete_initiation(landmarks);
                        report.map_created = true;
                    }
                }
            }
            Phase::Localizing => {
                tracker::associate(&observations, &mut self.landmarks, now)?;
                if let Some(pose) = self.estimator.estimate(&self.landmarks, self.pose.as_ref(), now) {
                    self.pose = Some(pose);
                    report.pose_updated = true;
                }
                if let Some(pose) = &self.pose {
                    occlusion::extrapolate_hidden(&mut self.landmarks, pose);
                }
            }
        }

        report.phase = self.phase;
        Ok(report)
    }

    fn complete_initiation(&mut self, landmarks: Vec<Landmark>) {
        info!("Initiation complete with {} poles", landmarks.len());
        self.landmarks = landmarks;
        self.phase = self.phase.after_initiation();
        info!("started localization");
    }

    fn reset(&mut self) {
        self.map_builder.reset();
        self.phase = Phase::Initiating;
        self.landmarks.clear();
        self.pose = None;
    }
}

impl LifecycleNode for PerceptionStack {
    fn on_configure(&mut self) -> Result<()> {
        info!("Configuring perception stack");
        self.config.validate()?;
        self.clusterer = ScanClusterer::new(&self.config.scan);
        self.map_builder = MapBuilder::new(&self.config.initiation);
        self.estimator = PoseEstimator::new(&self.config.estimation);
        self.base.transition(State::Inactive)?;
        Ok(())
    }

    fn on_activate(&mut self) -> Result<()> {
        info!("Activating perception stack");
        if !self.phase.is_localizing() {
            info!("started initiation");
        }
        self.base.transition(State::Active)?;
        Ok(())
    }

    fn on_deactivate(&mut self) -> Result<()> {
        info!("Deactivating perception stack");
        self.base.transition(State::Inactive)?;
        Ok(())
    }

    fn on_cleanup(&mut self) -> Result<()> {
        info!("Cleaning up perception stack");
        self.base.transition(State::Unconfigured)?;
        self.reset();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::XYPoint;
    use crate::error::LocalizationError;
    use crate::perception::sensors::simulated::{SimulatedScanner, SimulatedScannerConfig};
    use std::time::{Duration, Instant};

    fn active_stack() -> PerceptionStack {
        let mut stack = PerceptionStack::new(LocalizationConfig::default());
        stack.on_configure().unwrap();
        stack.on_activate().unwrap();
        stack
    }

    fn scanner() -> SimulatedScanner {
        SimulatedScanner::new(
            vec![XYPoint::new(4.0, -3.0), XYPoint::new(5.0, 2.0)],
            SimulatedScannerConfig::default(),
        )
    }

    #[test]
    fn inactive_stack_ignores_scans() {
        let mut stack = PerceptionStack::new(LocalizationConfig::default());
        let report = stack.process(&scanner().scan(), Instant::now()).unwrap();
        assert_eq!(report.observations, 0);
        assert_eq!(stack.phase(), Phase::Initiating);
    }

    #[test]
    fn invalid_frame_is_rejected() {
        let mut stack = active_stack();
        let frame = LaserScanFrame::new(vec![1.0, 2.0], vec![3000.0], 0.0, 0.1);
        assert!(stack.process(&frame, Instant::now()).is_err());
    }

    #[test]
    fn phase_moves_to_localizing_once() {
        let mut stack = active_stack();
        let frame = scanner().scan();
        let start = Instant::now();

        let mut created = 0;
        for k in 0..60 {
            let report = stack
                .process(&frame, start + Duration::from_millis(40 * k))
                .unwrap();
            if report.map_created {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(stack.phase(), Phase::Localizing);
        assert_eq!(stack.landmarks().len(), 2);
        assert!(stack.get_pose().is_some());

        stack.on_deactivate().unwrap();
        stack.on_cleanup().unwrap();
        assert_eq!(stack.phase(), Phase::Initiating);
        assert!(stack.landmarks().is_empty());
        assert!(stack.get_pose().is_none());
    }

    #[test]
    fn cleanup_requires_deactivation() {
        let mut stack = active_stack();
        assert!(matches!(
            stack.on_cleanup(),
            Err(LocalizationError::InvalidTransition { .. })
        ));
        assert_eq!(stack.state(), State::Active);
    }
}
