//! End-to-end runs of the perception stack against a simulated pole field.

use approx::assert_relative_eq;
use nalgebra::Rotation2;
use pole_localization::common::normalize_angle;
use pole_localization::lifecycle::LifecycleNode;
use pole_localization::perception::sensors::simulated::{SimulatedScanner, SimulatedScannerConfig};
use pole_localization::{LocalizationConfig, LocalizationError, PerceptionStack, Phase, XYPoint};
use std::time::{Duration, Instant};

const CYCLE: Duration = Duration::from_millis(40);

/// Poles listed in increasing bearing as seen from the world origin, so their
/// landmark ids match their index here.
fn world_poles() -> Vec<XYPoint> {
    vec![
        XYPoint::new(3.0, -4.0),
        XYPoint::new(5.0, 2.0),
        XYPoint::new(-2.0, 6.0),
        XYPoint::new(-5.0, 1.0),
    ]
}

fn active_stack() -> PerceptionStack {
    let mut stack = PerceptionStack::new(LocalizationConfig::default());
    stack.on_configure().unwrap();
    stack.on_activate().unwrap();
    stack
}

/// World pose expressed in the map frame anchored on the first two poles
fn to_map(x: f64, y: f64, theta: f64) -> (f64, f64, f64) {
    let poles = world_poles();
    let axis = poles[1] - poles[0];
    let heading = axis.y.atan2(axis.x);
    let position = Rotation2::new(-heading) * (XYPoint::new(x, y) - poles[0]);
    (position.x, position.y, normalize_angle(theta - heading))
}

/// Feed scans from the origin until the map exists; returns the time of the next cycle
fn initiate(stack: &mut PerceptionStack, scanner: &SimulatedScanner, start: Instant) -> Instant {
    let mut now = start;
    for _ in 0..60 {
        let report = stack.process(&scanner.scan(), now).unwrap();
        now += CYCLE;
        if report.map_created {
            return now;
        }
    }
    panic!("initiation did not finish");
}

fn assert_pose_near(stack: &PerceptionStack, truth: (f64, f64, f64), tolerance: f64) {
    let pose = stack.get_pose().expect("pose should be estimated");
    let expected = to_map(truth.0, truth.1, truth.2);
    assert_relative_eq!(pose.x, expected.0, epsilon = tolerance);
    assert_relative_eq!(pose.y, expected.1, epsilon = tolerance);
    assert!(
        normalize_angle(pose.theta - expected.2).abs() < tolerance,
        "theta {} expected {}",
        pose.theta,
        expected.2
    );
}

#[test]
fn initiation_reproduces_pole_geometry() {
    let scanner = SimulatedScanner::new(world_poles(), SimulatedScannerConfig::default());
    let mut stack = active_stack();
    initiate(&mut stack, &scanner, Instant::now());

    assert_eq!(stack.phase(), Phase::Localizing);
    let landmarks = stack.landmarks();
    assert_eq!(landmarks.len(), 4);
    for (landmark, pole) in landmarks.iter().zip(world_poles()) {
        let expected = to_map(pole.x, pole.y, 0.0);
        assert_relative_eq!(landmark.map_position().x, expected.0, epsilon = 0.02);
        assert_relative_eq!(landmark.map_position().y, expected.1, epsilon = 0.02);
    }
    assert_relative_eq!(landmarks[0].map_position().x, 0.0, epsilon = 1e-9);
    assert_relative_eq!(landmarks[1].map_position().y, 0.0, epsilon = 1e-9);
}

#[test]
fn first_pose_matches_starting_position() {
    let scanner = SimulatedScanner::new(world_poles(), SimulatedScannerConfig::default());
    let mut stack = active_stack();
    let now = initiate(&mut stack, &scanner, Instant::now());
    assert!(stack.get_pose().is_none());

    let report = stack.process(&scanner.scan(), now).unwrap();
    assert!(report.pose_updated);
    assert_pose_near(&stack, (0.0, 0.0, 0.0), 0.02);
}

#[test]
fn tracks_a_moving_platform() {
    let mut scanner = SimulatedScanner::new(world_poles(), SimulatedScannerConfig::default());
    let mut stack = active_stack();
    let mut now = initiate(&mut stack, &scanner, Instant::now());

    for step in 0..60 {
        let k = step as f64;
        let truth = (0.02 * k, 0.01 * k, 0.004 * k);
        scanner.set_pose(truth.0, truth.1, truth.2);
        let report = stack.process(&scanner.scan(), now).unwrap();
        now += CYCLE;

        assert_eq!(report.observations, 4);
        assert!(report.pose_updated);
        assert!(stack.landmarks().iter().all(|l| l.visible));
        assert_pose_near(&stack, truth, 0.05);
    }
}

#[test]
fn hidden_pole_is_predicted_and_recovered() {
    let mut scanner = SimulatedScanner::new(world_poles(), SimulatedScannerConfig::default());
    let mut stack = active_stack();
    let mut now = initiate(&mut stack, &scanner, Instant::now());

    for step in 0..40 {
        let k = step as f64;
        let truth = (-0.015 * k, 0.02 * k, -0.003 * k);
        scanner.set_pose(truth.0, truth.1, truth.2);
        scanner.set_occluded(2, (10..25).contains(&step));
        stack.process(&scanner.scan(), now).unwrap();
        now += CYCLE;

        let landmark = &stack.landmarks()[2];
        let (distance, bearing) = scanner.expected_reading(2).unwrap();
        if (10..25).contains(&step) {
            assert!(!landmark.visible);
        } else {
            assert!(landmark.visible, "pole 2 should be matched at step {}", step);
        }
        // measured or predicted, the reading follows the real pole
        assert_relative_eq!(landmark.last_observation.distance, distance, epsilon = 0.05);
        assert!(normalize_angle(landmark.last_observation.angle - bearing).abs() < 0.02);
        assert_pose_near(&stack, truth, 0.05);
    }
}

#[test]
fn empty_window_is_retried() {
    let mut scanner = SimulatedScanner::new(world_poles(), SimulatedScannerConfig::default());
    for index in 0..world_poles().len() {
        scanner.set_occluded(index, true);
    }
    let mut stack = active_stack();
    let start = Instant::now();

    let mut failure = None;
    for k in 0..=50u32 {
        if let Err(e) = stack.process(&scanner.scan(), start + CYCLE * k) {
            failure = Some(e);
        }
    }
    assert!(matches!(
        failure,
        Some(LocalizationError::InsufficientInitiationData { cycles: 0, .. })
    ));
    assert_eq!(stack.phase(), Phase::Initiating);

    for index in 0..world_poles().len() {
        scanner.set_occluded(index, false);
    }
    initiate(&mut stack, &scanner, start + CYCLE * 51);
    assert_eq!(stack.phase(), Phase::Localizing);
}

#[test]
fn single_pole_cannot_start_localization() {
    let scanner = SimulatedScanner::new(vec![XYPoint::new(2.0, 2.0)], SimulatedScannerConfig::default());
    let mut stack = active_stack();
    let start = Instant::now();

    let errors: Vec<LocalizationError> = (0..=50u32)
        .filter_map(|k| stack.process(&scanner.scan(), start + CYCLE * k).err())
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].is_fatal());
    assert_eq!(stack.phase(), Phase::Initiating);
}
