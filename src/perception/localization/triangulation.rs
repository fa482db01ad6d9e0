//! Pose from pairs of landmarks.
//!
//! Two landmarks with known map positions and measured ranges give two circles whose
//! intersections are the candidate platform positions. The heading at each candidate
//! follows from the bearing measured to the first landmark. One candidate is kept:
//! - with a previous pose, the one closest to the point found by refining the
//!   previous heading against both readings,
//! - without one, the only candidate whose heading also explains the bearing to the
//!   second landmark.
//!
//! Pairwise estimates are averaged into the published pose.

use std::f64::consts::PI;

use nalgebra::Vector2;
use tracing::{debug, warn};

use super::landmark::Landmark;
use crate::common::types::{Pose, ScanPoint, Timestamp, XYPoint};
use crate::common::{circular_mean, normalize_angle};
use crate::config::EstimationConfig;
use crate::error::{LocalizationError, Result};

/// Both intersections of two circles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleIntersection {
    pub first: XYPoint,
    pub second: XYPoint,
    /// Ranges after inflation
    pub range_a: f64,
    pub range_b: f64,
    /// Number of inflation steps needed
    pub inflation_steps: usize,
}

/// `(D+a+b)(D+a-b)(D-a+b)(-D+a+b)`, negative when the circles do not meet
#[inline]
pub fn circle_discriminant(baseline: f64, range_a: f64, range_b: f64) -> f64 {
    (baseline + range_a + range_b)
        * (baseline + range_a - range_b)
        * (baseline - range_a + range_b)
        * (-baseline + range_a + range_b)
}

/// Intersect circles of radius `range_a` around `a` and `range_b` around `b`.
///
/// Circles that miss each other are grown by `step` on both radii until they touch,
/// at most `max_steps` times. Returns `None` for coincident centers, for one circle
/// strictly inside the other (equal growth never fixes that), or when the step budget
/// runs out.
pub fn intersect_circles(
    a: XYPoint,
    range_a: f64,
    b: XYPoint,
    range_b: f64,
    step: f64,
    max_steps: usize,
) -> Option<CircleIntersection> {
    let baseline = nalgebra::distance(&a, &b);
    if baseline <= f64::EPSILON || (range_a - range_b).abs() > baseline {
        return None;
    }

    let (mut ra, mut rb) = (range_a, range_b);
    let mut discriminant = circle_discriminant(baseline, ra, rb);
    let mut steps = 0;
    while discriminant < 0.0 {
        if steps == max_steps {
            return None;
        }
        ra += step;
        rb += step;
        steps += 1;
        discriminant = circle_discriminant(baseline, ra, rb);
    }

    let d2 = baseline * baseline;
    let delta = 0.25 * discriminant.sqrt();
    let along = (ra * ra - rb * rb) / (2.0 * d2);
    let mid_x = (a.x + b.x) / 2.0 + (b.x - a.x) * along;
    let mid_y = (a.y + b.y) / 2.0 + (b.y - a.y) * along;
    let off_x = 2.0 * (a.y - b.y) / d2 * delta;
    let off_y = 2.0 * (a.x - b.x) / d2 * delta;

    Some(CircleIntersection {
        first: XYPoint::new(mid_x + off_x, mid_y - off_y),
        second: XYPoint::new(mid_x - off_x, mid_y + off_y),
        range_a: ra,
        range_b: rb,
        inflation_steps: steps,
    })
}

/// Heading implied by standing at `position` and seeing `landmark` at `bearing`
#[inline]
pub fn heading_from(position: XYPoint, landmark: XYPoint, bearing: f64) -> f64 {
    let offset = position - landmark;
    normalize_angle(PI - bearing + offset.y.atan2(offset.x))
}

/// Closure error of a candidate pose against the bearing to a second landmark
#[inline]
pub fn closure_residual(position: XYPoint, theta: f64, landmark: XYPoint, bearing: f64) -> f64 {
    let offset = position - landmark;
    normalize_angle(PI + offset.y.atan2(offset.x) - theta - bearing)
}

/// One pose estimate from a landmark pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairEstimate {
    pub first: usize,
    pub second: usize,
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

/// Solution of the heading refinement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefinedHeading {
    pub theta: f64,
    /// Midpoint of the positions implied by both readings at `theta`
    pub position: XYPoint,
    pub iterations: usize,
}

/// Pairwise triangulation and pose averaging
#[derive(Debug, Clone)]
pub struct PoseEstimator {
    config: EstimationConfig,
}

impl PoseEstimator {
    pub fn new(config: &EstimationConfig) -> Self {
        PoseEstimator {
            config: config.clone(),
        }
    }

    /// Refine a heading so both readings place the platform at the same point.
    ///
    /// With `u(φ) = (cos φ, sin φ)` the readings imply positions
    /// `A + a·u(α_a + θ − π)` and `B + b·u(α_b + θ − π)`. Newton steps drive the
    /// difference of the two to zero, starting from `seed`, until successive headings
    /// agree within the configured tolerance.
    pub fn refine_heading(
        &self,
        a: XYPoint,
        reading_a: ScanPoint,
        b: XYPoint,
        reading_b: ScanPoint,
        seed: f64,
    ) -> Option<RefinedHeading> {
        let implied = |landmark: XYPoint, reading: ScanPoint, theta: f64| {
            let phi = reading.angle + theta - PI;
            landmark.coords + reading.distance * Vector2::new(phi.cos(), phi.sin())
        };
        let slope = |reading: ScanPoint, theta: f64| {
            let phi = reading.angle + theta - PI;
            reading.distance * Vector2::new(-phi.sin(), phi.cos())
        };

        let mut theta = seed;
        for iteration in 1..=self.config.newton_max_iterations {
            let residual = implied(a, reading_a, theta) - implied(b, reading_b, theta);
            let jacobian = slope(reading_a, theta) - slope(reading_b, theta);
            let curvature = jacobian.norm_squared();
            if curvature < f64::EPSILON {
                return None;
            }
            let next = theta - jacobian.dot(&residual) / curvature;
            let converged = (next - theta).abs() < self.config.newton_tolerance;
            theta = next;
            if converged {
                let position = (implied(a, reading_a, theta) + implied(b, reading_b, theta)) / 2.0;
                return Some(RefinedHeading {
                    theta: normalize_angle(theta),
                    position: XYPoint::from(position),
                    iterations: iteration,
                });
            }
        }
        None
    }

    /// Estimate the pose from landmarks `a` and `b` using their last readings.
    pub fn triangulate_pair(
        &self,
        a: &Landmark,
        b: &Landmark,
        previous: Option<&Pose>,
    ) -> Result<PairEstimate> {
        let (pa, pb) = (a.map_position(), b.map_position());
        let (reading_a, reading_b) = (a.last_observation, b.last_observation);

        let circles = intersect_circles(
            pa,
            reading_a.distance,
            pb,
            reading_b.distance,
            self.config.inflation_step,
            self.config.max_inflation_steps,
        )
        .ok_or(LocalizationError::DegenerateCircleGeometry {
            first: a.id(),
            second: b.id(),
            baseline: nalgebra::distance(&pa, &pb),
            range_a: reading_a.distance,
            range_b: reading_b.distance,
        })?;

        let candidates = [circles.first, circles.second]
            .map(|position| (position, heading_from(position, pa, reading_a.angle)));

        let (position, theta) = match previous {
            Some(previous) => {
                let inflated_a = ScanPoint::new(circles.range_a, reading_a.angle);
                let inflated_b = ScanPoint::new(circles.range_b, reading_b.angle);
                let refined = self
                    .refine_heading(pa, inflated_a, pb, inflated_b, previous.theta)
                    .ok_or(LocalizationError::NewtonDidNotConverge {
                        first: a.id(),
                        second: b.id(),
                        iterations: self.config.newton_max_iterations,
                    })?;
                let [first, second] = candidates;
                if nalgebra::distance_squared(&first.0, &refined.position)
                    < nalgebra::distance_squared(&second.0, &refined.position)
                {
                    first
                } else {
                    second
                }
            }
            None => {
                let consistent: Vec<(XYPoint, f64)> = candidates
                    .into_iter()
                    .filter(|(position, theta)| {
                        closure_residual(*position, *theta, pb, reading_b.angle).abs()
                            < self.config.consistency_tolerance
                    })
                    .collect();
                match consistent.as_slice() {
                    [only] => *only,
                    _ => {
                        return Err(LocalizationError::AmbiguousPoseSolution {
                            first: a.id(),
                            second: b.id(),
                            consistent: consistent.len(),
                        })
                    }
                }
            }
        };

        debug!(
            "From poles {},{}: [{:.6} {:.6}] {:.6} rad",
            a.id(),
            b.id(),
            position.x,
            position.y,
            theta
        );
        Ok(PairEstimate {
            first: a.id(),
            second: b.id(),
            x: position.x,
            y: position.y,
            theta,
        })
    }

    /// Triangulate every adjacent pair of visible landmarks and average the results.
    ///
    /// Visible landmarks are paired in id order without overlap; a trailing odd one is
    /// unused. Pairs that fail are logged and skipped. Returns `None` when no pair
    /// produced an estimate, in which case the caller keeps its previous pose.
    pub fn estimate(
        &self,
        landmarks: &[Landmark],
        previous: Option<&Pose>,
        now: Timestamp,
    ) -> Option<Pose> {
        let visible: Vec<&Landmark> = landmarks.iter().filter(|l| l.visible).collect();
        let estimates: Vec<PairEstimate> = visible
            .chunks_exact(2)
            .filter_map(|pair| match self.triangulate_pair(pair[0], pair[1], previous) {
                Ok(estimate) => Some(estimate),
                Err(e) => {
                    warn!(
                        "Dropping pair {},{} ({:.3} m {:.3} rad, {:.3} m {:.3} rad): {}",
                        pair[0].id(),
                        pair[1].id(),
                        pair[0].last_observation.distance,
                        pair[0].last_observation.angle,
                        pair[1].last_observation.distance,
                        pair[1].last_observation.angle,
                        e
                    );
                    None
                }
            })
            .collect();

        let pose = average(&estimates, now)?;
        debug!("Averaged [{:.6} {:.6}] {:.6} rad", pose.x, pose.y, pose.theta);
        Some(pose)
    }
}

/// Mean position and circular mean heading of pairwise estimates
pub fn average(estimates: &[PairEstimate], now: Timestamp) -> Option<Pose> {
    if estimates.is_empty() {
        return None;
    }
    let count = estimates.len() as f64;
    let x = estimates.iter().map(|e| e.x).sum::<f64>() / count;
    let y = estimates.iter().map(|e| e.y).sum::<f64>() / count;
    let theta = circular_mean(estimates.iter().map(|e| e.theta)).unwrap_or_else(|| {
        normalize_angle(estimates.iter().map(|e| e.theta).sum::<f64>() / count)
    });
    Some(Pose {
        x,
        y,
        theta,
        timestamp: now,
    })
}
