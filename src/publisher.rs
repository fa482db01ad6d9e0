//! Output side of the localization loop

use tokio::sync::mpsc;

use crate::common::types::{Pose, XYPoint};
use crate::error::{LocalizationError, Result};
use crate::perception::localization::Landmark;

/// Sink for estimated poses and landmark positions
pub trait Publisher {
    /// Publish the current pose
    fn publish_pose(&mut self, pose: &Pose) -> Result<()>;

    /// Publish one landmark's map position
    fn publish_landmark(&mut self, landmark: &Landmark) -> Result<()>;
}

/// Something the loop published
#[derive(Debug, Clone, PartialEq)]
pub enum LocalizationEvent {
    Pose(Pose),
    Landmark { id: usize, position: XYPoint },
}

/// Publisher forwarding events over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    tx: mpsc::UnboundedSender<LocalizationEvent>,
}

impl ChannelPublisher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<LocalizationEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelPublisher { tx }, rx)
    }

    fn send(&self, event: LocalizationEvent) -> Result<()> {
        self.tx
            .send(event)
            .map_err(|_| LocalizationError::Publish("event receiver dropped".to_string()))
    }
}

impl Publisher for ChannelPublisher {
    fn publish_pose(&mut self, pose: &Pose) -> Result<()> {
        self.send(LocalizationEvent::Pose(*pose))
    }

    fn publish_landmark(&mut self, landmark: &Landmark) -> Result<()> {
        self.send(LocalizationEvent::Landmark {
            id: landmark.id(),
            position: landmark.map_position(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::ScanPoint;
    use std::time::Instant;

    #[test]
    fn forwards_events_and_reports_closed_channel() {
        let (mut publisher, mut rx) = ChannelPublisher::new();
        let landmark = Landmark::new(
            3,
            XYPoint::new(1.0, 2.0),
            ScanPoint::new(2.0, 0.5),
            Instant::now(),
        );
        publisher.publish_landmark(&landmark).unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            LocalizationEvent::Landmark {
                id: 3,
                position: XYPoint::new(1.0, 2.0)
            }
        );

        drop(rx);
        let pose = Pose {
            x: 0.0,
            y: 0.0,
            theta: 0.0,
            timestamp: Instant::now(),
        };
        assert!(matches!(
            publisher.publish_pose(&pose),
            Err(LocalizationError::Publish(_))
        ));
    }
}
