//! The localization control loop

use std::future::Future;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::config::LocalizationConfig;
use crate::error::Result;
use crate::lifecycle::LifecycleNode;
use crate::perception::sensors::ScanReader;
use crate::perception::{CycleReport, PerceptionStack};
use crate::publisher::Publisher;

/// Drives the perception stack from the latest scan at a fixed rate
pub struct LocalizationNode {
    stack: PerceptionStack,
    period: Duration,
}

impl LocalizationNode {
    pub fn new(config: LocalizationConfig) -> Self {
        let period = config.node.loop_period();
        LocalizationNode {
            stack: PerceptionStack::new(config),
            period,
        }
    }

    pub fn stack(&self) -> &PerceptionStack {
        &self.stack
    }

    /// Run until `shutdown` resolves.
    ///
    /// Every tick processes the newest frame in `scans`, if one has arrived. Recoverable
    /// errors are logged and the loop carries on; a fatal one deactivates the stack and
    /// is returned.
    pub async fn run<P, F>(&mut self, mut scans: ScanReader, publisher: &mut P, shutdown: F) -> Result<()>
    where
        P: Publisher,
        F: Future<Output = ()>,
    {
        self.stack.on_configure()?;
        self.stack.on_activate()?;
        info!("Started localization loop at {:.1} Hz", 1.0 / self.period.as_secs_f64());

        tokio::pin!(shutdown);
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                tick = ticker.tick() => {
                    let Some(frame) = scans.latest() else {
                        continue;
                    };
                    match self.stack.process(&frame, tick.into_std()) {
                        Ok(report) => self.publish(&report, publisher),
                        Err(e) if e.is_fatal() => {
                            error!("Localization cannot continue: {}", e);
                            self.stack.on_deactivate()?;
                            return Err(e);
                        }
                        Err(e) => warn!("Skipping cycle: {}", e),
                    }
                }
            }
        }

        self.stack.on_deactivate()?;
        self.stack.on_cleanup()?;
        info!("Localization loop stopped");
        Ok(())
    }

    fn publish<P: Publisher>(&self, report: &CycleReport, publisher: &mut P) {
        for landmark in self.stack.landmarks() {
            if let Err(e) = publisher.publish_landmark(landmark) {
                warn!("Failed to publish pole {}: {}", landmark.id(), e);
            }
        }
        if !report.phase.is_localizing() {
            return;
        }
        if let Some(pose) = self.stack.get_pose() {
            if let Err(e) = publisher.publish_pose(pose) {
                warn!("Failed to publish pose: {}", e);
            }
        }
    }
}
