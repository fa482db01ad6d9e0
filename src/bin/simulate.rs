use anyhow::Result;
use pole_localization::perception::sensors::simulated::{SimulatedScanner, SimulatedScannerConfig};
use pole_localization::perception::sensors::Sensor;
use pole_localization::{
    init_logging, scan_channel, ChannelPublisher, LocalizationConfig, LocalizationEvent,
    LocalizationNode, XYPoint,
};
use std::path::Path;
use tokio::sync::oneshot;
use tracing::info;

/// Seconds the platform stays still while the map is built
const SETTLE_SECS: f64 = 2.5;
/// Seconds of motion afterwards
const DRIVE_SECS: f64 = 6.0;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging("pole_localization=info,simulate=info");

    let args: Vec<String> = std::env::args().collect();
    let config = match args.get(1) {
        Some(path) => {
            info!("Loading configuration from {}", path);
            LocalizationConfig::load(Path::new(path))?
        }
        None => LocalizationConfig::default(),
    };
    let period = config.node.loop_period();

    let mut scanner = SimulatedScanner::new(
        vec![
            XYPoint::new(3.0, -4.0),
            XYPoint::new(5.0, 2.0),
            XYPoint::new(-2.0, 6.0),
            XYPoint::new(-5.0, 1.0),
        ],
        SimulatedScannerConfig::default(),
    );
    info!("Simulating {} poles with {}", scanner.poles().len(), scanner.name());

    let (writer, reader) = scan_channel();
    let (mut publisher, mut events) = ChannelPublisher::new();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    // Drive the platform: stand still for the initiation window, then arc to the left
    let driver = tokio::spawn(async move {
        let settle = (SETTLE_SECS / period.as_secs_f64()) as usize;
        let drive = (DRIVE_SECS / period.as_secs_f64()) as usize;
        for step in 0..settle + drive {
            let moving = step.saturating_sub(settle) as f64;
            scanner.set_pose(0.02 * moving, 0.005 * moving, 0.004 * moving);
            writer.publish(scanner.read()?);
            tokio::time::sleep(period).await;
        }
        let _ = stop_tx.send(());
        Ok::<_, pole_localization::LocalizationError>(scanner.pose())
    });

    let mut node = LocalizationNode::new(config);
    node.run(reader, &mut publisher, async {
        let _ = stop_rx.await;
    })
    .await?;
    let true_pose = driver.await??;

    let mut last_pose = None;
    let mut poses = 0;
    while let Ok(event) = events.try_recv() {
        if let LocalizationEvent::Pose(pose) = event {
            poses += 1;
            last_pose = Some(pose);
        }
    }

    println!("Received {} pose estimates", poses);
    println!("True pose (world frame): {:?}", true_pose);
    match last_pose {
        Some(pose) => println!(
            "Last estimate (map frame): [{:.3} {:.3}] {:.3} rad",
            pose.x, pose.y, pose.theta
        ),
        None => println!("No pose was estimated"),
    }
    Ok(())
}
