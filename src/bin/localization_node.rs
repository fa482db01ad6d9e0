use anyhow::{Error, Result};
use pole_localization::{
    init_logging, scan_channel, Landmark, LaserScanFrame, LocalizationConfig, LocalizationError,
    LocalizationNode, Pose, Publisher,
};
use rclrs::{Context, CreateBasicExecutor, RclrsErrorFilter, SpinOptions, QOS_PROFILE_DEFAULT};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info};

// Import the message types directly from the crates
use builtin_interfaces::msg::Time;
use geometry_msgs::msg::{PointStamped, PoseStamped};
use sensor_msgs::msg::LaserScan;
use std_msgs::msg::Header;

/// Publishes estimates as ROS 2 messages
struct RosPublisher {
    pose_publisher: Arc<rclrs::Publisher<PoseStamped>>,
    pole_publisher: Arc<rclrs::Publisher<PointStamped>>,
    frame_id: String,
}

impl RosPublisher {
    fn header(&self) -> Header {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Header {
            stamp: Time {
                sec: since_epoch.as_secs() as i32,
                nanosec: since_epoch.subsec_nanos(),
            },
            frame_id: self.frame_id.clone(),
        }
    }
}

impl Publisher for RosPublisher {
    fn publish_pose(&mut self, pose: &Pose) -> pole_localization::Result<()> {
        let mut msg = PoseStamped::default();
        msg.header = self.header();
        msg.pose.position.x = pose.x;
        msg.pose.position.y = pose.y;
        msg.pose.position.z = 0.0;

        // Yaw-only quaternion
        msg.pose.orientation.z = (pose.theta / 2.0).sin();
        msg.pose.orientation.w = (pose.theta / 2.0).cos();

        self.pose_publisher
            .publish(&msg)
            .map_err(|e| LocalizationError::Publish(e.to_string()))
    }

    fn publish_landmark(&mut self, landmark: &Landmark) -> pole_localization::Result<()> {
        let position = landmark.map_position();
        let mut msg = PointStamped::default();
        msg.header = self.header();
        msg.point.x = position.x;
        msg.point.y = position.y;
        msg.point.z = 0.0;

        self.pole_publisher
            .publish(&msg)
            .map_err(|e| LocalizationError::Publish(e.to_string()))
    }
}

fn frame_from_msg(msg: &LaserScan) -> LaserScanFrame {
    LaserScanFrame::new(
        msg.ranges.iter().map(|&r| r as f64).collect(),
        msg.intensities.iter().map(|&i| i as f64).collect(),
        msg.angle_min as f64,
        msg.angle_increment as f64,
    )
}

fn main() -> Result<(), Error> {
    init_logging("pole_localization=info,localization_node=info");

    // Optional TOML config as the first argument, ROS arguments are left to rclrs
    let args: Vec<String> = std::env::args().collect();
    let config = match args.get(1).filter(|a| !a.starts_with("--")) {
        Some(path) => {
            info!("Loading configuration from {}", path);
            LocalizationConfig::load(Path::new(path))?
        }
        None => LocalizationConfig::default(),
    };

    let mut executor = Context::default_from_env()?.create_basic_executor();
    let node = executor.create_node("localization")?;
    info!("Started localization node");

    let (writer, reader) = scan_channel();
    let _scan_subscription = node.create_subscription::<LaserScan, _>(
        &config.node.scan_topic,
        QOS_PROFILE_DEFAULT,
        move |msg: LaserScan| {
            writer.publish(frame_from_msg(&msg));
        },
    )?;
    info!("Subscribed to \"{}\" topic", config.node.scan_topic);

    let mut publisher = RosPublisher {
        pose_publisher: node.create_publisher::<PoseStamped>(&config.node.pose_topic, QOS_PROFILE_DEFAULT)?,
        pole_publisher: node.create_publisher::<PointStamped>(&config.node.landmark_topic, QOS_PROFILE_DEFAULT)?,
        frame_id: config.node.frame_id.clone(),
    };

    // The control loop runs on its own thread; the executor spins on this one
    let loop_handle = thread::spawn(move || -> Result<(), Error> {
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(async {
            let mut localization = LocalizationNode::new(config);
            localization
                .run(reader, &mut publisher, async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await
        })?;
        Ok(())
    });

    let spin_result = executor
        .spin(SpinOptions::default())
        .first_error()
        .map_err(Error::from);

    match loop_handle.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Localization loop failed: {}", e),
        Err(_) => error!("Localization loop panicked"),
    }
    spin_result
}
