//! Pose estimation from reflective pole landmarks.
//!
//! A rotating range scanner sees a handful of poles wrapped in reflective tape. On
//! startup the poles are mapped from the platform's own frame; afterwards they are
//! tracked scan by scan and every pair of visible poles triangulates the platform pose.
pub mod common;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod perception;
pub mod publisher;
pub mod runtime;

pub use crate::common::types::{Pose, ScanPoint, XYPoint};
pub use crate::config::LocalizationConfig;
pub use crate::error::{LocalizationError, Result};
pub use crate::perception::localization::{Landmark, Phase};
pub use crate::perception::sensors::{scan_channel, LaserScanFrame, ScanReader, ScanWriter};
pub use crate::perception::PerceptionStack;
pub use crate::publisher::{ChannelPublisher, LocalizationEvent, Publisher};
pub use crate::runtime::LocalizationNode;

/// Initialize `tracing` output for the binaries.
///
/// `RUST_LOG` overrides `default_directives`, e.g. `"pole_localization=info"`.
pub fn init_logging(default_directives: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directives));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
