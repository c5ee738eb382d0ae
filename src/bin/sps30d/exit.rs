use std::path::PathBuf;

use linux_embedded_hal::Serial;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;

/// Conditions that stop the daemon before sampling begins.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    /// Rendered clap error; already carries usage information.
    #[error("{0}")]
    ConfigMissing(#[from] clap::Error),

    #[error("failed to open serial port {path}: {reason}")]
    TransportOpenFailed { path: PathBuf, reason: String },

    #[error("failed to start sensor: {0}")]
    SensorStartFailed(sps30::SensorError<Serial>),

    #[error("signal handler setup failed: {0}")]
    SignalHandler(#[from] ctrlc::Error),
}

impl DaemonError {
    pub fn exit_code(&self) -> i32 {
        FAILURE
    }
}
