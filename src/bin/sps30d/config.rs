use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use sps30::sampling::LoopConfig;

use crate::logging::{LogFormat, LogLevel};

#[derive(Parser, Debug)]
#[command(name = "sps30d", version, about = "Polls an SPS30 sensor and forwards its readings")]
pub struct Cli {
    /// Serial device the sensor is attached to.
    #[arg(value_name = "DEVICE")]
    pub device: PathBuf,

    /// Unix socket readings are forwarded to.
    #[arg(long, env = "DATA_SOCKET", value_name = "PATH")]
    pub data_socket: PathBuf,

    /// Seconds between two measurements.
    #[arg(long, value_name = "SECS", default_value_t = 5)]
    pub sample_period: u64,

    /// Seconds to wait after starting the sensor.
    #[arg(long, value_name = "SECS", default_value_t = 5)]
    pub settle: u64,

    /// Seconds a measurement reply may take.
    #[arg(long, value_name = "SECS", default_value_t = 10)]
    pub read_timeout: u64,

    /// Seconds to pause when the sensor sent nothing.
    #[arg(long, value_name = "SECS", default_value_t = 1)]
    pub cooldown: u64,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: LogLevel,
}

/// Daemon settings derived from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub device: PathBuf,
    pub data_socket: PathBuf,
    pub read_timeout: Duration,
    pub sampling: LoopConfig,
}

impl From<&Cli> for Config {
    fn from(cli: &Cli) -> Self {
        Self {
            device: cli.device.clone(),
            data_socket: cli.data_socket.clone(),
            read_timeout: Duration::from_secs(cli.read_timeout),
            sampling: LoopConfig {
                period: Duration::from_secs(cli.sample_period),
                settle: Duration::from_secs(cli.settle),
                cooldown: Duration::from_secs(cli.cooldown),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::DaemonError;

    #[test]
    fn parses_device_and_socket_with_defaults() {
        let cli = Cli::try_parse_from(["sps30d", "/dev/ttyUSB0", "--data-socket", "/run/sps30.sock"])
            .expect("args should parse");
        let config = Config::from(&cli);

        assert_eq!(config.device, PathBuf::from("/dev/ttyUSB0"));
        assert_eq!(config.data_socket, PathBuf::from("/run/sps30.sock"));
        assert_eq!(config.read_timeout, Duration::from_secs(10));
        assert_eq!(config.sampling, LoopConfig::default());
        assert_eq!(cli.log_format, LogFormat::Text);
        assert_eq!(cli.log_level, LogLevel::Info);
    }

    #[test]
    fn timing_is_configurable() {
        let cli = Cli::try_parse_from([
            "sps30d",
            "/dev/ttyAMA0",
            "--data-socket",
            "/tmp/d.sock",
            "--sample-period",
            "2",
            "--settle",
            "0",
            "--read-timeout",
            "3",
            "--cooldown",
            "4",
            "--log-format",
            "json",
        ])
        .unwrap();
        let config = Config::from(&cli);

        assert_eq!(config.sampling.period, Duration::from_secs(2));
        assert_eq!(config.sampling.settle, Duration::ZERO);
        assert_eq!(config.read_timeout, Duration::from_secs(3));
        assert_eq!(config.sampling.cooldown, Duration::from_secs(4));
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn device_is_required() {
        let err = Cli::try_parse_from(["sps30d", "--data-socket", "/tmp/d.sock"])
            .expect_err("missing device should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn socket_is_required() {
        let err = Cli::try_parse_from(["sps30d", "/dev/ttyUSB0"]).expect_err("missing socket should fail");
        assert!(err.use_stderr());

        let err = DaemonError::from(err);
        assert!(matches!(err, DaemonError::ConfigMissing(_)));
        assert_eq!(err.exit_code(), crate::exit::FAILURE);
    }

    #[test]
    fn help_is_not_a_configuration_error() {
        let err = Cli::try_parse_from(["sps30d", "--help"]).expect_err("help short-circuits parsing");
        assert!(!err.use_stderr());
    }
}
