mod config;
mod exit;
mod logging;
mod sink;
mod transport;
mod watchdog;

use std::sync::mpsc;

use clap::Parser;
use sps30::sampling::SamplingLoop;
use sps30::Sps30Sensor;
use tracing::{error, info};

use crate::config::{Cli, Config};
use crate::exit::{DaemonError, SUCCESS};
use crate::logging::init_logging;
use crate::sink::UnixSocketSink;
use crate::transport::open_port;
use crate::watchdog::SystemdWatchdog;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            let err = DaemonError::from(err);
            eprint!("{err}");
            std::process::exit(err.exit_code());
        }
    };
    init_logging(cli.log_format, cli.log_level);

    match run(&Config::from(&cli)) {
        Ok(()) => std::process::exit(SUCCESS),
        Err(err) => {
            error!(error = %err, "fatal");
            std::process::exit(err.exit_code());
        }
    }
}

fn run(config: &Config) -> Result<(), DaemonError> {
    info!(data_socket = %config.data_socket.display(), "forwarding readings");

    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(());
    })?;

    let serial = open_port(&config.device)?;
    let sensor = Sps30Sensor::new(serial).with_read_timeout(config.read_timeout);
    let watchdog = SystemdWatchdog::from_env();
    info!(enabled = watchdog.is_enabled(), "service manager notifications");

    let mut sampler = SamplingLoop::new(
        sensor,
        UnixSocketSink::new(&config.data_socket),
        watchdog,
        config.sampling,
    );

    sampler.start().map_err(DaemonError::SensorStartFailed)?;
    sampler.run(&shutdown_rx);
    Ok(())
}
