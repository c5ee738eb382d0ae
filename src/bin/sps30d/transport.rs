use std::path::Path;
use std::time::Duration;

use linux_embedded_hal::Serial;
use serial_core::{BaudRate, CharSize, FlowControl, Parity, PortSettings, SerialPort, StopBits};
use tracing::info;

use crate::exit::DaemonError;

/// UART settings required by the SPS30: 115200 8N1, no flow control.
const PORT_SETTINGS: PortSettings = PortSettings {
    baud_rate: BaudRate::Baud115200,
    char_size: CharSize::Bits8,
    parity: Parity::ParityNone,
    stop_bits: StopBits::Stop1,
    flow_control: FlowControl::FlowNone,
};

/// How long one byte read may block before reporting `WouldBlock`.
const INTER_CHARACTER_TIMEOUT: Duration = Duration::from_millis(100);

pub fn open_port(path: &Path) -> Result<Serial, DaemonError> {
    let open_failed = |reason: String| DaemonError::TransportOpenFailed {
        path: path.to_path_buf(),
        reason,
    };

    let mut serial = Serial::open(path).map_err(|e| open_failed(e.to_string()))?;
    serial
        .0
        .configure(&PORT_SETTINGS)
        .map_err(|e| open_failed(e.to_string()))?;
    serial
        .0
        .set_timeout(INTER_CHARACTER_TIMEOUT)
        .map_err(|e| open_failed(e.to_string()))?;

    info!(path = %path.display(), "serial port opened");
    Ok(serial)
}
