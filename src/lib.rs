//! Driver for the Sensirion SPS30 particulate matter sensor over UART.
//!
//! The sensor speaks SHDLC: command frames are written with [`Sps30Sensor::start`]
//! and [`Sps30Sensor::sample`], replies are read back within a deadline and
//! decoded into a [`SensorReading`]. [`sampling::SamplingLoop`] drives the
//! driver on a fixed period.

use std::time::Duration;

use embedded_hal::serial::{Read, Write};
use nb::block;
use tracing::debug;

pub mod codec;
mod error;
mod reading;
pub mod sampling;
mod timed_read;

pub use crate::error::{DecodeError, Error, ReadError};
pub use crate::reading::{SensorReading, FIELD_COUNT};
pub use crate::timed_read::{drain, read_exact, ReadFault};

use crate::codec::{Command, FRAME_LEN, HEADER_LEN};

/// How long a measurement reply may take to arrive.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type returned by a sensor using `Serial`.
pub type SensorError<Serial> = Error<<Serial as Read<u8>>::Error, <Serial as Write<u8>>::Error>;

pub struct Sps30Sensor<Serial>
where
    Serial: Read<u8> + Write<u8>,
{
    serial: Serial,
    read_timeout: Duration,
    start_cmd: Command,
    request_cmd: Command,
}

impl<Serial> Sps30Sensor<Serial>
where
    Serial: Read<u8> + Write<u8>,
    <Serial as Read<u8>>::Error: ReadFault,
{
    ///
    /// Creates a new sensor instance using a single object implementing embedded hal serial traits
    ///
    pub fn new(serial: Serial) -> Self {
        Self {
            serial,
            read_timeout: DEFAULT_READ_TIMEOUT,
            start_cmd: codec::build_start_command(),
            request_cmd: codec::build_request_command(),
        }
    }

    ///
    /// Sets how long [`Sps30Sensor::sample`] waits for a complete reply
    ///
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    ///
    /// Starts measurement with floating point output. The sensor needs a few seconds
    /// before the first values are available.
    ///
    pub fn start(&mut self) -> Result<(), SensorError<Serial>> {
        send_cmd(&mut self.serial, &self.start_cmd).map_err(Error::StartFailed)
    }

    ///
    /// Requests and reads one set of measured values.
    ///
    /// Returns `Ok(None)` when the stream closed without delivering a frame.
    ///
    pub fn sample(&mut self) -> Result<Option<SensorReading>, SensorError<Serial>> {
        let discarded = drain(&mut self.serial);
        if discarded > 0 {
            debug!(discarded, "discarded stale input");
        }

        send_cmd(&mut self.serial, &self.request_cmd).map_err(Error::RequestFailed)?;

        let mut frame = [0_u8; FRAME_LEN];
        let read = match read_exact(&mut self.serial, &mut frame, self.read_timeout) {
            Ok(read) => read,
            Err(ReadError::StreamClosed) => return Ok(None),
            Err(ReadError::Timeout { read }) => {
                return Err(Error::Timeout {
                    read,
                    expected: FRAME_LEN,
                })
            }
            Err(ReadError::Io(e)) => return Err(Error::Io(e)),
        };
        frame_complete(read)?;

        let unstuffed = codec::unstuff(&frame);
        let payload = unstuffed.get(HEADER_LEN..).unwrap_or(&[]);
        Ok(Some(codec::decode_reading(payload)?))
    }

    ///
    /// Gives back the serial object
    ///
    pub fn release(self) -> Serial {
        self.serial
    }
}

fn frame_complete<R, W>(read: usize) -> Result<(), Error<R, W>> {
    if read == FRAME_LEN {
        Ok(())
    } else {
        Err(Error::ShortFrame {
            read,
            expected: FRAME_LEN,
        })
    }
}

fn send_cmd<Serial: Write<u8>>(serial: &mut Serial, cmd: &Command) -> Result<(), Serial::Error> {
    for byte in cmd.as_bytes() {
        block!(serial.write(*byte))?;
    }
    block!(serial.flush())
}

impl<TX, RX> Sps30Sensor<Wrapper<TX, RX>>
where
    TX: Write<u8>,
    RX: Read<u8>,
    RX::Error: ReadFault,
{
    ///
    /// Creates a new sensor instance using separate Read and Write embedded hal trait objects
    ///
    pub fn new_tx_rx(tx: TX, rx: RX) -> Self {
        Self::new(Wrapper(tx, rx))
    }
}

///
/// Combines two serial traits objects into one
///
pub struct Wrapper<TX, RX>(TX, RX)
where
    TX: Write<u8>,
    RX: Read<u8>;

impl<TX, RX> Read<u8> for Wrapper<TX, RX>
where
    TX: Write<u8>,
    RX: Read<u8>,
{
    type Error = RX::Error;

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        self.1.read()
    }
}

impl<TX, RX> Write<u8> for Wrapper<TX, RX>
where
    TX: Write<u8>,
    RX: Read<u8>,
{
    type Error = TX::Error;

    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        self.0.write(word)
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        self.0.flush()
    }
}
