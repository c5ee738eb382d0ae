use std::io::{self, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::time::Duration;

use sps30::sampling::ReadingSink;
use sps30::SensorReading;

const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("failed to connect to {path}: {source}")]
    Connect { path: PathBuf, source: io::Error },

    #[error("failed to encode reading: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write reading: {0}")]
    Write(#[from] io::Error),
}

/// Sends each reading as one JSON line over a fresh unix stream connection.
pub struct UnixSocketSink {
    path: PathBuf,
}

impl UnixSocketSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReadingSink for UnixSocketSink {
    type Error = ForwardError;

    fn forward(&mut self, reading: &SensorReading) -> Result<(), Self::Error> {
        let mut line = serde_json::to_vec(reading)?;
        line.push(b'\n');

        let mut stream = UnixStream::connect(&self.path).map_err(|source| ForwardError::Connect {
            path: self.path.clone(),
            source,
        })?;
        stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
        stream.write_all(&line)?;
        stream.flush()?;
        Ok(())
    }
}
