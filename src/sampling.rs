use core::fmt;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use embedded_hal::serial::{Read, Write};
use tracing::{debug, info, warn};

use crate::{Error, ReadFault, SensorError, SensorReading, Sps30Sensor};

/// Receives every decoded reading.
pub trait ReadingSink {
    type Error: fmt::Display;

    fn forward(&mut self, reading: &SensorReading) -> Result<(), Self::Error>;
}

/// Tells a supervisor the loop is still alive.
pub trait Liveness {
    /// Called once the sensor has been started and has settled.
    fn ready(&mut self) {}

    fn notify(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopConfig {
    /// Time between two ticks.
    pub period: Duration,
    /// Warm-up after the start command.
    pub settle: Duration,
    /// Extra pause after a tick that produced no frame.
    pub cooldown: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(5),
            settle: Duration::from_secs(5),
            cooldown: Duration::from_secs(1),
        }
    }
}

/// What a single tick ended with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Forwarded,
    ForwardFailed,
    NoReading,
    CycleFailed,
}

/// Fixed-rate schedule. Ticks that are already in the past are skipped.
#[derive(Debug)]
struct Ticker {
    period: Duration,
    /// `None` once the schedule runs past what `Instant` can represent.
    next: Option<Instant>,
}

impl Ticker {
    fn new(period: Duration, now: Instant) -> Self {
        Self {
            period,
            next: now.checked_add(period),
        }
    }

    fn remaining(&self, now: Instant) -> Duration {
        match self.next {
            Some(next) => next.saturating_duration_since(now),
            None => Duration::MAX,
        }
    }

    fn advance(&mut self, now: Instant) {
        if self.period.is_zero() {
            self.next = Some(now);
            return;
        }
        let mut next = self.next.and_then(|at| at.checked_add(self.period));
        while let Some(at) = next.filter(|at| *at <= now) {
            next = at.checked_add(self.period);
        }
        self.next = next;
    }
}

pub struct SamplingLoop<Serial, Sink, Live>
where
    Serial: Read<u8> + Write<u8>,
{
    sensor: Sps30Sensor<Serial>,
    sink: Sink,
    liveness: Live,
    config: LoopConfig,
}

impl<Serial, Sink, Live> SamplingLoop<Serial, Sink, Live>
where
    Serial: Read<u8> + Write<u8>,
    <Serial as Read<u8>>::Error: ReadFault + fmt::Debug,
    <Serial as Write<u8>>::Error: fmt::Debug,
    Sink: ReadingSink,
    Live: Liveness,
{
    pub fn new(sensor: Sps30Sensor<Serial>, sink: Sink, liveness: Live, config: LoopConfig) -> Self {
        Self {
            sensor,
            sink,
            liveness,
            config,
        }
    }

    /// Sends the start command and waits for the sensor to settle.
    pub fn start(&mut self) -> Result<(), SensorError<Serial>> {
        self.sensor.start()?;
        info!(settle = ?self.config.settle, "measurement started, waiting for sensor");
        thread::sleep(self.config.settle);
        self.liveness.ready();
        Ok(())
    }

    /// Runs one measurement cycle and reports liveness afterwards.
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = match self.sensor.sample() {
            Ok(Some(reading)) => {
                info!(%reading, "measurement");
                match self.sink.forward(&reading) {
                    Ok(()) => {
                        debug!("reading forwarded");
                        TickOutcome::Forwarded
                    }
                    Err(err) => {
                        warn!(error = %err, "failed to forward reading");
                        TickOutcome::ForwardFailed
                    }
                }
            }
            Ok(None) => {
                info!(cooldown = ?self.config.cooldown, "no frame from sensor");
                thread::sleep(self.config.cooldown);
                TickOutcome::NoReading
            }
            Err(Error::Timeout { read: 0, expected }) => {
                info!(expected, timeout = ?self.sensor.read_timeout, "sensor sent nothing");
                TickOutcome::CycleFailed
            }
            Err(err) => {
                warn!(error = %err, "measurement cycle failed");
                TickOutcome::CycleFailed
            }
        };

        self.liveness.notify();
        outcome
    }

    /// Ticks every `period` until `shutdown` receives a message or its
    /// sender is dropped.
    pub fn run(&mut self, shutdown: &Receiver<()>) {
        let mut ticker = Ticker::new(self.config.period, Instant::now());
        loop {
            match shutdown.recv_timeout(ticker.remaining(Instant::now())) {
                Err(RecvTimeoutError::Timeout) => {
                    self.tick();
                    ticker.advance(Instant::now());
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    info!("sampling loop stopped");
                    return;
                }
            }
        }
    }

    /// Gives back the sensor, sink and liveness reporter.
    pub fn into_parts(self) -> (Sps30Sensor<Serial>, Sink, Live) {
        (self.sensor, self.sink, self.liveness)
    }
}
