use std::time::{Duration, Instant};

use embedded_hal::serial::Read;

use crate::error::ReadError;

/// Classifies serial read errors.
pub trait ReadFault {
    /// `true` if the error means the stream has ended.
    fn is_end_of_stream(&self) -> bool;
}

impl ReadFault for std::io::ErrorKind {
    fn is_end_of_stream(&self) -> bool {
        *self == std::io::ErrorKind::UnexpectedEof
    }
}

impl ReadFault for () {
    fn is_end_of_stream(&self) -> bool {
        false
    }
}

impl ReadFault for core::convert::Infallible {
    fn is_end_of_stream(&self) -> bool {
        match *self {}
    }
}

#[derive(PartialEq, Debug)]
enum ReadStatus<E> {
    InProgress,
    Finished(usize),
    Failed(ReadError<E>),
}

struct ReadStateMachine<'a> {
    buffer: &'a mut [u8],
    index: usize,
    /// `None` when the timeout reaches past what `Instant` can represent.
    deadline: Option<Instant>,
}

impl<'a> ReadStateMachine<'a> {
    fn new(buffer: &'a mut [u8], deadline: Option<Instant>) -> Self {
        Self {
            buffer,
            index: 0,
            deadline,
        }
    }

    fn byte_read(&mut self, byte: u8) {
        self.buffer[self.index] = byte;
        self.index += 1;
    }

    fn update<E: ReadFault>(&mut self, read_result: nb::Result<u8, E>, now: Instant) -> ReadStatus<E> {
        match read_result {
            Ok(byte) => self.byte_read(byte),
            Err(nb::Error::WouldBlock) => {}
            Err(nb::Error::Other(e)) if e.is_end_of_stream() => {
                return ReadStatus::Failed(ReadError::StreamClosed)
            }
            Err(nb::Error::Other(e)) => return ReadStatus::Failed(ReadError::Io(e)),
        }

        if self.index == self.buffer.len() {
            ReadStatus::Finished(self.index)
        } else if self.deadline.is_some_and(|deadline| now >= deadline) {
            ReadStatus::Failed(ReadError::Timeout { read: self.index })
        } else {
            ReadStatus::InProgress
        }
    }
}

/// Fills `buffer` from `serial`, giving up once `timeout` has elapsed.
///
/// `WouldBlock` is retried until the deadline. Returns the number of bytes
/// read, which on success is always `buffer.len()`.
pub fn read_exact<S>(
    serial: &mut S,
    buffer: &mut [u8],
    timeout: Duration,
) -> Result<usize, ReadError<S::Error>>
where
    S: Read<u8>,
    S::Error: ReadFault,
{
    if buffer.is_empty() {
        return Ok(0);
    }

    let mut fsm = ReadStateMachine::new(buffer, Instant::now().checked_add(timeout));
    loop {
        match fsm.update(serial.read(), Instant::now()) {
            ReadStatus::InProgress => continue,
            ReadStatus::Finished(read) => return Ok(read),
            ReadStatus::Failed(e) => return Err(e),
        }
    }
}

/// Discards whatever `serial` has buffered. Stops at the first read that does
/// not produce a byte and returns the number of bytes discarded.
pub fn drain<S: Read<u8>>(serial: &mut S) -> usize {
    let mut discarded = 0;
    while serial.read().is_ok() {
        discarded += 1;
    }
    discarded
}
