/// Errors produced while decoding a de-stuffed payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Fewer bytes than ten big-endian floats need.
    #[error("malformed payload ({len} bytes, need {needed})")]
    MalformedPayload { len: usize, needed: usize },
}

/// Errors produced by a deadline-bounded read.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ReadError<E> {
    /// The deadline elapsed before the buffer was full.
    #[error("read timed out after {read} bytes")]
    Timeout { read: usize },

    /// The stream signalled end-of-stream.
    #[error("stream closed")]
    StreamClosed,

    /// Any other serial error.
    #[error("serial read error: {0:?}")]
    Io(E),
}

/// Errors returned by the sensor driver.
///
/// `R` and `W` are the error types of the serial read and write halves.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum Error<R, W> {
    #[error("sending start command failed: {0:?}")]
    StartFailed(W),

    #[error("requesting measurement failed: {0:?}")]
    RequestFailed(W),

    #[error("reading frame timed out ({read} of {expected} bytes)")]
    Timeout { read: usize, expected: usize },

    #[error("short frame ({read} of {expected} bytes)")]
    ShortFrame { read: usize, expected: usize },

    #[error(transparent)]
    MalformedPayload(#[from] DecodeError),

    #[error("serial read error: {0:?}")]
    Io(R),
}
