//! SHDLC framing used by the SPS30 UART interface.
//!
//! Every frame sits between two `0x7E` delimiters. Inside a frame the bytes
//! `0x7E`, `0x7D`, `0x11` and `0x13` are escaped as `0x7D` followed by the
//! original byte XOR `0x20`.

use scroll::{Pread, BE};

use crate::error::DecodeError;
use crate::reading::{SensorReading, FIELD_COUNT};

pub const FRAME_DELIMITER: u8 = 0x7E;
const ESCAPE: u8 = 0x7D;

/// Length of a measured-values reply as read from the wire.
pub const FRAME_LEN: usize = 47;
/// Start byte, address, command, state and length, discarded in front of the data.
pub const HEADER_LEN: usize = 5;
/// Ten big-endian `f32` values.
pub const PAYLOAD_LEN: usize = FIELD_COUNT * 4;

const ADDRESS: u8 = 0x00;
const CMD_START_MEASUREMENT: u8 = 0x00;
const CMD_READ_MEASURED_VALUES: u8 = 0x03;
// Sub-command 0x01 followed by output format 0x03 (big-endian IEEE754 float).
const START_MEASUREMENT_FLOAT_FORMAT: [u8; 2] = [0x01, 0x03];

/// A complete, delimited and stuffed command frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command(Vec<u8>);

impl Command {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Start measurement in floating point output format.
pub fn build_start_command() -> Command {
    create_command(CMD_START_MEASUREMENT, &START_MEASUREMENT_FLOAT_FORMAT)
}

/// Read measured values.
pub fn build_request_command() -> Command {
    create_command(CMD_READ_MEASURED_VALUES, &[])
}

fn create_command(cmd: u8, data: &[u8]) -> Command {
    let mut body = Vec::with_capacity(data.len() + 4);
    body.push(ADDRESS);
    body.push(cmd);
    body.push(data.len() as u8);
    body.extend_from_slice(data);
    body.push(checksum(&body));

    let stuffed = stuff(&body);
    let mut frame = Vec::with_capacity(stuffed.len() + 2);
    frame.push(FRAME_DELIMITER);
    frame.extend_from_slice(&stuffed);
    frame.push(FRAME_DELIMITER);

    Command(frame)
}

/// SHDLC checksum: the inverted least significant byte of the sum of all
/// bytes between the delimiters, before stuffing.
pub fn checksum(bytes: &[u8]) -> u8 {
    !bytes.iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
}

fn escaped(byte: u8) -> Option<u8> {
    match byte {
        0x7E => Some(0x5E),
        0x7D => Some(0x5D),
        0x11 => Some(0x31),
        0x13 => Some(0x33),
        _ => None,
    }
}

fn unescaped(byte: u8) -> Option<u8> {
    match byte {
        0x5E => Some(0x7E),
        0x5D => Some(0x7D),
        0x31 => Some(0x11),
        0x33 => Some(0x13),
        _ => None,
    }
}

/// Escapes reserved bytes.
pub fn stuff(buffer: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(buffer.len());
    for &byte in buffer {
        match escaped(byte) {
            Some(code) => {
                out.push(ESCAPE);
                out.push(code);
            }
            None => out.push(byte),
        }
    }
    out
}

/// Reverses [`stuff`] in a single left-to-right pass.
///
/// Substituted bytes are never scanned again. An escape byte that is not
/// followed by a known code is copied through unchanged.
pub fn unstuff(buffer: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(buffer.len());
    let mut index = 0;
    while index < buffer.len() {
        let byte = buffer[index];
        if byte == ESCAPE {
            if let Some(raw) = buffer.get(index + 1).copied().and_then(unescaped) {
                out.push(raw);
                index += 2;
                continue;
            }
        }
        out.push(byte);
        index += 1;
    }
    out
}

/// Decodes ten big-endian floats from the start of `payload`.
///
/// Bytes after the tenth value (checksum, delimiter) are ignored.
pub fn decode_reading(payload: &[u8]) -> Result<SensorReading, DecodeError> {
    let malformed = DecodeError::MalformedPayload {
        len: payload.len(),
        needed: PAYLOAD_LEN,
    };

    let mut values = [0_f32; FIELD_COUNT];
    let mut offset = 0usize;
    for value in values.iter_mut() {
        let raw = payload
            .gread_with::<f32>(&mut offset, BE)
            .map_err(|_| malformed)?;
        *value = round_hundredths(raw);
    }

    Ok(SensorReading::from_array(values))
}

/// Rounds half away from zero on the value widened to `f64`.
fn round_hundredths(value: f32) -> f32 {
    ((f64::from(value) * 100.0).round() / 100.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn float_payload(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_be_bytes()).collect()
    }

    #[test]
    fn start_command_bytes() {
        assert_eq!(
            build_start_command().as_bytes(),
            &[0x7E, 0x00, 0x00, 0x02, 0x01, 0x03, 0xF9, 0x7E]
        );
    }

    #[test]
    fn request_command_bytes() {
        assert_eq!(
            build_request_command().as_bytes(),
            &[0x7E, 0x00, 0x03, 0x00, 0xFC, 0x7E]
        );
    }

    #[test]
    fn checksum_inverts_wrapped_sum() {
        assert_eq!(checksum(&[0x00, 0x03, 0x00]), 0xFC);
        assert_eq!(checksum(&[0xFF, 0x02]), !0x01);
    }

    #[test]
    fn unstuff_replaces_each_escape_sequence() {
        assert_eq!(unstuff(&[0x7D, 0x5E]), vec![0x7E]);
        assert_eq!(unstuff(&[0x7D, 0x5D]), vec![0x7D]);
        assert_eq!(unstuff(&[0x7D, 0x31]), vec![0x11]);
        assert_eq!(unstuff(&[0x7D, 0x33]), vec![0x13]);
        assert_eq!(
            unstuff(&[0x01, 0x7D, 0x5E, 0x02, 0x7D, 0x33, 0x03]),
            vec![0x01, 0x7E, 0x02, 0x13, 0x03]
        );
    }

    #[test]
    fn unstuff_does_not_rescan_its_output() {
        // 7D 5D becomes 7D, which must not pair up with the following 31.
        assert_eq!(unstuff(&[0x7D, 0x5D, 0x31]), vec![0x7D, 0x31]);
        assert_eq!(unstuff(&[0x7D, 0x5D, 0x5E]), vec![0x7D, 0x5E]);
    }

    #[test]
    fn unstuff_keeps_unknown_and_trailing_escapes() {
        assert_eq!(unstuff(&[0x7D, 0x00]), vec![0x7D, 0x00]);
        assert_eq!(unstuff(&[0x01, 0x7D]), vec![0x01, 0x7D]);
        assert!(unstuff(&[]).is_empty());
    }

    #[test]
    fn unstuff_is_identity_without_escape_bytes() {
        let clean: Vec<u8> = (0u8..=255).filter(|b| *b != ESCAPE).collect();
        assert_eq!(unstuff(&clean), clean);
    }

    #[test]
    fn stuff_then_unstuff_restores_reserved_bytes() {
        let payload = [0x7E, 0x00, 0x7D, 0x11, 0x42, 0x13, 0x7D, 0x7D, 0x5E, 0x7E];
        let stuffed = stuff(&payload);

        assert!(!stuffed[..].contains(&0x7E));
        assert!(!stuffed[..].contains(&0x11));
        assert!(!stuffed[..].contains(&0x13));
        assert_eq!(stuffed.len(), payload.len() + 7);
        assert_eq!(unstuff(&stuffed), payload);
    }

    #[test]
    fn decodes_ten_floats_in_order() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let reading = decode_reading(&float_payload(&values)).unwrap();
        assert_eq!(reading.as_array(), values);
    }

    #[test]
    fn decoding_is_deterministic() {
        let payload = float_payload(&[
            12.345, 0.001, 99.999, 3.14159, 2.71828, 1.41421, 0.5, 1000.125, 7.0, 0.61,
        ]);
        let first = decode_reading(&payload).unwrap();
        let second = decode_reading(&payload).unwrap();

        let first_bits: Vec<u32> = first.as_array().iter().map(|v| v.to_bits()).collect();
        let second_bits: Vec<u32> = second.as_array().iter().map(|v| v.to_bits()).collect();
        assert_eq!(first_bits, second_bits);
    }

    #[test]
    fn rounds_to_two_decimals() {
        let mut values = [0.0; FIELD_COUNT];
        values[0] = 1.23456;
        values[1] = 1.005;
        values[2] = 0.125;
        values[3] = -0.125;
        values[4] = 2.999;

        let reading = decode_reading(&float_payload(&values)).unwrap();
        assert_eq!(reading.pm1_0, 1.23);
        // 1.005f32 is stored slightly below the tie.
        assert_eq!(reading.pm2_5, 1.0);
        // Exact ties round away from zero.
        assert_eq!(reading.pm4_0, 0.13);
        assert_eq!(reading.pm10_0, -0.13);
        assert_eq!(reading.nc0_5, 3.0);
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut payload = float_payload(&[1.0; FIELD_COUNT]);
        payload.extend_from_slice(&[0xAB, FRAME_DELIMITER]);
        assert_eq!(decode_reading(&payload).unwrap().as_array(), [1.0; FIELD_COUNT]);
    }

    #[test]
    fn short_payload_is_malformed() {
        let payload = [0u8; 30];
        assert_eq!(
            decode_reading(&payload),
            Err(DecodeError::MalformedPayload {
                len: 30,
                needed: PAYLOAD_LEN
            })
        );
        assert!(decode_reading(&[0u8; PAYLOAD_LEN - 1]).is_err());
    }
}
