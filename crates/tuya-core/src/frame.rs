//! Binary framing for the Tuya local protocol.
//!
//! Every message is wrapped in a frame delimited by the magic words
//! `0x000055AA` (prefix) and `0x0000AA55` (suffix):
//!
//! ```text
//! +--------+--------+---------+--------+---------+-------+--------+
//! | prefix |  seq   | command | length | payload | crc32 | suffix |
//! | 4 B    |  4 B   | 4 B     | 4 B    | n B     | 4 B   | 4 B    |
//! +--------+--------+---------+--------+---------+-------+--------+
//! ```
//!
//! All integers are big-endian. `length` counts everything after the length
//! field (payload + CRC + suffix). The CRC32 covers the header and payload.
//! Frames sent *by* the device carry a 4-byte return code ahead of the
//! payload; frames sent *to* the device do not.

use crate::error::Error;

/// Frame prefix magic word.
pub const PREFIX: u32 = 0x0000_55AA;

/// Frame suffix magic word.
pub const SUFFIX: u32 = 0x0000_AA55;

/// Length of the fixed frame header (prefix + seq + command + length).
pub const HEADER_LEN: usize = 16;

/// Upper bound on the declared frame body length, to reject garbage
/// before allocating a receive buffer.
pub const MAX_BODY_LEN: usize = 64 * 1024;

/// Command words understood by smart plugs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum CommandType {
    /// Set one or more data points.
    Control = 0x07,
    /// Keepalive ping.
    HeartBeat = 0x09,
    /// Query all data points.
    DpQuery = 0x0a,
}

impl CommandType {
    /// Returns the wire value of this command word.
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

/// A decoded frame received from a device.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Sequence number echoed from the request.
    pub seq: u32,
    /// Command word.
    pub command: u32,
    /// Device return code (0 = success). `None` for an empty body.
    pub return_code: Option<u32>,
    /// Payload bytes (possibly encrypted, possibly empty).
    pub payload: Vec<u8>,
}

/// Encodes a request frame.
///
/// # Example
///
/// ```
/// use tuya_core::frame::{encode_request, CommandType, HEADER_LEN};
///
/// let frame = encode_request(1, CommandType::DpQuery, b"payload");
/// // header + payload + crc + suffix
/// assert_eq!(frame.len(), HEADER_LEN + 7 + 8);
/// ```
pub fn encode_request(seq: u32, command: CommandType, payload: &[u8]) -> Vec<u8> {
    let body_len = payload.len() + 8; // CRC + suffix
    let mut buf = Vec::with_capacity(HEADER_LEN + body_len);
    buf.extend_from_slice(&PREFIX.to_be_bytes());
    buf.extend_from_slice(&seq.to_be_bytes());
    buf.extend_from_slice(&command.as_u32().to_be_bytes());
    buf.extend_from_slice(&(body_len as u32).to_be_bytes());
    buf.extend_from_slice(payload);

    let crc = crc32fast::hash(&buf);
    buf.extend_from_slice(&crc.to_be_bytes());
    buf.extend_from_slice(&SUFFIX.to_be_bytes());
    buf
}

/// Decodes a complete response frame (header and body).
///
/// Verifies the prefix, suffix, and CRC32 checksum, and splits the device
/// return code off the front of the body.
pub fn decode_response(buf: &[u8]) -> Result<Frame, Error> {
    if buf.len() < HEADER_LEN + 8 {
        return Err(Error::Protocol(format!(
            "frame too short: {} bytes",
            buf.len()
        )));
    }

    let prefix = read_u32(buf, 0);
    if prefix != PREFIX {
        return Err(Error::Protocol(format!(
            "bad frame prefix: {:#010x}",
            prefix
        )));
    }

    let seq = read_u32(buf, 4);
    let command = read_u32(buf, 8);
    let body_len = read_u32(buf, 12) as usize;

    if buf.len() != HEADER_LEN + body_len {
        return Err(Error::Protocol(format!(
            "frame length mismatch: declared {} bytes, got {}",
            body_len,
            buf.len() - HEADER_LEN
        )));
    }

    let suffix = read_u32(buf, buf.len() - 4);
    if suffix != SUFFIX {
        return Err(Error::Protocol(format!(
            "bad frame suffix: {:#010x}",
            suffix
        )));
    }

    let declared_crc = read_u32(buf, buf.len() - 8);
    let computed_crc = crc32fast::hash(&buf[..buf.len() - 8]);
    if declared_crc != computed_crc {
        return Err(Error::Protocol(format!(
            "CRC mismatch: declared {:#010x}, computed {:#010x}",
            declared_crc, computed_crc
        )));
    }

    let body = &buf[HEADER_LEN..buf.len() - 8];
    let (return_code, payload) = if body.len() >= 4 {
        (Some(read_u32(body, 0)), body[4..].to_vec())
    } else {
        (None, body.to_vec())
    };

    Ok(Frame {
        seq,
        command,
        return_code,
        payload,
    })
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a device-style response frame with a return code.
    fn build_response(seq: u32, command: u32, return_code: u32, payload: &[u8]) -> Vec<u8> {
        let body_len = 4 + payload.len() + 8;
        let mut buf = Vec::new();
        buf.extend_from_slice(&PREFIX.to_be_bytes());
        buf.extend_from_slice(&seq.to_be_bytes());
        buf.extend_from_slice(&command.to_be_bytes());
        buf.extend_from_slice(&(body_len as u32).to_be_bytes());
        buf.extend_from_slice(&return_code.to_be_bytes());
        buf.extend_from_slice(payload);
        let crc = crc32fast::hash(&buf);
        buf.extend_from_slice(&crc.to_be_bytes());
        buf.extend_from_slice(&SUFFIX.to_be_bytes());
        buf
    }

    #[test]
    fn test_encode_request_layout() {
        let frame = encode_request(7, CommandType::DpQuery, b"hello");
        assert_eq!(frame.len(), HEADER_LEN + 5 + 8);
        assert_eq!(read_u32(&frame, 0), PREFIX);
        assert_eq!(read_u32(&frame, 4), 7);
        assert_eq!(read_u32(&frame, 8), 0x0a);
        assert_eq!(read_u32(&frame, 12), 5 + 8);
        assert_eq!(&frame[HEADER_LEN..HEADER_LEN + 5], b"hello");
        assert_eq!(read_u32(&frame, frame.len() - 4), SUFFIX);
    }

    #[test]
    fn test_decode_response_roundtrip() {
        let payload = br#"{"dps":{"1":true}}"#;
        let buf = build_response(3, 0x0a, 0, payload);
        let frame = decode_response(&buf).unwrap();

        assert_eq!(frame.seq, 3);
        assert_eq!(frame.command, 0x0a);
        assert_eq!(frame.return_code, Some(0));
        assert_eq!(frame.payload, payload);
    }

    #[test]
    fn test_decode_empty_body() {
        let buf = encode_request(1, CommandType::HeartBeat, b"");
        let frame = decode_response(&buf).unwrap();
        assert_eq!(frame.return_code, None);
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn test_decode_rejects_corrupted_crc() {
        let mut buf = build_response(1, 0x0a, 0, b"payload");
        let crc_offset = buf.len() - 8;
        buf[crc_offset] ^= 0xff;

        let err = decode_response(&buf).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
        assert!(err.to_string().contains("CRC"));
    }

    #[test]
    fn test_decode_rejects_bad_prefix() {
        let mut buf = build_response(1, 0x0a, 0, b"payload");
        buf[0] = 0xff;
        assert!(matches!(
            decode_response(&buf),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn test_decode_rejects_truncated_frame() {
        let buf = build_response(1, 0x0a, 0, b"payload");
        assert!(decode_response(&buf[..buf.len() - 3]).is_err());
    }
}
