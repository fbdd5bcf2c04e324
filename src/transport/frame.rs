// src/transport/frame.rs

use crate::common::{crc, error::SmlError};
use alloc::vec::Vec;

// --- Transport Constants (SML transport protocol version 1) ---

/// Escape block. Four of these in a row announce a control block.
pub const ESCAPE: [u8; 4] = [0x1B; 4];
/// Control block following an escape that starts a frame.
pub const BEGIN_MARKER: [u8; 4] = [0x01; 4];
/// First byte of the control block that ends a frame: `1A <fill> <crc> <crc>`.
pub const END_MARKER: u8 = 0x1A;
/// Complete start sequence.
pub const START_SEQUENCE: [u8; 8] = [0x1B, 0x1B, 0x1B, 0x1B, 0x01, 0x01, 0x01, 0x01];
/// Frames are transmitted in whole blocks.
pub const BLOCK_LEN: usize = 4;
/// Escape block plus the end control block.
pub const END_SEQUENCE_LEN: usize = 8;
/// Start sequence plus end sequence, no payload.
pub const MIN_FRAME_LEN: usize = START_SEQUENCE.len() + END_SEQUENCE_LEN;
/// At most one partial block of payload is padded.
pub const MAX_FILL: u8 = 3;

/// A candidate frame exactly as it came off the wire, from the start sequence
/// up to and including the checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    bytes: Vec<u8>,
}

impl RawFrame {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of fill bytes announced in the end sequence.
    pub fn fill_count(&self) -> Option<u8> {
        let len = self.bytes.len();
        (len >= MIN_FRAME_LEN).then(|| self.bytes[len - 3])
    }

    /// Checks length, checksum and escaping, and extracts the message payload.
    ///
    /// # Returns
    ///
    /// * `Ok(FrameBody)` with escapes undone and fill bytes removed.
    /// * `Err(SmlError::InvalidFrameLength)` if the length field is inconsistent.
    /// * `Err(SmlError::CrcMismatch)` if the checksum does not match.
    /// * `Err(SmlError::InvalidEscape)` if the frame is not delimited correctly
    ///   or contains an unknown escape.
    pub fn validate<E>(&self) -> Result<FrameBody, SmlError<E>>
    where
        E: core::fmt::Debug,
    {
        let len = self.bytes.len();
        let fill = self.fill_count().unwrap_or(0);
        if len < MIN_FRAME_LEN || len % BLOCK_LEN != 0 {
            return Err(SmlError::InvalidFrameLength { len, fill });
        }

        crc::verify_frame_crc(&self.bytes)?;

        let end_start = len - END_SEQUENCE_LEN;
        if self.bytes[..START_SEQUENCE.len()] != START_SEQUENCE
            || self.bytes[end_start..end_start + BLOCK_LEN] != ESCAPE
            || self.bytes[end_start + BLOCK_LEN] != END_MARKER
        {
            return Err(SmlError::InvalidEscape);
        }

        let escaped = &self.bytes[START_SEQUENCE.len()..end_start];
        let mut payload = unescape(escaped).ok_or(SmlError::InvalidEscape)?;

        if fill > MAX_FILL || usize::from(fill) > payload.len() {
            return Err(SmlError::InvalidFrameLength { len, fill });
        }
        payload.truncate(payload.len() - usize::from(fill));

        Ok(FrameBody { payload, frame_len: len })
    }
}

/// Reverses the doubling of escape blocks inside the payload.
fn unescape(escaped: &[u8]) -> Option<Vec<u8>> {
    let mut payload = Vec::with_capacity(escaped.len());
    let mut blocks = escaped.chunks_exact(BLOCK_LEN);
    while let Some(block) = blocks.next() {
        payload.extend_from_slice(block);
        if block == ESCAPE && blocks.next()? != ESCAPE {
            return None;
        }
    }
    Some(payload)
}

/// Validated payload of a frame: the concatenated SML messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBody {
    payload: Vec<u8>,
    frame_len: usize,
}

impl FrameBody {
    pub fn as_bytes(&self) -> &[u8] {
        &self.payload
    }

    /// Length of the raw frame this body was taken from.
    pub fn frame_len(&self) -> usize {
        self.frame_len
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::encode::encode_frame;

    #[derive(Debug)]
    struct MockIoError;

    #[test]
    fn test_validate_roundtrip_with_fill() {
        let body = [0x76, 0x05, 0x01, 0x02, 0x03];
        let frame = RawFrame::new(encode_frame(&body));
        assert_eq!(frame.fill_count(), Some(3));
        let validated = frame.validate::<MockIoError>().unwrap();
        assert_eq!(validated.as_bytes(), &body);
        assert_eq!(validated.frame_len(), frame.len());
    }

    #[test]
    fn test_validate_unescapes_payload() {
        let body = [0x1B, 0x1B, 0x1B, 0x1B, 0x01, 0x01, 0x01, 0x01];
        let encoded = encode_frame(&body);
        // start + doubled escape + marker block + end
        assert_eq!(encoded.len(), 8 + 12 + 8);
        let validated = RawFrame::new(encoded).validate::<MockIoError>().unwrap();
        assert_eq!(validated.as_bytes(), &body);
    }

    #[test]
    fn test_validate_rejects_flipped_crc() {
        let mut bytes = encode_frame(&[0x01, 0x02, 0x03, 0x04]);
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let result = RawFrame::new(bytes).validate::<MockIoError>();
        assert!(matches!(result, Err(SmlError::CrcMismatch { .. })));
    }

    #[test]
    fn test_validate_rejects_misaligned_length() {
        let mut bytes = encode_frame(&[0x01, 0x02, 0x03, 0x04]);
        bytes.insert(8, 0x00);
        let result = RawFrame::new(bytes).validate::<MockIoError>();
        assert!(matches!(result, Err(SmlError::InvalidFrameLength { len: 21, .. })));
    }

    #[test]
    fn test_validate_rejects_excess_fill() {
        // hand-built frame announcing 4 fill bytes with a correct CRC
        let mut bytes = START_SEQUENCE.to_vec();
        bytes.extend_from_slice(&[0x00; 4]);
        bytes.extend_from_slice(&ESCAPE);
        bytes.extend_from_slice(&[END_MARKER, 4]);
        let crc_value = crc::calculate_crc16(&bytes);
        bytes.extend_from_slice(&crc::encode_crc(crc_value));
        let result = RawFrame::new(bytes).validate::<MockIoError>();
        assert!(matches!(result, Err(SmlError::InvalidFrameLength { fill: 4, .. })));
    }

    #[test]
    fn test_validate_rejects_lone_escape() {
        let mut bytes = START_SEQUENCE.to_vec();
        bytes.extend_from_slice(&ESCAPE);
        bytes.extend_from_slice(&[0x02; 4]);
        bytes.extend_from_slice(&ESCAPE);
        bytes.extend_from_slice(&[END_MARKER, 0]);
        let crc_value = crc::calculate_crc16(&bytes);
        bytes.extend_from_slice(&crc::encode_crc(crc_value));
        let result = RawFrame::new(bytes).validate::<MockIoError>();
        assert!(matches!(result, Err(SmlError::InvalidEscape)));
    }

    #[test]
    fn test_validate_rejects_short_frame() {
        let result = RawFrame::new(START_SEQUENCE.to_vec()).validate::<MockIoError>();
        assert!(matches!(result, Err(SmlError::InvalidFrameLength { len: 8, fill: 0 })));
    }
}
