// src/common/crc.rs

use super::error::SmlError;
use crc::{Algorithm, Crc};

/// CRC algorithm used by the SML transport layer (CRC-16/X-25).
/// Polynomial: 0x1021 (reflected 0x8408)
/// Initial Value: 0xFFFF
/// Input Reflected: true
/// Output Reflected: true
/// Final XOR: 0xFFFF
/// Check Value: 0x906E (for "123456789")
/// Residue: 0xF0B8
pub const SML_CRC: Algorithm<u16> = Algorithm {
    width: 16,
    poly: 0x1021,
    init: 0xFFFF,
    refin: true,
    refout: true,
    xorout: 0xFFFF,
    check: 0x906E,
    residue: 0xF0B8,
};

const CRC_COMPUTER: Crc<u16> = Crc::<u16>::new(&SML_CRC);

/// Number of trailing checksum bytes in a transport frame.
pub const CRC_LEN: usize = 2;

/// Calculates the SML transport CRC-16 for the given buffer.
///
/// The transport checksum covers the whole frame, from the first byte of the
/// start escape sequence up to and including the fill-count byte of the end
/// sequence.
#[inline]
pub fn calculate_crc16(data: &[u8]) -> u16 {
    CRC_COMPUTER.checksum(data)
}

/// Encodes a CRC value the way it trails an SML frame (LSB first).
pub fn encode_crc(crc_value: u16) -> [u8; 2] {
    crc_value.to_le_bytes()
}

/// Decodes the two trailing checksum bytes of a frame.
pub fn decode_crc(crc_bytes: [u8; 2]) -> u16 {
    u16::from_le_bytes(crc_bytes)
}

/// Verifies a complete frame whose last two bytes are its checksum.
///
/// # Returns
///
/// * `Ok(())` if the CRC is valid.
/// * `Err(SmlError::InvalidFrameLength)` if the buffer cannot hold a checksum.
/// * `Err(SmlError::CrcMismatch)` if the CRCs don't match.
pub fn verify_frame_crc<E>(frame_with_crc: &[u8]) -> Result<(), SmlError<E>>
where
    E: core::fmt::Debug,
{
    if frame_with_crc.len() < CRC_LEN {
        return Err(SmlError::InvalidFrameLength { len: frame_with_crc.len(), fill: 0 });
    }
    let data_len = frame_with_crc.len() - CRC_LEN;
    let data_part = &frame_with_crc[..data_len];
    let received_crc = decode_crc([frame_with_crc[data_len], frame_with_crc[data_len + 1]]);

    let calculated_crc = calculate_crc16(data_part);

    if calculated_crc == received_crc {
        Ok(())
    } else {
        Err(SmlError::CrcMismatch { expected: received_crc, calculated: calculated_crc })
    }
}
