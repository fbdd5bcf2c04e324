// src/common/hal_traits.rs

use core::fmt::Debug;

/// Abstraction for the non-blocking serial peer the meter is attached to.
///
/// Only the receive direction is needed: SML meters push their data
/// unsolicited, typically every one to four seconds.
pub trait SmlSerial {
    /// Associated error type for communication errors.
    type Error: Debug;

    /// Number of bytes that can be read without blocking.
    fn available(&self) -> usize;

    /// Attempts to read a single byte from the serial interface.
    ///
    /// Returns `Ok(byte)` if a byte was read, or `Err(nb::Error::WouldBlock)`
    /// if no byte is available yet. Other errors are returned as `Err(nb::Error::Other(Self::Error))`.
    fn read_byte(&mut self) -> nb::Result<u8, Self::Error>;

    /// Reads whatever is ready into `buf` and returns how many bytes were
    /// written. Returns `Ok(0)` when nothing is pending; never blocks.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut count = 0;
        while count < buf.len() {
            match self.read_byte() {
                Ok(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(e)) => return Err(e),
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Debug, PartialEq)]
    struct LineNoise;

    struct QueueSerial {
        queue: VecDeque<Result<u8, LineNoise>>,
    }

    impl SmlSerial for QueueSerial {
        type Error = LineNoise;

        fn available(&self) -> usize {
            self.queue.len()
        }

        fn read_byte(&mut self) -> nb::Result<u8, Self::Error> {
            match self.queue.pop_front() {
                Some(Ok(byte)) => Ok(byte),
                Some(Err(e)) => Err(nb::Error::Other(e)),
                None => Err(nb::Error::WouldBlock),
            }
        }
    }

    #[test]
    fn test_read_available_stops_when_empty() {
        let mut serial = QueueSerial { queue: [Ok(1), Ok(2), Ok(3)].into_iter().collect() };
        let mut buf = [0u8; 8];
        assert_eq!(serial.read_available(&mut buf), Ok(3));
        assert_eq!(&buf[..3], &[1, 2, 3]);
        assert_eq!(serial.read_available(&mut buf), Ok(0));
    }

    #[test]
    fn test_read_available_respects_buffer_size() {
        let mut serial = QueueSerial { queue: [Ok(1), Ok(2), Ok(3)].into_iter().collect() };
        let mut buf = [0u8; 2];
        assert_eq!(serial.read_available(&mut buf), Ok(2));
        assert_eq!(serial.available(), 1);
    }

    #[test]
    fn test_read_available_propagates_errors() {
        let mut serial = QueueSerial { queue: [Ok(1), Err(LineNoise)].into_iter().collect() };
        let mut buf = [0u8; 8];
        assert_eq!(serial.read_available(&mut buf), Err(LineNoise));
    }
}
