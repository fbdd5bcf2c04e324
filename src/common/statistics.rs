// src/common/statistics.rs

/// Diagnostic counters of the decode pipeline.
///
/// Recoverable failures never surface as errors from `poll`; a caller that
/// wants to know why no records arrive reads these instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmlStatistics {
    /// Bytes taken from the serial peer.
    pub bytes_received: u64,
    /// Complete frames emitted by the assembler.
    pub frames_received: u64,
    /// Frames that passed CRC and parsing.
    pub frames_decoded: u64,
    pub crc_errors: u64,
    /// Frames with a bad length field or escape sequence.
    pub framing_errors: u64,
    pub structural_errors: u64,
    /// Frames abandoned because they outgrew the accumulator.
    pub overflows: u64,
    /// Frames abandoned because a new start sequence arrived first.
    pub restarts: u64,
    /// Records that reached at least one subscription.
    pub records_dispatched: u64,
    /// Records no subscription asked for.
    pub records_unmatched: u64,
}

impl SmlStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Frames dropped as corrupt or oversized.
    ///
    /// Partial frames abandoned for a new start sequence are counted in
    /// `restarts` only.
    pub fn frames_rejected(&self) -> u64 {
        self.crc_errors + self.framing_errors + self.structural_errors + self.overflows
    }
}
