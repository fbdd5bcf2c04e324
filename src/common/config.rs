// src/common/config.rs

// === Defaults ===

/// Largest frame the assembler accumulates before giving up on it.
/// Typical household meters send 300..600 byte frames.
pub const DEFAULT_MAX_FRAME_LEN: usize = 2048;

/// Deepest list nesting accepted by the parser. Real SML trees stay below 6.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Bytes consumed from the serial peer per `poll` call.
pub const DEFAULT_MAX_BYTES_PER_POLL: usize = 256;

/// Runtime configuration of the [`Sml`](crate::component::Sml) component.
///
/// Set once when the component is built; nothing here can change afterwards.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SmlConfig {
    /// Emit a human-readable trace of every decoded frame.
    pub logging: bool,
    pub max_frame_len: usize,
    pub max_depth: usize,
    pub max_bytes_per_poll: usize,
}

impl SmlConfig {
    pub const fn new() -> Self {
        Self {
            logging: false,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            max_depth: DEFAULT_MAX_DEPTH,
            max_bytes_per_poll: DEFAULT_MAX_BYTES_PER_POLL,
        }
    }

    pub const fn with_logging(mut self, logging: bool) -> Self {
        self.logging = logging;
        self
    }

    pub const fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// A zero budget would stall the pipeline, so at least one byte is read per poll.
    pub const fn with_max_bytes_per_poll(mut self, max_bytes_per_poll: usize) -> Self {
        self.max_bytes_per_poll = if max_bytes_per_poll == 0 { 1 } else { max_bytes_per_poll };
        self
    }
}

impl Default for SmlConfig {
    fn default() -> Self {
        Self::new()
    }
}
