// src/common/error.rs

/// Errors produced by the decode pipeline.
///
/// Generic over the transport error `E` so that a failing serial peripheral
/// can be reported without boxing. Everything except [`SmlError::Io`] is
/// recoverable: the offending frame is dropped and decoding resumes at the
/// next frame boundary.
#[derive(Debug, thiserror::Error)]
pub enum SmlError<E = ()>
where
    E: core::fmt::Debug, // Still need Debug for the generic Io error
{
    /// Underlying I/O error from the byte source.
    #[error("I/O error: {0:?}")]
    Io(E),

    /// Received transport checksum does not match the calculated one.
    #[error("CRC mismatch: expected {expected:#06x}, calculated {calculated:#06x}")]
    CrcMismatch { expected: u16, calculated: u16 },

    /// Frame length is not a multiple of four or the fill count is out of range.
    #[error("Invalid frame length: {len} bytes with {fill} fill bytes")]
    InvalidFrameLength { len: usize, fill: u8 },

    /// An escape sequence was followed by an unknown block.
    #[error("Invalid escape sequence inside frame")]
    InvalidEscape,

    /// A frame grew beyond the configured accumulator capacity.
    #[error("Buffer overflow: needed {needed}, got {got}")]
    BufferOverflow { needed: usize, got: usize },

    /// The frame body could not be decoded into SML nodes.
    #[error("Structural error: {0}")]
    Structural(#[from] StructuralError),

    /// An OBIS code or pattern string could not be parsed.
    #[error("Invalid OBIS code")]
    InvalidObisCode,

    /// `poll` was called before `setup`.
    #[error("Component has not been set up")]
    NotSetUp,

    /// Subscriptions are immutable once `setup` has run.
    #[error("Subscriptions are frozen after setup")]
    SubscriptionsFrozen,
}

/// Parse-level failures. Each one aborts decoding of the current frame only.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum StructuralError {
    /// A node declares more bytes than are left in the frame body.
    #[error("length at offset {offset} needs {needed} bytes, {remaining} remaining")]
    LengthExceedsFrame { offset: usize, needed: usize, remaining: usize },

    /// The type bits of a TL byte are not a known SML type.
    #[error("unknown type in TL byte {tl:#04x} at offset {offset}")]
    UnknownType { offset: usize, tl: u8 },

    /// A list ended after a different number of children than it declared.
    #[error("list declared {declared} children, decoded {decoded}")]
    CountMismatch { declared: usize, decoded: usize },

    /// Lists are nested deeper than the configured maximum.
    #[error("nesting deeper than {max} levels")]
    DepthExceeded { max: usize },

    /// A value's length is shorter than its own TL header.
    #[error("length {length} at offset {offset} is shorter than its header")]
    InvalidLength { offset: usize, length: usize },

    /// An integer or boolean has a width the type cannot hold.
    #[error("invalid width {width} at offset {offset}")]
    InvalidWidth { offset: usize, width: usize },

    /// A top-level item is not a message list.
    #[error("top-level item at offset {offset} is not a list")]
    NotAList { offset: usize },

    /// A message list does not end with the end-of-message marker.
    #[error("message is not terminated by end-of-message")]
    MissingEndOfMessage,

    /// Non-zero bytes follow the fill marker.
    #[error("unexpected data after fill at offset {offset}")]
    TrailingBytes { offset: usize },
}

/// Result alias used throughout the crate.
pub type SmlResult<T, E = ()> = Result<T, SmlError<E>>;
