// src/transport/mod.rs

// SML transport protocol v1: escape-delimited frames with a trailing CRC.
pub mod assembler;
pub mod frame;

pub use assembler::{FrameAssembler, Frames};
pub use frame::{FrameBody, RawFrame};
