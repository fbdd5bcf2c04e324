// src/lib.rs

#![cfg_attr(not(test), no_std)] // no_std outside of unit tests

extern crate alloc;

pub mod common;
pub mod component;
pub mod dispatch;
pub mod parser;
pub mod transport;

#[cfg(test)]
mod fixtures;

// Re-export key types for convenience
pub use common::{ObisCode, ObisPattern, SmlConfig, SmlError, SmlSerial, SmlStatistics, StructuralError, ValueNode};
pub use component::{LogSink, Sml};
pub use dispatch::{ObisDispatcher, ObisRecord, SmlListener, Subscription, ValueFormat};
pub use parser::SmlFile;
pub use transport::{FrameAssembler, RawFrame};
