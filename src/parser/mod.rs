// src/parser/mod.rs

// SML TLV decoding of validated frame bodies, and the matching encoder.
pub mod decode;
pub mod encode;

pub use decode::{parse_node, SmlFile, END_OF_MESSAGE};
pub use encode::{encode_frame, encode_messages, encode_node};
