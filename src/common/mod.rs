// src/common/mod.rs

// --- Declare all public modules within common ---
pub mod config;
pub mod crc;
pub mod error;
pub mod hal_traits;
pub mod obis;
pub mod statistics;
pub mod types;

// --- Re-export key types/traits/functions for easier access ---

// From config.rs
pub use config::SmlConfig;

// From crc.rs
pub use crc::{calculate_crc16, decode_crc, encode_crc, verify_frame_crc};

// From error.rs
pub use error::{SmlError, SmlResult, StructuralError};

// From hal_traits.rs
pub use hal_traits::SmlSerial;

// From obis.rs
pub use obis::{ObisCode, ObisPattern};

// From statistics.rs
pub use statistics::SmlStatistics;

// From types.rs
pub use types::{SmlType, ValueNode};
