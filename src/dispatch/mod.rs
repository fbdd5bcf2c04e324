// src/dispatch/mod.rs

// Turns decoded message trees into OBIS records and routes them to listeners.
pub mod dispatcher;
pub mod record;
pub mod server_id;

pub use dispatcher::{extract_records, DispatchCounts, ObisDispatcher, SmlListener, Subscription, GET_LIST_RESPONSE};
pub use record::{unit_symbol, ObisRecord, ValueFormat};
pub use server_id::server_id_repr;
