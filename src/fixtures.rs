// src/fixtures.rs

// Message builders shared by the unit tests.

use crate::common::types::ValueNode;
pub use crate::dispatch::dispatcher::GET_LIST_RESPONSE;
use crate::parser::encode::{encode_frame, encode_messages};
use alloc::vec::Vec;
use std::cell::RefCell;
use std::sync::Once;

pub const SERVER_ID: [u8; 10] = [0x0A, 0x01, 0x45, 0x53, 0x59, 0x11, 0x03, 0x7A, 0xB1, 0x2C];

const PUBLIC_OPEN_RESPONSE: u64 = 0x0101;
const PUBLIC_CLOSE_RESPONSE: u64 = 0x0201;

fn octets(bytes: &[u8]) -> ValueNode {
    ValueNode::OctetString(bytes.to_vec())
}

fn absent() -> ValueNode {
    ValueNode::OctetString(Vec::new())
}

/// Wraps a message body in the six-element message envelope.
pub fn message(transaction_id: u8, tag: u64, payload: ValueNode) -> ValueNode {
    ValueNode::List(vec![
        octets(&[transaction_id]),
        ValueNode::Unsigned(0),
        ValueNode::Unsigned(0),
        ValueNode::List(vec![ValueNode::Unsigned(tag), payload]),
        ValueNode::Unsigned(0x1234),
        ValueNode::EndOfMessage,
    ])
}

pub fn value_entry(obis: [u8; 6], unit: Option<u8>, scaler: Option<i8>, value: ValueNode) -> ValueNode {
    ValueNode::List(vec![
        octets(&obis),
        absent(),
        absent(),
        unit.map_or_else(absent, |u| ValueNode::Unsigned(u64::from(u))),
        scaler.map_or_else(absent, |s| ValueNode::Integer(i64::from(s))),
        value,
        absent(),
    ])
}

pub fn open_response() -> ValueNode {
    message(
        1,
        PUBLIC_OPEN_RESPONSE,
        ValueNode::List(vec![absent(), absent(), octets(b"file"), octets(&SERVER_ID), absent(), absent()]),
    )
}

pub fn get_list_response(server_id: &[u8], entries: Vec<ValueNode>) -> ValueNode {
    message(
        2,
        GET_LIST_RESPONSE,
        ValueNode::List(vec![
            absent(),
            octets(server_id),
            absent(),
            absent(),
            ValueNode::List(entries),
            absent(),
            absent(),
        ]),
    )
}

pub fn close_response() -> ValueNode {
    message(3, PUBLIC_CLOSE_RESPONSE, ValueNode::List(vec![absent()]))
}

/// Total energy import, 12345 with scaler -2 (123.45 Wh).
pub fn energy_entry() -> ValueNode {
    value_entry([1, 0, 1, 8, 0, 255], Some(30), Some(-2), ValueNode::Integer(12345))
}

/// Current active power, 230 W.
pub fn power_entry() -> ValueNode {
    value_entry([1, 0, 16, 7, 0, 255], Some(27), Some(0), ValueNode::Integer(230))
}

/// Open, list and close responses as one frame body.
pub fn meter_body(entries: Vec<ValueNode>) -> Vec<u8> {
    encode_messages(&[open_response(), get_list_response(&SERVER_ID, entries), close_response()])
}

pub fn meter_frame(entries: Vec<ValueNode>) -> Vec<u8> {
    encode_frame(&meter_body(entries))
}

/// Collects `info` lines logged on the current thread.
struct CaptureLogger;

thread_local! {
    static CAPTURED: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

impl log::Log for CaptureLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() == log::Level::Info
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        CAPTURED.with(|captured| {
            if let Some(lines) = captured.borrow_mut().as_mut() {
                lines.push(record.args().to_string());
            }
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;
static INSTALL: Once = Once::new();

/// Runs `f` and returns its result with the `info` lines it logged.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
    INSTALL.call_once(|| {
        // tests share one process-wide logger
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(log::LevelFilter::Trace);
    });
    CAPTURED.with(|captured| *captured.borrow_mut() = Some(Vec::new()));
    let out = f();
    let lines = CAPTURED.with(|captured| captured.borrow_mut().take()).unwrap_or_default();
    (out, lines)
}
