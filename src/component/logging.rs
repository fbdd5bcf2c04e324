// src/component/logging.rs

use crate::dispatch::{record::ObisRecord, server_id::server_id_repr};
use crate::transport::frame::FrameBody;

/// Human-readable trace of decoded frames, emitted at `info` level.
///
/// Enabled or disabled once at construction; a disabled sink costs nothing
/// per record.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LogSink {
    enabled: bool,
}

impl LogSink {
    pub const fn new(enabled: bool) -> Self {
        LogSink { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn frame(&self, body: &FrameBody, messages: usize) {
        if self.enabled {
            log::info!(
                "SML frame: {} bytes on the wire, {} payload bytes, {} messages",
                body.frame_len(),
                body.as_bytes().len(),
                messages
            );
        }
    }

    pub fn record(&self, record: &ObisRecord) {
        if !self.enabled {
            return;
        }
        let unit = record.unit_symbol().unwrap_or("");
        log::info!(
            "  ({}) {} = {}{}{}",
            server_id_repr(&record.server_id),
            record.code,
            record.render(None),
            if unit.is_empty() { "" } else { " " },
            unit
        );
    }
}
