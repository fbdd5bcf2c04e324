// src/component/mod.rs

// Poll-driven meter reader wiring the whole pipeline together.
pub mod logging;

use crate::common::{
    config::SmlConfig,
    error::SmlError,
    hal_traits::SmlSerial,
    obis::ObisPattern,
    statistics::SmlStatistics,
};
use crate::dispatch::dispatcher::{extract_records, ObisDispatcher, SmlListener, Subscription};
use crate::parser::decode::SmlFile;
use crate::transport::{assembler::FrameAssembler, frame::RawFrame};
use alloc::vec::Vec;
use core::fmt::Debug;

pub use logging::LogSink;

/// Reads an SML meter attached to `serial` and notifies subscribers of every
/// OBIS value it reports.
///
/// Lifecycle: register subscriptions, call [`Sml::setup`] once, then call
/// [`Sml::poll`] from the host loop. Each poll consumes at most
/// `max_bytes_per_poll` bytes and never blocks.
#[derive(Debug)]
pub struct Sml<S>
where
    S: SmlSerial,
{
    serial: S,
    config: SmlConfig,
    assembler: FrameAssembler,
    dispatcher: ObisDispatcher,
    sink: LogSink,
    stats: SmlStatistics,
    read_buf: Vec<u8>,
    set_up: bool,
}

impl<S> Sml<S>
where
    S: SmlSerial,
    S::Error: Debug,
{
    pub fn new(serial: S, config: SmlConfig) -> Self {
        Sml {
            serial,
            config,
            assembler: FrameAssembler::new(config.max_frame_len),
            dispatcher: ObisDispatcher::new(),
            sink: LogSink::new(config.logging),
            stats: SmlStatistics::new(),
            read_buf: Vec::new(),
            set_up: false,
        }
    }

    /// Registers `listener` for every record whose code matches `pattern`.
    ///
    /// # Errors
    ///
    /// `SmlError::SubscriptionsFrozen` once [`Sml::setup`] has run.
    pub fn subscribe<L>(&mut self, pattern: ObisPattern, listener: L) -> Result<(), SmlError<S::Error>>
    where
        L: SmlListener + 'static,
    {
        self.add_subscription(Subscription::new(pattern, listener))
    }

    /// Like [`Sml::subscribe`], for subscriptions built with a server id filter.
    pub fn add_subscription(&mut self, subscription: Subscription) -> Result<(), SmlError<S::Error>> {
        if self.set_up {
            return Err(SmlError::SubscriptionsFrozen);
        }
        self.dispatcher.subscribe(subscription);
        Ok(())
    }

    /// Allocates the frame and read buffers and freezes the subscriptions.
    /// Calling it again has no effect.
    pub fn setup(&mut self) {
        if self.set_up {
            return;
        }
        self.assembler.reserve();
        self.read_buf.resize(self.config.max_bytes_per_poll, 0);
        self.set_up = true;
        log::debug!(
            "SML setup: logging={}, max_frame_len={}, max_depth={}, {} subscriptions",
            self.config.logging,
            self.config.max_frame_len,
            self.config.max_depth,
            self.dispatcher.len()
        );
    }

    pub fn is_set_up(&self) -> bool {
        self.set_up
    }

    /// Reads whatever the serial peer has ready and processes every frame it
    /// completes.
    ///
    /// # Returns
    ///
    /// * `Ok(n)` with the number of records delivered to listeners.
    /// * `Err(SmlError::NotSetUp)` if [`Sml::setup`] has not been called.
    /// * `Err(SmlError::Io)` if the serial peer failed.
    ///
    /// Bad frames are not errors; they show up in [`Sml::statistics`].
    pub fn poll(&mut self) -> Result<usize, SmlError<S::Error>> {
        if !self.set_up {
            return Err(SmlError::NotSetUp);
        }
        let mut buf = core::mem::take(&mut self.read_buf);
        let result = self.serial.read_available(&mut buf);
        let dispatched = match result {
            Ok(count) => Ok(self.process_bytes(&buf[..count])),
            Err(e) => Err(SmlError::Io(e)),
        };
        self.read_buf = buf;
        dispatched
    }

    /// Feeds bytes that did not come from the serial peer, e.g. a recorded
    /// capture. Returns the number of records delivered to listeners.
    pub fn process_bytes(&mut self, bytes: &[u8]) -> usize {
        self.stats.bytes_received += bytes.len() as u64;
        let restarts_before = self.assembler.restarts();
        let mut dispatched = 0;
        for &byte in bytes {
            match self.assembler.push(byte) {
                Ok(None) => {}
                Ok(Some(frame)) => dispatched += self.handle_frame(&frame),
                Err(e) => self.reject(&e, None),
            }
        }
        self.stats.restarts += self.assembler.restarts() - restarts_before;
        dispatched
    }

    pub fn statistics(&self) -> &SmlStatistics {
        &self.stats
    }

    pub fn clear_statistics(&mut self) {
        self.stats.clear();
    }

    pub fn config(&self) -> &SmlConfig {
        &self.config
    }

    pub fn serial(&self) -> &S {
        &self.serial
    }

    pub fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }

    /// Gives the serial peer back.
    pub fn release(self) -> S {
        self.serial
    }

    // --- Pipeline ---

    fn handle_frame(&mut self, frame: &RawFrame) -> usize {
        self.stats.frames_received += 1;
        log::trace!("frame bytes: {:02x?}", frame.as_bytes());

        let body = match frame.validate::<()>() {
            Ok(body) => body,
            Err(e) => {
                self.reject(&e, Some(frame.len()));
                return 0;
            }
        };
        let file = match SmlFile::parse(body.as_bytes(), self.config.max_depth) {
            Ok(file) => file,
            Err(e) => {
                self.reject(&SmlError::Structural(e), Some(frame.len()));
                return 0;
            }
        };
        self.stats.frames_decoded += 1;
        self.sink.frame(&body, file.messages().len());

        let mut dispatched = 0;
        for record in extract_records(file.messages()) {
            self.sink.record(&record);
            if self.dispatcher.dispatch_record(&record) {
                dispatched += 1;
                self.stats.records_dispatched += 1;
            } else {
                self.stats.records_unmatched += 1;
            }
        }
        dispatched
    }

    fn reject(&mut self, error: &SmlError, frame_len: Option<usize>) {
        match error {
            SmlError::CrcMismatch { .. } => self.stats.crc_errors += 1,
            SmlError::InvalidFrameLength { .. } | SmlError::InvalidEscape => self.stats.framing_errors += 1,
            SmlError::BufferOverflow { .. } => self.stats.overflows += 1,
            SmlError::Structural(_) => self.stats.structural_errors += 1,
            _ => {}
        }
        match frame_len {
            Some(len) => log::warn!("dropping {} byte frame: {}", len, error),
            None => log::warn!("dropping partial frame: {}", error),
        }
    }
}
