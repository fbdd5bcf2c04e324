// src/transport/assembler.rs

use super::frame::{RawFrame, BEGIN_MARKER, BLOCK_LEN, END_MARKER, ESCAPE, START_SEQUENCE};
use crate::common::{config::DEFAULT_MAX_FRAME_LEN, crc::verify_frame_crc, error::SmlError};
use alloc::vec::Vec;
use heapless::Deque;

/// Finds frame boundaries in an unaligned byte stream.
///
/// Bytes are pushed one at a time; state survives between calls so a frame
/// may arrive spread over any number of reads. Bytes outside a frame are
/// ignored. Once inside a frame the stream is block aligned, and every block
/// following an escape block decides what happens next:
///
/// * `1B 1B 1B 1B`: escaped payload data, kept as is.
/// * `01 01 01 01`: a new frame starts, the partial one is discarded.
/// * `1A xx xx xx`: end of frame, the accumulated bytes are emitted.
/// * anything else: the frame is discarded.
///
/// A start sequence that does not sit on the block grid is either payload
/// data or the start of a new frame after bytes were lost. It is tracked as
/// a candidate on its own grid until one of the two frames resolves it:
///
/// * the current frame ends with a valid checksum: the candidate was data.
/// * the candidate ends with a valid checksum first: the current frame was
///   truncated and is abandoned.
/// * the current frame ends with a bad checksum, hits an invalid escape or
///   outgrows `max_frame_len`: assembly continues from the candidate.
#[derive(Debug)]
pub struct FrameAssembler {
    window: Deque<u8, 8>,
    buffer: Vec<u8>,
    in_frame: bool,
    escape_pending: bool,
    candidate: Option<Candidate>,
    max_frame_len: usize,
    restarts: u64,
}

/// Start sequence seen off the block grid of the current frame.
#[derive(Debug, Copy, Clone)]
struct Candidate {
    offset: usize,
    escape_pending: bool,
}

impl FrameAssembler {
    pub fn new(max_frame_len: usize) -> Self {
        FrameAssembler {
            window: Deque::new(),
            buffer: Vec::new(),
            in_frame: false,
            escape_pending: false,
            candidate: None,
            max_frame_len: max_frame_len.max(START_SEQUENCE.len()),
            restarts: 0,
        }
    }

    /// Reserves the accumulator up front so steady-state decoding does not allocate.
    pub fn reserve(&mut self) {
        self.buffer.reserve(self.max_frame_len.saturating_sub(self.buffer.capacity()));
    }

    pub fn is_in_frame(&self) -> bool {
        self.in_frame
    }

    /// Partial frames abandoned because a new start sequence arrived.
    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    /// Feeds one byte.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(frame))` when the byte completed a frame.
    /// * `Ok(None)` when more bytes are needed.
    /// * `Err(SmlError::BufferOverflow)` if the frame outgrew `max_frame_len`; it is dropped.
    /// * `Err(SmlError::InvalidEscape)` for an unknown control block; the frame is dropped.
    pub fn push(&mut self, byte: u8) -> Result<Option<RawFrame>, SmlError> {
        if !self.in_frame {
            self.hunt(byte);
            return Ok(None);
        }

        if self.buffer.len() >= self.max_frame_len {
            if !self.promote_candidate() {
                self.reset();
                return Err(SmlError::BufferOverflow { needed: self.max_frame_len + 1, got: self.max_frame_len });
            }
            self.restarts += 1;
            log::debug!("frame outgrew {} bytes, continuing from unaligned start", self.max_frame_len);
        }
        self.buffer.push(byte);

        let len = self.buffer.len();
        if len % BLOCK_LEN != 0 {
            return Ok(self.track_candidate(len));
        }

        let block = self.last_block();
        if !self.escape_pending {
            self.escape_pending = block == ESCAPE;
            return Ok(None);
        }
        self.escape_pending = false;

        if block == ESCAPE {
            Ok(None)
        } else if block == BEGIN_MARKER {
            self.restart();
            Ok(None)
        } else if block[0] == END_MARKER {
            Ok(Some(self.finish_frame()))
        } else {
            if !self.promote_candidate() {
                self.reset();
            }
            Err(SmlError::InvalidEscape)
        }
    }

    /// Lazily yields the frames completed by `bytes`.
    ///
    /// The iterator borrows the assembler, so dropping it early leaves the
    /// remaining state intact for the next call.
    pub fn frames<I>(&mut self, bytes: I) -> Frames<'_, I::IntoIter>
    where
        I: IntoIterator<Item = u8>,
    {
        Frames { assembler: self, bytes: bytes.into_iter() }
    }

    /// Drops any partial frame and starts hunting again.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.window.clear();
        self.in_frame = false;
        self.escape_pending = false;
        self.candidate = None;
    }

    fn hunt(&mut self, byte: u8) {
        if self.window.is_full() {
            self.window.pop_front();
        }
        // cannot fail, a slot was just freed
        let _ = self.window.push_back(byte);
        if self.window.iter().eq(START_SEQUENCE.iter()) {
            self.begin_frame();
        }
    }

    fn begin_frame(&mut self) {
        self.buffer.clear();
        self.buffer.extend_from_slice(&START_SEQUENCE);
        self.window.clear();
        self.in_frame = true;
        self.escape_pending = false;
        self.candidate = None;
    }

    fn restart(&mut self) {
        self.restarts += 1;
        log::debug!("start sequence inside frame after {} bytes, restarting", self.buffer.len());
        self.begin_frame();
    }

    fn last_block(&self) -> [u8; BLOCK_LEN] {
        let mut block = [0u8; BLOCK_LEN];
        block.copy_from_slice(&self.buffer[self.buffer.len() - BLOCK_LEN..]);
        block
    }

    /// Runs the candidate's escape state machine on its own block grid, or
    /// records a new candidate when an unaligned start sequence just completed.
    fn track_candidate(&mut self, len: usize) -> Option<RawFrame> {
        if let Some(mut candidate) = self.candidate {
            if (len - candidate.offset) % BLOCK_LEN == 0 {
                let block = self.last_block();
                if !candidate.escape_pending {
                    candidate.escape_pending = block == ESCAPE;
                    self.candidate = Some(candidate);
                    return None;
                }
                candidate.escape_pending = false;
                self.candidate = Some(candidate);

                if block == ESCAPE {
                    return None;
                }
                if block == BEGIN_MARKER {
                    self.candidate = Some(Candidate { offset: len - START_SEQUENCE.len(), escape_pending: false });
                    return None;
                }
                if block[0] == END_MARKER && verify_frame_crc::<()>(&self.buffer[candidate.offset..]).is_ok() {
                    let bytes = self.buffer.split_off(candidate.offset);
                    self.restarts += 1;
                    log::debug!("unaligned frame completed first, dropping {} bytes before it", candidate.offset);
                    self.reset();
                    return Some(RawFrame::new(bytes));
                }
                self.candidate = None;
                return None;
            }
        }

        if self.buffer[len - START_SEQUENCE.len()..] == START_SEQUENCE {
            log::trace!("unaligned start sequence at offset {}", len - START_SEQUENCE.len());
            self.candidate = Some(Candidate { offset: len - START_SEQUENCE.len(), escape_pending: false });
        }
        None
    }

    /// Emits the current frame. With a pending candidate, a frame that fails
    /// its checksum is still emitted but assembly continues from the candidate.
    fn finish_frame(&mut self) -> RawFrame {
        let candidate = self.candidate.take();
        let bytes = match candidate {
            Some(candidate) if verify_frame_crc::<()>(&self.buffer).is_err() => {
                let tail = self.buffer.split_off(candidate.offset);
                self.escape_pending = candidate.escape_pending;
                log::debug!("frame failed its checksum, continuing from offset {}", candidate.offset);
                core::mem::replace(&mut self.buffer, tail)
            }
            _ => {
                let bytes = core::mem::take(&mut self.buffer);
                self.reset();
                bytes
            }
        };
        log::trace!("frame complete: {} bytes", bytes.len());
        RawFrame::new(bytes)
    }

    /// Drops the current frame in favour of the candidate, if there is one.
    fn promote_candidate(&mut self) -> bool {
        let Some(candidate) = self.candidate.take() else {
            return false;
        };
        self.buffer.drain(..candidate.offset);
        self.escape_pending = candidate.escape_pending;
        true
    }
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_LEN)
    }
}

/// Iterator returned by [`FrameAssembler::frames`].
#[derive(Debug)]
pub struct Frames<'a, I> {
    assembler: &'a mut FrameAssembler,
    bytes: I,
}

impl<I> Iterator for Frames<'_, I>
where
    I: Iterator<Item = u8>,
{
    type Item = Result<RawFrame, SmlError>;

    fn next(&mut self) -> Option<Self::Item> {
        for byte in self.bytes.by_ref() {
            match self.assembler.push(byte) {
                Ok(None) => continue,
                Ok(Some(frame)) => return Some(Ok(frame)),
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}
