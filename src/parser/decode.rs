// src/parser/decode.rs

use crate::common::{config::DEFAULT_MAX_DEPTH, error::StructuralError, types::{SmlType, ValueNode}};
use alloc::vec::Vec;

/// TL byte of the end-of-message marker (and of fill at the top level).
pub const END_OF_MESSAGE: u8 = 0x00;

/// Bit 7 of a TL byte: another TL byte follows.
const TL_MORE: u8 = 0x80;
const TL_TYPE_MASK: u8 = 0x70;
const TL_LEN_MASK: u8 = 0x0F;
/// Longest TL header accepted; eight nibbles already describe 4 GiB.
const MAX_TL_BYTES: usize = 8;

/// The messages contained in one validated frame body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmlFile {
    messages: Vec<ValueNode>,
}

impl SmlFile {
    /// Decodes every message in `body`.
    ///
    /// Messages are read until the body ends or a `0x00` fill byte is met at
    /// the top level; anything but fill after that point is an error. Each
    /// message must be a list closed by the end-of-message marker.
    pub fn parse(body: &[u8], max_depth: usize) -> Result<Self, StructuralError> {
        let mut decoder = Decoder::new(body, max_depth);
        let mut messages = Vec::new();

        while decoder.pos < body.len() {
            if body[decoder.pos] == END_OF_MESSAGE {
                let tail = &body[decoder.pos..];
                if let Some(i) = tail.iter().position(|b| *b != END_OF_MESSAGE) {
                    return Err(StructuralError::TrailingBytes { offset: decoder.pos + i });
                }
                break;
            }

            let offset = decoder.pos;
            let message = decoder.read_node()?;
            match &message {
                ValueNode::List(children) => {
                    if !matches!(children.last(), Some(ValueNode::EndOfMessage)) {
                        return Err(StructuralError::MissingEndOfMessage);
                    }
                }
                _ => return Err(StructuralError::NotAList { offset }),
            }
            messages.push(message);
        }

        Ok(SmlFile { messages })
    }

    pub fn messages(&self) -> &[ValueNode] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<ValueNode> {
        self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Decodes a single node (scalar or list) from the start of `bytes`.
///
/// Returns the node and the number of bytes it occupied.
pub fn parse_node(bytes: &[u8]) -> Result<(ValueNode, usize), StructuralError> {
    let mut decoder = Decoder::new(bytes, DEFAULT_MAX_DEPTH);
    let node = decoder.read_node()?;
    Ok((node, decoder.pos))
}

// --- Internal decoder ---

/// Decoded TL header.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Header {
    EndOfMessage,
    List { count: usize },
    OctetString { len: usize },
    Boolean { len: usize },
    Integer { len: usize },
    Unsigned { len: usize },
}

/// A list whose children are still being decoded.
struct OpenList {
    declared: usize,
    children: Vec<ValueNode>,
}

struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
    max_depth: usize,
}

impl<'a> Decoder<'a> {
    fn new(buf: &'a [u8], max_depth: usize) -> Self {
        Decoder { buf, pos: 0, max_depth }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn byte_at(&self, offset: usize) -> Result<u8, StructuralError> {
        self.buf.get(offset).copied().ok_or(StructuralError::LengthExceedsFrame {
            offset,
            needed: 1,
            remaining: 0,
        })
    }

    /// Reads one complete node. Lists are assembled on an explicit stack so
    /// malformed input cannot drive native recursion.
    fn read_node(&mut self) -> Result<ValueNode, StructuralError> {
        let mut stack: Vec<OpenList> = Vec::new();

        loop {
            let offset = self.pos;
            let mut node = match self.read_header()? {
                Header::List { count: 0 } => ValueNode::List(Vec::new()),
                Header::List { count } => {
                    if stack.len() >= self.max_depth {
                        return Err(StructuralError::DepthExceeded { max: self.max_depth });
                    }
                    // a hostile count must not reserve more than the frame could hold
                    let capacity = count.min(self.remaining());
                    stack.push(OpenList { declared: count, children: Vec::with_capacity(capacity) });
                    continue;
                }
                Header::EndOfMessage => ValueNode::EndOfMessage,
                Header::OctetString { len } => ValueNode::OctetString(self.take(offset, len)?.to_vec()),
                Header::Boolean { len } => {
                    let content = self.take(offset, len)?;
                    if len != 1 {
                        return Err(StructuralError::InvalidWidth { offset, width: len });
                    }
                    ValueNode::Boolean(content[0] != 0)
                }
                Header::Integer { len } => {
                    let content = self.take(offset, len)?;
                    let value = bytes_to_int(content).ok_or(StructuralError::InvalidWidth { offset, width: len })?;
                    ValueNode::Integer(value)
                }
                Header::Unsigned { len } => {
                    let content = self.take(offset, len)?;
                    let value = bytes_to_uint(content).ok_or(StructuralError::InvalidWidth { offset, width: len })?;
                    ValueNode::Unsigned(value)
                }
            };

            // Hand the finished node to its parent, closing every list it completes.
            loop {
                let Some(mut parent) = stack.pop() else {
                    return Ok(node);
                };
                let is_end = matches!(node, ValueNode::EndOfMessage);
                parent.children.push(node);
                if parent.children.len() < parent.declared {
                    if is_end {
                        return Err(StructuralError::CountMismatch {
                            declared: parent.declared,
                            decoded: parent.children.len(),
                        });
                    }
                    stack.push(parent);
                    break;
                }
                node = ValueNode::List(parent.children);
            }
        }
    }

    fn read_header(&mut self) -> Result<Header, StructuralError> {
        let start = self.pos;
        let first = self.byte_at(start)?;
        if first == END_OF_MESSAGE {
            self.pos += 1;
            return Ok(Header::EndOfMessage);
        }

        let ty = SmlType::from_bits((first & TL_TYPE_MASK) >> 4)
            .ok_or(StructuralError::UnknownType { offset: start, tl: first })?;

        let mut length = usize::from(first & TL_LEN_MASK);
        let mut tl_len = 1;
        let mut more = first & TL_MORE != 0;
        while more {
            let offset = start + tl_len;
            if tl_len == MAX_TL_BYTES {
                return Err(StructuralError::InvalidLength { offset: start, length });
            }
            let next = self.byte_at(offset)?;
            if next & TL_TYPE_MASK != 0 {
                return Err(StructuralError::UnknownType { offset, tl: next });
            }
            length = (length << 4) | usize::from(next & TL_LEN_MASK);
            tl_len += 1;
            more = next & TL_MORE != 0;
        }
        self.pos = start + tl_len;

        if ty == SmlType::List {
            return Ok(Header::List { count: length });
        }

        // for values the length includes the TL bytes themselves
        let len = length
            .checked_sub(tl_len)
            .ok_or(StructuralError::InvalidLength { offset: start, length })?;
        Ok(match ty {
            SmlType::OctetString => Header::OctetString { len },
            SmlType::Boolean => Header::Boolean { len },
            SmlType::Integer => Header::Integer { len },
            SmlType::Unsigned => Header::Unsigned { len },
            SmlType::List => Header::List { count: length },
        })
    }

    /// Consumes `len` content bytes of the node starting at `offset`.
    fn take(&mut self, offset: usize, len: usize) -> Result<&'a [u8], StructuralError> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(StructuralError::LengthExceedsFrame { offset, needed: len, remaining });
        }
        let buf: &'a [u8] = self.buf;
        let content = &buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(content)
    }
}

/// Big-endian unsigned value of 1..=8 bytes.
pub fn bytes_to_uint(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() || bytes.len() > 8 {
        return None;
    }
    Some(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
}

/// Big-endian two's complement value of 1..=8 bytes, sign-extended.
pub fn bytes_to_int(bytes: &[u8]) -> Option<i64> {
    let raw = bytes_to_uint(bytes)?;
    let shift = 64 - 8 * bytes.len() as u32;
    Some(((raw << shift) as i64) >> shift)
}
