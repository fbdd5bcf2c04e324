// src/parser/encode.rs

use crate::common::{
    crc::{calculate_crc16, encode_crc},
    types::{SmlType, ValueNode},
};
use crate::transport::frame::{BLOCK_LEN, END_MARKER, ESCAPE, START_SEQUENCE};
use alloc::vec::Vec;

/// Appends the TLV encoding of `node` to `out`.
///
/// Integers use the smallest of 1, 2, 4 or 8 bytes that holds the value.
pub fn encode_node(node: &ValueNode, out: &mut Vec<u8>) {
    match node {
        ValueNode::EndOfMessage => out.push(0x00),
        ValueNode::OctetString(bytes) => {
            write_value_tl(SmlType::OctetString, bytes.len(), out);
            out.extend_from_slice(bytes);
        }
        ValueNode::Boolean(b) => {
            write_value_tl(SmlType::Boolean, 1, out);
            out.push(u8::from(*b));
        }
        ValueNode::Integer(v) => {
            let width = signed_width(*v);
            write_value_tl(SmlType::Integer, width, out);
            out.extend_from_slice(&v.to_be_bytes()[8 - width..]);
        }
        ValueNode::Unsigned(v) => {
            let width = unsigned_width(*v);
            write_value_tl(SmlType::Unsigned, width, out);
            out.extend_from_slice(&v.to_be_bytes()[8 - width..]);
        }
        ValueNode::List(children) => {
            write_tl(SmlType::List, children.len(), tl_len_for(children.len(), false), out);
            for child in children {
                encode_node(child, out);
            }
        }
    }
}

/// Encodes a sequence of messages back to back.
pub fn encode_messages(messages: &[ValueNode]) -> Vec<u8> {
    let mut out = Vec::new();
    for message in messages {
        encode_node(message, &mut out);
    }
    out
}

/// Wraps `body` in a transport v1 frame: start sequence, escaped and padded
/// payload, end sequence with fill count and checksum.
pub fn encode_frame(body: &[u8]) -> Vec<u8> {
    let fill = (BLOCK_LEN - body.len() % BLOCK_LEN) % BLOCK_LEN;
    let mut padded = Vec::with_capacity(body.len() + fill);
    padded.extend_from_slice(body);
    padded.resize(body.len() + fill, 0x00);

    let mut frame = Vec::with_capacity(padded.len() + START_SEQUENCE.len() + 2 * BLOCK_LEN);
    frame.extend_from_slice(&START_SEQUENCE);
    for block in padded.chunks_exact(BLOCK_LEN) {
        frame.extend_from_slice(block);
        if block == ESCAPE {
            frame.extend_from_slice(&ESCAPE);
        }
    }
    frame.extend_from_slice(&ESCAPE);
    frame.push(END_MARKER);
    frame.push(fill as u8);
    let crc = calculate_crc16(&frame);
    frame.extend_from_slice(&encode_crc(crc));
    frame
}

// --- TL helpers ---

fn write_value_tl(ty: SmlType, content_len: usize, out: &mut Vec<u8>) {
    let tl_len = tl_len_for(content_len, true);
    write_tl(ty, content_len + tl_len, tl_len, out);
}

/// Number of TL bytes needed. For values the encoded length counts the TL
/// bytes as well, which can push it over a nibble boundary.
fn tl_len_for(len: usize, includes_self: bool) -> usize {
    let mut tl_len = 1;
    loop {
        let total = if includes_self { len + tl_len } else { len };
        let bits = 4 * tl_len;
        if bits >= usize::BITS as usize || total >> bits == 0 {
            return tl_len;
        }
        tl_len += 1;
    }
}

fn write_tl(ty: SmlType, length: usize, tl_len: usize, out: &mut Vec<u8>) {
    for i in 0..tl_len {
        let shift = 4 * (tl_len - 1 - i);
        let mut byte = ((length >> shift) & 0x0F) as u8;
        if i == 0 {
            byte |= ty.tl_bits();
        }
        if i + 1 < tl_len {
            byte |= 0x80;
        }
        out.push(byte);
    }
}

fn signed_width(v: i64) -> usize {
    if i8::try_from(v).is_ok() {
        1
    } else if i16::try_from(v).is_ok() {
        2
    } else if i32::try_from(v).is_ok() {
        4
    } else {
        8
    }
}

fn unsigned_width(v: u64) -> usize {
    if v <= u64::from(u8::MAX) {
        1
    } else if v <= u64::from(u16::MAX) {
        2
    } else if v <= u64::from(u32::MAX) {
        4
    } else {
        8
    }
}
