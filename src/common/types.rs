// src/common/types.rs

use alloc::vec::Vec;

// --- SML Type Tags ---

/// Type field (bits 6..4) of an SML TL byte.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
pub enum SmlType {
    OctetString = 0b000,
    Boolean = 0b100,
    Integer = 0b101,
    Unsigned = 0b110,
    List = 0b111,
}

impl SmlType {
    /// Tries to convert the three type bits of a TL byte into an SmlType.
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits & 0x07 {
            0b000 => Some(SmlType::OctetString),
            0b100 => Some(SmlType::Boolean),
            0b101 => Some(SmlType::Integer),
            0b110 => Some(SmlType::Unsigned),
            0b111 => Some(SmlType::List),
            _ => None,
        }
    }

    /// The bits as they appear in the upper nibble of a TL byte (without the
    /// continuation flag).
    pub fn tl_bits(self) -> u8 {
        (self as u8) << 4
    }
}

// --- Decoded Values ---

/// One decoded SML node.
///
/// Lists own their children; nothing is shared between frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueNode {
    /// Signed integer, sign-extended from its encoded width.
    Integer(i64),
    /// Unsigned integer, zero-extended from its encoded width.
    Unsigned(u64),
    /// Raw bytes. An empty octet string is how SML encodes an absent optional.
    OctetString(Vec<u8>),
    Boolean(bool),
    List(Vec<ValueNode>),
    /// The `0x00` end-of-message marker.
    EndOfMessage,
}

impl ValueNode {
    /// Returns the wire type of this node, `None` for the end-of-message marker.
    pub fn sml_type(&self) -> Option<SmlType> {
        match self {
            ValueNode::Integer(_) => Some(SmlType::Integer),
            ValueNode::Unsigned(_) => Some(SmlType::Unsigned),
            ValueNode::OctetString(_) => Some(SmlType::OctetString),
            ValueNode::Boolean(_) => Some(SmlType::Boolean),
            ValueNode::List(_) => Some(SmlType::List),
            ValueNode::EndOfMessage => None,
        }
    }

    /// An empty octet string marks an optional field that was not sent.
    pub fn is_absent(&self) -> bool {
        matches!(self, ValueNode::OctetString(bytes) if bytes.is_empty())
    }

    pub fn as_list(&self) -> Option<&[ValueNode]> {
        match self {
            ValueNode::List(children) => Some(children),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ValueNode::OctetString(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Numeric view of integer-like nodes. Unsigned values above `i64::MAX`
    /// do not fit and yield `None`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ValueNode::Integer(v) => Some(*v),
            ValueNode::Unsigned(v) => i64::try_from(*v).ok(),
            ValueNode::Boolean(b) => Some(i64::from(*b)),
            ValueNode::OctetString(_) | ValueNode::List(_) | ValueNode::EndOfMessage => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ValueNode::Unsigned(v) => Some(*v),
            ValueNode::Integer(v) => u64::try_from(*v).ok(),
            ValueNode::Boolean(b) => Some(u64::from(*b)),
            ValueNode::OctetString(_) | ValueNode::List(_) | ValueNode::EndOfMessage => None,
        }
    }

    /// Value as a float, for numeric nodes only.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ValueNode::Integer(v) => Some(*v as f64),
            ValueNode::Unsigned(v) => Some(*v as f64),
            ValueNode::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            ValueNode::OctetString(_) | ValueNode::List(_) | ValueNode::EndOfMessage => None,
        }
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sml_type_from_bits() {
        assert_eq!(SmlType::from_bits(0b000), Some(SmlType::OctetString));
        assert_eq!(SmlType::from_bits(0b100), Some(SmlType::Boolean));
        assert_eq!(SmlType::from_bits(0b101), Some(SmlType::Integer));
        assert_eq!(SmlType::from_bits(0b110), Some(SmlType::Unsigned));
        assert_eq!(SmlType::from_bits(0b111), Some(SmlType::List));
        assert_eq!(SmlType::from_bits(0b001), None);
        assert_eq!(SmlType::from_bits(0b010), None);
        assert_eq!(SmlType::from_bits(0b011), None);
    }

    #[test]
    fn test_tl_bits() {
        assert_eq!(SmlType::Integer.tl_bits(), 0x50);
        assert_eq!(SmlType::List.tl_bits(), 0x70);
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(ValueNode::Integer(-3).as_i64(), Some(-3));
        assert_eq!(ValueNode::Integer(-3).as_u64(), None);
        assert_eq!(ValueNode::Unsigned(u64::MAX).as_i64(), None);
        assert_eq!(ValueNode::Unsigned(7).as_f64(), Some(7.0));
        assert_eq!(ValueNode::Boolean(true).as_u64(), Some(1));
        assert_eq!(ValueNode::OctetString(vec![1]).as_f64(), None);
        assert_eq!(ValueNode::EndOfMessage.sml_type(), None);
    }

    #[test]
    fn test_absent_optional() {
        assert!(ValueNode::OctetString(vec![]).is_absent());
        assert!(!ValueNode::OctetString(vec![0]).is_absent());
        assert!(!ValueNode::Unsigned(0).is_absent());
    }
}
