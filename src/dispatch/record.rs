// src/dispatch/record.rs

use crate::common::{obis::ObisCode, types::ValueNode};
use alloc::{
    format,
    string::{String, ToString},
    vec::Vec,
};
use core::fmt::Write;

/// Number of children in an SML value-list entry:
/// `objName, status, valTime, unit, scaler, value, valueSignature`.
pub const VAL_LIST_ENTRY_LEN: usize = 7;

const IDX_OBJ_NAME: usize = 0;
const IDX_STATUS: usize = 1;
const IDX_UNIT: usize = 3;
const IDX_SCALER: usize = 4;
const IDX_VALUE: usize = 5;

/// One measurement extracted from a value-list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObisRecord {
    pub code: ObisCode,
    pub value: ValueNode,
    /// DLMS unit code, `None` if the meter did not send one.
    pub unit: Option<u8>,
    /// Decimal exponent applied to numeric values.
    pub scaler: Option<i8>,
    /// Server id of the enclosing GetList response, empty if there is none.
    pub server_id: Vec<u8>,
    pub status: Option<u64>,
}

impl ObisRecord {
    /// Builds a record from the children of a list, or returns `None` if the
    /// list does not have the shape of a value-list entry.
    ///
    /// Optional fields must be absent (empty octet string) or carry the type
    /// the entry defines for them; the value itself must be a scalar.
    pub fn from_entry(server_id: &[u8], entry: &[ValueNode]) -> Option<Self> {
        if entry.len() != VAL_LIST_ENTRY_LEN {
            return None;
        }
        let code = ObisCode::from_slice(entry[IDX_OBJ_NAME].as_bytes()?)?;

        let status = match &entry[IDX_STATUS] {
            ValueNode::Unsigned(v) => Some(*v),
            node if node.is_absent() => None,
            ValueNode::Integer(_) | ValueNode::Boolean(_) | ValueNode::OctetString(_) => None,
            ValueNode::List(_) | ValueNode::EndOfMessage => return None,
        };
        let unit = match &entry[IDX_UNIT] {
            ValueNode::Unsigned(v) => Some(u8::try_from(*v).ok()?),
            node if node.is_absent() => None,
            _ => return None,
        };
        let scaler = match &entry[IDX_SCALER] {
            ValueNode::Integer(v) => Some(i8::try_from(*v).ok()?),
            node if node.is_absent() => None,
            _ => return None,
        };
        let value = match &entry[IDX_VALUE] {
            ValueNode::List(_) | ValueNode::EndOfMessage => return None,
            node => node.clone(),
        };

        Some(ObisRecord { code, value, unit, scaler, server_id: server_id.to_vec(), status })
    }

    /// Value with the scaler applied: `value * 10^scaler`.
    ///
    /// `None` for octet strings.
    pub fn numeric_value(&self) -> Option<f64> {
        let raw = self.value.as_f64()?;
        let scaler = self.scaler.unwrap_or(0);
        let mut factor = 1.0f64;
        for _ in 0..scaler.unsigned_abs() {
            factor *= 10.0;
        }
        Some(if scaler < 0 { raw / factor } else { raw * factor })
    }

    pub fn unit_symbol(&self) -> Option<&'static str> {
        self.unit.and_then(unit_symbol)
    }

    /// Renders the value as text.
    ///
    /// Without an explicit format, numbers are scaled and octet strings are
    /// shown as hex.
    pub fn render(&self, format: Option<ValueFormat>) -> String {
        match format {
            None => match self.numeric_value() {
                Some(v) => format!("{}", v),
                None => self.value.as_bytes().map(hex).unwrap_or_default(),
            },
            Some(ValueFormat::Text) => match &self.value {
                ValueNode::OctetString(bytes) => String::from_utf8_lossy(bytes).into_owned(),
                _ => self.render(None),
            },
            Some(ValueFormat::Bool) => {
                let on = match &self.value {
                    ValueNode::OctetString(bytes) => bytes.iter().any(|b| *b != 0),
                    node => node.as_u64().is_some_and(|v| v != 0) || node.as_i64().is_some_and(|v| v != 0),
                };
                let text = if on { "ON" } else { "OFF" };
                text.to_string()
            }
            Some(ValueFormat::Uint) => match &self.value {
                ValueNode::OctetString(bytes) => be_uint(bytes).to_string(),
                ValueNode::Integer(v) => (*v as u64).to_string(),
                node => node.as_u64().unwrap_or_default().to_string(),
            },
            Some(ValueFormat::Int) => match &self.value {
                ValueNode::OctetString(bytes) => (be_uint(bytes) as i64).to_string(),
                ValueNode::Unsigned(v) => (*v as i64).to_string(),
                node => node.as_i64().unwrap_or_default().to_string(),
            },
            Some(ValueFormat::Hex) => match &self.value {
                ValueNode::OctetString(bytes) => hex(bytes),
                ValueNode::Integer(v) => format!("{:x}", v),
                node => format!("{:x}", node.as_u64().unwrap_or_default()),
            },
        }
    }
}

/// How a listener wants a record's value rendered as text.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ValueFormat {
    Text,
    Bool,
    Uint,
    Int,
    Hex,
}

impl core::str::FromStr for ValueFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(ValueFormat::Text),
            "bool" => Ok(ValueFormat::Bool),
            "uint" => Ok(ValueFormat::Uint),
            "int" => Ok(ValueFormat::Int),
            "hex" => Ok(ValueFormat::Hex),
            _ => Err(()),
        }
    }
}

/// Symbol of a DLMS/COSEM unit code, for the units electricity, gas, water
/// and heat meters commonly report.
pub fn unit_symbol(unit: u8) -> Option<&'static str> {
    Some(match unit {
        1 => "a",
        2 => "mo",
        3 => "wk",
        4 => "d",
        5 => "h",
        6 => "min",
        7 => "s",
        8 => "°",
        9 => "°C",
        11 => "m",
        12 => "m/s",
        13 => "m³",
        14 => "m³",
        15 => "m³/h",
        16 => "m³/h",
        17 => "m³/d",
        18 => "m³/d",
        19 => "l",
        20 => "kg",
        21 => "N",
        22 => "Nm",
        23 => "Pa",
        24 => "bar",
        25 => "J",
        26 => "J/h",
        27 => "W",
        28 => "VA",
        29 => "var",
        30 => "Wh",
        31 => "VAh",
        32 => "varh",
        33 => "A",
        34 => "C",
        35 => "V",
        36 => "V/m",
        37 => "F",
        38 => "Ω",
        44 => "Hz",
        52 => "K",
        56 => "%",
        255 => "",
        _ => return None,
    })
}

/// Lower-case hex without separators.
pub fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{:02x}", b);
    }
    out
}

/// Big-endian unsigned interpretation of up to the last 8 bytes.
fn be_uint(bytes: &[u8]) -> u64 {
    let tail = &bytes[bytes.len().saturating_sub(8)..];
    tail.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn record(value: ValueNode, unit: Option<u8>, scaler: Option<i8>) -> ObisRecord {
        let entry = fixtures::value_entry([1, 0, 1, 8, 0, 255], unit, scaler, value);
        ObisRecord::from_entry(&fixtures::SERVER_ID, entry.as_list().unwrap()).unwrap()
    }

    #[test]
    fn test_from_entry_fields() {
        let r = record(ValueNode::Integer(12345), Some(30), Some(-2));
        assert_eq!(r.code, ObisCode::new(1, 0, 1, 8, 0, 255));
        assert_eq!(r.unit, Some(30));
        assert_eq!(r.scaler, Some(-2));
        assert_eq!(r.status, None);
        assert_eq!(r.server_id, fixtures::SERVER_ID.to_vec());
        assert_eq!(r.unit_symbol(), Some("Wh"));
    }

    #[test]
    fn test_from_entry_rejects_other_shapes() {
        // wrong length
        assert!(ObisRecord::from_entry(&[], &[ValueNode::OctetString(vec![1, 0, 1, 8, 0, 255])]).is_none());

        // first child not a 6-byte name
        let mut entry = fixtures::energy_entry().as_list().unwrap().to_vec();
        entry[0] = ValueNode::OctetString(vec![1, 0, 1, 8, 0]);
        assert!(ObisRecord::from_entry(&[], &entry).is_none());

        // nested value
        let mut entry = fixtures::energy_entry().as_list().unwrap().to_vec();
        entry[5] = ValueNode::List(vec![]);
        assert!(ObisRecord::from_entry(&[], &entry).is_none());

        // unit of the wrong type
        let mut entry = fixtures::energy_entry().as_list().unwrap().to_vec();
        entry[3] = ValueNode::List(vec![]);
        assert!(ObisRecord::from_entry(&[], &entry).is_none());
    }

    #[test]
    fn test_numeric_value_scaling() {
        assert_eq!(record(ValueNode::Integer(12345), None, Some(-2)).numeric_value(), Some(123.45));
        assert_eq!(record(ValueNode::Unsigned(42), None, Some(3)).numeric_value(), Some(42000.0));
        assert_eq!(record(ValueNode::Integer(-5), None, None).numeric_value(), Some(-5.0));
        assert_eq!(record(ValueNode::OctetString(vec![1]), None, None).numeric_value(), None);
    }

    #[test]
    fn test_render_formats() {
        let text = record(ValueNode::OctetString(b"EMH".to_vec()), None, None);
        assert_eq!(text.render(None), "454d48");
        assert_eq!(text.render(Some(ValueFormat::Text)), "EMH");
        assert_eq!(text.render(Some(ValueFormat::Hex)), "454d48");
        assert_eq!(text.render(Some(ValueFormat::Uint)), "4541768");

        let number = record(ValueNode::Integer(12345), Some(30), Some(-2));
        assert_eq!(number.render(None), "123.45");
        assert_eq!(number.render(Some(ValueFormat::Int)), "12345");
        assert_eq!(number.render(Some(ValueFormat::Hex)), "3039");
        assert_eq!(number.render(Some(ValueFormat::Bool)), "ON");

        let zero = record(ValueNode::Unsigned(0), None, None);
        assert_eq!(zero.render(Some(ValueFormat::Bool)), "OFF");
        let negative = record(ValueNode::Integer(-1), None, None);
        assert_eq!(negative.render(Some(ValueFormat::Int)), "-1");
    }

    #[test]
    fn test_value_format_from_str() {
        assert_eq!("hex".parse::<ValueFormat>(), Ok(ValueFormat::Hex));
        assert_eq!("text".parse::<ValueFormat>(), Ok(ValueFormat::Text));
        assert_eq!("float".parse::<ValueFormat>(), Err(()));
    }

    #[test]
    fn test_unit_symbols() {
        assert_eq!(unit_symbol(27), Some("W"));
        assert_eq!(unit_symbol(35), Some("V"));
        assert_eq!(unit_symbol(255), Some(""));
        assert_eq!(unit_symbol(200), None);
    }
}
