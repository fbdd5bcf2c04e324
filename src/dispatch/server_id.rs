// src/dispatch/server_id.rs

use super::record::hex;
use alloc::{format, string::String};

// --- Server Id Layouts (first byte, total length) ---
const TYPE_BCD: u8 = 0x04; // 10 bytes, 18 BCD digits
const TYPE_EON: u8 = 0x04; // 8 bytes, 16 decimal digits
const TYPE_MAC: u8 = 0x05;
const TYPE_DIN_2010_02: u8 = 0x06;
const TYPE_IMEI: u8 = 0x07;
const TYPE_RWE: u8 = 0x08;
const TYPE_DIN_2010_07: u8 = 0x09;
const TYPE_DIN_2012_04: u8 = 0x0A;

/// Renders a meter's server id in the notation printed on the device.
///
/// Known layouts (EON, MAC address, IMEI, RWE and the DIN 43863-5 revisions)
/// are decoded; anything else falls back to its type, length and raw hex.
pub fn server_id_repr(id: &[u8]) -> String {
    let Some(&kind) = id.first() else {
        return String::from("EMPTY");
    };

    match (kind, id.len()) {
        (TYPE_BCD, 10) => hex(&id[1..]),
        (TYPE_EON, 8) => format!("{:016}", be_u64(&id[1..8])),
        (TYPE_MAC, 7) => {
            let mut repr = String::with_capacity(17);
            for (i, b) in id[1..].iter().enumerate() {
                if i > 0 {
                    repr.push(':');
                }
                repr.push_str(&format!("{:02x}", b));
            }
            repr
        }
        (TYPE_DIN_2010_02, 10) => {
            let mut number = be_u64(&id[4..10]);
            let meter_type = ((number / 1_000_000_000_000) & 0x0F) as u8;
            number %= 1_000_000_000_000;
            let block = number / 100_000_000;
            let fabrication = number % 100_000_000;
            format!("{:X}{}{:04}{:08}", meter_type, manufacturer(&id[1..4]), block, fabrication)
        }
        (TYPE_IMEI, 8) => format!("{:015}", be_u64(&id[1..8])),
        (TYPE_RWE, 8) if id[4] == b'-' => {
            format!("{:06}-{:07}", be_u64(&id[1..4]), be_u64(&id[5..8]))
        }
        (TYPE_DIN_2010_07 | TYPE_DIN_2012_04, 10) => {
            let meter_type = id[1] & 0x0F;
            let fabrication = be_u64(&id[6..10]) % 100_000_000;
            format!("{:X}{}{:02X}{:08}", meter_type, manufacturer(&id[2..5]), id[5], fabrication)
        }
        _ => format!("(type={:02x} len={}) {}", kind, id.len(), hex(id)),
    }
}

/// DLMS flag id: three ASCII letters.
fn manufacturer(bytes: &[u8]) -> String {
    bytes.iter().map(|b| char::from(*b)).collect()
}

fn be_u64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
}
